//! Event subscriber discovery
//!
//! Subscribers follow the route convention minus methods: the name is the
//! path relative to the subscribers root, and any export makes a file count.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::diagnostics::{Diagnostic, ScanReport};
use crate::error::ScanError;
use crate::exports::{ExportReader, SourceAnalyzer};
use crate::path::relative_segments;
use crate::scan::{glob_files, glob_root};

/// Export name subscribers are expected to provide when they have no default export
pub const LISTEN_EXPORT: &str = "listen";

/// One event subscriber module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriberInfo {
    pub file: PathBuf,
    /// Relative path without extension, `/`-separated (`nested/order-processed`)
    pub name: String,
    pub has_default_export: bool,
    pub exports: BTreeSet<String>,
}

impl SubscriberInfo {
    /// Export to wire as the entrypoint: `listen` when present, then `default`,
    /// then the first named export
    pub fn entry_export(&self) -> Option<&str> {
        if self.exports.contains(LISTEN_EXPORT) {
            Some(LISTEN_EXPORT)
        } else if self.has_default_export {
            Some(crate::exports::DEFAULT_EXPORT)
        } else {
            self.exports.iter().next().map(String::as_str)
        }
    }
}

/// Subscriber name for a file under `root`
///
/// # Examples
///
/// ```
/// use skyport_router::subscriber::subscriber_name;
/// use std::path::Path;
///
/// let root = Path::new("functions/subscribers");
/// let name = subscriber_name(Path::new("functions/subscribers/nested/order-processed.ts"), root);
/// assert_eq!(name.unwrap(), "nested/order-processed");
/// ```
pub fn subscriber_name(file: &Path, root: &Path) -> Result<String, ScanError> {
    Ok(relative_segments(file, root)?.join("/"))
}

/// Scans an explicit subscriber file list rooted at `root`
///
/// No merging happens; two files yielding the same name are both reported.
pub fn scan_subscriber_files<R: ExportReader + ?Sized>(
    reader: &R,
    root: &Path,
    files: &[PathBuf],
) -> Result<ScanReport<SubscriberInfo>, ScanError> {
    let mut subscribers = Vec::new();
    let mut diagnostics = Vec::new();

    for file in files {
        let name = subscriber_name(file, root)?;

        let exports = match reader.read_exports(file) {
            Ok(exports) => exports,
            Err(e) => {
                warn!("Skipping subscriber file {}: {}", file.display(), e);
                diagnostics.push(Diagnostic::new(file.clone(), e));
                continue;
            }
        };

        if exports.is_empty() {
            debug!("No exports in subscriber {}", file.display());
            continue;
        }

        subscribers.push(SubscriberInfo {
            file: file.clone(),
            name,
            has_default_export: exports.has_default(),
            exports: exports.named().into_iter().collect(),
        });
    }

    Ok(ScanReport::new(subscribers, diagnostics))
}

/// Scans subscribers matched by a glob pattern using the given reader
pub fn scan_subscribers_with<R: ExportReader + ?Sized>(
    reader: &R,
    pattern: &str,
) -> Result<ScanReport<SubscriberInfo>, ScanError> {
    let root = glob_root(pattern);
    let files = glob_files(pattern);
    let report = scan_subscriber_files(reader, &root, &files)?;

    info!("Discovered {} subscribers under {}", report.items.len(), root.display());
    Ok(report)
}

/// Scans subscribers matched by a glob pattern, parsing sources from disk
pub fn scan_subscribers(pattern: &str) -> Result<ScanReport<SubscriberInfo>, ScanError> {
    scan_subscribers_with(&SourceAnalyzer, pattern)
}

/// Names claimed by more than one subscriber file, with the files involved
///
/// The scanner keeps colliding records; callers decide what to do about them.
pub fn duplicate_subscriber_names(subscribers: &[SubscriberInfo]) -> Vec<(String, Vec<PathBuf>)> {
    let mut by_name: HashMap<&str, Vec<PathBuf>> = HashMap::new();
    for subscriber in subscribers {
        by_name
            .entry(subscriber.name.as_str())
            .or_default()
            .push(subscriber.file.clone());
    }

    let mut duplicates: Vec<(String, Vec<PathBuf>)> = by_name
        .into_iter()
        .filter(|(_, files)| files.len() > 1)
        .map(|(name, files)| (name.to_string(), files))
        .collect();
    duplicates.sort();
    duplicates
}
