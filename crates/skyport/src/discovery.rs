//! Project-level discovery: every configured glob, routes and subscribers together

use anyhow::{Context, Result};
use serde::Serialize;
use skyport_router::scan::{glob_files, scan_route_files};
use skyport_router::subscriber::scan_subscriber_files;
use skyport_router::{
    duplicate_subscriber_names, expand_routes_with, resolve_conflicts, Diagnostic, ExportReader,
    Resolution, RouteInfo, SourceAnalyzer, SubscriberInfo,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::Config;

/// Everything the build and the dev service need from one scan
#[derive(Debug, Clone, Default, Serialize)]
pub struct Discovery {
    /// Consolidated routes, one per path
    pub routes: Vec<RouteInfo>,
    /// Method routes with same-method collisions settled
    pub resolution: Resolution,
    pub subscribers: Vec<SubscriberInfo>,
    /// Files skipped during scanning or expansion
    pub diagnostics: Vec<Diagnostic>,
}

impl Discovery {
    /// Nothing routable and no subscribers
    pub fn is_empty(&self) -> bool {
        self.resolution.routes.is_empty() && self.subscribers.is_empty()
    }
}

/// Discovers a project from disk
pub fn discover(root: &Path, config: &Config) -> Result<Discovery> {
    discover_with(&SourceAnalyzer, root, config)
}

/// Discovers a project using the given export reader
pub fn discover_with<R: ExportReader + ?Sized>(
    reader: &R,
    root: &Path,
    config: &Config,
) -> Result<Discovery> {
    let route_files = collect_files(&config.route_patterns(root));
    let routes = scan_route_files(reader, &config.routes_root(root), &route_files)
        .context("Route discovery failed")?;

    let expanded = expand_routes_with(reader, &routes.items);
    let resolution = resolve_conflicts(expanded.items);

    let subscriber_files = collect_files(&config.subscriber_patterns(root));
    let subscribers =
        scan_subscriber_files(reader, &config.subscribers_root(root), &subscriber_files)
            .context("Subscriber discovery failed")?;

    for (name, files) in duplicate_subscriber_names(&subscribers.items) {
        warn!("Subscriber name '{}' is claimed by {} files: {:?}", name, files.len(), files);
    }

    let diagnostics: Vec<Diagnostic> = routes
        .diagnostics
        .into_iter()
        .chain(expanded.diagnostics)
        .chain(subscribers.diagnostics)
        .collect();

    info!(
        "Discovered {} routes ({} handlers) and {} subscribers, {} files skipped",
        routes.items.len(),
        resolution.routes.len(),
        subscribers.items.len(),
        diagnostics.len()
    );

    Ok(Discovery {
        routes: routes.items,
        resolution,
        subscribers: subscribers.items,
        diagnostics,
    })
}

/// Union of every pattern's matches, sorted and deduplicated
fn collect_files(patterns: &[String]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = patterns.iter().flat_map(|p| glob_files(p)).collect();
    files.sort();
    files.dedup();
    files
}
