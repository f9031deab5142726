use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A recoverable, per-file problem found while scanning or expanding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub reason: String,
}

impl Diagnostic {
    pub fn new(file: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self {
            file: file.into(),
            reason: reason.to_string(),
        }
    }

    pub fn concerns(&self, file: &Path) -> bool {
        self.file == file
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.reason)
    }
}

/// Result of a scan: the records found plus the files that had to be skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport<T> {
    pub items: Vec<T>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> ScanReport<T> {
    pub fn new(items: Vec<T>, diagnostics: Vec<Diagnostic>) -> Self {
        Self { items, diagnostics }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for ScanReport<T> {
    fn default() -> Self {
        Self::empty()
    }
}
