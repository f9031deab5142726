use std::path::PathBuf;
use thiserror::Error;

/// Hard failures of a scan call
///
/// Per-file problems never surface here; they become [`crate::Diagnostic`]s.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A file reached the analyzer that does not live under the scanned root.
    /// This is a caller or configuration bug, so the whole scan fails.
    #[error("unsupported file path {file:?}: not under root {root:?}")]
    UnsupportedPath { file: PathBuf, root: PathBuf },
}

/// Why a single module could not be analyzed
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },

    #[error("parser produced no syntax tree")]
    NoTree,

    #[error("failed to load grammar: {0}")]
    Language(String),
}
