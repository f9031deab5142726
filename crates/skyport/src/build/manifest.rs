//! `manifest.json`: the build's index of deployables

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use skyport_router::{Conflict, Method};
use std::fs;
use std::path::Path;

use crate::config::Target;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub project: String,
    pub target: Target,
    pub routes: Vec<ManifestRoute>,
    pub subscribers: Vec<ManifestSubscriber>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<ManifestConflict>,
}

/// One deployable HTTP handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRoute {
    pub method: Method,
    /// Route template in the target's placeholder syntax
    pub route: String,
    /// Wrapper path relative to the target directory
    pub artifact: String,
    pub source: String,
    pub export: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSubscriber {
    pub name: String,
    pub artifact: String,
    pub source: String,
    pub export: String,
}

/// Same-method collision settled at build time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestConflict {
    pub method: Method,
    pub route: String,
    pub kept: String,
    pub dropped: Vec<String>,
}

impl ManifestConflict {
    pub fn from_conflict(conflict: &Conflict, display: impl Fn(&Path) -> String) -> Self {
        Self {
            method: conflict.method,
            route: conflict.route.clone(),
            kept: display(conflict.kept.as_path()),
            dropped: conflict.dropped.iter().map(|p| display(p.as_path())).collect(),
        }
    }
}

impl Manifest {
    pub fn new(project: impl Into<String>, target: Target) -> Self {
        Self {
            project: project.into(),
            target,
            routes: Vec::new(),
            subscribers: Vec::new(),
            conflicts: Vec::new(),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize manifest")?;
        fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write manifest: {:?}", path))
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse manifest: {:?}", path))
    }
}
