//! Build pipeline: discovery → per-method wrappers → manifest
//!
//! Output layout under `<output_dir>/<target>/`:
//!
//! ```text
//! routes/index-get.ts            GET /
//! routes/users/[id]-delete.ts    DELETE /users/[id]
//! routes/webhook.ts              ALL /webhook
//! subscribers/user-created.ts
//! manifest.json
//! ```

pub mod manifest;
pub mod wrapper;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use skyport_router::{artifact_path, convert_route, Conflict, Diagnostic, MethodRoute};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{Config, Target};
use crate::discovery::{discover, Discovery};
use manifest::{Manifest, ManifestConflict, ManifestRoute, ManifestSubscriber, MANIFEST_FILE};
use wrapper::{relative_import, route_wrapper, subscriber_wrapper};

const WRAPPER_EXTENSION: &str = "ts";

/// Outcome of a build
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub target: Target,
    pub output_dir: PathBuf,
    /// Wrapper files written, in write order
    pub artifacts: Vec<PathBuf>,
    pub routes: usize,
    pub subscribers: usize,
    pub conflicts: Vec<Conflict>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildReport {
    /// True when discovery found nothing and no output was touched
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

pub struct Builder {
    root: PathBuf,
    config: Config,
}

impl Builder {
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn target_dir(&self) -> PathBuf {
        self.config.target_dir(&self.root)
    }

    /// Scans the project and writes the target's deployables
    pub fn build(&self) -> Result<BuildReport> {
        let discovery = discover(&self.root, &self.config)?;
        self.build_from(discovery)
    }

    /// Writes deployables for an already discovered project
    ///
    /// An empty discovery leaves the output directory untouched.
    pub fn build_from(&self, discovery: Discovery) -> Result<BuildReport> {
        let target = self.config.build.target;
        let target_dir = self.target_dir();
        let mut report = BuildReport {
            target,
            output_dir: target_dir.clone(),
            artifacts: Vec::new(),
            routes: 0,
            subscribers: 0,
            conflicts: discovery.resolution.conflicts.clone(),
            diagnostics: discovery.diagnostics.clone(),
        };

        if discovery.is_empty() {
            info!("No routes or subscribers found, nothing to build");
            return Ok(report);
        }

        let artifacts = route_artifacts(&discovery.resolution.routes)?;

        if target_dir.exists() {
            fs::remove_dir_all(&target_dir)
                .with_context(|| format!("Failed to clear output directory: {:?}", target_dir))?;
        }
        fs::create_dir_all(&target_dir)
            .with_context(|| format!("Failed to create output directory: {:?}", target_dir))?;

        let mut manifest = Manifest::new(&self.config.project.name, target);

        for (route, artifact) in discovery.resolution.routes.iter().zip(artifacts) {
            let template = convert_route(&route.route, target.param_syntax());
            let wrapper_file = target_dir.join(&artifact);
            let source = route_wrapper(
                target,
                route.method,
                &template,
                &route.export_name,
                &self.import_for(&wrapper_file, &route.file),
            );

            write_artifact(&wrapper_file, &source)?;
            debug!("{} {} -> {}", route.method, route.route, artifact);

            manifest.routes.push(ManifestRoute {
                method: route.method,
                route: template,
                artifact,
                source: self.display_path(&route.file),
                export: route.export_name.clone(),
            });
            report.artifacts.push(wrapper_file);
        }

        let mut written_names = HashSet::new();
        for subscriber in &discovery.subscribers {
            let Some(export) = subscriber.entry_export() else {
                continue;
            };
            if !written_names.insert(subscriber.name.as_str()) {
                warn!(
                    "Skipping {}: subscriber '{}' was already built from another file",
                    subscriber.file.display(),
                    subscriber.name
                );
                continue;
            }

            let artifact = format!("subscribers/{}.{}", subscriber.name, WRAPPER_EXTENSION);
            let wrapper_file = target_dir.join(&artifact);
            let source = subscriber_wrapper(
                target,
                &subscriber.name,
                export,
                &self.import_for(&wrapper_file, &subscriber.file),
            );

            write_artifact(&wrapper_file, &source)?;
            manifest.subscribers.push(ManifestSubscriber {
                name: subscriber.name.clone(),
                artifact,
                source: self.display_path(&subscriber.file),
                export: export.to_string(),
            });
            report.artifacts.push(wrapper_file);
        }

        manifest.conflicts = discovery
            .resolution
            .conflicts
            .iter()
            .map(|c| ManifestConflict::from_conflict(c, |p| self.display_path(p)))
            .collect();
        manifest.write(&target_dir.join(MANIFEST_FILE))?;

        report.routes = manifest.routes.len();
        report.subscribers = manifest.subscribers.len();

        info!(
            "Built {} route handlers and {} subscribers for {} into {}",
            report.routes,
            report.subscribers,
            target,
            target_dir.display()
        );
        Ok(report)
    }

    fn import_for(&self, wrapper_file: &Path, source: &Path) -> String {
        let from = wrapper_file.parent().unwrap_or(Path::new(""));
        let from = from.strip_prefix(&self.root).unwrap_or(from);
        let source = source.strip_prefix(&self.root).unwrap_or(source);
        relative_import(from, source)
    }

    /// Path relative to the project root, `/`-separated
    fn display_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Wrapper path for every route, refusing two routes that share one file
///
/// `GET /users` and `ALL /users-get` both spell `routes/users-get.ts`.
fn route_artifacts(routes: &[MethodRoute]) -> Result<Vec<String>> {
    let mut claimed: HashMap<String, &MethodRoute> = HashMap::new();
    let mut artifacts = Vec::with_capacity(routes.len());

    for route in routes {
        let artifact = format!(
            "routes/{}.{}",
            artifact_path(&route.route, route.method),
            WRAPPER_EXTENSION
        );
        if let Some(previous) = claimed.get(&artifact) {
            bail!(
                "{} {} ({}) and {} {} ({}) would both be built as {}",
                previous.method,
                previous.route,
                previous.file.display(),
                route.method,
                route.route,
                route.file.display(),
                artifact
            );
        }
        claimed.insert(artifact.clone(), route);
        artifacts.push(artifact);
    }

    Ok(artifacts)
}

fn write_artifact(path: &Path, source: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    fs::write(path, source).with_context(|| format!("Failed to write artifact: {:?}", path))
}
