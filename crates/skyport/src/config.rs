// File: src/config.rs
// Purpose: Configuration parsing from skyport.toml

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use skyport_router::ParamSyntax;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default config file name, looked up in the project root
pub const CONFIG_FILE: &str = "skyport.toml";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub functions: FunctionsConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub dev: DevConfig,
}

/// Project metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_name")]
    pub name: String,
}

/// Where handler and subscriber modules live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionsConfig {
    /// Directory containing HTTP route modules (default: "functions/api")
    #[serde(default = "default_routes_dir")]
    pub routes_dir: String,

    /// Directory containing event subscriber modules (default: "functions/subscribers")
    #[serde(default = "default_subscribers_dir")]
    pub subscribers_dir: String,

    /// Module file extensions to pick up, without the dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

/// Build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    #[serde(default)]
    pub target: Target,
}

/// Development configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_true")]
    pub hot_reload: bool,
}

/// Deployment runtime the build emits wrappers for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    #[default]
    AwsLambda,
    CloudflareWorkers,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::AwsLambda => "aws-lambda",
            Target::CloudflareWorkers => "cloudflare-workers",
        }
    }

    /// Placeholder syntax the target's router expects in route templates
    pub fn param_syntax(&self) -> ParamSyntax {
        match self {
            Target::AwsLambda => ParamSyntax::Brace,
            Target::CloudflareWorkers => ParamSyntax::Colon,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aws-lambda" | "lambda" | "aws" => Ok(Target::AwsLambda),
            "cloudflare-workers" | "workers" | "cloudflare" => Ok(Target::CloudflareWorkers),
            other => Err(format!(
                "unknown target '{}' (expected aws-lambda or cloudflare-workers)",
                other
            )),
        }
    }
}

// Default values
fn default_name() -> String {
    "skyport-app".to_string()
}

fn default_routes_dir() -> String {
    "functions/api".to_string()
}

fn default_subscribers_dir() -> String {
    "functions/subscribers".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["ts".to_string()]
}

fn default_output_dir() -> String {
    ".skyport".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

// Default implementations
impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
        }
    }
}

impl Default for FunctionsConfig {
    fn default() -> Self {
        Self {
            routes_dir: default_routes_dir(),
            subscribers_dir: default_subscribers_dir(),
            extensions: default_extensions(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            target: Target::default(),
        }
    }
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            hot_reload: true,
        }
    }
}

impl Config {
    /// Load configuration from a skyport.toml, then apply `SKYPORT_*` overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::load_file(path.as_ref())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from the project root's skyport.toml
    pub fn load_from_root(root: impl AsRef<Path>) -> Result<Self> {
        Self::load(root.as_ref().join(CONFIG_FILE))
    }

    fn load_file(path: &Path) -> Result<Self> {
        // If file doesn't exist or is empty, return default config
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Applies `SKYPORT_PORT` and `SKYPORT_TARGET` from `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("SKYPORT_PORT") {
            self.dev.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid SKYPORT_PORT: {:?}", port))?;
        }

        if let Some(target) = lookup("SKYPORT_TARGET") {
            self.build.target = target.parse().map_err(|e: String| anyhow!(e))?;
        }

        Ok(())
    }

    /// Route discovery globs under `root`, one per extension
    pub fn route_patterns(&self, root: &Path) -> Vec<String> {
        patterns(&self.routes_root(root), &self.functions.extensions)
    }

    /// Subscriber discovery globs under `root`, one per extension
    pub fn subscriber_patterns(&self, root: &Path) -> Vec<String> {
        patterns(&self.subscribers_root(root), &self.functions.extensions)
    }

    pub fn routes_root(&self, root: &Path) -> PathBuf {
        root.join(&self.functions.routes_dir)
    }

    pub fn subscribers_root(&self, root: &Path) -> PathBuf {
        root.join(&self.functions.subscribers_dir)
    }

    /// `<output_dir>/<target>` under `root`
    pub fn target_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.build.output_dir).join(self.build.target.as_str())
    }
}

/// The directory part is escaped so `[` or `*` in a project path stay literal
fn patterns(dir: &Path, extensions: &[String]) -> Vec<String> {
    let dir = glob::Pattern::escape(&dir.to_string_lossy());
    extensions
        .iter()
        .map(|ext| format!("{}/**/*.{}", dir, ext.trim_start_matches('.')))
        .collect()
}
