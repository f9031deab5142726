//! # Skyport
//!
//! Turns a `functions/` directory into deployables and a local dev router.
//!
//! - [`config`]: `skyport.toml` with `SKYPORT_*` overrides
//! - [`discovery`]: routes and subscribers for every configured glob
//! - [`build`]: per-method wrappers plus `manifest.json` for the chosen target
//! - [`dev`]: refreshable routing table for the dev server
//! - [`watcher`]: file watching that keeps the dev table current

pub mod build;
pub mod config;
pub mod dev;
pub mod discovery;
pub mod watcher;

pub use build::{BuildReport, Builder};
pub use config::{Config, Target};
pub use dev::{DevService, Dispatch, HandlerTarget, RefreshSummary};
pub use discovery::{discover, Discovery};
pub use watcher::FunctionsWatcher;
