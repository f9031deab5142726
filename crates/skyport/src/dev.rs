//! Dev service: a live routing table over the project's functions
//!
//! The table is rebuilt from scratch on every refresh and swapped in under
//! the write lock, so a concurrent dispatch sees either the previous table or
//! the new one, never a mix.

use anyhow::{Context, Result};
use serde::Serialize;
use skyport_router::{DevRouter, Diagnostic, Method, MethodRoute, SubscriberInfo};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::discovery::{discover, Discovery};

/// What a matched request would be served by
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerTarget {
    pub route: String,
    pub method: Method,
    pub file: PathBuf,
    pub export: String,
}

impl HandlerTarget {
    pub fn route_key(&self) -> String {
        skyport_router::route_key(self.method, &self.route)
    }
}

impl From<&MethodRoute> for HandlerTarget {
    fn from(route: &MethodRoute) -> Self {
        Self {
            route: route.route.clone(),
            method: route.method,
            file: route.file.clone(),
            export: route.export_name.clone(),
        }
    }
}

/// Result of dispatching one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Dispatch {
    Matched {
        target: HandlerTarget,
        params: HashMap<String, String>,
    },
    NotFound {
        method: String,
        path: String,
    },
}

/// Summary of one table rebuild
#[derive(Debug, Clone, Serialize)]
pub struct RefreshSummary {
    pub routes: usize,
    pub subscribers: usize,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Default)]
struct Table {
    router: DevRouter<HandlerTarget>,
    subscribers: Vec<SubscriberInfo>,
}

/// Shared, refreshable dev-time router
#[derive(Clone)]
pub struct DevService {
    root: PathBuf,
    config: Arc<Config>,
    table: Arc<RwLock<Table>>,
}

impl DevService {
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            root: root.into(),
            config: Arc::new(config),
            table: Arc::new(RwLock::new(Table::default())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Rescans the project and swaps in a fresh table
    ///
    /// On a scan error the previous table stays in place.
    pub async fn refresh(&self) -> Result<RefreshSummary> {
        let started = Instant::now();
        let root = self.root.clone();
        let config = Arc::clone(&self.config);

        let discovery = tokio::task::spawn_blocking(move || discover(&root, &config))
            .await
            .context("Discovery task panicked")??;

        let summary = self.install(discovery).await;
        info!(
            "Routing table refreshed: {} handlers, {} subscribers in {:?}",
            summary.routes,
            summary.subscribers,
            started.elapsed()
        );
        for diagnostic in &summary.diagnostics {
            warn!("{}", diagnostic);
        }
        Ok(summary)
    }

    /// Replaces the table with an already discovered project
    pub async fn install(&self, discovery: Discovery) -> RefreshSummary {
        let router =
            DevRouter::from_method_routes(&discovery.resolution.routes, |r| HandlerTarget::from(r));
        let summary = RefreshSummary {
            routes: router.len(),
            subscribers: discovery.subscribers.len(),
            diagnostics: discovery.diagnostics,
        };

        let mut table = self.table.write().await;
        table.router = router;
        table.subscribers = discovery.subscribers;
        summary
    }

    /// Resolves a request against the current table
    ///
    /// Captured parameters are percent-decoded; a capture that does not
    /// decode to UTF-8 is passed through as-is.
    pub async fn dispatch(&self, method: Method, path: &str) -> Dispatch {
        let started = Instant::now();
        let table = self.table.read().await;

        let dispatch = match table.router.match_route(method, path) {
            Ok(found) => Dispatch::Matched {
                target: found.handler.clone(),
                params: found
                    .params
                    .into_iter()
                    .map(|(name, value)| {
                        let decoded = urlencoding::decode(&value)
                            .map(|v| v.into_owned())
                            .unwrap_or(value);
                        (name, decoded)
                    })
                    .collect(),
            },
            Err(miss) => Dispatch::NotFound {
                method: miss.method,
                path: miss.path,
            },
        };

        match &dispatch {
            Dispatch::Matched { target, .. } => debug!(
                "{} {} -> {} ({}#{}) in {:?}",
                method,
                path,
                target.route,
                target.file.display(),
                target.export,
                started.elapsed()
            ),
            Dispatch::NotFound { .. } => {
                debug!("{} {} -> not found in {:?}", method, path, started.elapsed())
            }
        }
        dispatch
    }

    /// Current table as `(route key, target)` pairs, in registration order
    pub async fn routes(&self) -> Vec<(String, HandlerTarget)> {
        let table = self.table.read().await;
        table
            .router
            .entries()
            .flat_map(|entry| entry.handlers.values())
            .map(|target| (target.route_key(), target.clone()))
            .collect()
    }

    pub async fn subscribers(&self) -> Vec<SubscriberInfo> {
        self.table.read().await.subscribers.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use skyport_router::Resolution;

    fn unit(route: &str, method: Method, file: &str) -> MethodRoute {
        MethodRoute {
            file: PathBuf::from(file),
            route: route.to_string(),
            method,
            export_name: method.as_str().to_string(),
        }
    }

    fn discovery(routes: Vec<MethodRoute>) -> Discovery {
        Discovery {
            resolution: Resolution {
                routes,
                conflicts: Vec::new(),
            },
            ..Discovery::default()
        }
    }

    #[tokio::test]
    async fn test_dispatch_decodes_params() {
        let service = DevService::new(".", Config::default());
        service
            .install(discovery(vec![unit("/files/[name]", Method::Get, "api/files/[name].ts")]))
            .await;

        match service.dispatch(Method::Get, "/files/hello%20world").await {
            Dispatch::Matched { target, params } => {
                assert_eq!(target.file, PathBuf::from("api/files/[name].ts"));
                assert_eq!(params.get("name").map(String::as_str), Some("hello world"));
            }
            other => panic!("expected a match, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_miss() {
        let service = DevService::new(".", Config::default());
        assert_eq!(
            service.dispatch(Method::Post, "/nothing").await,
            Dispatch::NotFound {
                method: "POST".to_string(),
                path: "/nothing".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_install_replaces_previous_table() {
        let service = DevService::new(".", Config::default());
        service.install(discovery(vec![unit("/old", Method::Get, "api/old.ts")])).await;
        service.install(discovery(vec![unit("/new", Method::Get, "api/new.ts")])).await;

        let keys: Vec<String> = service.routes().await.into_iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["GET:/new"]);
        assert!(matches!(
            service.dispatch(Method::Get, "/old").await,
            Dispatch::NotFound { .. }
        ));
    }
}
