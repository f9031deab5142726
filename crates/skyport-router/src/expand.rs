//! Method expansion: consolidated routes → one dispatch unit per method
//!
//! A route backed by a single file is expanded from the data gathered at
//! discovery. A route backed by several files is re-analyzed file by file,
//! because the unioned method set no longer says which file serves what.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::diagnostics::{Diagnostic, ScanReport};
use crate::exports::{ExportReader, HandlerShape, SourceAnalyzer, DEFAULT_EXPORT, HANDLER_EXPORT};
use crate::method::Method;
use crate::scan::RouteInfo;

/// One concrete `(method, file, route)` dispatch unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MethodRoute {
    pub file: PathBuf,
    pub route: String,
    pub method: Method,
    /// Symbol inside `file` implementing `method`
    pub export_name: String,
}

impl MethodRoute {
    /// Dispatch table key, `"{METHOD}:{route}"`
    pub fn route_key(&self) -> String {
        route_key(self.method, &self.route)
    }
}

/// Builds a dispatch table key
///
/// # Examples
///
/// ```
/// use skyport_router::{route_key, Method};
///
/// assert_eq!(route_key(Method::Get, "/users/[id]"), "GET:/users/[id]");
/// ```
pub fn route_key(method: Method, route: &str) -> String {
    format!("{}:{}", method, route)
}

/// Expands routes, re-reading multi-file routes from disk
pub fn expand_routes_to_methods(routes: &[RouteInfo]) -> ScanReport<MethodRoute> {
    expand_routes_with(&SourceAnalyzer, routes)
}

/// Expands routes using the given reader for multi-file re-analysis
///
/// A file that cannot be re-analyzed becomes a diagnostic and contributes
/// nothing. Same-method duplicates across files are emitted as they are; see
/// [`resolve_conflicts`].
pub fn expand_routes_with<R: ExportReader + ?Sized>(
    reader: &R,
    routes: &[RouteInfo],
) -> ScanReport<MethodRoute> {
    let mut expanded = Vec::new();
    let mut diagnostics = Vec::new();

    for info in routes {
        match info.files.as_slice() {
            [] => {}
            [file] => expanded.extend(expand_single_file(info, file)),
            files => {
                for file in files {
                    match reader.read_exports(file) {
                        Ok(exports) => expanded.extend(method_routes_for_shape(
                            &info.route,
                            file,
                            exports.shape(),
                        )),
                        Err(e) => {
                            warn!(
                                "Skipping {} while expanding {}: {}",
                                file.display(),
                                info.route,
                                e
                            );
                            diagnostics.push(Diagnostic::new(file.clone(), e));
                        }
                    }
                }
            }
        }
    }

    debug!("Expanded {} routes into {} method routes", routes.len(), expanded.len());
    ScanReport::new(expanded, diagnostics)
}

fn expand_single_file(info: &RouteInfo, file: &Path) -> Vec<MethodRoute> {
    info.methods
        .iter()
        .map(|&method| MethodRoute {
            file: file.to_path_buf(),
            route: info.route.clone(),
            method,
            export_name: export_name_for(info, method),
        })
        .collect()
}

/// Export serving `method` in a single-file route
fn export_name_for(info: &RouteInfo, method: Method) -> String {
    if method.is_wildcard() {
        return if info.has_default_export {
            DEFAULT_EXPORT.to_string()
        } else {
            HANDLER_EXPORT.to_string()
        };
    }

    info.exports
        .iter()
        .find(|name| Method::from_export_name(name) == Some(method))
        .cloned()
        .unwrap_or_else(|| method.as_str().to_string())
}

fn method_routes_for_shape(route: &str, file: &Path, shape: HandlerShape) -> Vec<MethodRoute> {
    let unit = |method: Method, export_name: String| MethodRoute {
        file: file.to_path_buf(),
        route: route.to_string(),
        method,
        export_name,
    };

    match shape {
        HandlerShape::Methods(methods) => methods
            .into_iter()
            .map(|(method, export_name)| unit(method, export_name))
            .collect(),
        HandlerShape::All(export_name) => vec![unit(Method::All, export_name)],
        HandlerShape::Unroutable => Vec::new(),
    }
}

// ============================================================================
// Conflict resolution
// ============================================================================

/// Two or more files claimed the same method on the same route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub method: Method,
    pub route: String,
    pub kept: PathBuf,
    pub dropped: Vec<PathBuf>,
}

/// Method routes with every `(method, route)` pair claimed exactly once
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub routes: Vec<MethodRoute>,
    pub conflicts: Vec<Conflict>,
}

/// Keeps one candidate per `(method, route)`
///
/// The winner is the candidate whose file is not an `index` module (the more
/// specific filename), then the lexicographically smallest path. Output keeps
/// first-occurrence order of each pair.
pub fn resolve_conflicts(routes: Vec<MethodRoute>) -> Resolution {
    let mut groups: IndexMap<(Method, String), Vec<MethodRoute>> = IndexMap::new();
    for route in routes {
        groups
            .entry((route.method, route.route.clone()))
            .or_default()
            .push(route);
    }

    let mut resolution = Resolution::default();
    for ((method, route), mut candidates) in groups {
        candidates.sort_by(specificity);
        let mut candidates = candidates.into_iter();
        let Some(winner) = candidates.next() else {
            continue;
        };

        let dropped: Vec<PathBuf> = candidates.map(|c| c.file).collect();
        if !dropped.is_empty() {
            warn!(
                "{} {} is exported by several files; using {}",
                method,
                route,
                winner.file.display()
            );
            resolution.conflicts.push(Conflict {
                method,
                route,
                kept: winner.file.clone(),
                dropped,
            });
        }
        resolution.routes.push(winner);
    }

    resolution
}

fn specificity(a: &MethodRoute, b: &MethodRoute) -> Ordering {
    let is_index = |r: &MethodRoute| r.file.file_stem().and_then(|s| s.to_str()) == Some("index");
    is_index(a)
        .cmp(&is_index(b))
        .then_with(|| a.file.cmp(&b.file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::exports::{ExportDeclaration, ModuleExports};
    use pretty_assertions::assert_eq;
    use std::collections::{BTreeSet, HashMap};

    /// In-memory modules keyed by path
    struct FakeModules(HashMap<PathBuf, ModuleExports>);

    impl ExportReader for FakeModules {
        fn read_exports(&self, path: &Path) -> Result<ModuleExports, ParseError> {
            self.0.get(path).cloned().ok_or(ParseError::NoTree)
        }
    }

    fn info(
        route: &str,
        files: &[&str],
        methods: &[Method],
        exports: &[&str],
        default: bool,
    ) -> RouteInfo {
        RouteInfo {
            files: files.iter().map(PathBuf::from).collect(),
            route: route.to_string(),
            methods: methods.iter().copied().collect(),
            has_default_export: default,
            exports: exports.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        }
    }

    #[test]
    fn test_single_file_keeps_export_spelling() {
        let routes = [info(
            "/items",
            &["api/items.ts"],
            &[Method::Get, Method::Post],
            &["get", "POST"],
            false,
        )];
        let report = expand_routes_with(&FakeModules(HashMap::new()), &routes);

        let pairs: Vec<(Method, &str)> = report
            .items
            .iter()
            .map(|r| (r.method, r.export_name.as_str()))
            .collect();
        assert_eq!(pairs, vec![(Method::Get, "get"), (Method::Post, "POST")]);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_single_file_all_prefers_default() {
        let routes = [
            info("/a", &["api/a.ts"], &[Method::All], &["handler"], true),
            info("/b", &["api/b.ts"], &[Method::All], &["handler"], false),
        ];
        let report = expand_routes_with(&FakeModules(HashMap::new()), &routes);
        assert_eq!(report.items[0].export_name, "default");
        assert_eq!(report.items[1].export_name, "handler");
    }

    #[test]
    fn test_multi_file_reanalyzes_each_file() {
        let modules = FakeModules(HashMap::from([
            (
                PathBuf::from("api/users/index.ts"),
                ModuleExports::new(vec![ExportDeclaration::named("GET")]),
            ),
            (
                PathBuf::from("api/users/create.ts"),
                ModuleExports::new(vec![ExportDeclaration::default_export()]),
            ),
        ]));
        let routes = [info(
            "/users",
            &["api/users/index.ts", "api/users/create.ts", "api/users/gone.ts"],
            &[Method::Get, Method::All],
            &["GET"],
            true,
        )];

        let report = expand_routes_with(&modules, &routes);
        assert_eq!(
            report.items,
            vec![
                MethodRoute {
                    file: PathBuf::from("api/users/index.ts"),
                    route: "/users".to_string(),
                    method: Method::Get,
                    export_name: "GET".to_string(),
                },
                MethodRoute {
                    file: PathBuf::from("api/users/create.ts"),
                    route: "/users".to_string(),
                    method: Method::All,
                    export_name: "default".to_string(),
                },
            ]
        );
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].concerns(Path::new("api/users/gone.ts")));
    }

    fn unit(file: &str, method: Method) -> MethodRoute {
        MethodRoute {
            file: PathBuf::from(file),
            route: "/users".to_string(),
            method,
            export_name: method.as_str().to_string(),
        }
    }

    #[test]
    fn test_resolve_prefers_specific_file_over_index() {
        let resolution = resolve_conflicts(vec![
            unit("api/users/index.ts", Method::Get),
            unit("api/users/index.ts", Method::Post),
            unit("api/users/create.ts", Method::Post),
        ]);

        assert_eq!(
            resolution.routes,
            vec![
                unit("api/users/index.ts", Method::Get),
                unit("api/users/create.ts", Method::Post),
            ]
        );
        assert_eq!(
            resolution.conflicts,
            vec![Conflict {
                method: Method::Post,
                route: "/users".to_string(),
                kept: PathBuf::from("api/users/create.ts"),
                dropped: vec![PathBuf::from("api/users/index.ts")],
            }]
        );
    }

    #[test]
    fn test_resolve_breaks_ties_by_path() {
        let resolution = resolve_conflicts(vec![
            unit("api/users/update.ts", Method::Put),
            unit("api/users/edit.ts", Method::Put),
        ]);
        assert_eq!(resolution.routes[0].file, PathBuf::from("api/users/edit.ts"));
        assert_eq!(resolution.conflicts[0].dropped, vec![PathBuf::from("api/users/update.ts")]);
    }
}
