//! Route discovery: glob → per-file export analysis → merged `RouteInfo`s
//!
//! Discovery is split in two so the merge rules can be tested without a
//! filesystem: [`discover_route_files`] turns files into [`DiscoveredFile`]s,
//! and [`merge_routes`] folds those into one record per route path.

use std::collections::{BTreeSet, HashSet};
use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::diagnostics::{Diagnostic, ScanReport};
use crate::error::ScanError;
use crate::exports::{ExportReader, HandlerShape, ModuleExports, SourceAnalyzer};
use crate::method::Method;
use crate::path::{collapse_method_named, route_from_file};

/// One logical HTTP route as discovered on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    /// Contributing files, unique, in discovery order
    pub files: Vec<PathBuf>,
    /// Normalized route path, `[name]` for dynamic segments
    pub route: String,
    pub methods: BTreeSet<Method>,
    pub has_default_export: bool,
    /// Named exports across every contributing file
    pub exports: BTreeSet<String>,
}

impl RouteInfo {
    pub fn is_multi_file(&self) -> bool {
        self.files.len() > 1
    }
}

/// A single routable file before merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub file: PathBuf,
    pub route: String,
    pub methods: BTreeSet<Method>,
    pub has_default_export: bool,
    pub exports: BTreeSet<String>,
}

impl DiscoveredFile {
    /// Builds the record for a file, or `None` when the file exports nothing
    ///
    /// A file exporting only helpers is kept with an empty method set: it still
    /// belongs to its route but expands to no handlers.
    pub fn from_exports(file: PathBuf, route: String, exports: &ModuleExports) -> Option<Self> {
        if exports.is_empty() {
            return None;
        }

        let methods: BTreeSet<Method> = match exports.shape() {
            HandlerShape::Methods(methods) => methods.into_iter().map(|(m, _)| m).collect(),
            HandlerShape::All(_) => BTreeSet::from([Method::All]),
            HandlerShape::Unroutable => BTreeSet::new(),
        };

        Some(Self {
            file,
            route,
            methods,
            has_default_export: exports.has_default(),
            exports: exports.named().into_iter().collect(),
        })
    }
}

/// Folds discovered files into one `RouteInfo` per route path
///
/// Same-route files are merged: methods and exports are unioned, the default
/// flag is OR'd and `files` accumulates. Output order follows first discovery.
pub fn merge_routes<I>(discovered: I) -> Vec<RouteInfo>
where
    I: IntoIterator<Item = DiscoveredFile>,
{
    discovered
        .into_iter()
        .fold(IndexMap::<String, RouteInfo>::new(), |mut routes, found| {
            match routes.get_mut(&found.route) {
                Some(existing) => {
                    if !existing.files.contains(&found.file) {
                        existing.files.push(found.file);
                    }
                    existing.methods.extend(found.methods);
                    existing.exports.extend(found.exports);
                    existing.has_default_export |= found.has_default_export;
                }
                None => {
                    routes.insert(
                        found.route.clone(),
                        RouteInfo {
                            files: vec![found.file],
                            route: found.route,
                            methods: found.methods,
                            has_default_export: found.has_default_export,
                            exports: found.exports,
                        },
                    );
                }
            }
            routes
        })
        .into_values()
        .collect()
}

/// Directory a glob pattern is rooted at: every component before the first wildcard
///
/// # Examples
///
/// ```
/// use skyport_router::scan::glob_root;
/// use std::path::PathBuf;
///
/// assert_eq!(glob_root("functions/api/**/*.ts"), PathBuf::from("functions/api"));
/// assert_eq!(glob_root("./functions/subscribers/*.ts"), PathBuf::from("./functions/subscribers"));
/// ```
pub fn glob_root(pattern: &str) -> PathBuf {
    let is_wild = |part: &str| part.contains(|c| matches!(c, '*' | '?' | '[' | '{'));

    Path::new(pattern)
        .components()
        .take_while(|component| match component {
            Component::Normal(part) => !is_wild(&part.to_string_lossy()),
            _ => true,
        })
        .collect()
}

/// Expands a glob into a sorted file list; pattern errors yield no files
pub fn glob_files(pattern: &str) -> Vec<PathBuf> {
    let paths = match glob::glob(pattern) {
        Ok(paths) => paths,
        Err(e) => {
            debug!("Glob pattern {:?} did not resolve: {}", pattern, e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = paths
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable glob entry: {}", e);
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    files
}

/// Directories (of the given file list) that contain an `index` module
pub fn index_directories(files: &[PathBuf]) -> HashSet<PathBuf> {
    files
        .iter()
        .filter(|file| file.file_stem().and_then(|s| s.to_str()) == Some("index"))
        .filter_map(|file| file.parent().map(Path::to_path_buf))
        .collect()
}

/// Route path for a file, with the `create`/`update`/... collapsing applied
pub fn route_for_file(
    file: &Path,
    root: &Path,
    index_dirs: &HashSet<PathBuf>,
) -> Result<String, ScanError> {
    let route = route_from_file(file, root)?;
    let has_index_sibling = file
        .parent()
        .map(|dir| index_dirs.contains(dir))
        .unwrap_or(false);
    Ok(collapse_method_named(&route, has_index_sibling).to_string())
}

/// Analyzes every file and keeps the ones with exports
///
/// Files that fail to parse become diagnostics. A file outside `root` aborts
/// the call with [`ScanError::UnsupportedPath`].
pub fn discover_route_files<R: ExportReader + ?Sized>(
    reader: &R,
    root: &Path,
    files: &[PathBuf],
) -> Result<(Vec<DiscoveredFile>, Vec<Diagnostic>), ScanError> {
    let index_dirs = index_directories(files);
    let mut discovered = Vec::new();
    let mut diagnostics = Vec::new();

    for file in files {
        let route = route_for_file(file, root, &index_dirs)?;

        let exports = match reader.read_exports(file) {
            Ok(exports) => exports,
            Err(e) => {
                warn!("Skipping route file {}: {}", file.display(), e);
                diagnostics.push(Diagnostic::new(file.clone(), e));
                continue;
            }
        };

        match DiscoveredFile::from_exports(file.clone(), route, &exports) {
            Some(found) => {
                debug!("Route file {} -> {}", file.display(), found.route);
                discovered.push(found);
            }
            None => debug!("No exports in {}", file.display()),
        }
    }

    Ok((discovered, diagnostics))
}

/// Scans an explicit file list rooted at `root`
pub fn scan_route_files<R: ExportReader + ?Sized>(
    reader: &R,
    root: &Path,
    files: &[PathBuf],
) -> Result<ScanReport<RouteInfo>, ScanError> {
    let (discovered, diagnostics) = discover_route_files(reader, root, files)?;
    Ok(ScanReport::new(merge_routes(discovered), diagnostics))
}

/// Scans the routes matched by a glob pattern using the given reader
pub fn scan_routes_with<R: ExportReader + ?Sized>(
    reader: &R,
    pattern: &str,
) -> Result<ScanReport<RouteInfo>, ScanError> {
    let root = glob_root(pattern);
    let files = glob_files(pattern);
    let report = scan_route_files(reader, &root, &files)?;

    info!(
        "Discovered {} routes from {} files under {}",
        report.items.len(),
        files.len(),
        root.display()
    );
    Ok(report)
}

/// Scans the routes matched by a glob pattern, parsing sources from disk
///
/// # Examples
///
/// ```no_run
/// use skyport_router::scan_routes;
///
/// let report = scan_routes("functions/api/**/*.ts").unwrap();
/// for route in &report.items {
///     println!("{} {:?}", route.route, route.methods);
/// }
/// ```
pub fn scan_routes(pattern: &str) -> Result<ScanReport<RouteInfo>, ScanError> {
    scan_routes_with(&SourceAnalyzer, pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exports::ExportDeclaration;
    use pretty_assertions::assert_eq;

    fn found(file: &str, route: &str, methods: &[Method], exports: &[&str]) -> DiscoveredFile {
        DiscoveredFile {
            file: PathBuf::from(file),
            route: route.to_string(),
            methods: methods.iter().copied().collect(),
            has_default_export: false,
            exports: exports.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_merge_unions_same_route() {
        let routes = merge_routes(vec![
            found("api/users/index.ts", "/users", &[Method::Get], &["GET"]),
            found("api/health.ts", "/health", &[Method::All], &["handler"]),
            found("api/users/create.ts", "/users", &[Method::Post], &["POST", "schema"]),
        ]);

        assert_eq!(routes.len(), 2);
        let users = &routes[0];
        assert_eq!(users.route, "/users");
        assert_eq!(
            users.files,
            vec![PathBuf::from("api/users/index.ts"), PathBuf::from("api/users/create.ts")]
        );
        assert_eq!(users.methods, BTreeSet::from([Method::Get, Method::Post]));
        assert_eq!(
            users.exports,
            BTreeSet::from(["GET".to_string(), "POST".to_string(), "schema".to_string()])
        );
        assert!(users.is_multi_file());
        assert!(!routes[1].is_multi_file());
    }

    #[test]
    fn test_merge_ors_default_flag_and_dedups_files() {
        let mut with_default = found("api/a.ts", "/a", &[Method::All], &[]);
        with_default.has_default_export = true;
        let routes = merge_routes(vec![
            found("api/a/index.ts", "/a", &[Method::Get], &["GET"]),
            with_default.clone(),
            with_default,
        ]);

        assert_eq!(routes.len(), 1);
        assert!(routes[0].has_default_export);
        assert_eq!(routes[0].files.len(), 2);
        assert_eq!(routes[0].methods, BTreeSet::from([Method::Get, Method::All]));
    }

    #[test]
    fn test_helper_only_file_is_kept_without_methods() {
        let helpers = ModuleExports::new(vec![ExportDeclaration::named("formatUser")]);
        let found = DiscoveredFile::from_exports(
            PathBuf::from("api/helpers.ts"),
            "/helpers".into(),
            &helpers,
        )
        .unwrap();
        assert!(found.methods.is_empty());
        assert_eq!(found.exports, BTreeSet::from(["formatUser".to_string()]));

        let nothing = ModuleExports::new(Vec::new());
        assert_eq!(
            DiscoveredFile::from_exports(PathBuf::from("api/empty.ts"), "/empty".into(), &nothing),
            None
        );
    }

    #[test]
    fn test_glob_root_without_wildcards_is_whole_path() {
        assert_eq!(glob_root("functions/api"), PathBuf::from("functions/api"));
        assert_eq!(glob_root("**/*.ts"), PathBuf::new());
    }

    #[test]
    fn test_route_for_file_collapses_only_with_index_sibling() {
        let files = vec![
            PathBuf::from("api/users/index.ts"),
            PathBuf::from("api/users/create.ts"),
            PathBuf::from("api/posts/new.ts"),
        ];
        let index_dirs = index_directories(&files);
        let root = Path::new("api");

        assert_eq!(route_for_file(&files[1], root, &index_dirs).unwrap(), "/users");
        assert_eq!(route_for_file(&files[2], root, &index_dirs).unwrap(), "/posts/new");
    }
}
