//! Path utilities: request path normalization and file-to-route derivation
//!
//! All functions are **pure**: given same input, always produce same output with no side effects.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use crate::error::ScanError;

pub mod artifact;

pub use artifact::{artifact_path, route_from_artifact};

/// Filenames that only carry method meaning when they sit next to an `index` file
pub const COLLAPSIBLE_STEMS: [&str; 5] = ["create", "update", "delete", "edit", "new"];

/// Validates if a path is in canonical form
///
/// # Rules
///
/// - Must start with `/`
/// - Must not contain `//` or `\`
/// - Must not end with `/` (except root `/`)
/// - Must not be empty
///
/// # Examples
///
/// ```
/// use skyport_router::path::is_valid_path;
///
/// assert!(is_valid_path("/"));
/// assert!(is_valid_path("/users/123"));
///
/// assert!(!is_valid_path(""));
/// assert!(!is_valid_path("about")); // Missing leading /
/// assert!(!is_valid_path("/about/")); // Trailing /
/// assert!(!is_valid_path("/about//page")); // Double //
/// ```
pub fn is_valid_path(path: &str) -> bool {
    if path.is_empty() || !path.starts_with('/') {
        return false;
    }

    if path.contains("//") || path.contains('\\') {
        return false;
    }

    path == "/" || !path.ends_with('/')
}

/// Normalize a request path to canonical form
///
/// Returns `Cow::Borrowed` when input is already valid (zero allocations).
/// Trailing slashes, repeated slashes and backslashes are folded away.
///
/// # Examples
///
/// ```
/// use skyport_router::path::normalize_path;
/// use std::borrow::Cow;
///
/// assert!(matches!(normalize_path("/about"), Cow::Borrowed("/about")));
/// assert_eq!(normalize_path("/users/42/"), "/users/42");
/// assert_eq!(normalize_path("\\users\\42"), "/users/42");
/// assert_eq!(normalize_path(""), "/");
/// ```
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if is_valid_path(path) {
        return Cow::Borrowed(path);
    }

    let normalized = path
        .replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if normalized.is_empty() {
        Cow::Borrowed("/")
    } else {
        Cow::Owned(format!("/{}", normalized))
    }
}

/// Parent of a normalized route; the root is its own parent
///
/// # Examples
///
/// ```
/// use skyport_router::path::parent_route;
///
/// assert_eq!(parent_route("/users/create"), "/users");
/// assert_eq!(parent_route("/users"), "/");
/// assert_eq!(parent_route("/"), "/");
/// ```
pub fn parent_route(route: &str) -> &str {
    match route.rfind('/') {
        Some(0) | None => "/",
        Some(pos) => &route[..pos],
    }
}

/// Last segment of a route (empty for the root)
pub fn last_segment(route: &str) -> &str {
    route.rsplit('/').next().unwrap_or("")
}

/// Collapses a trailing `/index` onto its parent
///
/// # Examples
///
/// ```
/// use skyport_router::path::collapse_index;
///
/// assert_eq!(collapse_index("/index"), "/");
/// assert_eq!(collapse_index("/users/index"), "/users");
/// assert_eq!(collapse_index("/users/indexes"), "/users/indexes");
/// ```
pub fn collapse_index(route: &str) -> &str {
    if last_segment(route) == "index" {
        parent_route(route)
    } else {
        route
    }
}

/// Collapses `create`/`update`/`delete`/`edit`/`new` onto the directory route
///
/// Applies only when the directory also holds an `index` file; otherwise the
/// filename is a regular path segment.
///
/// # Examples
///
/// ```
/// use skyport_router::path::collapse_method_named;
///
/// assert_eq!(collapse_method_named("/users/create", true), "/users");
/// assert_eq!(collapse_method_named("/users/create", false), "/users/create");
/// assert_eq!(collapse_method_named("/users/profile", true), "/users/profile");
/// ```
pub fn collapse_method_named(route: &str, has_index_sibling: bool) -> &str {
    if has_index_sibling && COLLAPSIBLE_STEMS.contains(&last_segment(route)) {
        parent_route(route)
    } else {
        route
    }
}

/// Relative path segments of `file` under `root`, extension stripped from the last one
///
/// Fails with [`ScanError::UnsupportedPath`] when `file` is not under `root`.
pub fn relative_segments(file: &Path, root: &Path) -> Result<Vec<String>, ScanError> {
    let (clean_file, clean_root) = (without_cur_dir(file), without_cur_dir(root));
    let relative = clean_file
        .strip_prefix(&clean_root)
        .map_err(|_| ScanError::UnsupportedPath {
            file: file.to_path_buf(),
            root: root.to_path_buf(),
        })?;

    let mut segments: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    match segments.last_mut() {
        Some(last) => {
            if let Some(dot) = last.rfind('.').filter(|&dot| dot > 0) {
                last.truncate(dot);
            }
            Ok(segments)
        }
        None => Err(ScanError::UnsupportedPath {
            file: file.to_path_buf(),
            root: root.to_path_buf(),
        }),
    }
}

/// `./a/./b` and `a/b` must compare equal when stripping the root
fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}

/// Derives the route path of a handler file living under `root`
///
/// Strips the root and the extension, joins segments with `/` whatever the OS
/// separator, and collapses a trailing `index`.
///
/// # Examples
///
/// ```
/// use skyport_router::path::route_from_file;
/// use std::path::Path;
///
/// let root = Path::new("functions/api");
/// assert_eq!(route_from_file(Path::new("functions/api/index.ts"), root).unwrap(), "/");
/// assert_eq!(route_from_file(Path::new("functions/api/users/index.ts"), root).unwrap(), "/users");
/// assert_eq!(route_from_file(Path::new("functions/api/users/[id].ts"), root).unwrap(), "/users/[id]");
/// assert!(route_from_file(Path::new("elsewhere/a.ts"), root).is_err());
/// ```
pub fn route_from_file(file: &Path, root: &Path) -> Result<String, ScanError> {
    let route = format!("/{}", relative_segments(file, root)?.join("/"));
    Ok(collapse_index(&route).to_string())
}
