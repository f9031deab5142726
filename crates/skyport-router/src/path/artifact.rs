//! Artifact naming: encoding the method into a deployable's file name
//!
//! Build output lays one wrapper per `(route, method)` out on disk, so the
//! method has to live in the name: `/users/[id]` + `GET` becomes
//! `users/[id]-get`. Wildcard handlers carry no suffix.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::method::Method;
use crate::path::collapse_index;

static METHOD_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.*)-(get|post|put|patch|delete|head|options)$")
        .expect("method suffix pattern is valid")
});

/// Splits a `name-method` artifact path back into a route and method
///
/// A recognized suffix is split off; a non-empty remainder stays as the last
/// segment, an empty remainder collapses onto the parent. Without a suffix the
/// method is [`Method::Any`] and the segment is kept. A file extension, if
/// present, is ignored.
///
/// # Examples
///
/// ```
/// use skyport_router::{path::route_from_artifact, Method};
///
/// assert_eq!(route_from_artifact("users/[id]-get.ts"), ("/users/[id]".to_string(), Method::Get));
/// assert_eq!(route_from_artifact("users/-post"), ("/users".to_string(), Method::Post));
/// assert_eq!(route_from_artifact("index-get"), ("/".to_string(), Method::Get));
/// assert_eq!(route_from_artifact("health"), ("/health".to_string(), Method::Any));
/// ```
pub fn route_from_artifact(artifact: &str) -> (String, Method) {
    let trimmed = artifact.trim_matches('/');
    let without_ext = match trimmed.rfind('.') {
        Some(dot) if dot > trimmed.rfind('/').map_or(0, |slash| slash + 1) => &trimmed[..dot],
        _ => trimmed,
    };

    let route = format!("/{}", without_ext);
    let (parent, last) = match route.rfind('/') {
        Some(pos) => (&route[..pos], &route[pos + 1..]),
        None => ("", route.as_str()),
    };

    let Some(captures) = METHOD_SUFFIX.captures(last) else {
        return (collapse_index(&route).to_string(), Method::Any);
    };

    // The pattern only admits the seven method names
    let method = Method::from_export_name(&captures[2]).unwrap_or(Method::Any);
    let remainder = &captures[1];

    let route = if remainder.is_empty() || remainder == "index" {
        if parent.is_empty() {
            "/".to_string()
        } else {
            parent.to_string()
        }
    } else {
        format!("{}/{}", parent, remainder)
    };

    (route, method)
}

/// Artifact path (no extension) for a route and method
///
/// The root route is spelled `index`; wildcard methods get no suffix.
///
/// # Examples
///
/// ```
/// use skyport_router::{path::artifact_path, Method};
///
/// assert_eq!(artifact_path("/users/[id]", Method::Get), "users/[id]-get");
/// assert_eq!(artifact_path("/", Method::Post), "index-post");
/// assert_eq!(artifact_path("/users", Method::All), "users");
/// assert_eq!(artifact_path("/", Method::All), "index");
/// ```
pub fn artifact_path(route: &str, method: Method) -> String {
    let base = if route == "/" {
        "index".to_string()
    } else {
        route.trim_start_matches('/').to_string()
    };

    if method.is_wildcard() {
        base
    } else {
        format!("{}-{}", base, method.as_str().to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/", Method::Get)]
    #[case("/users", Method::Post)]
    #[case("/users/[id]", Method::Delete)]
    #[case("/orgs/[org]/repos", Method::Options)]
    fn test_artifact_names_map_back(#[case] route: &str, #[case] method: Method) {
        let artifact = artifact_path(route, method);
        assert_eq!(route_from_artifact(&artifact), (route.to_string(), method));
    }

    #[test]
    fn test_wildcard_maps_back_to_any() {
        let artifact = artifact_path("/users", Method::All);
        assert_eq!(route_from_artifact(&artifact), ("/users".to_string(), Method::Any));
        assert_eq!(route_from_artifact("index"), ("/".to_string(), Method::Any));
    }

    #[test]
    fn test_suffix_must_be_lowercase_and_dashed() {
        assert_eq!(route_from_artifact("widget"), ("/widget".to_string(), Method::Any));
        assert_eq!(route_from_artifact("forget"), ("/forget".to_string(), Method::Any));
        assert_eq!(route_from_artifact("users-GET"), ("/users-GET".to_string(), Method::Any));
    }

    #[test]
    fn test_dotted_directory_is_not_an_extension() {
        assert_eq!(
            route_from_artifact("v1.2/status-get"),
            ("/v1.2/status".to_string(), Method::Get)
        );
    }
}
