//! Dev router behavior over realistic route tables

use pretty_assertions::assert_eq;
use skyport_router::*;
use std::path::PathBuf;

fn unit(file: &str, route: &str, method: Method, export_name: &str) -> MethodRoute {
    MethodRoute {
        file: PathBuf::from(file),
        route: route.to_string(),
        method,
        export_name: export_name.to_string(),
    }
}

fn api() -> DevRouter<PathBuf> {
    let routes = vec![
        unit("api/index.ts", "/", Method::Get, "GET"),
        unit("api/users/[id].ts", "/users/[id]", Method::Get, "GET"),
        unit("api/users/[id].ts", "/users/[id]", Method::Delete, "DELETE"),
        unit("api/users/active.ts", "/users/active", Method::Get, "GET"),
        unit("api/orgs/[org]/repos/[repo].ts", "/orgs/[org]/repos/[repo]", Method::Get, "GET"),
        unit("api/webhook.ts", "/webhook", Method::All, "default"),
    ];
    DevRouter::from_method_routes(&routes, |r| r.file.clone())
}

#[test]
fn test_static_route_wins_over_earlier_pattern() {
    let router = api();
    let found = router.match_route(Method::Get, "/users/active").unwrap();

    assert_eq!(found.route, "/users/active");
    assert_eq!(found.handler, &PathBuf::from("api/users/active.ts"));
    assert!(found.params.is_empty());
}

#[test]
fn test_pattern_captures_every_parameter() {
    let router = api();
    let found = router.match_route(Method::Get, "/orgs/acme/repos/api").unwrap();

    assert_eq!(found.route, "/orgs/[org]/repos/[repo]");
    assert_eq!(found.params.get("org").map(String::as_str), Some("acme"));
    assert_eq!(found.params.get("repo").map(String::as_str), Some("api"));
}

#[test]
fn test_method_selects_among_same_template() {
    let router = api();

    let delete = router.match_route(Method::Delete, "/users/7").unwrap();
    assert_eq!(delete.method, Method::Delete);
    assert!(router.match_route(Method::Put, "/users/7").is_err());
}

#[test]
fn test_wildcard_route_serves_every_method() {
    let router = api();
    for method in [Method::Get, Method::Post, Method::Options] {
        let found = router.match_route(method, "/webhook").unwrap();
        assert_eq!(found.method, Method::All);
    }
}

#[test]
fn test_miss_reports_request() {
    let router = api();
    let miss = router.match_route(Method::Get, "/nope/").unwrap_err();
    assert_eq!(miss.path, "/nope");
    assert_eq!(miss.method, "GET");
}

#[test]
fn test_keys_follow_registration_order() {
    let router = api();
    let keys: Vec<&str> = router.keys().collect();
    assert_eq!(
        keys,
        vec![
            "GET:/",
            "GET:/users/[id]",
            "DELETE:/users/[id]",
            "GET:/users/active",
            "GET:/orgs/[org]/repos/[repo]",
            "ALL:/webhook",
        ]
    );
}

#[test]
fn test_artifact_names_line_up_with_route_keys() {
    for route in [unit("api/users/[id].ts", "/users/[id]", Method::Get, "GET")] {
        let artifact = artifact_path(&route.route, route.method);
        assert_eq!(artifact, "users/[id]-get");
        assert_eq!(route_from_artifact(&artifact), (route.route.clone(), route.method));
    }
}

#[test]
fn test_default_export_route_beats_sibling_template() {
    let dir = tempfile::tempdir().unwrap();
    let users = dir.path().join("functions/api/users");
    std::fs::create_dir_all(&users).unwrap();
    std::fs::write(users.join("[id].ts"), "export function GET() {}").unwrap();
    std::fs::write(users.join("me.ts"), "export default function () {}").unwrap();

    let pattern = format!("{}/functions/api/**/*.ts", dir.path().display());
    let report = scan_routes(&pattern).unwrap();
    let expanded = expand_routes_to_methods(&report.items);
    let router = DevRouter::from_method_routes(&expanded.items, |r| r.export_name.clone());

    let keys: Vec<&str> = router.keys().collect();
    assert_eq!(keys, vec!["GET:/users/[id]", "ALL:/users/me"]);

    let me = router.match_route(Method::Get, "/users/me").unwrap();
    assert_eq!(me.route, "/users/me");
    assert_eq!(me.handler, "default");
    assert!(me.params.is_empty());

    let other = router.match_route(Method::Get, "/users/42").unwrap();
    assert_eq!(other.route, "/users/[id]");
}
