//! Dev-time request router
//!
//! Holds the expanded method routes in registration order and matches
//! `(method, path)` pairs against them.
//!
//! ## Precedence
//!
//! 1. Exact key `"{METHOD}:{path}"`, then `"ALL:{path}"` and `"ANY:{path}"`:
//!    static routes resolve without scanning and always beat templates.
//! 2. Otherwise the table is walked in registration order and the first
//!    template that matches wins. There is no specificity ranking between
//!    overlapping dynamic routes; register more specific routes first if
//!    both could match.
//!
//! The table is only ever replaced wholesale ([`DevRouter::replace_all`]),
//! never patched, so a lookup sees either the old table or the new one.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use tracing::debug;

use crate::expand::{route_key, MethodRoute};
use crate::method::Method;
use crate::path::normalize_path;
use crate::route::pattern::{bracket_param, is_dynamic};

/// Handlers registered under one route key
#[derive(Debug, Clone)]
pub struct RouteEntry<H> {
    pub route: String,
    pub handlers: HashMap<Method, H>,
}

/// Successful lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, H> {
    /// Registered route template
    pub route: &'a str,
    /// Method the handler was registered under (`ALL` for wildcard handlers)
    pub method: Method,
    pub handler: &'a H,
    pub params: HashMap<String, String>,
}

/// No route serves this request; carries what was asked for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFound {
    pub method: String,
    pub path: String,
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no route for {} {}", self.method, self.path)
    }
}

/// In-memory dispatch table keyed by `"{METHOD}:{route}"`
#[derive(Debug, Clone)]
pub struct DevRouter<H> {
    table: IndexMap<String, RouteEntry<H>>,
}

impl<H> Default for DevRouter<H> {
    fn default() -> Self {
        Self {
            table: IndexMap::new(),
        }
    }
}

impl<H> DevRouter<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a router from `(method, route, handler)` registrations, in order
    pub fn from_registrations<I>(registrations: I) -> Self
    where
        I: IntoIterator<Item = (Method, String, H)>,
    {
        let mut router = Self::new();
        for (method, route, handler) in registrations {
            router.register(method, &route, handler);
        }
        router
    }

    /// Builds a router from expanded method routes with a handler per route
    pub fn from_method_routes<'a, I, F>(routes: I, mut make_handler: F) -> Self
    where
        I: IntoIterator<Item = &'a MethodRoute>,
        F: FnMut(&MethodRoute) -> H,
    {
        Self::from_registrations(
            routes
                .into_iter()
                .map(|r| (r.method, r.route.clone(), make_handler(r))),
        )
    }

    /// Registers a handler; a later registration for the same key and method replaces it
    pub fn register(&mut self, method: Method, route: &str, handler: H) {
        let route = normalize_path(route).into_owned();
        debug!("Registering {} {}", method, route);
        self.table
            .entry(route_key(method, &route))
            .or_insert_with(|| RouteEntry {
                route: route.clone(),
                handlers: HashMap::new(),
            })
            .handlers
            .insert(method, handler);
    }

    /// Replaces the whole table with freshly built registrations
    ///
    /// The new table is complete before it becomes visible.
    pub fn replace_all<I>(&mut self, registrations: I)
    where
        I: IntoIterator<Item = (Method, String, H)>,
    {
        *self = Self::from_registrations(registrations);
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Route keys in registration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = &RouteEntry<H>> {
        self.table.values()
    }

    /// Resolves a request to a handler
    ///
    /// # Examples
    ///
    /// ```
    /// use skyport_router::{DevRouter, Method};
    ///
    /// let mut router = DevRouter::new();
    /// router.register(Method::Get, "/users/[id]", "show user");
    ///
    /// let found = router.match_route(Method::Get, "/users/42").unwrap();
    /// assert_eq!(*found.handler, "show user");
    /// assert_eq!(found.params.get("id").map(String::as_str), Some("42"));
    ///
    /// assert!(router.match_route(Method::Get, "/users/42/extra").is_err());
    /// ```
    pub fn match_route(&self, method: Method, path: &str) -> Result<RouteMatch<'_, H>, NotFound> {
        let path = normalize_path(path);

        if let Some(found) = self.match_exact(method, &path) {
            return Ok(found);
        }

        self.table
            .values()
            .find_map(|entry| {
                let (registered, handler) = entry
                    .handlers
                    .iter()
                    .find(|(registered, _)| registered.serves(method))?;
                let params = match_template(&entry.route, &path)?;
                Some(RouteMatch {
                    route: entry.route.as_str(),
                    method: *registered,
                    handler,
                    params,
                })
            })
            .ok_or_else(|| NotFound {
                method: method.to_string(),
                path: path.into_owned(),
            })
    }

    /// Static lookup: the request's own method first, then the wildcards
    fn match_exact(&self, method: Method, path: &str) -> Option<RouteMatch<'_, H>> {
        [method, Method::All, Method::Any]
            .into_iter()
            .find_map(|candidate| {
                let entry = self.table.get(&route_key(candidate, path))?;
                if is_dynamic(&entry.route) {
                    return None;
                }
                let handler = entry.handlers.get(&candidate)?;
                Some(RouteMatch {
                    route: entry.route.as_str(),
                    method: candidate,
                    handler,
                    params: HashMap::new(),
                })
            })
    }
}

/// Matches a path against a route template, capturing `[name]` segments
///
/// Empty segments are ignored on both sides. Captures accept any non-empty
/// segment; literal segments must be equal.
///
/// # Examples
///
/// ```
/// use skyport_router::dev::match_template;
///
/// let params = match_template("/orgs/[org]/repos/[repo]", "/orgs/acme/repos/api").unwrap();
/// assert_eq!(params["org"], "acme");
/// assert_eq!(params["repo"], "api");
///
/// assert!(match_template("/users/[id]", "/users").is_none());
/// assert!(match_template("/users/active", "/users/idle").is_none());
/// ```
pub fn match_template(template: &str, path: &str) -> Option<HashMap<String, String>> {
    let template_segments: Vec<&str> = template.split('/').filter(|s| !s.is_empty()).collect();
    let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if template_segments.len() != path_segments.len() {
        return None;
    }

    template_segments
        .iter()
        .zip(path_segments.iter())
        .try_fold(HashMap::new(), |mut params, (pattern, actual)| {
            match bracket_param(pattern) {
                Some(name) => {
                    params.insert(name.to_string(), actual.to_string());
                    Some(params)
                }
                None if pattern == actual => Some(params),
                None => None,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_lookup_skips_patterns() {
        let router = DevRouter::from_registrations(vec![
            (Method::Get, "/users/[id]".to_string(), "dynamic"),
            (Method::Get, "/users/active".to_string(), "static"),
        ]);

        let found = router.match_route(Method::Get, "/users/active").unwrap();
        assert_eq!(*found.handler, "static");
        assert!(found.params.is_empty());
    }

    #[test]
    fn test_all_handler_serves_any_method() {
        let router = DevRouter::from_registrations(vec![(Method::All, "/health".to_string(), "h")]);

        for method in Method::HTTP {
            let found = router.match_route(method, "/health").unwrap();
            assert_eq!(found.method, Method::All);
        }
    }

    #[test]
    fn test_specific_method_beats_all_on_exact_key() {
        let router = DevRouter::from_registrations(vec![
            (Method::All, "/users".to_string(), "fallback"),
            (Method::Get, "/users".to_string(), "list"),
        ]);

        assert_eq!(*router.match_route(Method::Get, "/users").unwrap().handler, "list");
        assert_eq!(*router.match_route(Method::Post, "/users").unwrap().handler, "fallback");
    }

    #[test]
    fn test_static_wildcard_beats_earlier_template() {
        let router = DevRouter::from_registrations(vec![
            (Method::Get, "/users/[id]".to_string(), "dynamic"),
            (Method::All, "/users/me".to_string(), "me"),
        ]);

        let found = router.match_route(Method::Get, "/users/me").unwrap();
        assert_eq!(*found.handler, "me");
        assert_eq!(found.method, Method::All);
        assert!(found.params.is_empty());
    }

    #[test]
    fn test_literal_brackets_in_request_still_capture() {
        let router =
            DevRouter::from_registrations(vec![(Method::Get, "/users/[id]".to_string(), ())]);

        let found = router.match_route(Method::Get, "/users/[id]").unwrap();
        assert_eq!(found.params.get("id").map(String::as_str), Some("[id]"));
    }

    #[test]
    fn test_method_mismatch_is_not_found() {
        let router =
            DevRouter::from_registrations(vec![(Method::Get, "/users/[id]".to_string(), ())]);

        let miss = router.match_route(Method::Delete, "/users/1").unwrap_err();
        assert_eq!(
            miss,
            NotFound {
                method: "DELETE".to_string(),
                path: "/users/1".to_string()
            }
        );
        assert_eq!(miss.to_string(), "no route for DELETE /users/1");
    }

    #[test]
    fn test_trailing_slash_is_normalized() {
        let router = DevRouter::from_registrations(vec![(Method::Get, "/users".to_string(), ())]);
        assert!(router.match_route(Method::Get, "/users/").is_ok());
    }

    #[test]
    fn test_root_route() {
        let router = DevRouter::from_registrations(vec![(Method::Get, "/".to_string(), "root")]);
        assert_eq!(*router.match_route(Method::Get, "/").unwrap().handler, "root");
        assert_eq!(*router.match_route(Method::Get, "").unwrap().handler, "root");
    }

    #[test]
    fn test_replace_all_drops_stale_entries() {
        let mut router = DevRouter::from_registrations(vec![(Method::Get, "/old".to_string(), 1)]);
        router.replace_all(vec![(Method::Get, "/new".to_string(), 2)]);

        assert!(router.match_route(Method::Get, "/old").is_err());
        assert_eq!(*router.match_route(Method::Get, "/new").unwrap().handler, 2);
        assert_eq!(router.keys().collect::<Vec<_>>(), vec!["GET:/new"]);
    }
}
