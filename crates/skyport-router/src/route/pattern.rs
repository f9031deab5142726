//! Route template segments and placeholder syntax translation
//!
//! The on-disk convention spells a dynamic segment as `[name]`. Emission targets
//! want other spellings: colon routers use `:name`, API Gateway uses `{name}`.
//! Every function here is pure and keeps the captured parameter name intact.

use serde::{Deserialize, Serialize};

/// Placeholder spelling for dynamic route segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamSyntax {
    /// `[id]`, the file-tree convention
    Bracket,
    /// `:id`
    Colon,
    /// `{id}`
    Brace,
}

impl ParamSyntax {
    /// Spells a parameter name in this syntax
    pub fn render(&self, name: &str) -> String {
        match self {
            ParamSyntax::Bracket => format!("[{}]", name),
            ParamSyntax::Colon => format!(":{}", name),
            ParamSyntax::Brace => format!("{{{}}}", name),
        }
    }
}

/// A single classified route segment, borrowing from the template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal text that must match exactly
    Static(&'a str),
    /// Dynamic capture with its parameter name
    Param(&'a str),
}

/// Classifies a segment written in any of the three placeholder syntaxes
///
/// # Examples
///
/// ```
/// use skyport_router::route::pattern::{classify_segment, Segment};
///
/// assert_eq!(classify_segment("users"), Segment::Static("users"));
/// assert_eq!(classify_segment("[id]"), Segment::Param("id"));
/// assert_eq!(classify_segment(":id"), Segment::Param("id"));
/// assert_eq!(classify_segment("{id}"), Segment::Param("id"));
/// ```
pub fn classify_segment(segment: &str) -> Segment<'_> {
    let param = segment
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .or_else(|| segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
        .or_else(|| segment.strip_prefix(':'));

    match param {
        Some(name) if !name.is_empty() => Segment::Param(name),
        _ => Segment::Static(segment),
    }
}

/// Only the bracket form counts as a capture when matching requests
///
/// The dev router matches against discovered templates, which always use the
/// on-disk convention. A literal `:x` or `{x}` path segment stays literal there.
pub fn bracket_param(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .filter(|name| !name.is_empty())
}

/// Splits a route into non-empty classified segments
pub fn segments(route: &str) -> impl Iterator<Item = Segment<'_>> {
    route
        .split('/')
        .filter(|s| !s.is_empty())
        .map(classify_segment)
}

/// Rewrites every dynamic segment of `route` into `syntax`
///
/// # Examples
///
/// ```
/// use skyport_router::route::pattern::{convert_route, ParamSyntax};
///
/// assert_eq!(convert_route("/users/[id]", ParamSyntax::Colon), "/users/:id");
/// assert_eq!(convert_route("/users/:id", ParamSyntax::Brace), "/users/{id}");
/// assert_eq!(convert_route("/users/{id}", ParamSyntax::Bracket), "/users/[id]");
/// assert_eq!(convert_route("/", ParamSyntax::Brace), "/");
/// ```
pub fn convert_route(route: &str, syntax: ParamSyntax) -> String {
    let converted: Vec<String> = segments(route)
        .map(|segment| match segment {
            Segment::Static(text) => text.to_string(),
            Segment::Param(name) => syntax.render(name),
        })
        .collect();

    format!("/{}", converted.join("/"))
}

/// Parameter names of a route, in path order
pub fn param_names(route: &str) -> Vec<String> {
    segments(route)
        .filter_map(|segment| match segment {
            Segment::Param(name) => Some(name.to_string()),
            Segment::Static(_) => None,
        })
        .collect()
}

/// True when the route has at least one dynamic segment
pub fn is_dynamic(route: &str) -> bool {
    segments(route).any(|segment| matches!(segment, Segment::Param(_)))
}
