//! Route module for file-based routing
//!
//! Pure components for route templates: segment classification and
//! placeholder syntax translation.

pub mod pattern;

pub use pattern::{classify_segment, convert_route, param_names, ParamSyntax, Segment};
