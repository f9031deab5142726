//! # Skyport Router
//!
//! Convention-based discovery for serverless functions:
//! - Route files (`functions/api/**/*.ts`) become an HTTP routing table
//! - Subscriber files (`functions/subscribers/**/*.ts`) become an event table
//! - A dev-time router replays the routing table against live requests
//!
//! ## File Conventions
//!
//! - `index.ts` collapses onto its directory: `api/users/index.ts` → `/users`
//! - `[name]` segments capture: `api/users/[id].ts` → `/users/[id]`
//! - Export names choose methods: `export function GET` serves `GET`
//! - No method exports: `export default` (or `export const handler`) serves every method
//! - `create`/`update`/`delete`/`edit`/`new` next to an `index` file share its route
//!
//! ## Pipeline
//!
//! ```text
//! glob ─▶ scan_routes ─▶ RouteInfo[] ─▶ expand_routes_to_methods ─▶ MethodRoute[]
//!                                                         │
//!                                     ┌───────────────────┴──────────┐
//!                                     ▼                              ▼
//!                               build wrappers                   DevRouter
//! ```
//!
//! Modules are analyzed statically with tree-sitter; nothing is executed.
//!
//! ## Example
//!
//! ```
//! use skyport_router::{DevRouter, Method};
//!
//! let router = DevRouter::from_registrations(vec![
//!     (Method::Get, "/users/active".to_string(), "active users"),
//!     (Method::Get, "/users/[id]".to_string(), "one user"),
//! ]);
//!
//! assert_eq!(*router.match_route(Method::Get, "/users/active").unwrap().handler, "active users");
//! assert_eq!(*router.match_route(Method::Get, "/users/7").unwrap().handler, "one user");
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod dev;
pub mod diagnostics;
pub mod error;
pub mod expand;
pub mod exports;
pub mod method;
pub mod path;
pub mod route;
pub mod scan;
pub mod subscriber;

// ============================================================================
// Re-exports
// ============================================================================

pub use dev::{DevRouter, NotFound, RouteMatch};
pub use diagnostics::{Diagnostic, ScanReport};
pub use error::{ParseError, ScanError};
pub use expand::{
    expand_routes_to_methods, expand_routes_with, resolve_conflicts, route_key, Conflict,
    MethodRoute, Resolution,
};
pub use exports::{ExportDeclaration, ExportReader, HandlerShape, ModuleExports, SourceAnalyzer};
pub use method::Method;
pub use path::{artifact_path, normalize_path, route_from_artifact};
pub use route::pattern::{convert_route, ParamSyntax};
pub use scan::{scan_routes, scan_routes_with, RouteInfo};
pub use subscriber::{
    duplicate_subscriber_names, scan_subscribers, scan_subscribers_with, SubscriberInfo,
};
