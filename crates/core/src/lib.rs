//! `routeguard-core` — the route tree model.
//!
//! This crate contains **pure data** for a static navigation structure: route
//! nodes, their permission requirements, and the opaque router metadata they
//! carry. It owns no authorization behavior.

pub mod error;
pub mod permission;
pub mod route;
pub mod tree;

pub use error::{RouteError, RouteResult};
pub use permission::Permission;
pub use route::{RouteMeta, RouteNode};
pub use tree::{count_nodes, join_path, max_depth, RouteTree};
