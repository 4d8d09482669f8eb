//! `routeguard-auth` — authorization-aware route tree transform.
//!
//! This crate is intentionally decoupled from fetching and rendering: callers
//! hand in the permissions they currently hold and the two element factories,
//! and get back a new tree of the same shape.

pub mod authorize;
pub mod grants;
pub mod guard;
pub mod policy;

pub use authorize::{DenialKind, RouteExplanation, decide, explain};
pub use grants::PermissionSet;
pub use guard::{
    AuthContext, GuardReport, ReportEntry, guard_routes, transform, transform_with_report,
};
pub use policy::{Decision, MatchPolicy};
pub use routeguard_core::{Permission, RouteNode, RouteTree};
