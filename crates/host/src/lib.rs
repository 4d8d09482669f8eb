//! `routeguard-host`
//!
//! **Responsibility:** the application shell around the route guard.
//!
//! This crate provides:
//! - Permission fetching through a pluggable async source
//! - Stale-while-revalidate permission state with host-controlled triggers
//! - A render driver that re-guards the static route tree per render
//! - Environment configuration and JSON route loading
//!
//! The route transform itself lives in `routeguard-auth`; nothing here changes
//! how a route is decided.

pub mod config;
pub mod host;
pub mod source;
pub mod state;
pub mod store;

pub use config::{ConfigError, HostConfig};
pub use host::{Render, RouteHost};
pub use source::{DelayedSource, PermissionSource, SourceError, StaticSource};
pub use state::{PermissionState, RevalidatePolicy, RevalidateTrigger};
pub use store::{PermissionStore, Revalidation};
