//! Permission state as observed by the render loop.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use routeguard_auth::PermissionSet;

use crate::SourceError;

/// Stale-while-revalidate view of the user's permissions.
///
/// `permissions` keeps the last successful fetch while a new one is in flight,
/// so a render during revalidation still has the previous grants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PermissionState {
    pub permissions: Option<PermissionSet>,
    pub is_validating: bool,
    pub last_error: Option<SourceError>,
    pub validated_at: Option<DateTime<Utc>>,
    /// Bumped every time a fetch starts; only the newest fetch may land.
    pub generation: u64,
}

impl PermissionState {
    /// Best-available permission set for this render (empty until resolved).
    pub fn auth(&self) -> PermissionSet {
        self.permissions.clone().unwrap_or_default()
    }

    pub fn is_resolved(&self) -> bool {
        self.permissions.is_some()
    }
}

/// Events that may cause the host to refetch permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevalidateTrigger {
    Mount,
    Focus,
    Reconnect,
    Interval,
    Manual,
}

/// Which triggers actually refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevalidatePolicy {
    pub on_mount: bool,
    pub on_focus: bool,
    pub on_reconnect: bool,
    /// Periodic refresh; `None` disables it.
    pub interval: Option<Duration>,
}

impl Default for RevalidatePolicy {
    fn default() -> Self {
        Self {
            on_mount: true,
            on_focus: false,
            on_reconnect: true,
            interval: None,
        }
    }
}

impl RevalidatePolicy {
    pub fn allows(&self, trigger: RevalidateTrigger) -> bool {
        match trigger {
            RevalidateTrigger::Mount => self.on_mount,
            RevalidateTrigger::Focus => self.on_focus,
            RevalidateTrigger::Reconnect => self.on_reconnect,
            RevalidateTrigger::Interval => self.interval.is_some(),
            RevalidateTrigger::Manual => true,
        }
    }
}
