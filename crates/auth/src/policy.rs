//! Matching policy and per-node decisions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use routeguard_core::Permission;

use crate::PermissionSet;

/// How a node's requirement set is matched against held permissions.
///
/// An empty requirement set is unrestricted under every policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Holding any one of the listed permissions is enough.
    #[default]
    AnyOf,
    /// Every listed permission must be held.
    AllOf,
}

impl MatchPolicy {
    pub fn matches(self, required: &BTreeSet<Permission>, held: &PermissionSet) -> bool {
        if required.is_empty() {
            return true;
        }
        match self {
            MatchPolicy::AnyOf => held.intersects(required),
            MatchPolicy::AllOf => held.covers(required),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchPolicy::AnyOf => "any_of",
            MatchPolicy::AllOf => "all_of",
        }
    }
}

impl core::fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of authorizing one route node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allowed,
    Denied,
}

impl Decision {
    pub fn from_allowed(allowed: bool) -> Self {
        if allowed {
            Decision::Allowed
        } else {
            Decision::Denied
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}
