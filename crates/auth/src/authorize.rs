use serde::Serialize;

use routeguard_core::{Permission, RouteNode};

use crate::{Decision, MatchPolicy, PermissionSet};

/// Authorize a single route node against the held permissions.
///
/// - No IO
/// - No panics
/// - Ancestors are not consulted
pub fn decide<E>(node: &RouteNode<E>, held: &PermissionSet, policy: MatchPolicy) -> Decision {
    Decision::from_allowed(policy.matches(&node.required_permissions, held))
}

// ─────────────────────────────────────────────────────────────────────────────
// Decision Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of why a route was allowed or denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteExplanation {
    /// The node's own path segment, if any.
    pub path: Option<String>,

    pub policy: MatchPolicy,

    pub decision: Decision,

    /// Human-readable reason for the decision.
    pub reason: String,

    /// The node's requirement set (sorted).
    pub required: Vec<String>,

    /// Required permissions the user holds.
    pub matched: Vec<String>,

    /// Required permissions the user lacks.
    pub missing: Vec<String>,

    pub denial: Option<DenialKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// Nothing is held at all (unresolved, or no grants).
    NoPermissions,
    /// None of the alternatives is held (any-of).
    NoMatchingPermission,
    /// Some, but not all, requirements are held (all-of).
    IncompletePermissions,
}

/// Explain the decision [`decide`] would make for `node`.
pub fn explain<E>(
    node: &RouteNode<E>,
    held: &PermissionSet,
    policy: MatchPolicy,
) -> RouteExplanation {
    let decision = decide(node, held, policy);

    let names = |perms: Vec<&Permission>| -> Vec<String> {
        perms.into_iter().map(|p| p.as_str().to_string()).collect()
    };

    let (matched, missing): (Vec<&Permission>, Vec<&Permission>) = node
        .required_permissions
        .iter()
        .partition(|p| held.contains(p));
    let (matched, missing) = (names(matched), names(missing));
    let required = names(node.required_permissions.iter().collect());

    let (reason, denial) = match decision {
        Decision::Allowed if required.is_empty() => {
            ("route has no permission requirements".to_string(), None)
        }
        Decision::Allowed => match policy {
            MatchPolicy::AnyOf => (format!("holds required permission(s) {matched:?}"), None),
            MatchPolicy::AllOf => (format!("holds all required permissions {required:?}"), None),
        },
        Decision::Denied if held.is_empty() => (
            format!("no permissions held; route requires {required:?}"),
            Some(DenialKind::NoPermissions),
        ),
        Decision::Denied => match policy {
            MatchPolicy::AnyOf => (
                format!("holds none of {required:?}"),
                Some(DenialKind::NoMatchingPermission),
            ),
            MatchPolicy::AllOf => (
                format!("missing required permission(s) {missing:?}"),
                Some(DenialKind::IncompletePermissions),
            ),
        },
    };

    RouteExplanation {
        path: node.path.clone(),
        policy,
        decision,
        reason,
        required,
        matched,
        missing,
        denial,
    }
}
