use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use routeguard_core::Permission;

/// The permissions a user currently holds.
///
/// Empty covers both "not resolved yet" and "holds nothing"; this layer does
/// not distinguish the two, which keeps denial the default while a fetch is
/// pending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    pub fn contains(&self, permission: &Permission) -> bool {
        self.0.contains(permission)
    }

    pub fn insert(&mut self, permission: impl Into<Permission>) -> bool {
        self.0.insert(permission.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    /// True when at least one of `required` is held.
    pub fn intersects(&self, required: &BTreeSet<Permission>) -> bool {
        !self.0.is_disjoint(required)
    }

    /// True when every one of `required` is held.
    pub fn covers(&self, required: &BTreeSet<Permission>) -> bool {
        required.is_subset(&self.0)
    }
}

impl<P: Into<Permission>> FromIterator<P> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = &'a Permission;
    type IntoIter = std::collections::btree_set::Iter<'a, Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
