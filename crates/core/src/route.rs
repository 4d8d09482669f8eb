//! Route nodes: one navigable unit of the static route tree.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Permission;

/// Router-specific metadata carried by a node (loaders, error elements,
/// index flags, ...).
///
/// The authorization layer never inspects these fields; they are copied
/// through unchanged so the downstream router sees exactly what was declared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteMeta(Map<String, Value>);

impl RouteMeta {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Map<String, Value>> for RouteMeta {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// One entry in the navigation tree.
///
/// `E` is the element type: whatever the hosting application renders for
/// this route. The model treats it as opaque.
///
/// Serialized form uses camelCase keys (`requiredPermissions`) and flattens
/// [`RouteMeta`] into the node, so unknown keys survive a load/store cycle.
/// Deserializing only needs `E: Deserialize`; the element type need not be
/// `Default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "E: Deserialize<'de>"))]
pub struct RouteNode<E> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<E>,

    /// Empty means unrestricted.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub required_permissions: BTreeSet<Permission>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteNode<E>>,

    #[serde(flatten)]
    pub meta: RouteMeta,
}

impl<E> RouteNode<E> {
    /// A node matching `path`, with no element, requirements, or children yet.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::layout()
        }
    }

    /// A pathless node (layout or index route).
    pub fn layout() -> Self {
        Self {
            path: None,
            element: None,
            required_permissions: BTreeSet::new(),
            children: Vec::new(),
            meta: RouteMeta::new(),
        }
    }

    pub fn with_element(mut self, element: E) -> Self {
        self.element = Some(element);
        self
    }

    /// Add one permission to the node's requirement set.
    pub fn require(mut self, permission: impl Into<Permission>) -> Self {
        self.required_permissions.insert(permission.into());
        self
    }

    pub fn with_child(mut self, child: RouteNode<E>) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = RouteNode<E>>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key, value);
        self
    }

    /// Whether access to this node needs any permission at all.
    pub fn is_restricted(&self) -> bool {
        !self.required_permissions.is_empty()
    }

    /// Visit this node and all descendants in pre-order.
    ///
    /// `visit` receives each node with its depth (this node is depth 0).
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a RouteNode<E>, usize)) {
        let mut stack: Vec<(&'a RouteNode<E>, usize)> = vec![(self, 0)];
        while let Some((node, depth)) = stack.pop() {
            visit(node, depth);
            // Reverse so the first child is popped first.
            for child in node.children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
    }
}
