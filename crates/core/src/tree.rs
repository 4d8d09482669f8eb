//! Whole-tree helpers: loading, shape measurement, and path joining.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{RouteError, RouteNode, RouteResult};

/// An ordered list of root-level routes.
///
/// Derefs to `[RouteNode<E>]`, so it can be passed anywhere a slice of
/// roots is expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteTree<E>(Vec<RouteNode<E>>);

impl<E> RouteTree<E> {
    pub fn new(roots: Vec<RouteNode<E>>) -> Self {
        Self(roots)
    }

    /// Total number of nodes at every depth.
    pub fn node_count(&self) -> usize {
        count_nodes(&self.0)
    }
}

impl<E> RouteTree<E>
where
    E: for<'de> Deserialize<'de>,
{
    /// Parse a route tree from JSON text.
    pub fn from_json_str(input: &str) -> RouteResult<Self> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_json_value(value)
    }

    /// Build a route tree from an already-parsed JSON value.
    ///
    /// The top level must be an array of objects.
    pub fn from_json_value(value: Value) -> RouteResult<Self> {
        let Value::Array(items) = value else {
            return Err(RouteError::shape("route tree must be a JSON array"));
        };

        let mut roots = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            if !item.is_object() {
                return Err(RouteError::shape(format!(
                    "route at index {index} is not an object"
                )));
            }
            roots.push(serde_json::from_value(item)?);
        }

        tracing::debug!(roots = roots.len(), "route tree loaded");
        Ok(Self(roots))
    }
}

impl<E: Serialize> RouteTree<E> {
    pub fn to_json_string(&self) -> RouteResult<String> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }
}

impl<E> core::ops::Deref for RouteTree<E> {
    type Target = [RouteNode<E>];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<E> From<Vec<RouteNode<E>>> for RouteTree<E> {
    fn from(value: Vec<RouteNode<E>>) -> Self {
        Self(value)
    }
}

impl<E> FromIterator<RouteNode<E>> for RouteTree<E> {
    fn from_iter<I: IntoIterator<Item = RouteNode<E>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Number of nodes in a forest, counting every depth.
pub fn count_nodes<E>(nodes: &[RouteNode<E>]) -> usize {
    let mut count = 0;
    for node in nodes {
        node.walk(&mut |_, _| count += 1);
    }
    count
}

/// Nesting depth of a forest: 0 when empty, 1 when only roots exist.
pub fn max_depth<E>(nodes: &[RouteNode<E>]) -> usize {
    let mut deepest = 0;
    for node in nodes {
        node.walk(&mut |_, depth| deepest = deepest.max(depth + 1));
    }
    deepest
}

/// Resolve a child segment against its parent's full path.
///
/// Absolute segments (leading `/`) replace the parent; a missing segment
/// (layout/index route) inherits the parent's path.
pub fn join_path(parent: &str, segment: Option<&str>) -> String {
    match segment {
        None | Some("") => parent.to_string(),
        Some(seg) if seg.starts_with('/') => seg.to_string(),
        Some(seg) => {
            if parent.is_empty() || parent == "/" {
                format!("/{seg}")
            } else {
                format!("{}/{seg}", parent.trim_end_matches('/'))
            }
        }
    }
}
