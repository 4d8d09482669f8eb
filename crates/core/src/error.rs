//! Route model error types.

use thiserror::Error;

/// Result type used when loading route trees.
pub type RouteResult<T> = Result<T, RouteError>;

/// Failure while loading a route tree from its serialized form.
///
/// The in-memory model itself has no failure modes; these only surface at the
/// JSON boundary.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The input was not valid JSON, or a node did not match the route shape.
    #[error("malformed route json: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON was well-formed but not a route tree (e.g. top level is not an array).
    #[error("invalid route tree shape: {0}")]
    Shape(String),
}

impl RouteError {
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }
}
