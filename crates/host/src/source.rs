//! Where the current user's permissions come from.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use routeguard_auth::PermissionSet;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(String),
    #[error("permission fetch timed out after {0:?}")]
    Timeout(Duration),
    #[error("not authenticated")]
    Unauthorized,
    #[error("parse error: {0}")]
    Parse(String),
}

/// Fetches the permission set for the current user.
///
/// Implementations own transport and identity; the host only awaits them and
/// decides what to keep when they fail.
#[async_trait]
pub trait PermissionSource: Send + Sync {
    async fn fetch(&self) -> Result<PermissionSet, SourceError>;
}

/// Always yields the same result.
#[derive(Debug, Clone)]
pub struct StaticSource {
    result: Result<PermissionSet, SourceError>,
}

impl StaticSource {
    pub fn granting(permissions: PermissionSet) -> Self {
        Self {
            result: Ok(permissions),
        }
    }

    pub fn failing(error: SourceError) -> Self {
        Self { result: Err(error) }
    }
}

#[async_trait]
impl PermissionSource for StaticSource {
    async fn fetch(&self) -> Result<PermissionSet, SourceError> {
        self.result.clone()
    }
}

/// Wraps another source and waits before delegating to it.
///
/// Stands in for a slow permission endpoint in demos and tests.
#[derive(Debug, Clone)]
pub struct DelayedSource<S> {
    inner: S,
    delay: Duration,
}

impl<S> DelayedSource<S> {
    pub fn new(inner: S, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl<S: PermissionSource> PermissionSource for DelayedSource<S> {
    async fn fetch(&self) -> Result<PermissionSet, SourceError> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch().await
    }
}
