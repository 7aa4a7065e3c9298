//! External link-issuing API contract

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Failure signals returned by the external system
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Too many requests; retry after `wait`
    #[error("Throttled, retry after {wait:?}")]
    Throttled { wait: Duration },

    /// Caller lacks rights to act on the resource
    #[error("Permission denied")]
    PermissionDenied,

    /// Resource was deleted or the reference is invalid
    #[error("Invalid resource")]
    InvalidResource,

    /// Resource became private or otherwise inaccessible
    #[error("Private resource")]
    PrivateResource,

    #[error("{0}")]
    Other(String),
}

/// Result type for external API calls
pub type ApiResult<T> = Result<T, ApiError>;

/// The external system that owns the resources
#[async_trait]
pub trait ExternalApi: Send + Sync {
    /// Issues a new access link for a resource
    async fn issue_link(&self, resource_id: &str) -> ApiResult<String>;

    /// Fetches the current display title of a resource
    async fn fetch_title(&self, resource_id: &str) -> ApiResult<String>;
}
