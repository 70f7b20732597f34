//! store::traits
//!
//! The count store contract.
//!
//! # Design
//!
//! The store answers a single read-only question: how many records have a
//! code field matching a pattern. It is async because real stores sit behind
//! network I/O. Any failure is fatal for a pipeline run; there is no partial
//! aggregation.

use async_trait::async_trait;
use thiserror::Error;

use crate::core::codes::CodePattern;

/// Errors from count store queries.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store cannot be reached (connection refused, timeout, 5xx, missing file).
    #[error("count store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected our credentials.
    #[error("count store authentication failed: {0}")]
    AuthFailed(String),

    /// The store returned an error response.
    #[error("count store error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the store
        message: String,
    },

    /// The store refused the query.
    #[error("count store rejected the query: {0}")]
    Rejected(String),

    /// The store answered with something we could not interpret.
    #[error("malformed count store response: {0}")]
    Malformed(String),

    /// The pattern could not be evaluated.
    #[error("invalid match pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl StoreError {
    /// Whether the error means the store could not be reached at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// A read-only store of coded records.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait CountStore: Send + Sync {
    /// Store name for logs (e.g., "http", "mongodb", "file").
    fn name(&self) -> &'static str;

    /// Count records whose code field matches `pattern`.
    ///
    /// # Errors
    ///
    /// - `Unavailable` if the store cannot be reached
    /// - `AuthFailed` if credentials are rejected
    /// - `ApiError` / `Rejected` / `Malformed` for unusable responses
    async fn count_matching(&self, pattern: &CodePattern) -> Result<u64, StoreError>;
}
