//! geo::traits
//!
//! Lookup service contracts: country name to standard code, and standard
//! code to coordinates.
//!
//! # Design
//!
//! Both lookups fail per item. Callers in [`super::resolver`] absorb every
//! [`LookupError`] into a per-row marker, so implementations should report
//! failures faithfully rather than retry or guess.

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::Coordinates;

/// Errors from a single lookup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    /// Nothing matched the query.
    #[error("no match for '{0}'")]
    NotFound(String),

    /// The service throttled us.
    #[error("rate limited")]
    RateLimited,

    /// The lookup did not finish within the configured timeout.
    #[error("lookup timed out")]
    Timeout,

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// Service returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the service
        message: String,
    },

    /// The response could not be interpreted.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Maps country display names to ISO 3166-1 alpha-2 codes.
#[async_trait]
pub trait CountryLookup: Send + Sync {
    /// Lookup name for logs.
    fn name(&self) -> &'static str;

    /// Resolve a display name to its alpha-2 code.
    ///
    /// # Errors
    ///
    /// `NotFound` if the name is not recognized.
    async fn alpha2(&self, country: &str) -> Result<String, LookupError>;
}

/// Resolves a free-text query (a standard code) to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Geocoder name for logs.
    fn name(&self) -> &'static str;

    /// Look up the coordinates for `query`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the service has no match
    /// - `RateLimited`, `NetworkError`, `ApiError`, `Malformed` on service failure
    async fn geocode(&self, query: &str) -> Result<Coordinates, LookupError>;
}
