//! geo::resolver
//!
//! Failure-tolerant resolution of country names and standard codes.
//!
//! # Tolerance
//!
//! Both resolvers return exactly one output per input, in input order, and
//! never fail. A lookup error or timeout for one row is logged and recorded
//! as [`StandardCode::Unknown`] / [`GeoPoint::Missing`] for that row only.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use countmap::core::types::{GeoPoint, StandardCode};
//! use countmap::geo::countries::CountryTable;
//! use countmap::geo::mock::MockGeocoder;
//! use countmap::geo::resolver::{CountryCodeResolver, GeoResolver};
//!
//! # tokio_test::block_on(async {
//! let names = vec!["France".to_string(), "Atlantis".to_string()];
//! let codes = CountryCodeResolver::new(Arc::new(CountryTable::new()))
//!     .resolve(&names)
//!     .await;
//! assert_eq!(codes, vec![StandardCode::Alpha2("FR".into()), StandardCode::Unknown]);
//!
//! let geocoder = MockGeocoder::new().with_point("FR", 46.6, 1.9);
//! let points = GeoResolver::new(Arc::new(geocoder)).locate(&codes).await;
//! assert!(!points[0].is_missing());
//! assert!(points[1].is_missing());
//! # });
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::traits::{CountryLookup, Geocoder, LookupError};
use crate::core::types::{GeoPoint, StandardCode};

/// Default per-lookup timeout.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Run a lookup under a timeout; expiry counts as a lookup failure.
async fn bounded<T, F>(timeout: Duration, lookup: F) -> Result<T, LookupError>
where
    F: Future<Output = Result<T, LookupError>>,
{
    tokio::time::timeout(timeout, lookup)
        .await
        .unwrap_or(Err(LookupError::Timeout))
}

/// Maps country display names to standard codes.
pub struct CountryCodeResolver {
    lookup: Arc<dyn CountryLookup>,
    timeout: Duration,
}

impl CountryCodeResolver {
    pub fn new(lookup: Arc<dyn CountryLookup>) -> Self {
        Self {
            lookup,
            timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve one name, absorbing failure into `Unknown`.
    pub async fn resolve_one(&self, country: &str) -> StandardCode {
        match bounded(self.timeout, self.lookup.alpha2(country)).await {
            Ok(code) => StandardCode::Alpha2(code),
            Err(e) => {
                tracing::warn!(
                    country,
                    lookup = self.lookup.name(),
                    error = %e,
                    "country name not resolved"
                );
                StandardCode::Unknown
            }
        }
    }

    /// Resolve every name in order.
    pub async fn resolve(&self, countries: &[String]) -> Vec<StandardCode> {
        let mut codes = Vec::with_capacity(countries.len());
        for country in countries {
            codes.push(self.resolve_one(country).await);
        }
        codes
    }
}

/// Maps standard codes to coordinates.
///
/// Identical codes within one call are looked up once and share the result.
pub struct GeoResolver {
    geocoder: Arc<dyn Geocoder>,
    timeout: Duration,
    min_interval: Duration,
}

impl GeoResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            geocoder,
            timeout: DEFAULT_LOOKUP_TIMEOUT,
            min_interval: Duration::ZERO,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Minimum spacing between consecutive service calls.
    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    async fn lookup(&self, query: &str) -> GeoPoint {
        match bounded(self.timeout, self.geocoder.geocode(query)).await {
            Ok(coords) => GeoPoint::Located(coords),
            Err(e) => {
                tracing::warn!(
                    code = query,
                    geocoder = self.geocoder.name(),
                    error = %e,
                    "location not resolved"
                );
                GeoPoint::Missing
            }
        }
    }

    /// Locate every code in order, including `Unknown`.
    pub async fn locate(&self, codes: &[StandardCode]) -> Vec<GeoPoint> {
        let mut cache: HashMap<&str, GeoPoint> = HashMap::new();
        let mut last_call: Option<Instant> = None;
        let mut points = Vec::with_capacity(codes.len());

        for code in codes {
            let query = code.as_str();
            if let Some(point) = cache.get(query) {
                points.push(*point);
                continue;
            }

            if let Some(last) = last_call {
                tokio::time::sleep_until(last + self.min_interval).await;
            }
            last_call = Some(Instant::now());

            let point = self.lookup(query).await;
            tracing::debug!(code = query, missing = point.is_missing(), "geocoded");
            cache.insert(query, point);
            points.push(point);
        }

        points
    }
}
