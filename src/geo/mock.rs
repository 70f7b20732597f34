//! geo::mock
//!
//! Mock geocoder for deterministic testing.
//!
//! # Example
//!
//! ```
//! use countmap::core::types::Coordinates;
//! use countmap::geo::mock::MockGeocoder;
//! use countmap::geo::{Geocoder, LookupError};
//!
//! # tokio_test::block_on(async {
//! let geocoder = MockGeocoder::new().with_point("FR", 46.6, 1.9);
//!
//! assert_eq!(geocoder.geocode("FR").await, Ok(Coordinates::new(46.6, 1.9)));
//! assert!(matches!(geocoder.geocode("Unknown").await, Err(LookupError::NotFound(_))));
//! assert_eq!(geocoder.calls(), vec!["FR", "Unknown"]);
//! # });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::traits::{Geocoder, LookupError};
use crate::core::types::Coordinates;

/// Mock geocoder.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockGeocoder {
    inner: Arc<Mutex<MockGeocoderInner>>,
}

#[derive(Debug, Default)]
struct MockGeocoderInner {
    points: HashMap<String, Coordinates>,
    failures: HashMap<String, LookupError>,
    delays: HashMap<String, Duration>,
    calls: Vec<String>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` with the given coordinates.
    pub fn with_point(self, query: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        self.inner
            .lock()
            .unwrap()
            .points
            .insert(query.into(), Coordinates::new(latitude, longitude));
        self
    }

    /// Fail `query` with `error`.
    pub fn fail_on(self, query: impl Into<String>, error: LookupError) -> Self {
        self.inner
            .lock()
            .unwrap()
            .failures
            .insert(query.into(), error);
        self
    }

    /// Sleep before answering `query`.
    pub fn delay(self, query: impl Into<String>, delay: Duration) -> Self {
        self.inner.lock().unwrap().delays.insert(query.into(), delay);
        self
    }

    /// Queries received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn geocode(&self, query: &str) -> Result<Coordinates, LookupError> {
        let delay = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(query.to_string());
            inner.delays.get(query).copied()
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let inner = self.inner.lock().unwrap();
        if let Some(err) = inner.failures.get(query) {
            return Err(err.clone());
        }
        inner
            .points
            .get(query)
            .copied()
            .ok_or_else(|| LookupError::NotFound(query.to_string()))
    }
}
