//! geo::nominatim
//!
//! Geocoder backed by a Nominatim search endpoint.
//!
//! # Protocol
//!
//! ```text
//! GET {base_url}/search?q=FR&format=json&limit=1
//!
//! 200 [{"lat": "46.603354", "lon": "1.8883335", "display_name": "France"}]
//! ```
//!
//! An empty array means no match. Nominatim's usage policy requires an
//! identifying User-Agent, which is sent with every request.
//!
//! # Rate Limiting
//!
//! 429 responses map to `LookupError::RateLimited`. Throttling between
//! calls is the resolver's job (`geocoder.min_interval_ms`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::traits::{Geocoder, LookupError};
use crate::core::types::Coordinates;

/// Nominatim geocoder.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    user_agent: String,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
        }
    }

    /// Apply a transport-level request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, LookupError> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::NetworkError(format!("cannot build HTTP client: {}", e)))?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }

    fn headers(&self) -> Result<HeaderMap, LookupError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let agent = HeaderValue::from_str(&self.user_agent)
            .map_err(|_| LookupError::Malformed("user agent contains invalid characters".into()))?;
        headers.insert(USER_AGENT, agent);
        Ok(headers)
    }
}

fn parse_hit(query: &str, hits: Vec<SearchHit>) -> Result<Coordinates, LookupError> {
    let hit = hits
        .into_iter()
        .next()
        .ok_or_else(|| LookupError::NotFound(query.to_string()))?;

    let latitude = hit
        .lat
        .parse::<f64>()
        .map_err(|_| LookupError::Malformed(format!("latitude '{}'", hit.lat)))?;
    let longitude = hit
        .lon
        .parse::<f64>()
        .map_err(|_| LookupError::Malformed(format!("longitude '{}'", hit.lon)))?;

    Ok(Coordinates::new(latitude, longitude))
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    fn name(&self) -> &'static str {
        "nominatim"
    }

    async fn geocode(&self, query: &str) -> Result<Coordinates, LookupError> {
        if query.trim().is_empty() {
            return Err(LookupError::NotFound(query.to_string()));
        }

        let response = self
            .client
            .get(self.search_url())
            .headers(self.headers()?)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| LookupError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => LookupError::RateLimited,
                _ => LookupError::ApiError {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let hits: Vec<SearchHit> = response
            .json()
            .await
            .map_err(|e| LookupError::Malformed(format!("failed to parse response: {}", e)))?;

        parse_hit(query, hits)
    }
}
