//! store::http
//!
//! Count store backed by a document-store HTTP endpoint.
//!
//! # Protocol
//!
//! ```text
//! POST {base_url}/count
//! {"collection": "records", "filter": {"code": {"$regex": "^250"}}}
//!
//! 200 {"count": 3}
//! ```
//!
//! The filter is the document-store regex filter on the configured code
//! field. Connection failures, timeouts and 5xx responses are reported as
//! [`StoreError::Unavailable`].
//!
//! # Authentication
//!
//! An optional bearer token is sent when configured. It is never included in
//! `Debug` output or error messages.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::traits::{CountStore, StoreError};
use crate::core::codes::CodePattern;

/// User-Agent header value for store requests.
const USER_AGENT_VALUE: &str = concat!("countmap/", env!("CARGO_PKG_VERSION"));

/// HTTP count store.
pub struct HttpCountStore {
    client: Client,
    base_url: String,
    collection: String,
    field: String,
    token: Option<String>,
}

impl std::fmt::Debug for HttpCountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCountStore")
            .field("base_url", &self.base_url)
            .field("collection", &self.collection)
            .field("field", &self.field)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct CountRequest<'a> {
    collection: &'a str,
    filter: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(alias = "error")]
    message: String,
}

impl HttpCountStore {
    /// Create a store client with the default HTTP client.
    pub fn new(
        base_url: impl Into<String>,
        collection: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            field: field.into(),
            token: None,
        }
    }

    /// Apply a request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, StoreError> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("cannot build HTTP client: {}", e)))?;
        Ok(self)
    }

    /// Send a bearer token with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn count_url(&self) -> String {
        format!("{}/count", self.base_url)
    }

    fn headers(&self) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| StoreError::AuthFailed("token contains invalid characters".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn filter(&self, pattern: &CodePattern) -> serde_json::Value {
        let mut filter = serde_json::Map::new();
        filter.insert(self.field.clone(), json!({ "$regex": pattern.as_str() }));
        serde_json::Value::Object(filter)
    }

    async fn handle_response(&self, response: Response) -> Result<u64, StoreError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json::<CountResponse>()
                .await
                .map(|body| body.count)
                .map_err(|e| StoreError::Malformed(format!("failed to parse response: {}", e)));
        }

        let message = match response.json::<ErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        };

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::AuthFailed(message),
            _ if status.is_server_error() => {
                StoreError::Unavailable(format!("server error {}: {}", status.as_u16(), message))
            }
            _ => StoreError::ApiError {
                status: status.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl CountStore for HttpCountStore {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn count_matching(&self, pattern: &CodePattern) -> Result<u64, StoreError> {
        let body = CountRequest {
            collection: &self.collection,
            filter: self.filter(pattern),
        };

        let response = self
            .client
            .post(self.count_url())
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        self.handle_response(response).await
    }
}
