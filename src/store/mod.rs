//! store
//!
//! Abstraction over the record store that answers count queries.
//!
//! # Architecture
//!
//! The `CountStore` trait is the only view the pipeline has of stored
//! records. Commands build a store through [`create_store`] rather than
//! naming a backend directly.
//!
//! # Modules
//!
//! - `traits`: `CountStore` trait and `StoreError`
//! - [`http`]: document-store HTTP endpoint
//! - [`mongo`]: MongoDB collection
//! - [`file`]: JSON document file
//! - [`mock`]: in-memory store for deterministic testing

pub mod file;
pub mod http;
pub mod mock;
pub mod mongo;
mod traits;

pub use traits::*;

use std::sync::Arc;

use crate::core::config::Config;

/// Environment variable holding the bearer token for the HTTP store.
pub const STORE_TOKEN_ENV: &str = "COUNTMAP_STORE_TOKEN";

/// Environment variable holding the MongoDB connection string.
///
/// Takes precedence over `store.url` so credentials stay out of config files.
pub const MONGODB_URI_ENV: &str = "COUNTMAP_MONGODB_URI";

/// Build the configured count store.
///
/// # Errors
///
/// Returns `StoreError::Unavailable` if the HTTP client cannot be built. The
/// MongoDB client connects on its first query.
pub fn create_store(config: &Config) -> Result<Arc<dyn CountStore>, StoreError> {
    match config.store_kind() {
        "file" => Ok(Arc::new(file::DocumentFileStore::new(
            config.store_path(),
            config.store_field(),
        ))),
        "mongodb" => {
            let uri = std::env::var(MONGODB_URI_ENV)
                .ok()
                .filter(|uri| !uri.is_empty())
                .unwrap_or_else(|| config.store_url().to_string());

            Ok(Arc::new(
                mongo::MongoCountStore::new(
                    uri,
                    config.store_database(),
                    config.store_collection(),
                    config.store_field(),
                )
                .with_timeout(config.store_timeout()),
            ))
        }
        _ => {
            let mut store = http::HttpCountStore::new(
                config.store_url(),
                config.store_collection(),
                config.store_field(),
            )
            .with_timeout(config.store_timeout())?;

            if let Ok(token) = std::env::var(STORE_TOKEN_ENV) {
                if !token.is_empty() {
                    store = store.with_token(token);
                }
            }

            Ok(Arc::new(store))
        }
    }
}
