//! store::mongo
//!
//! Count store backed by a MongoDB collection.
//!
//! Counting issues `count_documents` with a `$regex` filter on the
//! configured code field. The client connects lazily on the first query, so
//! building the store never touches the network.
//!
//! # Errors
//!
//! Server selection, DNS and socket failures are reported as
//! [`StoreError::Unavailable`]; rejected credentials as
//! [`StoreError::AuthFailed`]. The connection string may carry credentials
//! and is never included in `Debug` output.

use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::options::ClientOptions;
use mongodb::Client;
use tokio::sync::OnceCell;

use super::traits::{CountStore, StoreError};
use crate::core::codes::CodePattern;

/// Server error code for an invalid regular expression.
const INVALID_REGEX_CODE: i32 = 51091;

/// MongoDB count store.
pub struct MongoCountStore {
    uri: String,
    database: String,
    collection: String,
    field: String,
    timeout: Duration,
    client: OnceCell<Client>,
}

impl std::fmt::Debug for MongoCountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoCountStore")
            .field("database", &self.database)
            .field("collection", &self.collection)
            .field("field", &self.field)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl MongoCountStore {
    pub fn new(
        uri: impl Into<String>,
        database: impl Into<String>,
        collection: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            collection: collection.into(),
            field: field.into(),
            timeout: Duration::from_secs(30),
            client: OnceCell::new(),
        }
    }

    /// Bound server selection and connection setup.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn client(&self) -> Result<&Client, StoreError> {
        self.client
            .get_or_try_init(|| async {
                let mut options = ClientOptions::parse(&self.uri).await.map_err(store_error)?;
                options.app_name = Some("countmap".to_string());
                options.server_selection_timeout = Some(self.timeout);
                options.connect_timeout = Some(self.timeout);
                tracing::debug!(database = %self.database, "connecting to mongodb");
                Client::with_options(options).map_err(store_error)
            })
            .await
    }
}

/// The `count_documents` filter for `pattern` on `field`.
fn filter(field: &str, pattern: &CodePattern) -> Document {
    let mut filter = Document::new();
    filter.insert(field, doc! { "$regex": pattern.as_str() });
    filter
}

fn store_error(err: MongoError) -> StoreError {
    match err.kind.as_ref() {
        ErrorKind::ServerSelection { message, .. } | ErrorKind::DnsResolve { message, .. } => {
            StoreError::Unavailable(message.clone())
        }
        ErrorKind::Io(io) => StoreError::Unavailable(io.to_string()),
        ErrorKind::Authentication { message, .. } => StoreError::AuthFailed(message.clone()),
        ErrorKind::InvalidArgument { message, .. } => {
            StoreError::Unavailable(format!("invalid connection string: {}", message))
        }
        ErrorKind::Command(command) => StoreError::Rejected(format!(
            "{} ({}): {}",
            command.code_name, command.code, command.message
        )),
        _ => StoreError::Rejected(err.to_string()),
    }
}

#[async_trait]
impl CountStore for MongoCountStore {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    async fn count_matching(&self, pattern: &CodePattern) -> Result<u64, StoreError> {
        let collection = self
            .client()
            .await?
            .database(&self.database)
            .collection::<Document>(&self.collection);

        collection
            .count_documents(filter(&self.field, pattern))
            .await
            .map_err(|err| {
                if let ErrorKind::Command(command) = err.kind.as_ref() {
                    if command.code == INVALID_REGEX_CODE {
                        return StoreError::InvalidPattern {
                            pattern: pattern.as_str().to_string(),
                            message: command.message.clone(),
                        };
                    }
                }
                store_error(err)
            })
    }
}
