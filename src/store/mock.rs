//! store::mock
//!
//! In-memory count store for deterministic testing.
//!
//! # Example
//!
//! ```
//! use countmap::core::codes::CodeSpec;
//! use countmap::store::mock::MemoryStore;
//! use countmap::store::CountStore;
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::with_codes(["2501", "2501", "2501", "9999"]);
//! let count = store.count_matching(&CodeSpec::Single(250).pattern()).await.unwrap();
//! assert_eq!(count, 3);
//! assert_eq!(store.queries(), vec!["^250".to_string()]);
//! # });
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::file::compile;
use super::traits::{CountStore, StoreError};
use crate::core::codes::CodePattern;

/// Mock count store.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    codes: Vec<String>,
    fail_with: Option<StoreError>,
    queries: Vec<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding one record per code.
    pub fn with_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        for code in codes {
            store.push(code);
        }
        store
    }

    /// Add a record.
    pub fn push(&self, code: impl Into<String>) {
        self.inner.lock().unwrap().codes.push(code.into());
    }

    /// Fail every query with `error`.
    pub fn fail_with(self, error: StoreError) -> Self {
        self.inner.lock().unwrap().fail_with = Some(error);
        self
    }

    pub fn clear_failure(&self) {
        self.inner.lock().unwrap().fail_with = None;
    }

    /// Patterns queried so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.inner.lock().unwrap().queries.clone()
    }
}

#[async_trait]
impl CountStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn count_matching(&self, pattern: &CodePattern) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.queries.push(pattern.to_string());

        if let Some(err) = &inner.fail_with {
            return Err(err.clone());
        }

        let regex = compile(pattern)?;
        Ok(inner.codes.iter().filter(|code| regex.is_match(code)).count() as u64)
    }
}
