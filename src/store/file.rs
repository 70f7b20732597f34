//! store::file
//!
//! Count store over a JSON document file.
//!
//! The file holds an array of documents. A document counts when its code
//! field is a string or an integer whose decimal form matches the pattern.
//! Documents without the field are ignored. The file is read once, on the
//! first query.
//!
//! # Example
//!
//! ```json
//! [
//!   {"code": "2501", "received": "2023-01-04"},
//!   {"code": 9999}
//! ]
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use async_trait::async_trait;
use serde_json::Value;

use super::traits::{CountStore, StoreError};
use crate::core::codes::CodePattern;

/// File-backed count store.
#[derive(Debug)]
pub struct DocumentFileStore {
    path: PathBuf,
    field: String,
    documents: OnceLock<Result<Vec<Value>, StoreError>>,
}

impl DocumentFileStore {
    pub fn new(path: impl Into<PathBuf>, field: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            field: field.into(),
            documents: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn documents(&self) -> Result<&[Value], StoreError> {
        self.documents
            .get_or_init(|| load_documents(&self.path))
            .as_ref()
            .map(|docs| docs.as_slice())
            .map_err(Clone::clone)
    }
}

fn load_documents(path: &Path) -> Result<Vec<Value>, StoreError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| StoreError::Unavailable(format!("cannot read {}: {}", path.display(), e)))?;

    serde_json::from_str::<Vec<Value>>(&contents)
        .map_err(|e| StoreError::Malformed(format!("{}: {}", path.display(), e)))
}

/// Decimal/string form of a code field, if it has one.
pub(crate) fn code_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_u64() || n.is_i64() => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn compile(pattern: &CodePattern) -> Result<regex::Regex, StoreError> {
    pattern.compile().map_err(|e| StoreError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl CountStore for DocumentFileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn count_matching(&self, pattern: &CodePattern) -> Result<u64, StoreError> {
        let regex = compile(pattern)?;
        let count = self
            .documents()?
            .iter()
            .filter_map(|doc| doc.get(&self.field).and_then(code_text))
            .filter(|code| regex.is_match(code))
            .count();
        Ok(count as u64)
    }
}
