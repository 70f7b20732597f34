//! render
//!
//! Map document assembly, persistence, and metadata injection.
//!
//! # Modules
//!
//! - [`map`]: builds the marker-clustered map document from records
//! - [`artifact`]: atomic persistence and digest of the rendered document
//! - [`metadata`]: idempotent icon/title injection into a persisted document

pub mod artifact;
pub mod map;
pub mod metadata;

pub use artifact::{persist, ArtifactInfo};
pub use map::{MapAssembler, MapDocument, MapOptions, Marker};
pub use metadata::{inject_metadata, inject_metadata_file, Metadata};

use std::path::PathBuf;

use thiserror::Error;

/// Errors from rendering and persisting the map artifact.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write artifact '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read artifact '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to rewrite document: {0}")]
    RewriteError(String),

    #[error("document has no <head> element")]
    MissingHead,
}

/// Escape text for inclusion in HTML content or a quoted attribute.
pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
