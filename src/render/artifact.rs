//! render::artifact
//!
//! Atomic persistence of the rendered map document.
//!
//! The document is written to a temporary sibling, synced, and renamed over
//! the target, so a failed write leaves any previous artifact untouched.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::RenderError;

/// Facts about a persisted artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactInfo {
    /// Where the document was written
    pub path: PathBuf,
    /// Size in bytes
    pub bytes: usize,
    /// SHA-256 of the document, hex encoded
    pub digest: String,
}

/// SHA-256 hex digest of a document.
pub fn digest(contents: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents.as_bytes());
    hex::encode(hasher.finalize())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// Write `contents` to `path`, fully replacing any previous document.
///
/// Creates parent directories if needed.
pub fn persist(path: &Path, contents: &str) -> Result<ArtifactInfo, RenderError> {
    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| RenderError::WriteError { path, source }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err(path))?;
    }

    let temp = temp_path(path);
    let mut file = fs::File::create(&temp).map_err(write_err(&temp))?;
    file.write_all(contents.as_bytes())
        .map_err(write_err(&temp))?;
    file.sync_all().map_err(write_err(&temp))?;
    drop(file);

    if let Err(e) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(RenderError::WriteError {
            path: path.to_path_buf(),
            source: e,
        });
    }

    Ok(ArtifactInfo {
        path: path.to_path_buf(),
        bytes: contents.len(),
        digest: digest(contents),
    })
}

/// Read a persisted document.
pub fn read(path: &Path) -> Result<String, RenderError> {
    fs::read_to_string(path).map_err(|e| RenderError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })
}
