//! Input resolution: turn a document reference into a readable local file.
//!
//! Uploaded bytes are written to a `NamedTempFile` whose name keeps the
//! upload's suffix, so classification and pdfium both see a normal path. The
//! temp file is owned by [`ResolvedInput`] and deleted when it drops: on
//! success, on a sentinel outcome, on error, and during a panic unwind.

use crate::error::ExplainError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// A document available on the local file system.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was uploaded bytes, staged to a temp file that lives as long as
    /// this value.
    Staged { path: PathBuf, _file: NamedTempFile },
}

impl ResolvedInput {
    /// Path to the file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Staged { path, .. } => path,
        }
    }
}

/// Validate that a local file exists and is readable.
pub fn resolve_local(path: &Path) -> Result<ResolvedInput, ExplainError> {
    if !path.exists() {
        return Err(ExplainError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ExplainError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(ExplainError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            });
        }
    }

    debug!("Resolved local file: {}", path.display());
    Ok(ResolvedInput::Local(path.to_path_buf()))
}

/// Stage uploaded bytes to a temp file carrying `file_name`'s suffix.
pub fn stage_upload(file_name: &str, bytes: &[u8]) -> Result<ResolvedInput, ExplainError> {
    let suffix = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    let staging_err = |source: std::io::Error| ExplainError::StagingFailed {
        file_name: file_name.to_string(),
        source,
    };

    let mut file = tempfile::Builder::new()
        .prefix("claim-upload-")
        .suffix(&suffix)
        .tempfile()
        .map_err(staging_err)?;
    file.write_all(bytes).map_err(staging_err)?;
    file.flush().map_err(staging_err)?;

    let path = file.path().to_path_buf();
    debug!("Staged upload '{}' → {}", file_name, path.display());

    Ok(ResolvedInput::Staged { path, _file: file })
}

/// Read a text document verbatim.
pub async fn read_text_file(path: &Path) -> Result<String, ExplainError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ExplainError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    String::from_utf8(bytes).map_err(|e| ExplainError::InvalidEncoding {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}
