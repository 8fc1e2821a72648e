//! Document references and extension-based classification.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Handling strategy chosen from a file's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Image,
    PlainText,
    Unsupported,
}

impl DocumentKind {
    pub fn is_supported(self) -> bool {
        self != DocumentKind::Unsupported
    }
}

/// Extensions accepted by the pipeline, lower-case and without the dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png", "txt"];

/// Lower-cased extension of `path`, if it has one.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Classify a path by its extension (case-insensitive).
///
/// Anything outside [`SUPPORTED_EXTENSIONS`], including a missing extension,
/// is [`DocumentKind::Unsupported`].
pub fn classify(path: &Path) -> DocumentKind {
    match extension_of(path).as_deref() {
        Some("pdf") => DocumentKind::Pdf,
        Some("jpg" | "jpeg" | "png") => DocumentKind::Image,
        Some("txt") => DocumentKind::PlainText,
        _ => DocumentKind::Unsupported,
    }
}

/// A transient handle to the content of one request.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// A file already on disk.
    Path(PathBuf),
    /// Text typed or pasted by the user.
    Text(String),
    /// Uploaded content, staged to a temp file carrying `file_name`'s suffix.
    Upload { file_name: String, bytes: Vec<u8> },
}

impl DocumentSource {
    /// A short description for log lines; never includes document content.
    pub fn describe(&self) -> String {
        match self {
            DocumentSource::Path(p) => p.display().to_string(),
            DocumentSource::Text(t) => format!("<direct text, {} chars>", t.chars().count()),
            DocumentSource::Upload { file_name, bytes } => {
                format!("<upload {}, {} bytes>", file_name, bytes.len())
            }
        }
    }
}

impl From<PathBuf> for DocumentSource {
    fn from(p: PathBuf) -> Self {
        DocumentSource::Path(p)
    }
}

impl From<&Path> for DocumentSource {
    fn from(p: &Path) -> Self {
        DocumentSource::Path(p.to_path_buf())
    }
}
