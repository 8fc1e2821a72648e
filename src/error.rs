//! Error types for the claim-explainer library.
//!
//! Only fatal conditions live here. The recoverable outcomes of the pipeline
//! (unsupported file type, no readable text, empty input) are not errors at
//! all: they are [`crate::outcome::Outcome`] sentinels returned in place of a
//! summary.
//!
//! Model failures (OCR, summarisation, provider set-up) are tagged variants so
//! callers can tell them apart and decide how to present them.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the claim-explainer library.
#[derive(Debug, Error)]
pub enum ExplainError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Reading the file failed for another I/O reason.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `.txt` document is not valid UTF-8.
    #[error("Text file '{path}' is not valid UTF-8: {detail}")]
    InvalidEncoding { path: PathBuf, detail: String },

    /// Uploaded bytes could not be staged to a temporary file.
    #[error("Failed to stage upload '{file_name}': {source}")]
    StagingFailed {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium failed to rasterise a page for OCR.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium (or pass --pdfium-lib) to point at an\n\
existing copy, or install pdfium where the system loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Image errors ──────────────────────────────────────────────────────
    /// The image file could not be decoded.
    #[error("Could not decode image '{path}': {detail}")]
    ImageDecodeFailed { path: PathBuf, detail: String },

    // ── Model errors ──────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The OCR capability itself failed (as opposed to finding no text).
    #[error("OCR failed on page {page} after {retries} retries: {detail}")]
    OcrFailed {
        page: usize,
        retries: u32,
        detail: String,
    },

    /// The summarisation capability failed.
    #[error("Summarisation failed after {retries} retries: {detail}")]
    SummarizationFailed { retries: u32, detail: String },

    /// `models::init_global` was called a second time.
    #[error("Models are already initialised for this process")]
    ModelsAlreadyInitialised,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExplainError {
    /// `true` for failures inside an OCR or summarisation capability.
    pub fn is_model_failure(&self) -> bool {
        matches!(
            self,
            ExplainError::OcrFailed { .. }
                | ExplainError::SummarizationFailed { .. }
                | ExplainError::ProviderNotConfigured { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ocr_failed_display() {
        let e = ExplainError::OcrFailed {
            page: 2,
            retries: 3,
            detail: "HTTP 503".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("page 2"), "got: {msg}");
        assert!(msg.contains("HTTP 503"));
    }

    #[test]
    fn summarization_failed_display() {
        let e = ExplainError::SummarizationFailed {
            retries: 2,
            detail: "invalid key".into(),
        };
        assert!(e.to_string().contains("2 retries"));
        assert!(e.to_string().contains("invalid key"));
    }

    #[test]
    fn model_failures_are_tagged() {
        assert!(ExplainError::OcrFailed {
            page: 1,
            retries: 0,
            detail: String::new()
        }
        .is_model_failure());
        assert!(ExplainError::ProviderNotConfigured {
            provider: "auto".into(),
            hint: String::new()
        }
        .is_model_failure());
        assert!(!ExplainError::FileNotFound {
            path: PathBuf::from("/tmp/x.pdf")
        }
        .is_model_failure());
    }

    #[test]
    fn invalid_encoding_names_the_file() {
        let e = ExplainError::InvalidEncoding {
            path: PathBuf::from("claim.txt"),
            detail: "invalid utf-8 sequence".into(),
        };
        assert!(e.to_string().contains("claim.txt"));
    }
}
