//! Result types returned by the pipeline.
//!
//! An [`Outcome`] is what a presentation shell shows the user: either a
//! summary or one of three fixed sentinel messages. An [`Explanation`] wraps
//! the outcome with what the pipeline learnt along the way (document kind,
//! extraction method, timings) and is what the CLI serialises for `--json`.

use crate::document::DocumentKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel for empty input reaching the summariser.
pub const NO_TEXT_DETECTED: &str = "No text detected in the document.";
/// Sentinel for a supported file that yielded no text.
pub const NO_READABLE_TEXT: &str = "Could not extract any readable text.";
/// Sentinel for a file whose extension is not handled.
pub const UNSUPPORTED_FILE_TYPE: &str = "Unsupported file type.";

/// Terminal state of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Summarisation ran and produced this text.
    Summary { text: String },
    /// The text handed to the summariser was empty or whitespace.
    NoTextDetected,
    /// Extraction from a supported file produced nothing.
    NoReadableText,
    /// The file extension is not one of pdf/jpg/jpeg/png/txt.
    UnsupportedFileType { extension: Option<String> },
}

impl Outcome {
    /// The string a presentation layer renders in place of a summary.
    pub fn message(&self) -> &str {
        match self {
            Outcome::Summary { text } => text,
            Outcome::NoTextDetected => NO_TEXT_DETECTED,
            Outcome::NoReadableText => NO_READABLE_TEXT,
            Outcome::UnsupportedFileType { .. } => UNSUPPORTED_FILE_TYPE,
        }
    }

    pub fn is_summary(&self) -> bool {
        matches!(self, Outcome::Summary { .. })
    }

    /// The summary text, if any.
    pub fn summary(&self) -> Option<&str> {
        match self {
            Outcome::Summary { text } => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// How the text handed to the summariser was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Selectable text embedded in a PDF.
    TextLayer,
    /// Vision-model OCR of an image or of rendered PDF pages.
    Ocr,
    /// A `.txt` file read verbatim.
    PlainText,
    /// Text supplied directly by the caller.
    Direct,
}

/// Text recovered from a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub method: ExtractionMethod,
}

impl Extraction {
    pub fn new(text: impl Into<String>, method: ExtractionMethod) -> Self {
        Self {
            text: text.into(),
            method,
        }
    }

    /// `true` when the text is empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Wall-clock time spent in each stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTimings {
    pub extraction_ms: u64,
    pub summarization_ms: u64,
    pub total_ms: u64,
}

/// Full report of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub outcome: Outcome,
    /// None for direct text entry.
    pub kind: Option<DocumentKind>,
    /// None when extraction never ran (unsupported type).
    pub method: Option<ExtractionMethod>,
    /// Character count of the extracted text before truncation.
    pub extracted_chars: usize,
    /// Whether text was cut to the configured cap before summarisation.
    pub truncated: bool,
    pub timings: StageTimings,
}

impl Explanation {
    /// The string a presentation layer renders.
    pub fn message(&self) -> &str {
        self.outcome.message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_messages_are_fixed() {
        assert_eq!(Outcome::NoTextDetected.message(), NO_TEXT_DETECTED);
        assert_eq!(Outcome::NoReadableText.message(), NO_READABLE_TEXT);
        assert_eq!(
            Outcome::UnsupportedFileType {
                extension: Some("docx".into())
            }
            .message(),
            UNSUPPORTED_FILE_TYPE
        );
    }

    #[test]
    fn summary_message_is_the_summary() {
        let o = Outcome::Summary {
            text: "Minor collision, claim approved.".into(),
        };
        assert_eq!(o.message(), "Minor collision, claim approved.");
        assert_eq!(o.summary(), Some("Minor collision, claim approved."));
        assert!(o.is_summary());
        assert!(Outcome::NoReadableText.summary().is_none());
    }

    #[test]
    fn blank_extraction() {
        assert!(Extraction::new(" \n\t ", ExtractionMethod::Ocr).is_blank());
        assert!(!Extraction::new(" a ", ExtractionMethod::Ocr).is_blank());
    }

    #[test]
    fn outcome_serialises_with_status_tag() {
        let json = serde_json::to_string(&Outcome::NoTextDetected).unwrap();
        assert_eq!(json, r#"{"status":"no_text_detected"}"#);
        let json = serde_json::to_string(&Outcome::Summary { text: "ok".into() }).unwrap();
        assert!(json.contains(r#""status":"summary""#));
    }
}
