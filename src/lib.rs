//! # claim-explainer
//!
//! Summarise insurance claim documents into plain English.
//!
//! A claim arrives as a PDF, a scanned image, a text file, or pasted text.
//! The crate gets the text out (PDF text layer, falling back to OCR for
//! scanned PDFs; OCR for images; a verbatim read for `.txt`) and asks a
//! summarisation model for a short customer-friendly explanation.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document
//!  │
//!  ├─ 1. Classify  extension → PDF / image / text / unsupported
//!  ├─ 2. Extract   text layer, OCR (vision LLM), or verbatim read
//!  ├─ 3. Truncate  first 3000 characters only
//!  └─ 4. Summarise 40–130 tokens, temperature 0
//! ```
//!
//! Conditions a user can recover from (an unsupported extension, a document
//! with no readable text, empty input) are not errors: they come back as an
//! [`Outcome`] sentinel with a fixed message. Only fatal failures, model
//! failures included, are `Err(ExplainError)`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use claim_explainer::{ClaimExplainer, ExplainerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let explainer = ClaimExplainer::from_config(ExplainerConfig::default())?;
//!     let explanation = explainer.explain_file("claim.pdf").await?;
//!     println!("{}", explanation.message());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `claim-explain` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod explainer;
pub mod models;
pub mod outcome;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExplainerConfig, ExplainerConfigBuilder};
pub use document::{classify, DocumentKind, DocumentSource, SUPPORTED_EXTENSIONS};
pub use error::ExplainError;
pub use explainer::{explain_sync, ClaimExplainer};
pub use models::Models;
pub use outcome::{
    Explanation, Extraction, ExtractionMethod, Outcome, StageTimings, NO_READABLE_TEXT,
    NO_TEXT_DETECTED, UNSUPPORTED_FILE_TYPE,
};
pub use pipeline::ocr::OcrEngine;
pub use pipeline::pdf::PdfBackend;
pub use pipeline::summarize::{summarize_claim, Summarizer, SummaryBounds};
pub use progress::{ExplainProgress, NoopProgress, ProgressCallback, Stage};
