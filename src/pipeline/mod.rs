//! Pipeline stages for claim explanation.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──┬─▶ pdf (text layer) ──┐
//! (path/upload)       ├─▶ pdf (render) ─▶ ocr ┼─▶ summarize
//!                     ├─▶ ocr (image) ───────┤
//!                     └─▶ read (.txt) ───────┘
//! ```
//!
//! 1. [`input`]     — validate a local path or stage uploaded bytes
//! 2. [`extract`]   — dispatch on document kind, PDF → OCR fallback
//! 3. [`pdf`]       — pdfium text layer and rasterisation (`spawn_blocking`)
//! 4. [`ocr`]       — vision-model transcription, tidied by [`cleanup`]
//! 5. [`summarize`] — truncation and bounded, deterministic summarisation
//!
//! [`llm`] holds the retry loop both model-backed stages share.

pub mod cleanup;
pub mod extract;
pub mod input;
pub mod llm;
pub mod ocr;
pub mod pdf;
pub mod summarize;
