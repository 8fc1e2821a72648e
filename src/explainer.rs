//! Orchestrator: classification → extraction → summarisation.
//!
//! Each request walks a linear state machine and stops at the first terminal
//! state:
//!
//! ```text
//! classify ──unsupported──▶ UnsupportedFileType
//!    │
//! extract ──blank──▶ NoReadableText
//!    │
//! summarize ──blank──▶ NoTextDetected
//!    │
//!    ▼
//! Summary
//! ```
//!
//! Requests on one [`ClaimExplainer`] never overlap: a request holds the
//! explainer's run lock from classification to outcome.

use crate::config::ExplainerConfig;
use crate::document::{classify, extension_of, DocumentKind, DocumentSource};
use crate::error::ExplainError;
use crate::models::Models;
use crate::outcome::{Explanation, Extraction, ExtractionMethod, Outcome, StageTimings};
use crate::pipeline::extract::{extract_text, Extractors};
use crate::pipeline::input::{self, ResolvedInput};
use crate::pipeline::summarize::summarize_claim;
use crate::progress::Stage;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Explains claim documents using a shared set of [`Models`].
pub struct ClaimExplainer {
    models: Arc<Models>,
    config: ExplainerConfig,
    run_lock: Mutex<()>,
}

impl ClaimExplainer {
    /// Create an explainer over already-loaded models.
    pub fn new(models: Arc<Models>, config: ExplainerConfig) -> Self {
        Self {
            models,
            config,
            run_lock: Mutex::new(()),
        }
    }

    /// Load the default models from `config` and wrap them.
    pub fn from_config(config: ExplainerConfig) -> Result<Self, ExplainError> {
        let models = Models::load(&config)?;
        Ok(Self::new(Arc::new(models), config))
    }

    pub fn config(&self) -> &ExplainerConfig {
        &self.config
    }

    pub fn models(&self) -> &Arc<Models> {
        &self.models
    }

    /// Explain any document reference.
    pub async fn explain(&self, source: DocumentSource) -> Result<Explanation, ExplainError> {
        debug!("Request: {}", source.describe());
        match source {
            DocumentSource::Path(path) => self.explain_file(&path).await,
            DocumentSource::Text(text) => self.explain_text(&text).await,
            DocumentSource::Upload { file_name, bytes } => {
                self.explain_upload(&file_name, &bytes).await
            }
        }
    }

    /// Explain a file on disk.
    ///
    /// # Errors
    /// Only fatal conditions: unreadable input, corrupt PDFs, model failures.
    /// Unsupported types and blank extractions come back as `Ok` with a
    /// sentinel [`Outcome`].
    pub async fn explain_file(&self, path: impl AsRef<Path>) -> Result<Explanation, ExplainError> {
        let path = path.as_ref();
        let _guard = self.run_lock.lock().await;
        info!("Explaining {}", path.display());

        let kind = self.classify(path);
        if !kind.is_supported() {
            return Ok(self.unsupported(path));
        }

        let resolved = input::resolve_local(path)?;
        self.run_document(&resolved, kind).await
    }

    /// Explain uploaded bytes. The bytes are staged to a temp file that is
    /// removed before this returns, whatever the outcome.
    pub async fn explain_upload(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<Explanation, ExplainError> {
        let _guard = self.run_lock.lock().await;
        info!("Explaining upload '{}' ({} bytes)", file_name, bytes.len());

        let kind = self.classify(Path::new(file_name));
        if !kind.is_supported() {
            return Ok(self.unsupported(Path::new(file_name)));
        }

        let staged = input::stage_upload(file_name, bytes)?;
        self.run_document(&staged, kind).await
    }

    /// Explain text entered directly; classification and extraction are skipped.
    pub async fn explain_text(&self, text: &str) -> Result<Explanation, ExplainError> {
        let _guard = self.run_lock.lock().await;
        let start = Instant::now();
        debug!("Explaining {} chars of direct text", text.chars().count());

        let extraction = Extraction::new(text, ExtractionMethod::Direct);
        let summarize_start = Instant::now();
        let outcome = self.summarize(&extraction.text).await?;

        Ok(self.finish(
            outcome,
            None,
            Some(extraction.method),
            &extraction.text,
            StageTimings {
                extraction_ms: 0,
                summarization_ms: summarize_start.elapsed().as_millis() as u64,
                total_ms: start.elapsed().as_millis() as u64,
            },
        ))
    }

    /// Run classification and extraction only.
    ///
    /// Returns `None` for unsupported file types.
    pub async fn extract_only(&self, path: impl AsRef<Path>) -> Result<Option<Extraction>, ExplainError> {
        let path = path.as_ref();
        let _guard = self.run_lock.lock().await;

        let kind = self.classify(path);
        if !kind.is_supported() {
            return Ok(None);
        }

        let resolved = input::resolve_local(path)?;
        let extraction = extract_text(resolved.path(), kind, &self.extractors()).await?;
        Ok(Some(extraction))
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    fn classify(&self, path: &Path) -> DocumentKind {
        self.stage(Stage::Classifying);
        let kind = classify(path);
        debug!("Classified {} as {:?}", path.display(), kind);
        kind
    }

    fn unsupported(&self, path: &Path) -> Explanation {
        let extension = extension_of(path);
        info!(
            "Unsupported file type: {}",
            extension.as_deref().unwrap_or("<none>")
        );
        self.finish(
            Outcome::UnsupportedFileType { extension },
            Some(DocumentKind::Unsupported),
            None,
            "",
            StageTimings::default(),
        )
    }

    async fn run_document(
        &self,
        resolved: &ResolvedInput,
        kind: DocumentKind,
    ) -> Result<Explanation, ExplainError> {
        let start = Instant::now();

        let extraction = extract_text(resolved.path(), kind, &self.extractors()).await?;
        let extraction_ms = start.elapsed().as_millis() as u64;
        info!(
            "Extracted {} chars via {:?} in {}ms",
            extraction.text.chars().count(),
            extraction.method,
            extraction_ms
        );

        if extraction.is_blank() {
            return Ok(self.finish(
                Outcome::NoReadableText,
                Some(kind),
                Some(extraction.method),
                &extraction.text,
                StageTimings {
                    extraction_ms,
                    summarization_ms: 0,
                    total_ms: start.elapsed().as_millis() as u64,
                },
            ));
        }

        let summarize_start = Instant::now();
        let outcome = self.summarize(&extraction.text).await?;

        Ok(self.finish(
            outcome,
            Some(kind),
            Some(extraction.method),
            &extraction.text,
            StageTimings {
                extraction_ms,
                summarization_ms: summarize_start.elapsed().as_millis() as u64,
                total_ms: start.elapsed().as_millis() as u64,
            },
        ))
    }

    async fn summarize(&self, text: &str) -> Result<Outcome, ExplainError> {
        if !text.trim().is_empty() {
            self.stage(Stage::Summarizing);
        }
        summarize_claim(text, self.models.summarizer.as_ref(), &self.config).await
    }

    fn extractors(&self) -> Extractors<'_> {
        Extractors {
            pdf: self.models.pdf.as_ref(),
            ocr: self.models.ocr.as_ref(),
            progress: self.config.progress_callback.as_deref(),
            max_image_pixels: self.config.max_rendered_pixels,
        }
    }

    fn stage(&self, stage: Stage) {
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_stage(stage);
        }
    }

    fn finish(
        &self,
        outcome: Outcome,
        kind: Option<DocumentKind>,
        method: Option<ExtractionMethod>,
        text: &str,
        timings: StageTimings,
    ) -> Explanation {
        let extracted_chars = text.chars().count();
        let truncated = outcome.is_summary() && extracted_chars > self.config.max_input_chars;

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_complete(&outcome);
        }

        Explanation {
            outcome,
            kind,
            method,
            extracted_chars,
            truncated,
            timings,
        }
    }
}

/// Synchronous wrapper around [`ClaimExplainer::explain`].
///
/// Creates a temporary tokio runtime internally; do not call from inside an
/// async context.
pub fn explain_sync(
    explainer: &ClaimExplainer,
    source: DocumentSource,
) -> Result<Explanation, ExplainError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExplainError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(explainer.explain(source))
}
