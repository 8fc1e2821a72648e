//! Model resources: loaded once, shared read-only.
//!
//! [`Models`] bundles the three capabilities the pipeline calls on. It is
//! built explicitly with [`Models::load`] (or [`Models::new`] for custom or
//! test capabilities) and handed to [`crate::ClaimExplainer`] behind an
//! `Arc`. Nothing in the pipeline mutates it.
//!
//! Applications that want a single process-wide instance call
//! [`init_global`] once at start-up and [`global`] afterwards. A second
//! `init_global` fails instead of silently reloading.

use crate::config::ExplainerConfig;
use crate::error::ExplainError;
use crate::pipeline::ocr::{OcrEngine, VisionOcr};
use crate::pipeline::pdf::{PdfBackend, PdfiumBackend};
use crate::pipeline::summarize::{LlmSummarizer, Summarizer};
use edgequake_llm::{LLMProvider, ProviderFactory};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{info, warn};

/// Model used when a provider is named but no model is given.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// The capabilities shared by every pipeline run.
#[derive(Clone)]
pub struct Models {
    pub pdf: Arc<dyn PdfBackend>,
    pub ocr: Arc<dyn OcrEngine>,
    pub summarizer: Arc<dyn Summarizer>,
}

impl std::fmt::Debug for Models {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Models")
            .field("pdf", &"<dyn PdfBackend>")
            .field("ocr", &"<dyn OcrEngine>")
            .field("summarizer", &"<dyn Summarizer>")
            .finish()
    }
}

impl Models {
    pub fn new(
        pdf: Arc<dyn PdfBackend>,
        ocr: Arc<dyn OcrEngine>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            pdf,
            ocr,
            summarizer,
        }
    }

    /// Build the default capabilities: pdfium, a vision-model OCR engine,
    /// and an LLM summariser.
    ///
    /// A missing pdfium library is only a warning here; PDFs will fail with
    /// [`ExplainError::PdfiumBindingFailed`] when they are processed, while
    /// images and text keep working.
    pub fn load(config: &ExplainerConfig) -> Result<Self, ExplainError> {
        let summary_provider = resolve_provider(config, config.model.as_deref())?;

        let ocr_provider = match (&config.provider, config.ocr_model.as_deref()) {
            (None, Some(ocr_model)) if config.model.as_deref() != Some(ocr_model) => {
                resolve_provider(config, Some(ocr_model))?
            }
            _ => Arc::clone(&summary_provider),
        };

        let pdf = PdfiumBackend::new(config);
        if let Err(e) = pdf.probe() {
            warn!("PDF support unavailable: {}", e);
        }

        info!(
            "Models loaded (summary model: {}, ocr model: {})",
            config.model.as_deref().unwrap_or("provider default"),
            config.ocr_model_or_default().unwrap_or("provider default")
        );

        Ok(Self::new(
            Arc::new(pdf),
            Arc::new(VisionOcr::new(ocr_provider, config)),
            Arc::new(LlmSummarizer::new(summary_provider, config)),
        ))
    }
}

static GLOBAL_MODELS: OnceCell<Arc<Models>> = OnceCell::new();

/// Install `models` as the process-wide instance.
///
/// # Errors
/// [`ExplainError::ModelsAlreadyInitialised`] if called more than once.
pub fn init_global(models: Models) -> Result<Arc<Models>, ExplainError> {
    let models = Arc::new(models);
    GLOBAL_MODELS
        .set(Arc::clone(&models))
        .map_err(|_| ExplainError::ModelsAlreadyInitialised)?;
    Ok(models)
}

/// The process-wide instance, if [`init_global`] has run.
pub fn global() -> Option<Arc<Models>> {
    GLOBAL_MODELS.get().cloned()
}

/// Instantiate a named provider with the given model.
fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, ExplainError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ExplainError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve an LLM provider, from most-specific to least-specific:
///
/// 1. a pre-built `config.provider`, used as-is;
/// 2. `config.provider_name` with `model` (or [`DEFAULT_MODEL`]);
/// 3. `CLAIM_EXPLAIN_PROVIDER` + `CLAIM_EXPLAIN_MODEL` when both are set;
/// 4. OpenAI when `OPENAI_API_KEY` is present;
/// 5. whatever `ProviderFactory::from_env` detects.
pub fn resolve_provider(
    config: &ExplainerConfig,
    model: Option<&str>,
) -> Result<Arc<dyn LLMProvider>, ExplainError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model.unwrap_or(DEFAULT_MODEL));
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("CLAIM_EXPLAIN_PROVIDER"),
        std::env::var("CLAIM_EXPLAIN_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_provider(&prov, model.unwrap_or(&env_model));
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", model.unwrap_or(DEFAULT_MODEL));
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ExplainError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(apply_requested_model(llm_provider, model))
}

/// Re-create an auto-detected provider with the model the caller asked for.
///
/// `ProviderFactory::from_env` picks its own default model. If the detected
/// provider cannot be rebuilt by name, it is kept and the request is logged
/// as ignored.
fn apply_requested_model(
    detected: Arc<dyn LLMProvider>,
    model: Option<&str>,
) -> Arc<dyn LLMProvider> {
    let Some(model) = model else {
        return detected;
    };
    if detected.model() == model {
        return detected;
    }

    match create_provider(detected.name(), model) {
        Ok(provider) => {
            info!("Auto-detected provider '{}' using model '{}'", detected.name(), model);
            provider
        }
        Err(e) => {
            warn!(
                "Model '{}' ignored: auto-detected provider '{}' keeps '{}' ({})",
                model,
                detected.name(),
                detected.model(),
                e
            );
            detected
        }
    }
}
