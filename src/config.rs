//! Configuration types for claim explanation.
//!
//! Every knob lives in [`ExplainerConfig`], built via its
//! [`ExplainerConfigBuilder`]. Defaults: 3000 input characters, summaries
//! between 40 and 130 tokens, deterministic decoding.

use crate::error::ExplainError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default cap on characters passed to the summariser.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 3000;
/// Default lower bound on summary length, in tokens.
pub const DEFAULT_MIN_SUMMARY_TOKENS: usize = 40;
/// Default upper bound on summary length, in tokens.
pub const DEFAULT_MAX_SUMMARY_TOKENS: usize = 130;

/// Configuration for the extraction and summarisation pipeline.
///
/// # Example
/// ```rust
/// use claim_explainer::ExplainerConfig;
///
/// let config = ExplainerConfig::builder()
///     .model("gpt-4.1-nano")
///     .max_input_chars(2000)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_input_chars, 2000);
/// ```
#[derive(Clone)]
pub struct ExplainerConfig {
    /// Rendering DPI used when rasterising PDF pages for OCR. Range: 72–400. Default: 150.
    pub dpi: u32,

    /// Maximum rendered image dimension in pixels. Default: 2000.
    ///
    /// Caps either edge of every image sent to OCR: rasterised PDF pages and
    /// decoded photos or scans alike. Larger images are downscaled with their
    /// aspect ratio kept, so a 12 MP phone photo never becomes a payload the
    /// vision provider rejects.
    pub max_rendered_pixels: u32,

    /// LLM model used for summarisation. If None, uses the provider default.
    pub model: Option<String>,

    /// Vision model used for OCR. If None, falls back to `model`.
    pub ocr_model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Only this many leading characters are summarised. Default: 3000.
    ///
    /// Text beyond the cap is dropped silently; the summariser's context
    /// window is the constraint.
    pub max_input_chars: usize,

    /// Requested minimum summary length in tokens. Default: 40.
    pub min_summary_tokens: usize,

    /// Maximum summary length in tokens, sent as `max_tokens`. Default: 130.
    pub max_summary_tokens: usize,

    /// Maximum tokens the vision model may produce per OCR'd page. Default: 4096.
    pub ocr_max_tokens: usize,

    /// Retry attempts on a transient provider failure. Default: 2.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit path to the pdfium shared library.
    ///
    /// If None, `PDFIUM_LIB_PATH` is consulted, then the system loader.
    pub pdfium_library: Option<PathBuf>,

    /// Custom OCR system prompt. If None, uses [`crate::prompts::OCR_SYSTEM_PROMPT`].
    pub ocr_prompt: Option<String>,

    /// Custom summarisation system prompt. If None, uses
    /// [`crate::prompts::SUMMARY_SYSTEM_PROMPT`].
    pub summary_prompt: Option<String>,

    /// Optional stage-progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            max_rendered_pixels: 2000,
            model: None,
            ocr_model: None,
            provider_name: None,
            provider: None,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            min_summary_tokens: DEFAULT_MIN_SUMMARY_TOKENS,
            max_summary_tokens: DEFAULT_MAX_SUMMARY_TOKENS,
            ocr_max_tokens: 4096,
            max_retries: 2,
            retry_backoff_ms: 500,
            password: None,
            pdfium_library: None,
            ocr_prompt: None,
            summary_prompt: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExplainerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplainerConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("model", &self.model)
            .field("ocr_model", &self.ocr_model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("max_input_chars", &self.max_input_chars)
            .field("min_summary_tokens", &self.min_summary_tokens)
            .field("max_summary_tokens", &self.max_summary_tokens)
            .field("ocr_max_tokens", &self.ocr_max_tokens)
            .field("max_retries", &self.max_retries)
            .field("pdfium_library", &self.pdfium_library)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExplainProgress>"),
            )
            .finish()
    }
}

impl ExplainerConfig {
    /// Create a new builder for `ExplainerConfig`.
    pub fn builder() -> ExplainerConfigBuilder {
        ExplainerConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model used for OCR calls: `ocr_model`, else `model`.
    pub fn ocr_model_or_default(&self) -> Option<&str> {
        self.ocr_model.as_deref().or(self.model.as_deref())
    }
}

/// Builder for [`ExplainerConfig`].
pub struct ExplainerConfigBuilder {
    config: ExplainerConfig,
}

impl fmt::Debug for ExplainerConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplainerConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ExplainerConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn ocr_model(mut self, model: impl Into<String>) -> Self {
        self.config.ocr_model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn max_input_chars(mut self, n: usize) -> Self {
        self.config.max_input_chars = n;
        self
    }

    pub fn min_summary_tokens(mut self, n: usize) -> Self {
        self.config.min_summary_tokens = n;
        self
    }

    pub fn max_summary_tokens(mut self, n: usize) -> Self {
        self.config.max_summary_tokens = n;
        self
    }

    pub fn ocr_max_tokens(mut self, n: usize) -> Self {
        self.config.ocr_max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn ocr_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.ocr_prompt = Some(prompt.into());
        self
    }

    pub fn summary_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.summary_prompt = Some(prompt.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExplainerConfig, ExplainError> {
        let c = &self.config;
        if c.max_input_chars == 0 {
            return Err(ExplainError::InvalidConfig(
                "max_input_chars must be ≥ 1".into(),
            ));
        }
        if c.max_summary_tokens == 0 {
            return Err(ExplainError::InvalidConfig(
                "max_summary_tokens must be ≥ 1".into(),
            ));
        }
        if c.min_summary_tokens > c.max_summary_tokens {
            return Err(ExplainError::InvalidConfig(format!(
                "min_summary_tokens ({}) exceeds max_summary_tokens ({})",
                c.min_summary_tokens, c.max_summary_tokens
            )));
        }
        if c.ocr_max_tokens == 0 {
            return Err(ExplainError::InvalidConfig(
                "ocr_max_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_3000_chars_and_40_to_130_tokens() {
        let c = ExplainerConfig::default();
        assert_eq!(c.max_input_chars, 3000);
        assert_eq!(c.min_summary_tokens, 40);
        assert_eq!(c.max_summary_tokens, 130);
    }

    #[test]
    fn builder_clamps_dpi() {
        let c = ExplainerConfig::builder().dpi(10).build().unwrap();
        assert_eq!(c.dpi, 72);
        let c = ExplainerConfig::builder().dpi(9000).build().unwrap();
        assert_eq!(c.dpi, 400);
    }

    #[test]
    fn rejects_inverted_summary_bounds() {
        let err = ExplainerConfig::builder()
            .min_summary_tokens(200)
            .max_summary_tokens(100)
            .build()
            .unwrap_err();
        assert!(matches!(err, ExplainError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_zero_input_cap() {
        assert!(ExplainerConfig::builder().max_input_chars(0).build().is_err());
    }

    #[test]
    fn ocr_model_falls_back_to_model() {
        let c = ExplainerConfig::builder().model("gpt-4.1-mini").build().unwrap();
        assert_eq!(c.ocr_model_or_default(), Some("gpt-4.1-mini"));
        let c = ExplainerConfig::builder()
            .model("gpt-4.1-mini")
            .ocr_model("gpt-4.1")
            .build()
            .unwrap();
        assert_eq!(c.ocr_model_or_default(), Some("gpt-4.1"));
    }

    #[test]
    fn debug_hides_provider() {
        let c = ExplainerConfig::default();
        let s = format!("{:?}", c);
        assert!(s.contains("max_input_chars"));
    }
}
