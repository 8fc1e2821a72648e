//! Summarisation adapter: bounded input, bounded output, deterministic decoding.
//!
//! [`summarize_claim`] enforces the adapter contract around any
//! [`Summarizer`]:
//!
//! - blank input never reaches the model and yields
//!   [`Outcome::NoTextDetected`];
//! - only the first `max_input_chars` characters are sent;
//! - the summary is trimmed, and an empty answer is treated as a failure
//!   rather than passed off as a summary.

use crate::config::ExplainerConfig;
use crate::error::ExplainError;
use crate::outcome::Outcome;
use crate::pipeline::llm::{chat_with_retry, RetryPolicy};
use crate::prompts::{summary_request, SUMMARY_SYSTEM_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use tracing::{debug, info};

/// Requested summary length, in model tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryBounds {
    pub min_tokens: usize,
    pub max_tokens: usize,
}

impl SummaryBounds {
    pub fn from_config(config: &ExplainerConfig) -> Self {
        Self {
            min_tokens: config.min_summary_tokens,
            max_tokens: config.max_summary_tokens,
        }
    }
}

/// A summarisation capability.
///
/// Implementations must decode deterministically: identical input and bounds
/// produce identical output.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, bounds: SummaryBounds) -> Result<String, ExplainError>;
}

/// [`Summarizer`] backed by a chat-completion [`LLMProvider`].
pub struct LlmSummarizer {
    provider: Arc<dyn LLMProvider>,
    system_prompt: String,
    retry: RetryPolicy,
}

impl LlmSummarizer {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ExplainerConfig) -> Self {
        Self {
            provider,
            system_prompt: config
                .summary_prompt
                .clone()
                .unwrap_or_else(|| SUMMARY_SYSTEM_PROMPT.to_string()),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                backoff_ms: config.retry_backoff_ms,
            },
        }
    }
}

/// Completion options for a summary: greedy decoding, capped length.
pub fn summary_options(bounds: SummaryBounds) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(0.0),
        max_tokens: Some(bounds.max_tokens),
        ..Default::default()
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, text: &str, bounds: SummaryBounds) -> Result<String, ExplainError> {
        let messages = vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user(summary_request(text, bounds.min_tokens, bounds.max_tokens)),
        ];

        chat_with_retry(
            &self.provider,
            &messages,
            &summary_options(bounds),
            self.retry,
            "Summary",
        )
        .await
        .map_err(|detail| ExplainError::SummarizationFailed {
            retries: self.retry.max_retries,
            detail,
        })
    }
}

/// The first `max_chars` characters of `text`, and whether anything was cut.
///
/// Counts Unicode scalar values, so a multi-byte character is never split.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

/// Summarise extracted claim text under the adapter contract.
pub async fn summarize_claim(
    text: &str,
    summarizer: &dyn Summarizer,
    config: &ExplainerConfig,
) -> Result<Outcome, ExplainError> {
    if text.trim().is_empty() {
        debug!("Summary skipped: input is blank");
        return Ok(Outcome::NoTextDetected);
    }

    let (input, truncated) = truncate_chars(text, config.max_input_chars);
    if truncated {
        info!(
            "Input truncated to {} of {} chars",
            config.max_input_chars,
            text.chars().count()
        );
    }

    let summary = summarizer
        .summarize(input, SummaryBounds::from_config(config))
        .await?;
    let summary = summary.trim();

    if summary.is_empty() {
        return Err(ExplainError::SummarizationFailed {
            retries: 0,
            detail: "model returned an empty summary".into(),
        });
    }

    Ok(Outcome::Summary {
        text: summary.to_string(),
    })
}
