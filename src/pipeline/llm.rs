//! Provider calls with bounded retry, shared by OCR and summarisation.
//!
//! HTTP 429 / 503 errors from LLM APIs are usually transient. Exponential
//! backoff (`retry_backoff_ms * 2^attempt`) spaces out the retries: with a
//! 500 ms base and 2 retries the waits are 500 ms then 1 s. Once retries run
//! out the last error is handed back and the caller turns it into a fatal
//! [`crate::error::ExplainError`].

use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Retry budget for one logical request.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_ms: u64,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based; 0 is treated as 1).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        Duration::from_millis(self.backoff_ms.saturating_mul(2u64.saturating_pow(exponent)))
    }
}

/// Send `messages` to `provider`, retrying failed attempts per `policy`.
///
/// Returns the response content, or the last error message once every
/// attempt has failed. `label` identifies the request in log lines.
pub async fn chat_with_retry(
    provider: &Arc<dyn LLMProvider>,
    messages: &[ChatMessage],
    options: &CompletionOptions,
    policy: RetryPolicy,
    label: &str,
) -> Result<String, String> {
    let start = Instant::now();
    let mut last_err: Option<String> = None;

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let backoff = policy.backoff_for(attempt);
            warn!(
                "{}: retry {}/{} after {}ms",
                label,
                attempt,
                policy.max_retries,
                backoff.as_millis()
            );
            sleep(backoff).await;
        }

        match provider.chat(messages, Some(options)).await {
            Ok(response) => {
                debug!(
                    "{}: {} input tokens, {} output tokens, {:?}",
                    label,
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                return Ok(response.content);
            }
            Err(e) => {
                let err_msg = format!("{}", e);
                warn!("{}: attempt {} failed: {}", label, attempt + 1, err_msg);
                last_err = Some(err_msg);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| "Unknown error".to_string()))
}

/// Scripted provider shared by the adapter tests.
#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use edgequake_llm::traits::LLMResponse;
    use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, LlmError};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// One `chat` call as the provider saw it.
    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub messages: Vec<ChatMessage>,
        pub options: Option<CompletionOptions>,
    }

    /// Answers `chat` from a script, one entry per call. An `Err` entry fails
    /// that attempt; once the script runs out every call fails.
    pub struct ScriptedProvider {
        name: String,
        script: Mutex<VecDeque<Result<String, String>>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedProvider {
        pub fn new(script: Vec<Result<&str, &str>>) -> Arc<Self> {
            Self::named("scripted", script)
        }

        pub fn named(name: &str, script: Vec<Result<&str, &str>>) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                script: Mutex::new(
                    script
                        .into_iter()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn model(&self) -> &str {
            "scripted-model"
        }

        fn max_context_length(&self) -> usize {
            8192
        }

        async fn complete(&self, prompt: &str) -> edgequake_llm::Result<LLMResponse> {
            self.chat(&[ChatMessage::user(prompt)], None).await
        }

        async fn complete_with_options(
            &self,
            prompt: &str,
            options: &CompletionOptions,
        ) -> edgequake_llm::Result<LLMResponse> {
            self.chat(&[ChatMessage::user(prompt)], Some(options)).await
        }

        async fn chat(
            &self,
            messages: &[ChatMessage],
            options: Option<&CompletionOptions>,
        ) -> edgequake_llm::Result<LLMResponse> {
            self.calls.lock().unwrap().push(RecordedCall {
                messages: messages.to_vec(),
                options: options.cloned(),
            });
            match self.script.lock().unwrap().pop_front() {
                Some(Ok(content)) => Ok(LLMResponse::new(content, "scripted-model")),
                Some(Err(detail)) => Err(LlmError::ApiError(detail)),
                None => Err(LlmError::ApiError("script exhausted".into())),
            }
        }
    }
}
