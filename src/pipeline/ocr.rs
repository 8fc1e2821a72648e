//! OCR: turn page images into text with a vision model.
//!
//! Each image is PNG-encoded, wrapped as a base64 attachment, and sent to the
//! provider with [`crate::prompts::OCR_SYSTEM_PROMPT`]. Pages are transcribed
//! one after another and joined in order.
//!
//! A model that reads the page and finds nothing returns an empty string,
//! which is a normal result. A model call that fails outright is
//! [`ExplainError::OcrFailed`].

use crate::config::ExplainerConfig;
use crate::error::ExplainError;
use crate::pipeline::cleanup::{clean_ocr_text, join_pages};
use crate::pipeline::llm::{chat_with_retry, RetryPolicy};
use crate::prompts::OCR_SYSTEM_PROMPT;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use image::DynamicImage;
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, info};

/// An OCR capability.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Transcribe `pages` in order and return their combined text.
    ///
    /// An empty string means no legible text was found.
    async fn recognize(&self, pages: &[DynamicImage]) -> Result<String, ExplainError>;
}

/// [`OcrEngine`] backed by a vision-capable [`LLMProvider`].
pub struct VisionOcr {
    provider: Arc<dyn LLMProvider>,
    system_prompt: String,
    max_tokens: usize,
    retry: RetryPolicy,
}

impl VisionOcr {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ExplainerConfig) -> Self {
        Self {
            provider,
            system_prompt: config
                .ocr_prompt
                .clone()
                .unwrap_or_else(|| OCR_SYSTEM_PROMPT.to_string()),
            max_tokens: config.ocr_max_tokens,
            retry: RetryPolicy {
                max_retries: config.max_retries,
                backoff_ms: config.retry_backoff_ms,
            },
        }
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(0.0),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }

    async fn recognize_page(&self, page_num: usize, page: &DynamicImage) -> Result<String, ExplainError> {
        let image_data = encode_page(page).map_err(|e| ExplainError::OcrFailed {
            page: page_num,
            retries: 0,
            detail: format!("could not encode page image: {}", e),
        })?;

        let messages = vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user_with_images("", vec![image_data]),
        ];

        let label = format!("OCR page {}", page_num);
        let raw = chat_with_retry(&self.provider, &messages, &self.options(), self.retry, &label)
            .await
            .map_err(|detail| ExplainError::OcrFailed {
                page: page_num,
                retries: self.retry.max_retries,
                detail,
            })?;

        Ok(clean_ocr_text(&raw))
    }
}

#[async_trait]
impl OcrEngine for VisionOcr {
    async fn recognize(&self, pages: &[DynamicImage]) -> Result<String, ExplainError> {
        let mut texts = Vec::with_capacity(pages.len());
        for (idx, page) in pages.iter().enumerate() {
            let text = self.recognize_page(idx + 1, page).await?;
            debug!("OCR page {}: {} chars", idx + 1, text.chars().count());
            texts.push(text);
        }

        let joined = join_pages(&texts);
        info!(
            "OCR recognised {} chars across {} pages",
            joined.chars().count(),
            pages.len()
        );
        Ok(joined)
    }
}

/// Encode an image as a base64 PNG attachment.
///
/// PNG rather than JPEG: compression artefacts around small glyphs hurt
/// transcription far more than the larger payload does. `detail: "high"`
/// lets OpenAI-style models tile the image instead of reading a single
/// downscaled overview.
pub fn encode_page(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::llm::testing::ScriptedProvider;
    use image::{Rgba, RgbaImage};

    fn page() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255])))
    }

    fn ocr_over(provider: &Arc<ScriptedProvider>) -> VisionOcr {
        let config = ExplainerConfig::builder()
            .retry_backoff_ms(0)
            .build()
            .unwrap();
        VisionOcr::new(provider.clone(), &config)
    }

    #[test]
    fn encodes_png_attachment() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 4, Rgba([0, 0, 0, 255])));
        let data = encode_page(&img).expect("encode should succeed");
        assert_eq!(data.mime_type, "image/png");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert_eq!(&decoded[1..4], b"PNG");
    }

    #[tokio::test]
    async fn pages_are_joined_in_order_without_blanks() {
        let provider = ScriptedProvider::new(vec![
            Ok("Page one"),
            Ok("   \n"),
            Ok("```text\nPage three\n```"),
        ]);
        let ocr = ocr_over(&provider);

        let text = ocr.recognize(&[page(), page(), page()]).await.unwrap();

        assert_eq!(text, "Page one\n\nPage three");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn sends_one_image_per_call_with_deterministic_options() {
        let provider = ScriptedProvider::new(vec![Ok("CLAIM FORM")]);
        let ocr = ocr_over(&provider);

        ocr.recognize(&[page()]).await.unwrap();

        let call = &provider.calls()[0];
        let options = call.options.as_ref().expect("options are always sent");
        assert_eq!(options.temperature, Some(0.0));
        assert_eq!(options.max_tokens, Some(4096));
        assert_eq!(call.messages[0].content, OCR_SYSTEM_PROMPT);
        let images = call.messages[1].images.as_ref().expect("page attached");
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].mime_type, "image/png");
    }

    #[tokio::test]
    async fn failing_page_is_ocr_failed_after_retries() {
        // Page 1 succeeds; page 2 fails its first attempt and both retries.
        let provider = ScriptedProvider::new(vec![
            Ok("Page one"),
            Err("503"),
            Err("503"),
            Err("503"),
        ]);
        let ocr = ocr_over(&provider);

        let err = ocr.recognize(&[page(), page()]).await.unwrap_err();

        match err {
            ExplainError::OcrFailed { page, retries, .. } => {
                assert_eq!(page, 2);
                assert_eq!(retries, 2);
            }
            other => panic!("expected OcrFailed, got {other:?}"),
        }
        assert_eq!(provider.call_count(), 4);
    }

    #[tokio::test]
    async fn unencodable_page_is_ocr_failed_without_a_call() {
        let provider = ScriptedProvider::new(vec![Ok("unused")]);
        let ocr = ocr_over(&provider);

        let err = ocr.recognize(&[DynamicImage::new_rgb8(0, 0)]).await.unwrap_err();

        assert!(matches!(err, ExplainError::OcrFailed { page: 1, .. }));
        assert_eq!(provider.call_count(), 0);
    }
}
