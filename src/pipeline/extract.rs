//! Extraction dispatcher: per-kind strategy for getting text out of a file.
//!
//! | Kind      | Strategy                                                   |
//! |-----------|------------------------------------------------------------|
//! | PDF       | text layer; OCR of rendered pages if the layer is blank    |
//! | Image     | OCR, always                                                |
//! | PlainText | read verbatim                                              |
//!
//! Unsupported kinds never get here; the orchestrator stops before dispatch.

use crate::document::DocumentKind;
use crate::error::ExplainError;
use crate::outcome::{Extraction, ExtractionMethod};
use crate::pipeline::input::read_text_file;
use crate::pipeline::ocr::OcrEngine;
use crate::pipeline::pdf::PdfBackend;
use crate::progress::{ExplainProgress, Stage};
use image::imageops::FilterType;
use image::DynamicImage;
use std::path::Path;
use tracing::{debug, info};

/// The capabilities extraction may call on.
pub struct Extractors<'a> {
    pub pdf: &'a dyn PdfBackend,
    pub ocr: &'a dyn OcrEngine,
    pub progress: Option<&'a dyn ExplainProgress>,
    /// Longest edge, in pixels, of an image handed to OCR.
    pub max_image_pixels: u32,
}

impl Extractors<'_> {
    fn stage(&self, stage: Stage) {
        if let Some(cb) = self.progress {
            cb.on_stage(stage);
        }
    }
}

/// Extract text from `path` according to `kind`.
///
/// # Errors
/// I/O, decoding, pdfium, and OCR-capability failures. Finding no text is
/// not an error: the returned [`Extraction`] is simply blank.
pub async fn extract_text(
    path: &Path,
    kind: DocumentKind,
    ex: &Extractors<'_>,
) -> Result<Extraction, ExplainError> {
    match kind {
        DocumentKind::Pdf => extract_pdf(path, ex).await,
        DocumentKind::Image => extract_image(path, ex).await,
        DocumentKind::PlainText => {
            ex.stage(Stage::ReadingText);
            let text = read_text_file(path).await?;
            Ok(Extraction::new(text, ExtractionMethod::PlainText))
        }
        DocumentKind::Unsupported => Err(ExplainError::Internal(format!(
            "extract_text called on unsupported file '{}'",
            path.display()
        ))),
    }
}

/// Text layer first; OCR the rendered pages only when the layer is blank.
async fn extract_pdf(path: &Path, ex: &Extractors<'_>) -> Result<Extraction, ExplainError> {
    ex.stage(Stage::ReadingTextLayer);
    let pages = ex.pdf.text_layer(path).await?;
    let text = pages.concat();

    if !text.trim().is_empty() {
        info!(
            "PDF text layer: {} chars from {} pages",
            text.chars().count(),
            pages.len()
        );
        return Ok(Extraction::new(text.trim(), ExtractionMethod::TextLayer));
    }

    info!("PDF has no text layer; falling back to OCR");
    let images = ex.pdf.render_pages(path).await?;
    if let Some(cb) = ex.progress {
        cb.on_ocr_fallback(images.len());
    }

    ex.stage(Stage::RunningOcr);
    let text = ex.ocr.recognize(&images).await?;
    Ok(Extraction::new(text, ExtractionMethod::Ocr))
}

async fn extract_image(path: &Path, ex: &Extractors<'_>) -> Result<Extraction, ExplainError> {
    let owned = path.to_path_buf();
    let max_px = ex.max_image_pixels;
    let image = tokio::task::spawn_blocking(move || {
        decode_image(&owned).map(|img| fit_within(img, max_px))
    })
    .await
    .map_err(|e| ExplainError::Internal(format!("Image decode task panicked: {}", e)))?
    .map_err(|detail| ExplainError::ImageDecodeFailed {
        path: path.to_path_buf(),
        detail,
    })?;
    debug!("Decoded image {}x{}", image.width(), image.height());

    ex.stage(Stage::RunningOcr);
    let text = ex.ocr.recognize(std::slice::from_ref(&image)).await?;
    Ok(Extraction::new(text, ExtractionMethod::Ocr))
}

/// Downscale so neither edge exceeds `max_px`, keeping the aspect ratio.
///
/// Phone photos routinely run past 4000 px a side; vision APIs reject
/// payloads that large, and OCR gains nothing from the extra pixels.
pub fn fit_within(image: DynamicImage, max_px: u32) -> DynamicImage {
    if image.width() <= max_px && image.height() <= max_px {
        return image;
    }
    let resized = image.resize(max_px, max_px, FilterType::Lanczos3);
    debug!(
        "Downscaled image {}x{} → {}x{}",
        image.width(),
        image.height(),
        resized.width(),
        resized.height()
    );
    resized
}

/// Decode by content rather than extension, so a PNG saved as `.jpg` still opens.
fn decode_image(path: &Path) -> Result<DynamicImage, String> {
    image::ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| e.to_string())?
        .decode()
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_image_fits_within_cap() {
        let img = DynamicImage::new_rgb8(1200, 800);
        let out = fit_within(img, 300);
        assert_eq!((out.width(), out.height()), (300, 200));
    }

    #[test]
    fn tall_image_is_capped_on_height() {
        let img = DynamicImage::new_rgb8(400, 1000);
        let out = fit_within(img, 500);
        assert_eq!((out.width(), out.height()), (200, 500));
    }

    #[test]
    fn small_image_is_untouched() {
        let img = DynamicImage::new_rgb8(640, 480);
        let out = fit_within(img, 2000);
        assert_eq!((out.width(), out.height()), (640, 480));
    }
}
