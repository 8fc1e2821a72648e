//! PDF access via pdfium: text-layer extraction and page rasterisation.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and must not run on async worker threads. Every call here moves the
//! work onto tokio's blocking pool.
//!
//! ## Why a trait?
//!
//! The orchestrator only needs two questions answered about a PDF: "what text
//! does its text layer hold?" and "what do its pages look like?". Hiding
//! pdfium behind [`PdfBackend`] keeps the fallback logic testable without a
//! pdfium shared library on the test machine.

use crate::config::ExplainerConfig;
use crate::error::ExplainError;
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Read access to a PDF document.
#[async_trait]
pub trait PdfBackend: Send + Sync {
    /// Text layer of every page, in document order. Pages without a text
    /// layer yield an empty string rather than an error.
    async fn text_layer(&self, pdf_path: &Path) -> Result<Vec<String>, ExplainError>;

    /// Every page rasterised to an image, in document order.
    async fn render_pages(&self, pdf_path: &Path) -> Result<Vec<DynamicImage>, ExplainError>;
}

/// [`PdfBackend`] backed by a pdfium shared library.
#[derive(Debug, Clone)]
pub struct PdfiumBackend {
    library: Option<PathBuf>,
    password: Option<String>,
    dpi: u32,
    max_rendered_pixels: u32,
}

impl PdfiumBackend {
    pub fn new(config: &ExplainerConfig) -> Self {
        Self {
            library: config.pdfium_library.clone(),
            password: config.password.clone(),
            dpi: config.dpi,
            max_rendered_pixels: config.max_rendered_pixels,
        }
    }

    /// Check that a pdfium library can be bound, without opening a document.
    ///
    /// Called once while models load so a missing library fails at start-up
    /// rather than on the first PDF.
    pub fn probe(&self) -> Result<(), ExplainError> {
        bind_pdfium(self.library.as_deref()).map(|_| ())
    }
}

#[async_trait]
impl PdfBackend for PdfiumBackend {
    async fn text_layer(&self, pdf_path: &Path) -> Result<Vec<String>, ExplainError> {
        let path = pdf_path.to_path_buf();
        let library = self.library.clone();
        let password = self.password.clone();

        tokio::task::spawn_blocking(move || {
            text_layer_blocking(&path, library.as_deref(), password.as_deref())
        })
        .await
        .map_err(|e| ExplainError::Internal(format!("Text-layer task panicked: {}", e)))?
    }

    async fn render_pages(&self, pdf_path: &Path) -> Result<Vec<DynamicImage>, ExplainError> {
        let path = pdf_path.to_path_buf();
        let backend = self.clone();

        tokio::task::spawn_blocking(move || backend.render_pages_blocking(&path))
            .await
            .map_err(|e| ExplainError::Internal(format!("Render task panicked: {}", e)))?
    }
}

impl PdfiumBackend {
    fn render_pages_blocking(&self, pdf_path: &Path) -> Result<Vec<DynamicImage>, ExplainError> {
        let pdfium = bind_pdfium(self.library.as_deref())?;
        let document = pdfium
            .load_pdf_from_file(pdf_path, self.password.as_deref())
            .map_err(|e| map_load_error(pdf_path, self.password.is_some(), e))?;

        let max_px = self.max_rendered_pixels as i32;
        let render_config = PdfRenderConfig::new()
            .scale_page_by_factor(self.dpi as f32 / 72.0)
            .set_maximum_width(max_px)
            .set_maximum_height(max_px);

        let pages = document.pages();
        let mut images = Vec::with_capacity(pages.len() as usize);

        for (idx, page) in pages.iter().enumerate() {
            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                ExplainError::RasterisationFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );
            images.push(image);
        }

        info!("Rendered {} pages for OCR", images.len());
        Ok(images)
    }
}

/// Blocking implementation of text-layer extraction.
fn text_layer_blocking(
    pdf_path: &Path,
    library: Option<&Path>,
    password: Option<&str>,
) -> Result<Vec<String>, ExplainError> {
    let pdfium = bind_pdfium(library)?;
    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| map_load_error(pdf_path, password.is_some(), e))?;

    let mut texts = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let text = match page.text() {
            Ok(t) => t.all(),
            Err(e) => {
                warn!("Page {}: no readable text layer ({:?})", idx + 1, e);
                String::new()
            }
        };
        texts.push(text);
    }

    debug!(
        "Text layer: {} pages, {} chars",
        texts.len(),
        texts.iter().map(|t| t.chars().count()).sum::<usize>()
    );
    Ok(texts)
}

/// Bind to pdfium: explicit path, then `PDFIUM_LIB_PATH`, then the system loader.
///
/// A path may name the library file itself or the directory containing it.
pub fn bind_pdfium(library: Option<&Path>) -> Result<Pdfium, ExplainError> {
    let explicit = library
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

    let bindings = match explicit {
        Some(path) => {
            let file = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from {}", file.display());
            Pdfium::bind_to_library(&file)
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ExplainError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Translate a pdfium load failure into the matching error variant.
fn map_load_error(pdf_path: &Path, had_password: bool, e: PdfiumError) -> ExplainError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if had_password {
            ExplainError::WrongPassword {
                path: pdf_path.to_path_buf(),
            }
        } else {
            ExplainError::PasswordRequired {
                path: pdf_path.to_path_buf(),
            }
        }
    } else {
        ExplainError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: err_str,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_copies_render_settings() {
        let config = ExplainerConfig::builder()
            .dpi(200)
            .max_rendered_pixels(1600)
            .password("secret")
            .build()
            .unwrap();
        let backend = PdfiumBackend::new(&config);
        assert_eq!(backend.dpi, 200);
        assert_eq!(backend.max_rendered_pixels, 1600);
        assert_eq!(backend.password.as_deref(), Some("secret"));
    }

    #[test]
    fn missing_library_is_a_binding_error() {
        let result = bind_pdfium(Some(Path::new("/definitely/not/libpdfium.so")));
        assert!(matches!(result, Err(ExplainError::PdfiumBindingFailed(_))));
    }
}
