//! PDF page rendering behind a trait seam.
//!
//! The production renderer is backed by PDFium, loaded dynamically at call
//! time; tests use [`MockPageRenderer`] so no native library is required.

use std::io::Cursor;

use pdfium_render::prelude::*;
use tracing::debug;

use crate::error::DocumentError;
use crate::models::config::RenderConfig;

/// PDF points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Renders the first page of a PDF to PNG bytes.
pub trait PageRenderer: Send + Sync {
    fn render_first_page(
        &self,
        pdf_bytes: &[u8],
        config: &RenderConfig,
    ) -> Result<Vec<u8>, DocumentError>;
}

/// Production renderer backed by PDFium.
///
/// The library handle is loaded per call because the upstream `Pdfium`
/// type is `!Send`; the OS caches repeated dynamic-library loads.
#[derive(Default)]
pub struct PdfiumRenderer;

impl PdfiumRenderer {
    pub fn new() -> Self {
        Self
    }
}

/// Load the PDFium dynamic library.
///
/// Discovery order: `PDFIUM_DYNAMIC_LIB_PATH` env var, then the system
/// library search paths.
fn load_pdfium() -> Result<Pdfium, DocumentError> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let bindings = Pdfium::bind_to_library(&path).map_err(|e| {
            DocumentError::RendererUnavailable(format!(
                "failed to load PDFium from {path}: {e}"
            ))
        })?;
        return Ok(Pdfium::new(bindings));
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|e| {
        DocumentError::RendererUnavailable(format!(
            "PDFium library not found; set PDFIUM_DYNAMIC_LIB_PATH or install PDFium: {e}"
        ))
    })?;
    Ok(Pdfium::new(bindings))
}

/// Map PDF open errors, detecting encrypted documents.
fn map_load_error(e: PdfiumError) -> DocumentError {
    let message = e.to_string();
    let lower = message.to_lowercase();
    if lower.contains("password") || lower.contains("encrypt") {
        DocumentError::Encrypted
    } else {
        DocumentError::Render(format!("failed to open PDF: {message}"))
    }
}

/// Pixel dimensions for a page at the requested DPI, capped so a single
/// page cannot produce an oversized provider payload.
fn target_dimensions(
    width_points: f32,
    height_points: f32,
    config: &RenderConfig,
) -> (u32, u32) {
    let scale = config.dpi as f32 / POINTS_PER_INCH;
    let width = (width_points * scale).max(1.0);
    let height = (height_points * scale).max(1.0);

    let longest = width.max(height);
    let cap = config.max_dimension_px as f32;
    if longest <= cap {
        return (width as u32, height as u32);
    }

    let ratio = cap / longest;
    (
        ((width * ratio) as u32).clamp(1, config.max_dimension_px),
        ((height * ratio) as u32).clamp(1, config.max_dimension_px),
    )
}

impl PageRenderer for PdfiumRenderer {
    fn render_first_page(
        &self,
        pdf_bytes: &[u8],
        config: &RenderConfig,
    ) -> Result<Vec<u8>, DocumentError> {
        let pdfium = load_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf_bytes, None)
            .map_err(map_load_error)?;

        let pages = document.pages();
        if pages.len() == 0 {
            return Err(DocumentError::NoPages);
        }

        let page = pages
            .get(0)
            .map_err(|e| DocumentError::Render(format!("failed to load first page: {e}")))?;

        let (width, height) =
            target_dimensions(page.width().value, page.height().value, config);

        let render_config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_maximum_height(height as i32);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| DocumentError::Render(format!("rendering failed: {e}")))?;

        let mut png = Vec::new();
        bitmap
            .as_image()
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| DocumentError::Render(format!("PNG encoding failed: {e}")))?;

        debug!(width, height, png_size = png.len(), "Rendered first PDF page");
        Ok(png)
    }
}

/// Test renderer returning fixed PNG bytes, or a configured failure.
pub struct MockPageRenderer {
    png: Vec<u8>,
    failure: Option<String>,
}

impl MockPageRenderer {
    pub fn new(png: Vec<u8>) -> Self {
        Self { png, failure: None }
    }

    /// A 1x1 white PNG, enough for pipeline tests.
    pub fn tiny() -> Self {
        let mut png = Vec::new();
        let pixel = image::Rgba([255u8, 255, 255, 255]);
        let buffer = image::RgbaImage::from_pixel(1, 1, pixel);
        // Encoding a 1x1 in-memory buffer cannot fail.
        let _ = image::DynamicImage::ImageRgba8(buffer)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png);
        Self::new(png)
    }

    /// A renderer that fails every call with the given message.
    pub fn failing(message: &str) -> Self {
        Self {
            png: Vec::new(),
            failure: Some(message.to_string()),
        }
    }
}

impl PageRenderer for MockPageRenderer {
    fn render_first_page(
        &self,
        _pdf_bytes: &[u8],
        _config: &RenderConfig,
    ) -> Result<Vec<u8>, DocumentError> {
        if let Some(message) = &self.failure {
            return Err(DocumentError::Render(message.clone()));
        }
        Ok(self.png.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn letter_page_at_200_dpi() {
        let config = RenderConfig::default();
        // US Letter: 612 x 792 points.
        let (w, h) = target_dimensions(612.0, 792.0, &config);
        assert_eq!((w, h), (1700, 2200));
    }

    #[test]
    fn oversized_page_is_capped_preserving_aspect() {
        let config = RenderConfig {
            dpi: 600,
            max_dimension_px: 4096,
        };
        let (w, h) = target_dimensions(612.0, 792.0, &config);
        assert_eq!(h, 4096);
        assert!(w < h);
        // Aspect ratio survives within rounding error.
        let expected_w = (612.0 / 792.0 * 4096.0) as u32;
        assert!((w as i64 - expected_w as i64).abs() <= 1);
    }

    #[test]
    fn degenerate_page_still_renders_one_pixel() {
        let config = RenderConfig::default();
        let (w, h) = target_dimensions(0.0, 0.0, &config);
        assert_eq!((w, h), (1, 1));
    }

    #[test]
    fn mock_returns_configured_bytes() {
        let renderer = MockPageRenderer::new(vec![9, 9, 9]);
        let out = renderer
            .render_first_page(b"%PDF", &RenderConfig::default())
            .unwrap();
        assert_eq!(out, vec![9, 9, 9]);
    }

    #[test]
    fn tiny_mock_produces_a_png() {
        let renderer = MockPageRenderer::tiny();
        let out = renderer
            .render_first_page(b"%PDF", &RenderConfig::default())
            .unwrap();
        // PNG magic bytes.
        assert_eq!(&out[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn failing_mock_returns_render_error() {
        let renderer = MockPageRenderer::failing("boom");
        let err = renderer
            .render_first_page(b"%PDF", &RenderConfig::default())
            .unwrap_err();
        assert!(matches!(err, DocumentError::Render(_)));
    }
}
