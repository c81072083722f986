//! Document loading and conversion for vision extraction.
//!
//! Uploaded documents arrive as PDFs or images. The vision providers want
//! a single image, so PDFs have their first page rendered to PNG while
//! images pass through unchanged in their original format.

pub mod render;

use std::path::Path;

use base64::Engine as _;
use tracing::debug;

use crate::error::{DocumentError, Result};
use crate::models::config::RenderConfig;
use render::PageRenderer;

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Png,
    Jpeg,
    Webp,
    Tiff,
    Bmp,
}

impl DocumentKind {
    /// Detect the kind from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            "tiff" | "tif" => Some(Self::Tiff),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Mime type for the kind.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Tiff => "image/tiff",
            Self::Bmp => "image/bmp",
        }
    }

    pub fn is_pdf(&self) -> bool {
        matches!(self, Self::Pdf)
    }
}

/// An uploaded document with its raw bytes.
#[derive(Debug, Clone)]
pub struct DocumentFile {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub kind: DocumentKind,
}

impl DocumentFile {
    /// Load a document from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string();
        let bytes = std::fs::read(path)?;
        Self::from_bytes(filename, bytes)
    }

    /// Wrap already-loaded bytes, sniffing the kind from the filename.
    pub fn from_bytes(filename: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let filename = filename.into();
        let ext = Path::new(&filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        let kind = DocumentKind::from_extension(ext)
            .ok_or_else(|| DocumentError::Unsupported(ext.to_string()))?;

        Ok(Self {
            filename,
            bytes,
            kind,
        })
    }
}

/// An image payload ready for a vision model.
#[derive(Debug, Clone)]
pub struct VisionImage {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

impl VisionImage {
    /// Base64 encoding of the payload for the provider call.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

/// Convert an uploaded document into a vision payload.
pub fn convert_for_vision(
    document: &DocumentFile,
    config: &RenderConfig,
    renderer: &dyn PageRenderer,
) -> Result<VisionImage> {
    if document.kind.is_pdf() {
        let png = renderer.render_first_page(&document.bytes, config)?;
        debug!(
            file = %document.filename,
            png_size = png.len(),
            "Rendered PDF page for vision call"
        );
        return Ok(VisionImage {
            bytes: png,
            mime: "image/png",
        });
    }

    Ok(VisionImage {
        bytes: document.bytes.clone(),
        mime: document.kind.mime(),
    })
}
