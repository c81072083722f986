//! Error types for the invox-core library.

use thiserror::Error;

/// Main error type for the invox library.
#[derive(Error, Debug)]
pub enum InvoxError {
    /// Document loading or conversion error.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Prompt library error.
    #[error("prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// AI response interpretation error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Error from the provider layer.
    #[error("provider error: {0}")]
    Provider(#[from] invox_providers::ProviderError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to document loading and conversion.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The file extension is not a supported document format.
    #[error("unsupported document format: {0}")]
    Unsupported(String),

    /// The PDF is encrypted and cannot be rendered.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Page rendering failed.
    #[error("failed to render page: {0}")]
    Render(String),

    /// The PDF rendering library could not be loaded.
    #[error("PDF renderer unavailable: {0}")]
    RendererUnavailable(String),
}

/// Errors related to the prompt library.
#[derive(Error, Debug)]
pub enum PromptError {
    /// Two templates share the same code.
    #[error("duplicate prompt code: {0}")]
    DuplicateCode(String),

    /// No template exists for the requested code.
    #[error("unknown prompt code: {0}")]
    UnknownCode(String),
}

/// Errors related to interpreting the AI response.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The response contained no JSON object.
    #[error("no JSON object found in model response")]
    NoJson,

    /// The JSON did not match the expected extraction shape.
    #[error("failed to parse model response: {0}")]
    Parse(String),
}

/// Result type for the invox library.
pub type Result<T> = std::result::Result<T, InvoxError>;
