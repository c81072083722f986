//! AI vision provider abstraction for invox.
//!
//! This crate abstracts over remote vision-capable generation APIs so the
//! extraction pipeline can run unchanged against Google Gemini
//! (`generateContent`) or OpenAI (chat completions). Both backends take an
//! instruction prompt plus one base64-encoded document image and return the
//! model's raw text answer, which is expected to be a JSON object.

pub mod backend;
pub mod error;

pub use backend::{
    create_provider, MockProvider, Provider, ProviderSettings, VisionProvider, VisionRequest,
    DEFAULT_TIMEOUT_SECS,
};
pub use backend::gemini::GeminiProvider;
pub use backend::openai::OpenAiProvider;
pub use error::{ProviderError, Result};
