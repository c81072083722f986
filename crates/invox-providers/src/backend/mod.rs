//! Provider backend implementations.

pub mod gemini;
pub mod openai;

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{ProviderError, Result};

/// Default request timeout for provider calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Remote AI provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Gemini via `models.generateContent`.
    Google,
    /// OpenAI via chat completions.
    OpenAi,
}

impl Provider {
    /// Short identifier used in prompt template codes and config files.
    pub fn code(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::OpenAi => "openai",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A single vision extraction request.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    /// Model name, e.g. `gemini-1.5-flash-002` or `gpt-4o`.
    pub model: String,
    /// Instruction text selected from the prompt library.
    pub prompt: String,
    /// Base64-encoded image payload.
    pub image_base64: String,
    /// Mime type of the encoded image.
    pub image_mime: String,
}

/// Connection settings shared by all backends.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Credential for the remote API.
    pub api_key: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Endpoint override; tests point this at a local mock server.
    pub base_url: Option<String>,
}

impl ProviderSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: None,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
}

/// Trait for vision-capable generation backends.
///
/// This trait abstracts over the two supported remote APIs, allowing the
/// digitization pipeline to stay provider-agnostic. Implementations send
/// one image plus an instruction prompt and return the model's raw text
/// answer without interpreting it.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Run one extraction request against the remote model.
    async fn extract(&self, request: &VisionRequest) -> Result<String>;

    /// Provider name used in logs and error messages.
    fn name(&self) -> &'static str;
}

/// Build the backend for a provider selection.
///
/// Fails with [`ProviderError::MissingApiKey`] when the key is empty so the
/// caller surfaces a configuration problem before any network traffic.
pub fn create_provider(
    provider: Provider,
    settings: ProviderSettings,
) -> Result<Box<dyn VisionProvider>> {
    if settings.api_key.trim().is_empty() {
        return Err(ProviderError::MissingApiKey);
    }

    Ok(match provider {
        Provider::Google => Box::new(gemini::GeminiProvider::new(settings)?),
        Provider::OpenAi => Box::new(openai::OpenAiProvider::new(settings)?),
    })
}

/// Map a reqwest transport failure to the provider error taxonomy.
pub(crate) fn map_send_error(
    e: reqwest::Error,
    endpoint: &str,
    timeout_secs: u64,
) -> ProviderError {
    if e.is_connect() {
        ProviderError::Connect(endpoint.to_string())
    } else if e.is_timeout() {
        ProviderError::Timeout(timeout_secs)
    } else {
        ProviderError::Http(e.to_string())
    }
}

/// Normalize a configured base URL, falling back to the backend default.
pub(crate) fn resolve_base_url(configured: Option<String>, default: &str) -> String {
    configured
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Mock provider for tests.
///
/// Returns a configured response (or error) and records every request it
/// receives so tests can assert on the prompt and model that were sent.
pub struct MockProvider {
    response: String,
    fail_with: Option<String>,
    requests: Mutex<Vec<VisionRequest>>,
}

impl MockProvider {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            fail_with: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A mock that fails every request with the given message.
    pub fn failing(message: &str) -> Self {
        Self {
            response: String::new(),
            fail_with: Some(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far.
    pub fn requests(&self) -> Vec<VisionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl VisionProvider for MockProvider {
    async fn extract(&self, request: &VisionRequest) -> Result<String> {
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request.clone());
        }
        if let Some(message) = &self.fail_with {
            return Err(ProviderError::Http(message.clone()));
        }
        Ok(self.response.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[async_trait]
impl<T: VisionProvider + ?Sized> VisionProvider for std::sync::Arc<T> {
    async fn extract(&self, request: &VisionRequest) -> Result<String> {
        (**self).extract(request).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> VisionRequest {
        VisionRequest {
            model: "test-model".to_string(),
            prompt: "extract".to_string(),
            image_base64: "aGVsbG8=".to_string(),
            image_mime: "image/png".to_string(),
        }
    }

    #[tokio::test]
    async fn mock_returns_configured_response() {
        let provider = MockProvider::new(r#"{"supplier": {}}"#);
        let out = provider.extract(&request()).await.unwrap();
        assert_eq!(out, r#"{"supplier": {}}"#);
        assert_eq!(provider.requests().len(), 1);
        assert_eq!(provider.requests()[0].model, "test-model");
    }

    #[tokio::test]
    async fn mock_failure_propagates() {
        let provider = MockProvider::failing("boom");
        let err = provider.extract(&request()).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn factory_rejects_empty_api_key() {
        let result = create_provider(Provider::Google, ProviderSettings::new("  "));
        assert!(matches!(result, Err(ProviderError::MissingApiKey)));
    }

    #[test]
    fn factory_builds_both_backends() {
        let google =
            create_provider(Provider::Google, ProviderSettings::new("key")).unwrap();
        assert_eq!(google.name(), "gemini");

        let openai =
            create_provider(Provider::OpenAi, ProviderSettings::new("key")).unwrap();
        assert_eq!(openai.name(), "openai");
    }

    #[test]
    fn provider_codes_round_trip_through_serde() {
        let google: Provider = serde_json::from_str("\"google\"").unwrap();
        assert_eq!(google, Provider::Google);
        let openai: Provider = serde_json::from_str("\"openai\"").unwrap();
        assert_eq!(openai, Provider::OpenAi);

        assert_eq!(serde_json::to_string(&Provider::Google).unwrap(), "\"google\"");
    }

    #[test]
    fn unknown_provider_string_is_rejected() {
        let result: std::result::Result<Provider, _> = serde_json::from_str("\"azure\"");
        assert!(result.is_err());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let url = resolve_base_url(Some("http://localhost:9000/".to_string()), "https://x");
        assert_eq!(url, "http://localhost:9000");
        assert_eq!(resolve_base_url(None, "https://x"), "https://x");
    }
}
