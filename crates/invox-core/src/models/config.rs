//! Configuration structures for the digitization pipeline.

use serde::{Deserialize, Serialize};

use invox_providers::{Provider, DEFAULT_TIMEOUT_SECS};

use crate::prompt::DocumentType;

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "INVOX_API_KEY";

/// Main configuration for the invox pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoxConfig {
    /// Company-level digitization settings.
    pub company: CompanyConfig,

    /// PDF page rendering configuration.
    pub render: RenderConfig,

    /// Field reconciliation configuration.
    pub extraction: ExtractionConfig,

    /// HTTP settings for provider calls.
    pub http: HttpConfig,
}

impl Default for InvoxConfig {
    fn default() -> Self {
        Self {
            company: CompanyConfig::default(),
            render: RenderConfig::default(),
            extraction: ExtractionConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

/// Per-company digitization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyConfig {
    /// Master switch; when false the digitizer skips documents untouched.
    pub enabled: bool,

    /// Which AI provider to call.
    pub provider: Provider,

    /// API key for the provider; the `INVOX_API_KEY` environment variable
    /// takes precedence over this value.
    pub api_key: Option<String>,

    /// Model name, e.g. `gemini-1.5-flash-002` or `gpt-4o`.
    pub model: String,

    /// Pin a specific prompt template code, bypassing the provider lookup.
    pub prompt_code: Option<String>,

    /// Document type used for prompt selection.
    pub document_type: DocumentType,

    /// Company record id used to scope tax lookups.
    pub company_id: u32,
}

impl Default for CompanyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: Provider::Google,
            api_key: None,
            model: "gemini-1.5-flash-002".to_string(),
            prompt_code: None,
            document_type: DocumentType::Invoice,
            company_id: 1,
        }
    }
}

impl CompanyConfig {
    /// Resolve the API key, letting the environment override the file.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|key| !key.trim().is_empty()))
    }
}

/// PDF page rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// DPI for rendering the first PDF page.
    pub dpi: u32,

    /// Maximum dimension (longer side) of the rendered image, so a single
    /// page cannot exceed provider payload limits.
    pub max_dimension_px: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            max_dimension_px: 4096,
        }
    }
}

/// Field reconciliation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Extract a formal `NNNNN-NNNNNNNN` document number from the raw
    /// invoice number when present.
    pub normalize_document_number: bool,

    /// Currency assigned to new drafts before extraction runs.
    pub default_currency: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            normalize_document_number: true,
            default_currency: "USD".to_string(),
        }
    }
}

/// HTTP settings for provider calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Endpoint override for Gemini (testing / proxies).
    pub gemini_base_url: Option<String>,

    /// Endpoint override for OpenAI (testing / proxies).
    pub openai_base_url: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            gemini_base_url: None,
            openai_base_url: None,
        }
    }
}

impl HttpConfig {
    /// Endpoint override for the given provider, if configured.
    pub fn base_url_for(&self, provider: Provider) -> Option<String> {
        match provider {
            Provider::Google => self.gemini_base_url.clone(),
            Provider::OpenAi => self.openai_base_url.clone(),
        }
    }
}

impl InvoxConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}
