//! OpenAI backend.
//!
//! Calls `/v1/chat/completions` with a single user message carrying the
//! prompt text and the document image as a base64 data URL, with
//! `response_format: json_object` and a low temperature so the model
//! answers with plain JSON.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{map_send_error, resolve_base_url, ProviderSettings, VisionProvider, VisionRequest};
use crate::{ProviderError, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const PROVIDER_NAME: &str = "openai";

/// Sampling temperature for extraction calls. Kept low: the task is data
/// transcription, not generation.
const EXTRACTION_TEMPERATURE: f32 = 0.1;

/// Client for the OpenAI chat completions endpoint.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout_secs: u64,
}

impl OpenAiProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: resolve_base_url(settings.base_url, DEFAULT_BASE_URL),
            api_key: settings.api_key,
            timeout_secs: settings.timeout_secs,
        })
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat<'a>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl VisionProvider for OpenAiProvider {
    async fn extract(&self, request: &VisionRequest) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let data_url = format!(
            "data:{};base64,{}",
            request.image_mime, request.image_base64
        );

        let body = ChatCompletionRequest {
            model: &request.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: &request.prompt,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ],
            }],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            temperature: EXTRACTION_TEMPERATURE,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_send_error(e, &self.base_url, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: PROVIDER_NAME,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse =
            response.json().await.map_err(|e| ProviderError::ResponseShape {
                provider: PROVIDER_NAME,
                reason: e.to_string(),
            })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError::ResponseShape {
                provider: PROVIDER_NAME,
                reason: "no message content in response".to_string(),
            });
        }

        debug!(
            model = %request.model,
            response_len = text.len(),
            "OpenAI response received"
        );

        Ok(text)
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
