//! Integration tests for the OpenAI backend against a mock HTTP server.

use httpmock::prelude::*;
use invox_providers::{
    OpenAiProvider, ProviderError, ProviderSettings, VisionProvider, VisionRequest,
};

fn vision_request() -> VisionRequest {
    VisionRequest {
        model: "gpt-4o".to_string(),
        prompt: "Extract the invoice data as JSON.".to_string(),
        image_base64: "iVBORw0KGgo=".to_string(),
        image_mime: "image/png".to_string(),
    }
}

#[tokio::test]
async fn extracts_first_choice_content() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .header("authorization", "Bearer sk-test")
            .json_body_partial(r#"{"model": "gpt-4o", "response_format": {"type": "json_object"}}"#);
        then.status(200).json_body(serde_json::json!({
            "choices": [
                {"message": {"content": "{\"supplier\": {\"name\": \"ACME Corp\"}}"}}
            ]
        }));
    });

    let provider = OpenAiProvider::new(
        ProviderSettings::new("sk-test").with_base_url(server.base_url()),
    )
    .unwrap();

    let response = provider.extract(&vision_request()).await.unwrap();
    assert!(response.contains("ACME Corp"));
    mock.assert();
}

#[tokio::test]
async fn image_travels_as_base64_data_url() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .json_body_partial(
                r#"{"messages": [{"role": "user", "content": [
                    {"type": "text", "text": "Extract the invoice data as JSON."},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,iVBORw0KGgo="}}
                ]}]}"#,
            );
        then.status(200).json_body(serde_json::json!({
            "choices": [{"message": {"content": "{}"}}]
        }));
    });

    let provider = OpenAiProvider::new(
        ProviderSettings::new("sk-test").with_base_url(server.base_url()),
    )
    .unwrap();

    provider.extract(&vision_request()).await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn http_error_status_surfaces_with_body() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(401)
            .body(r#"{"error": {"message": "Incorrect API key provided"}}"#);
    });

    let provider = OpenAiProvider::new(
        ProviderSettings::new("sk-bad").with_base_url(server.base_url()),
    )
    .unwrap();

    let err = provider.extract(&vision_request()).await.unwrap_err();
    match err {
        ProviderError::Api {
            provider, status, body,
        } => {
            assert_eq!(provider, "openai");
            assert_eq!(status, 401);
            assert!(body.contains("Incorrect API key"));
        }
        other => panic!("expected Api error, got: {other}"),
    }
}

#[tokio::test]
async fn empty_message_content_is_a_shape_error() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200).json_body(serde_json::json!({
            "choices": [{"message": {"content": null}}]
        }));
    });

    let provider = OpenAiProvider::new(
        ProviderSettings::new("sk-test").with_base_url(server.base_url()),
    )
    .unwrap();

    let err = provider.extract(&vision_request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::ResponseShape { .. }));
}
