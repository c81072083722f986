//! Integration tests for the Gemini backend against a mock HTTP server.

use httpmock::prelude::*;
use invox_providers::{
    GeminiProvider, ProviderError, ProviderSettings, VisionProvider, VisionRequest,
};

fn vision_request() -> VisionRequest {
    VisionRequest {
        model: "gemini-1.5-flash-002".to_string(),
        prompt: "Extract the invoice data as JSON.".to_string(),
        image_base64: "iVBORw0KGgo=".to_string(),
        image_mime: "image/png".to_string(),
    }
}

#[tokio::test]
async fn extracts_candidate_text_from_json_response() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-1.5-flash-002:generateContent")
            .query_param("key", "test-key")
            .json_body_partial(
                r#"{"generationConfig": {"responseMimeType": "application/json"}}"#,
            );
        then.status(200).json_body(serde_json::json!({
            "candidates": [
                {"content": {"parts": [
                    {"text": "{\"invoice_data\": {\"invoice_number\": \"0001-00000042\"}}"}
                ]}}
            ]
        }));
    });

    let provider = GeminiProvider::new(
        ProviderSettings::new("test-key").with_base_url(server.base_url()),
    )
    .unwrap();

    let response = provider.extract(&vision_request()).await.unwrap();
    assert!(response.contains("0001-00000042"));
    mock.assert();
}

#[tokio::test]
async fn image_payload_is_sent_as_inline_data() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-1.5-flash-002:generateContent")
            .json_body_partial(
                r#"{"contents": [{"parts": [
                    {"text": "Extract the invoice data as JSON."},
                    {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
                ]}]}"#,
            );
        then.status(200).json_body(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "{}"}]}}]
        }));
    });

    let provider = GeminiProvider::new(
        ProviderSettings::new("test-key").with_base_url(server.base_url()),
    )
    .unwrap();

    provider.extract(&vision_request()).await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn http_error_status_surfaces_with_body() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path_contains("generateContent");
        then.status(403)
            .body(r#"{"error": {"message": "API key not valid"}}"#);
    });

    let provider = GeminiProvider::new(
        ProviderSettings::new("bad-key").with_base_url(server.base_url()),
    )
    .unwrap();

    let err = provider.extract(&vision_request()).await.unwrap_err();
    match err {
        ProviderError::Api {
            provider, status, body,
        } => {
            assert_eq!(provider, "gemini");
            assert_eq!(status, 403);
            assert!(body.contains("API key not valid"));
        }
        other => panic!("expected Api error, got: {other}"),
    }
}

#[tokio::test]
async fn empty_candidate_list_is_a_shape_error() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path_contains("generateContent");
        then.status(200).json_body(serde_json::json!({"candidates": []}));
    });

    let provider = GeminiProvider::new(
        ProviderSettings::new("test-key").with_base_url(server.base_url()),
    )
    .unwrap();

    let err = provider.extract(&vision_request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::ResponseShape { .. }));
}

#[tokio::test]
async fn unreachable_endpoint_maps_to_connect_error() {
    // Port 1 is never listening.
    let provider = GeminiProvider::new(
        ProviderSettings::new("test-key").with_base_url("http://127.0.0.1:1"),
    )
    .unwrap();

    let err = provider.extract(&vision_request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Connect(_)));
}
