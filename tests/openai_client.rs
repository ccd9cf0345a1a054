//! OpenAI client against a WireMock server.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::json;
use visage::{
    config::OpenAiConfig,
    generation::{ImageGenerator, OpenAiClient, ParentDescriber},
    models::image::GeneratedImage,
    models::request::GenderHint,
    prompt::PromptBuilder,
    VisageError,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenAiClient {
    OpenAiClient::new(
        OpenAiConfig::new()
            .with_api_key("test-api-key")
            .with_base_url(format!("{}/v1", server.uri())),
    )
    .unwrap()
}

fn prompt() -> visage::GenerationPrompt {
    PromptBuilder::with_references(GenderHint::Girl, Some(7), "https://a/dad.jpg", "https://a/mum.jpg")
}

#[tokio::test]
async fn b64_payload_is_decoded_inline() {
    let server = MockServer::start().await;
    let png = vec![0x89u8, b'P', b'N', b'G'];

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .and(header("Authorization", "Bearer test-api-key"))
        .and(body_partial_json(json!({ "model": "gpt-image-1", "n": 1, "size": "512x512" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "created": 1700000000,
            "data": [{ "b64_json": BASE64.encode(&png) }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let image = client_for(&server).generate(&prompt(), "512x512").await.unwrap();
    assert_eq!(image, GeneratedImage::Inline(png.into()));
}

#[tokio::test]
async fn url_payload_is_kept_remote() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "created": 1700000000,
            "data": [{ "url": "https://cdn.example/child.png" }]
        })))
        .mount(&server)
        .await;

    let image = client_for(&server).generate(&prompt(), "1024x1024").await.unwrap();
    assert_eq!(image, GeneratedImage::Remote("https://cdn.example/child.png".into()));
}

#[tokio::test]
async fn non_2xx_is_a_generation_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "message": "Rate limit reached", "type": "rate_limit_error" }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).generate(&prompt(), "1024x1024").await.unwrap_err();
    match err {
        VisageError::GenerationError(msg) => assert!(msg.contains("429")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn empty_data_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "created": 1, "data": [] })))
        .mount(&server)
        .await;

    let err = client_for(&server).generate(&prompt(), "1024x1024").await.unwrap_err();
    assert!(matches!(err, VisageError::GenerationError(_)));
}

#[tokio::test]
async fn describer_returns_trimmed_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({ "model": "gpt-4o", "max_tokens": 200 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "  short dark hair, brown eyes  " },
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let description = client_for(&server)
        .describe("https://a/dad.jpg", "father")
        .await
        .unwrap();
    assert_eq!(description, "short dark hair, brown eyes");
}

#[test]
fn missing_key_is_config_error() {
    let result = OpenAiClient::new(OpenAiConfig::new());
    assert!(matches!(result, Err(VisageError::ConfigError(_))));
}

#[tokio::test]
async fn slow_generation_times_out_as_generation_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": [{ "url": "https://gen.example/late.png" }] }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = OpenAiClient::new(
        OpenAiConfig::new()
            .with_api_key("test-api-key")
            .with_base_url(format!("{}/v1", server.uri()))
            .with_timeout(Duration::from_millis(200)),
    )
    .unwrap();

    let err = client.generate(&prompt(), "1024x1024").await.unwrap_err();
    assert!(matches!(err, VisageError::GenerationError(_)));
}
