//! Cloudinary uploads against a WireMock server.

use std::time::Duration;

use serde_json::json;
use visage::{
    config::CloudinaryConfig,
    models::asset::AssetUpload,
    storage::{AssetStore, CloudinaryStore},
    VisageError,
};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_for(server: &MockServer) -> CloudinaryStore {
    CloudinaryStore::new(
        CloudinaryConfig::new()
            .with_credentials("demo", "1234", "shh")
            .with_base_url(server.uri()),
    )
    .unwrap()
}

#[tokio::test]
async fn upload_returns_secure_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/upload"))
        .and(body_string_contains("devine_le_visage/parents"))
        .and(body_string_contains("signature_algorithm"))
        .and(body_string_contains("1234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "public_id": "devine_le_visage/parents/abc123",
            "secure_url": "https://res.cloudinary.com/demo/image/upload/v1/devine_le_visage/parents/abc123.jpg",
            "resource_type": "image"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let asset = store_for(&server)
        .upload(
            AssetUpload::new(b"jpeg-bytes".to_vec(), "devine_le_visage/parents")
                .with_file_name("dad.jpg")
                .with_content_type("image/jpeg"),
        )
        .await
        .unwrap();

    assert_eq!(asset.public_id, "devine_le_visage/parents/abc123");
    assert!(asset.secure_url.starts_with("https://res.cloudinary.com/demo/"));
}

#[tokio::test]
async fn overwrite_flag_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/upload"))
        .and(body_string_contains("overwrite"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "public_id": "devine_le_visage/x",
            "secure_url": "https://res.cloudinary.com/demo/image/upload/x.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server)
        .upload(AssetUpload::new(vec![1u8, 2, 3], "devine_le_visage").overwrite(true))
        .await
        .unwrap();
}

#[tokio::test]
async fn error_message_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/upload"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Invalid Signature" }
        })))
        .mount(&server)
        .await;

    let err = store_for(&server)
        .upload(AssetUpload::new(vec![1u8], "devine_le_visage"))
        .await
        .unwrap_err();

    match err {
        VisageError::StorageError(msg) => assert!(msg.contains("Invalid Signature")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn missing_secure_url_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "public_id": "x" })))
        .mount(&server)
        .await;

    let err = store_for(&server)
        .upload(AssetUpload::new(vec![1u8], "devine_le_visage"))
        .await
        .unwrap_err();
    assert!(matches!(err, VisageError::StorageError(_)));
}

#[tokio::test]
async fn remote_url_is_sent_as_file_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/upload"))
        .and(body_string_contains("https://gen.example/tmp/child.png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "public_id": "devine_le_visage/child",
            "secure_url": "https://res.cloudinary.com/demo/image/upload/v1/devine_le_visage/child.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let asset = store_for(&server)
        .upload(
            AssetUpload::from_url("https://gen.example/tmp/child.png", "devine_le_visage")
                .with_file_name("child_1.png")
                .overwrite(true),
        )
        .await
        .unwrap();

    assert!(asset.secure_url.starts_with("https://res.cloudinary.com/demo/"));
}

#[tokio::test]
async fn slow_upload_times_out_as_storage_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/upload"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "secure_url": "https://res.cloudinary.com/demo/late.png" }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let store = CloudinaryStore::new(
        CloudinaryConfig::new()
            .with_credentials("demo", "1234", "shh")
            .with_base_url(server.uri())
            .with_timeout(Duration::from_millis(200)),
    )
    .unwrap();

    let err = store
        .upload(AssetUpload::new(b"jpeg-bytes".to_vec(), "devine_le_visage"))
        .await
        .unwrap_err();
    assert!(matches!(err, VisageError::StorageError(_)));
}
