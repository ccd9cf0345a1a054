use std::collections::BTreeMap;

use crate::{
    config::CloudinaryConfig,
    error::{Result, VisageError},
    models::asset::{
        AssetSource, AssetUpload, CloudinaryErrorResponse, CloudinaryUploadResponse, UploadedAsset,
    },
    storage::traits::AssetStore,
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use sha2::{Digest, Sha256};

pub struct CloudinaryStore {
    client: Client,
    upload_url: String,
    api_key: String,
    api_secret: String,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> Result<Self> {
        let cloud_name = config
            .cloud_name
            .ok_or_else(|| VisageError::ConfigError("Cloudinary cloud name is required".into()))?;
        let api_key = config
            .api_key
            .ok_or_else(|| VisageError::ConfigError("Cloudinary API key is required".into()))?;
        let api_secret = config
            .api_secret
            .ok_or_else(|| VisageError::ConfigError("Cloudinary API secret is required".into()))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VisageError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            upload_url: format!(
                "{}/v1_1/{}/image/upload",
                config.base_url.trim_end_matches('/'),
                cloud_name
            ),
            api_key,
            api_secret,
        })
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }
}

/// Cloudinary signature: sorted `k=v` pairs joined by `&`, secret appended, SHA-256 hex.
pub fn sign_params(params: &BTreeMap<&'static str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl AssetStore for CloudinaryStore {
    async fn upload(&self, upload: AssetUpload) -> Result<UploadedAsset> {
        let mut params: BTreeMap<&'static str, String> = BTreeMap::new();
        params.insert("folder", upload.folder.clone());
        if upload.overwrite {
            params.insert("overwrite", "true".to_string());
        }
        params.insert("timestamp", Utc::now().timestamp().to_string());
        let signature = sign_params(&params, &self.api_secret);

        let form = match upload.source {
            AssetSource::Bytes(bytes) => {
                let file_name = upload.file_name.unwrap_or_else(|| "upload".to_string());
                let content_type = upload
                    .content_type
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                log::debug!("Uploading {} bytes to folder {}", bytes.len(), upload.folder);

                let file = Part::bytes(bytes.to_vec())
                    .file_name(file_name)
                    .mime_str(&content_type)
                    .map_err(|e| VisageError::InvalidInput(format!("Bad content type: {}", e)))?;
                Form::new().part("file", file)
            }
            // Cloudinary fetches remote files itself.
            AssetSource::Url(url) => {
                log::debug!("Uploading {} to folder {}", url, upload.folder);
                Form::new().text("file", url)
            }
        };

        let mut form = form
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| VisageError::StorageError(format!("Cloudinary request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| VisageError::StorageError(format!("Cloudinary response unreadable: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<CloudinaryErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(VisageError::StorageError(format!(
                "Cloudinary upload failed ({}): {}",
                status, message
            )));
        }

        let parsed: CloudinaryUploadResponse = serde_json::from_str(&body)
            .map_err(|e| VisageError::StorageError(format!("Unexpected Cloudinary response: {}", e)))?;

        let secure_url = parsed.secure_url.ok_or_else(|| {
            VisageError::StorageError("Cloudinary response has no secure_url".into())
        })?;

        Ok(UploadedAsset {
            public_id: parsed.public_id.unwrap_or_default(),
            secure_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_matches_cloudinary_scheme() {
        let mut params = BTreeMap::new();
        params.insert("timestamp", "1700000000".to_string());
        params.insert("folder", "devine_le_visage/parents".to_string());
        assert_eq!(
            sign_params(&params, "shh"),
            "dd55e77c25270cf0889833e3041be8e3bc0bca425a8ed5ad7b0c1fad7853a881"
        );

        params.insert("folder", "devine_le_visage".to_string());
        params.insert("overwrite", "true".to_string());
        assert_eq!(
            sign_params(&params, "shh"),
            "697b290fa03ebfddc03843b73c046c7c91bb526541830386a5572dd52e0dd7b1"
        );
    }

    #[test]
    fn missing_credentials_are_config_errors() {
        let result = CloudinaryStore::new(CloudinaryConfig::new());
        assert!(matches!(result, Err(VisageError::ConfigError(_))));
    }

    #[test]
    fn upload_url_uses_cloud_name() {
        let store = CloudinaryStore::new(
            CloudinaryConfig::new()
                .with_credentials("demo", "key", "secret")
                .with_base_url("http://localhost:9000/"),
        )
        .unwrap();
        assert_eq!(store.upload_url(), "http://localhost:9000/v1_1/demo/image/upload");
    }
}
