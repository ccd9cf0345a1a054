use crate::{
    config::OpenAiConfig,
    error::{Result, VisageError},
    generation::{ImageGenerator, ParentDescriber},
    models::image::{ChatCompletionResponse, GeneratedImage, OpenAiImageRequest, OpenAiImageResponse},
    prompt::GenerationPrompt,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use reqwest::Client;
use serde_json::json;

const DESCRIBE_MAX_TOKENS: u32 = 200;

#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    image_model: String,
    vision_model: String,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .ok_or_else(|| VisageError::ConfigError("OpenAI API key is required".into()))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VisageError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            image_model: config.image_model,
            vision_model: config.vision_model,
        })
    }

    fn build_headers(&self) -> Result<reqwest::header::HeaderMap> {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth = format!("Bearer {}", self.api_key)
            .parse()
            .map_err(|_| VisageError::ConfigError("OpenAI API key is not a valid header".into()))?;
        headers.insert(reqwest::header::AUTHORIZATION, auth);
        Ok(headers)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        payload: &serde_json::Value,
    ) -> Result<T> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .headers(self.build_headers()?)
            .json(payload)
            .send()
            .await
            .map_err(|e| VisageError::GenerationError(format!("OpenAI request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(VisageError::GenerationError(format!(
                "OpenAI returned {}: {}",
                status, error_text
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| VisageError::GenerationError(format!("Unexpected OpenAI response: {}", e)))
    }
}

#[async_trait]
impl ImageGenerator for OpenAiClient {
    async fn generate(&self, prompt: &GenerationPrompt, size: &str) -> Result<GeneratedImage> {
        let request = OpenAiImageRequest {
            model: self.image_model.clone(),
            prompt: prompt.as_str().to_string(),
            n: 1,
            size: size.to_string(),
        };
        let payload = serde_json::to_value(&request)
            .map_err(|e| VisageError::SerializationError(e.to_string()))?;

        log::info!("Generating image with model: {}", self.image_model);

        let response: OpenAiImageResponse = self.post_json("/images/generations", &payload).await?;
        let data = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| VisageError::GenerationError("No images generated".into()))?;

        match (data.b64_json, data.url) {
            (Some(b64), _) => {
                let bytes = BASE64.decode(b64.trim()).map_err(|e| {
                    VisageError::GenerationError(format!("Invalid base64 image payload: {}", e))
                })?;
                Ok(GeneratedImage::Inline(Bytes::from(bytes)))
            }
            (None, Some(url)) => Ok(GeneratedImage::Remote(url)),
            (None, None) => Err(VisageError::GenerationError(
                "Image entry has neither b64_json nor url".into(),
            )),
        }
    }
}

#[async_trait]
impl ParentDescriber for OpenAiClient {
    async fn describe(&self, image_url: &str, role: &str) -> Result<String> {
        let payload = json!({
            "model": self.vision_model,
            "max_tokens": DESCRIBE_MAX_TOKENS,
            "messages": [
                {
                    "role": "system",
                    "content": "You are an expert at describing realistic portraits."
                },
                {
                    "role": "user",
                    "content": [
                        {
                            "type": "text",
                            "text": format!(
                                "Briefly describe the visible features of this {}: hair, eyes, skin tone and expression.",
                                role
                            )
                        },
                        {
                            "type": "image_url",
                            "image_url": { "url": image_url }
                        }
                    ]
                }
            ]
        });

        log::debug!("Describing {} with model: {}", role, self.vision_model);

        let response: ChatCompletionResponse = self.post_json("/chat/completions", &payload).await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| VisageError::GenerationError("Vision model returned no description".into()))
    }
}
