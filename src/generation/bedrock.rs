use crate::{
    config::BedrockConfig,
    error::{Result, VisageError},
    generation::ImageGenerator,
    models::image::{parse_dimensions, GeneratedImage, TitanImageResponse},
    prompt::GenerationPrompt,
};
use async_trait::async_trait;
use aws_sdk_bedrockruntime::{primitives::Blob, Client};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use serde_json::json;

const TITAN_DEFAULT_SIDE: u32 = 1024;
// Titan rejects prompts longer than this.
const TITAN_MAX_PROMPT_CHARS: usize = 512;

#[derive(Clone)]
pub struct BedrockImageClient {
    client: Client,
    model_id: String,
}

impl BedrockImageClient {
    /// Rejects non-Titan models before any AWS configuration is loaded.
    pub async fn new(bedrock_config: BedrockConfig) -> Result<Self> {
        bedrock_config.check_model()?;

        let region = bedrock_config
            .region
            .clone()
            .unwrap_or_else(|| "us-east-1".to_string());

        let aws_config = if let (Some(access_key), Some(secret_key)) =
            (&bedrock_config.access_key, &bedrock_config.secret_key)
        {
            aws_config::from_env()
                .credentials_provider(aws_sdk_bedrockruntime::config::Credentials::new(
                    access_key,
                    secret_key,
                    None,
                    None,
                    "visage",
                ))
                .region(aws_sdk_bedrockruntime::config::Region::new(region))
                .load()
                .await
        } else {
            aws_config::from_env()
                .region(aws_sdk_bedrockruntime::config::Region::new(region))
                .load()
                .await
        };

        Ok(Self {
            client: Client::new(&aws_config),
            model_id: bedrock_config.model_id,
        })
    }
}

/// Titan text-to-image payload for a single image.
pub fn titan_payload(prompt: &str, size: &str) -> serde_json::Value {
    let (width, height) = parse_dimensions(size).unwrap_or((TITAN_DEFAULT_SIDE, TITAN_DEFAULT_SIDE));
    let text: String = prompt.chars().take(TITAN_MAX_PROMPT_CHARS).collect();

    json!({
        "taskType": "TEXT_IMAGE",
        "textToImageParams": {
            "text": text
        },
        "imageGenerationConfig": {
            "numberOfImages": 1,
            "width": width,
            "height": height,
            "quality": "standard",
            "cfgScale": 8.0
        }
    })
}

#[async_trait]
impl ImageGenerator for BedrockImageClient {
    async fn generate(&self, prompt: &GenerationPrompt, size: &str) -> Result<GeneratedImage> {
        let request_json = serde_json::to_string(&titan_payload(prompt.as_str(), size))
            .map_err(|e| VisageError::SerializationError(e.to_string()))?;

        log::info!("Generating image with model: {}", self.model_id);

        let response = self
            .client
            .invoke_model()
            .model_id(&self.model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(request_json.into_bytes()))
            .send()
            .await
            .map_err(|e| VisageError::AwsError(e.to_string()))?;

        let response_bytes = response.body.into_inner();
        let titan_response: TitanImageResponse = serde_json::from_slice(&response_bytes)
            .map_err(|e| VisageError::GenerationError(format!("Unexpected Titan response: {}", e)))?;

        let encoded = titan_response
            .images
            .into_iter()
            .next()
            .ok_or_else(|| VisageError::GenerationError("No images generated".into()))?;

        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| VisageError::GenerationError(format!("Invalid base64 image payload: {}", e)))?;

        Ok(GeneratedImage::Inline(Bytes::from(bytes)))
    }
}
