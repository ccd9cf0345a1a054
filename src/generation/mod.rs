pub mod bedrock;
pub mod openai;

use std::sync::Arc;

use crate::{
    config::{AppConfig, GenerationProvider, PromptStrategy},
    error::Result,
    models::image::GeneratedImage,
    prompt::GenerationPrompt,
};
use async_trait::async_trait;

pub use bedrock::BedrockImageClient;
pub use openai::OpenAiClient;

/// Produces exactly one image per call.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &GenerationPrompt, size: &str) -> Result<GeneratedImage>;
}

/// Turns a stored parent photo into a short textual description.
#[async_trait]
pub trait ParentDescriber: Send + Sync {
    async fn describe(&self, image_url: &str, role: &str) -> Result<String>;
}

/// Builds the generator selected by `GENERATION_PROVIDER`.
pub async fn build_generator(config: &AppConfig) -> Result<Arc<dyn ImageGenerator>> {
    match config.generation.provider {
        GenerationProvider::OpenAi => Ok(Arc::new(OpenAiClient::new(config.openai.clone())?)),
        GenerationProvider::Bedrock => {
            Ok(Arc::new(BedrockImageClient::new(config.bedrock.clone()).await?))
        }
    }
}

/// Only the description strategy needs a describer.
pub fn build_describer(config: &AppConfig) -> Result<Option<Arc<dyn ParentDescriber>>> {
    match config.generation.prompt_strategy {
        PromptStrategy::References => Ok(None),
        PromptStrategy::Descriptions => {
            Ok(Some(Arc::new(OpenAiClient::new(config.openai.clone())?)))
        }
    }
}
