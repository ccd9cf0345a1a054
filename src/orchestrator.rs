//! The generate pipeline: validate, store parents, compose the prompt, generate, store results.
//!
//! Validation runs before anything touches the network. Once external calls start, the first
//! failure ends the request, except under [`FailurePolicy::Partial`] where failed generations are
//! counted and reported next to the successful ones.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};

use crate::{
    config::{AppConfig, FailurePolicy, PromptStrategy},
    error::{Result, VisageError},
    generation::{ImageGenerator, ParentDescriber},
    logger,
    models::{
        asset::{AssetUpload, UploadedAsset},
        image::{GeneratedImage, GeneratedImageSet},
        request::{GenderHint, GenerationRequest, ParentImage, ValidatedRequest, MAX_AGE, MIN_AGE},
    },
    prompt::{GenerationPrompt, PromptBuilder},
    storage::AssetStore,
};

const RESULT_CONTENT_TYPE: &str = "image/png";

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub image_count: usize,
    pub image_size: String,
    pub concurrency: usize,
    pub retries: u32,
    pub retry_backoff: Duration,
    pub failure_policy: FailurePolicy,
    pub require_age: bool,
    pub prompt_strategy: PromptStrategy,
    pub folder: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        PipelineSettings::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for PipelineSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            image_count: config.generation.image_count,
            image_size: config.generation.image_size.clone(),
            concurrency: config.generation.concurrency,
            retries: config.generation.retries,
            retry_backoff: config.generation.retry_backoff,
            failure_policy: config.generation.failure_policy,
            require_age: config.generation.require_age,
            prompt_strategy: config.generation.prompt_strategy,
            folder: config.cloudinary.folder.clone(),
        }
    }
}

impl PipelineSettings {
    pub fn parents_folder(&self) -> String {
        format!("{}/parents", self.folder)
    }
}

/// Checks the raw form. Never performs I/O.
pub fn validate(request: GenerationRequest, require_age: bool) -> Result<ValidatedRequest> {
    let father = check_image("father", request.father)?;
    let mother = check_image("mother", request.mother)?;

    let age = match request.age.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        Some(raw) => Some(parse_age(raw)?),
        None if require_age => {
            return Err(VisageError::InvalidInput(format!(
                "Age is required ({} to {}).",
                MIN_AGE, MAX_AGE
            )))
        }
        None => None,
    };

    Ok(ValidatedRequest {
        father,
        mother,
        gender: GenderHint::parse(request.gender.as_deref()),
        age,
    })
}

fn check_image(role: &str, image: Option<ParentImage>) -> Result<ParentImage> {
    let image = image.ok_or_else(|| {
        VisageError::InvalidInput("Images 'father' and 'mother' are required.".into())
    })?;
    if image.bytes.is_empty() {
        return Err(VisageError::InvalidInput(format!("Image '{}' is empty.", role)));
    }
    if !image.is_allowed_format() {
        return Err(VisageError::InvalidInput(format!(
            "Image '{}' must be a JPEG, PNG or WebP file.",
            role
        )));
    }
    Ok(image)
}

fn parse_age(raw: &str) -> Result<u8> {
    let age: i64 = raw
        .parse()
        .map_err(|_| VisageError::InvalidInput("Invalid age (must be an integer).".into()))?;
    if age < i64::from(MIN_AGE) || age > i64::from(MAX_AGE) {
        return Err(VisageError::InvalidInput(format!(
            "Age out of range ({} to {}).",
            MIN_AGE, MAX_AGE
        )));
    }
    Ok(age as u8)
}

pub struct Orchestrator {
    generator: Arc<dyn ImageGenerator>,
    store: Arc<dyn AssetStore>,
    describer: Option<Arc<dyn ParentDescriber>>,
    settings: PipelineSettings,
}

impl Orchestrator {
    pub fn new(
        generator: Arc<dyn ImageGenerator>,
        store: Arc<dyn AssetStore>,
        describer: Option<Arc<dyn ParentDescriber>>,
        settings: PipelineSettings,
    ) -> Result<Self> {
        if settings.image_count == 0 {
            return Err(VisageError::ConfigError("Image count must be at least 1".into()));
        }
        if settings.prompt_strategy == PromptStrategy::Descriptions && describer.is_none() {
            return Err(VisageError::ConfigError(
                "The descriptions prompt strategy needs a vision describer".into(),
            ));
        }

        Ok(Self {
            generator,
            store,
            describer,
            settings,
        })
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub async fn generate(&self, request: GenerationRequest) -> Result<GeneratedImageSet> {
        let request = validate(request, self.settings.require_age)?;

        let (father, mother) = self.store_parents(&request).await?;
        let prompt = self.compose_prompt(&request, &father, &mother).await?;
        log::debug!("Prompt: {}", prompt);

        self.produce_images(&prompt).await
    }

    async fn store_parents(&self, request: &ValidatedRequest) -> Result<(UploadedAsset, UploadedAsset)> {
        let _timer = logger::timer("parent uploads");
        let folder = self.settings.parents_folder();

        let father = self.store.upload(parent_upload(&request.father, &folder)).await?;
        let mother = self.store.upload(parent_upload(&request.mother, &folder)).await?;
        Ok((father, mother))
    }

    async fn compose_prompt(
        &self,
        request: &ValidatedRequest,
        father: &UploadedAsset,
        mother: &UploadedAsset,
    ) -> Result<GenerationPrompt> {
        match (self.settings.prompt_strategy, &self.describer) {
            (PromptStrategy::References, _) => Ok(PromptBuilder::with_references(
                request.gender,
                request.age,
                &father.secure_url,
                &mother.secure_url,
            )),
            (PromptStrategy::Descriptions, Some(describer)) => {
                let _timer = logger::timer("parent descriptions");
                let father_description = describer.describe(&father.secure_url, "father").await?;
                let mother_description = describer.describe(&mother.secure_url, "mother").await?;
                Ok(PromptBuilder::with_descriptions(
                    request.gender,
                    request.age,
                    &father_description,
                    &mother_description,
                ))
            }
            (PromptStrategy::Descriptions, None) => Err(VisageError::ConfigError(
                "The descriptions prompt strategy needs a vision describer".into(),
            )),
        }
    }

    async fn produce_images(&self, prompt: &GenerationPrompt) -> Result<GeneratedImageSet> {
        let _timer = logger::timer("image generation");
        let count = self.settings.image_count;
        let limit = self.settings.concurrency.max(1);

        // `buffered` keeps generation order regardless of completion order.
        let results = stream::iter(0..count)
            .map(|index| self.produce_one(prompt, index))
            .buffered(limit);

        match self.settings.failure_policy {
            FailurePolicy::Abort => {
                let images: Vec<String> = results.try_collect().await?;
                Ok(GeneratedImageSet { images, failed: 0 })
            }
            FailurePolicy::Partial => {
                let outcomes: Vec<Result<String>> = results.collect().await;
                let mut set = GeneratedImageSet::default();
                let mut errors = Vec::new();
                for outcome in outcomes {
                    match outcome {
                        Ok(url) => set.images.push(url),
                        Err(e) => errors.push(e),
                    }
                }
                set.failed = errors.len();

                let mut errors = errors.into_iter();
                match errors.next() {
                    // The endpoint logs the returned error; only the rest are logged here.
                    Some(first) if set.images.is_empty() => {
                        for e in errors {
                            log::warn!("Dropping failed image: {}", e);
                        }
                        Err(first)
                    }
                    Some(first) => {
                        for e in std::iter::once(first).chain(errors) {
                            log::warn!("Dropping failed image: {}", e);
                        }
                        Ok(set)
                    }
                    None => Ok(set),
                }
            }
        }
    }

    /// One generation call (with retries) plus persisting the result in the asset store.
    async fn produce_one(&self, prompt: &GenerationPrompt, index: usize) -> Result<String> {
        let mut attempt = 0;
        let image = loop {
            match self.generator.generate(prompt, &self.settings.image_size).await {
                Ok(image) => break image,
                Err(e) if attempt < self.settings.retries => {
                    attempt += 1;
                    log::warn!(
                        "Image {} failed (attempt {}/{}): {}",
                        index + 1,
                        attempt,
                        self.settings.retries + 1,
                        e
                    );
                    if !self.settings.retry_backoff.is_zero() {
                        tokio::time::sleep(self.settings.retry_backoff * attempt).await;
                    }
                }
                Err(e) => return Err(e),
            }
        };

        // Generator URLs expire, so remote results are copied into the store too.
        let upload = match image {
            GeneratedImage::Inline(bytes) => AssetUpload::new(bytes, self.settings.folder.clone())
                .with_content_type(RESULT_CONTENT_TYPE),
            GeneratedImage::Remote(url) => AssetUpload::from_url(url, self.settings.folder.clone()),
        };
        let upload = upload
            .with_file_name(format!("child_{}.png", index + 1))
            .overwrite(true);

        let asset = self.store.upload(upload).await?;
        Ok(asset.secure_url)
    }
}

fn parent_upload(image: &ParentImage, folder: &str) -> AssetUpload {
    let mut upload = AssetUpload::new(image.bytes.clone(), folder).with_content_type(image.mime());
    if let Some(name) = &image.file_name {
        upload = upload.with_file_name(name.clone());
    }
    upload
}
