use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, VisageError};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_IMAGE_COUNT: usize = 10;
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_FOLDER: &str = "devine_le_visage";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;
/// Only Titan image models speak the payload `BedrockImageClient` sends.
pub const TITAN_IMAGE_MODEL_PREFIX: &str = "amazon.titan-image-generator";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationProvider {
    OpenAi,
    Bedrock,
}

impl FromStr for GenerationProvider {
    type Err = VisageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(GenerationProvider::OpenAi),
            "bedrock" => Ok(GenerationProvider::Bedrock),
            other => Err(VisageError::ConfigError(format!(
                "Unknown GENERATION_PROVIDER '{}' (expected openai or bedrock)",
                other
            ))),
        }
    }
}

/// What happens to a request when one of its generation calls fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// First failure fails the whole request.
    Abort,
    /// Successful images are returned together with the number of failed ones.
    Partial,
}

impl FromStr for FailurePolicy {
    type Err = VisageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "partial" => Ok(FailurePolicy::Partial),
            other => Err(VisageError::ConfigError(format!(
                "Unknown GENERATION_FAILURE_POLICY '{}' (expected abort or partial)",
                other
            ))),
        }
    }
}

/// How the parents are brought into the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStrategy {
    /// Embed the stored parent URLs.
    References,
    /// Ask a vision model to describe each parent and embed the descriptions.
    Descriptions,
}

impl FromStr for PromptStrategy {
    type Err = VisageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "references" => Ok(PromptStrategy::References),
            "descriptions" => Ok(PromptStrategy::Descriptions),
            other => Err(VisageError::ConfigError(format!(
                "Unknown PROMPT_STRATEGY '{}' (expected references or descriptions)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub debug: bool,
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub provider: GenerationProvider,
    pub image_count: usize,
    pub image_size: String,
    pub concurrency: usize,
    pub retries: u32,
    pub retry_backoff: Duration,
    pub failure_policy: FailurePolicy,
    pub require_age: bool,
    pub prompt_strategy: PromptStrategy,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub image_model: String,
    pub vision_model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct BedrockConfig {
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub model_id: String,
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub base_url: String,
    pub folder: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub generation: GenerationConfig,
    pub openai: OpenAiConfig,
    pub bedrock: BedrockConfig,
    pub cloudinary: CloudinaryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: DEFAULT_PORT,
            debug: false,
            allowed_origins: vec![
                "http://127.0.0.1:5173".to_string(),
                "http://localhost:5173".to_string(),
                "https://joel3500.github.io".to_string(),
            ],
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            provider: GenerationProvider::OpenAi,
            image_count: DEFAULT_IMAGE_COUNT,
            image_size: DEFAULT_IMAGE_SIZE.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            retries: 0,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
            failure_policy: FailurePolicy::Abort,
            require_age: true,
            prompt_strategy: PromptStrategy::References,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        OpenAiConfig {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            image_model: "gpt-image-1".to_string(),
            vision_model: "gpt-4o".to_string(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl Default for BedrockConfig {
    fn default() -> Self {
        BedrockConfig {
            region: None,
            access_key: None,
            secret_key: None,
            model_id: "amazon.titan-image-generator-v1".to_string(),
        }
    }
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        CloudinaryConfig {
            cloud_name: None,
            api_key: None,
            api_secret: None,
            base_url: "https://api.cloudinary.com".to_string(),
            folder: DEFAULT_FOLDER.to_string(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            server: ServerConfig::default(),
            generation: GenerationConfig::default(),
            openai: OpenAiConfig::default(),
            bedrock: BedrockConfig::default(),
            cloudinary: CloudinaryConfig::default(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_flag(value: Option<String>, default: bool) -> bool {
    value
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

fn parse_number<T: FromStr>(name: &str, value: Option<String>, default: T) -> Result<T> {
    match non_empty(value) {
        Some(raw) => raw
            .parse()
            .map_err(|_| VisageError::ConfigError(format!("{} must be a number, got '{}'", name, raw))),
        None => Ok(default),
    }
}

impl OpenAiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl BedrockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn check_model(&self) -> Result<()> {
        if self.model_id.starts_with(TITAN_IMAGE_MODEL_PREFIX) {
            Ok(())
        } else {
            Err(VisageError::ConfigError(format!(
                "Unsupported BEDROCK_IMAGE_MODEL '{}' (expected {}*)",
                self.model_id, TITAN_IMAGE_MODEL_PREFIX
            )))
        }
    }
}

impl CloudinaryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(
        mut self,
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        self.cloud_name = Some(cloud_name.into());
        self.api_key = Some(api_key.into());
        self.api_secret = Some(api_secret.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let var = |key: &str| non_empty(lookup(key));

        let allowed_origins = var("FRONTEND_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.server.allowed_origins);

        let timeout = Duration::from_secs(parse_number(
            "HTTP_TIMEOUT_SECS",
            var("HTTP_TIMEOUT_SECS"),
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);

        let server = ServerConfig {
            port: parse_number("PORT", var("PORT"), DEFAULT_PORT)?,
            debug: parse_flag(var("DEBUG"), false),
            allowed_origins,
            max_upload_bytes: parse_number(
                "MAX_UPLOAD_BYTES",
                var("MAX_UPLOAD_BYTES"),
                DEFAULT_MAX_UPLOAD_BYTES,
            )?,
        };

        let generation = GenerationConfig {
            provider: match var("GENERATION_PROVIDER") {
                Some(raw) => raw.parse()?,
                None => defaults.generation.provider,
            },
            image_count: parse_number(
                "OPENAI_IMAGE_COUNT",
                var("OPENAI_IMAGE_COUNT"),
                DEFAULT_IMAGE_COUNT,
            )?,
            image_size: var("OPENAI_IMAGE_SIZE").unwrap_or(defaults.generation.image_size),
            concurrency: parse_number(
                "GENERATION_CONCURRENCY",
                var("GENERATION_CONCURRENCY"),
                DEFAULT_CONCURRENCY,
            )?,
            retries: parse_number("GENERATION_RETRIES", var("GENERATION_RETRIES"), 0)?,
            retry_backoff: Duration::from_millis(parse_number(
                "GENERATION_RETRY_BACKOFF_MS",
                var("GENERATION_RETRY_BACKOFF_MS"),
                DEFAULT_RETRY_BACKOFF_MS,
            )?),
            failure_policy: match var("GENERATION_FAILURE_POLICY") {
                Some(raw) => raw.parse()?,
                None => defaults.generation.failure_policy,
            },
            require_age: parse_flag(var("REQUIRE_AGE"), true),
            prompt_strategy: match var("PROMPT_STRATEGY") {
                Some(raw) => raw.parse()?,
                None => defaults.generation.prompt_strategy,
            },
        };

        let openai = OpenAiConfig {
            api_key: var("OPENAI_API_KEY"),
            base_url: var("OPENAI_BASE_URL").unwrap_or(defaults.openai.base_url),
            image_model: var("OPENAI_IMAGE_MODEL").unwrap_or(defaults.openai.image_model),
            vision_model: var("OPENAI_VISION_MODEL").unwrap_or(defaults.openai.vision_model),
            timeout,
        };

        let bedrock = BedrockConfig {
            region: var("AWS_REGION").or_else(|| var("AWS_DEFAULT_REGION")),
            access_key: var("AWS_ACCESS_KEY_ID"),
            secret_key: var("AWS_SECRET_ACCESS_KEY"),
            model_id: var("BEDROCK_IMAGE_MODEL").unwrap_or(defaults.bedrock.model_id),
        };

        let cloudinary = CloudinaryConfig {
            cloud_name: var("CLOUDINARY_CLOUD_NAME"),
            api_key: var("CLOUDINARY_API_KEY"),
            api_secret: var("CLOUDINARY_API_SECRET"),
            base_url: var("CLOUDINARY_BASE_URL").unwrap_or(defaults.cloudinary.base_url),
            folder: var("CLOUDINARY_FOLDER").unwrap_or(defaults.cloudinary.folder),
            timeout,
        };

        Ok(AppConfig {
            server,
            generation,
            openai,
            bedrock,
            cloudinary,
        })
    }

    pub fn with_openai(mut self, config: OpenAiConfig) -> Self {
        self.openai = config;
        self
    }

    pub fn with_bedrock(mut self, config: BedrockConfig) -> Self {
        self.bedrock = config;
        self.generation.provider = GenerationProvider::Bedrock;
        self
    }

    pub fn with_cloudinary(mut self, config: CloudinaryConfig) -> Self {
        self.cloudinary = config;
        self
    }

    /// Reports every missing credential at once, before any network call.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();

        let needs_openai = self.generation.provider == GenerationProvider::OpenAi
            || self.generation.prompt_strategy == PromptStrategy::Descriptions;
        if needs_openai && self.openai.api_key.is_none() {
            missing.push("OPENAI_API_KEY");
        }
        if self.cloudinary.cloud_name.is_none() {
            missing.push("CLOUDINARY_CLOUD_NAME");
        }
        if self.cloudinary.api_key.is_none() {
            missing.push("CLOUDINARY_API_KEY");
        }
        if self.cloudinary.api_secret.is_none() {
            missing.push("CLOUDINARY_API_SECRET");
        }

        if !missing.is_empty() {
            return Err(VisageError::ConfigError(format!(
                "Missing environment variables: {}",
                missing.join(", ")
            )));
        }

        if self.generation.image_count == 0 {
            return Err(VisageError::ConfigError(
                "OPENAI_IMAGE_COUNT must be at least 1".into(),
            ));
        }
        if self.generation.concurrency == 0 {
            return Err(VisageError::ConfigError(
                "GENERATION_CONCURRENCY must be at least 1".into(),
            ));
        }
        if self.generation.provider == GenerationProvider::Bedrock {
            self.bedrock.check_model()?;
        }

        Ok(())
    }
}
