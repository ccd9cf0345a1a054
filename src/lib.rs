//! Visage turns two parent photos plus a few hints into a set of generated child portraits.
//!
//! The crate is a thin orchestration layer over two external services: an image generator
//! ([`generation::ImageGenerator`]) and an asset store ([`storage::AssetStore`]). Both are
//! injected into [`orchestrator::Orchestrator`] so they can be replaced in tests.

pub mod config;
pub mod error;
pub mod generation;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod prompt;
#[cfg(feature = "server")]
pub mod server;
pub mod storage;

pub use config::{AppConfig, CloudinaryConfig, FailurePolicy, OpenAiConfig, PromptStrategy};
pub use error::{Result, VisageError};
pub use generation::{ImageGenerator, ParentDescriber};
pub use models::*;
pub use orchestrator::{Orchestrator, PipelineSettings};
pub use prompt::{GenerationPrompt, PromptBuilder};
pub use storage::{AssetStore, CloudinaryStore};
