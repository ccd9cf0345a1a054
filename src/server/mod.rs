pub mod error;
pub mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, web};
use uuid::Uuid;

use crate::{
    error::{Result, VisageError},
    orchestrator::Orchestrator,
};

pub use error::ApiError;

/// Shared, read-only state handed to every worker.
///
/// A broken configuration leaves the pipeline unset: the process keeps serving `/health` and
/// every `/generate` fails with a configuration error.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: std::result::Result<Arc<Orchestrator>, String>,
    pub debug: bool,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, debug: bool, max_upload_bytes: usize) -> Self {
        Self {
            pipeline: Ok(orchestrator),
            debug,
            max_upload_bytes,
        }
    }

    pub fn unconfigured(reason: impl Into<String>, debug: bool, max_upload_bytes: usize) -> Self {
        Self {
            pipeline: Err(reason.into()),
            debug,
            max_upload_bytes,
        }
    }

    pub fn orchestrator(&self) -> Result<&Arc<Orchestrator>> {
        self.pipeline
            .as_ref()
            .map_err(|reason| VisageError::ConfigError(reason.clone()))
    }

    /// The single place a failed request is logged before it becomes a response.
    pub fn reject(&self, request_id: Uuid, error: VisageError) -> ApiError {
        if error.is_client_error() {
            log::warn!("[req:{}] rejected: {}", request_id, error);
        } else {
            log::error!("[req:{}] /generate failed: {:?}", request_id, error);
        }
        ApiError::new(error, self.debug)
    }
}

/// CORS only guards `/generate`; `/health` stays open to any caller.
pub fn routes(cfg: &mut web::ServiceConfig, allowed_origins: &[String]) {
    cfg.service(
        web::resource("/generate")
            .wrap(cors(allowed_origins))
            .route(web::post().to(handlers::generate)),
    )
    .service(handlers::health);
}

pub fn cors(allowed_origins: &[String]) -> Cors {
    allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| {
            if origin == "*" {
                cors.allow_any_origin()
            } else {
                cors.allowed_origin(origin)
            }
        })
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600)
}
