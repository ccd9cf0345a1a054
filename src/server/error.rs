use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

use crate::{
    error::{ErrorKind, VisageError},
    models::response::ErrorResponse,
};

const GENERIC_FAILURE: &str = "Processing failed. Please try again later.";

/// Endpoint-boundary wrapper deciding how much of a `VisageError` a client gets to see.
#[derive(Debug)]
pub struct ApiError {
    pub error: VisageError,
    pub debug: bool,
}

impl ApiError {
    pub fn new(error: VisageError, debug: bool) -> Self {
        Self { error, debug }
    }

    pub fn body(&self) -> ErrorResponse {
        match self.error.kind() {
            ErrorKind::ClientInput => ErrorResponse {
                error: self.error.detail().to_string(),
                trace: None,
            },
            _ if self.debug => ErrorResponse {
                error: self.error.to_string(),
                trace: Some(format!("{:?}", self.error)),
            },
            _ => ErrorResponse {
                error: GENERIC_FAILURE.to_string(),
                trace: None,
            },
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.error.kind() {
            ErrorKind::ClientInput => StatusCode::BAD_REQUEST,
            ErrorKind::Configuration | ErrorKind::Dependency | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_message() {
        let err = ApiError::new(VisageError::InvalidInput("Age out of range (0 to 50).".into()), false);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.body().error, "Age out of range (0 to 50).");
        assert!(err.body().trace.is_none());
    }

    #[test]
    fn dependency_detail_is_hidden_outside_debug() {
        let err = ApiError::new(VisageError::StorageError("cloud 'demo' said 401".into()), false);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body().error, GENERIC_FAILURE);
        assert!(err.body().trace.is_none());
    }

    #[test]
    fn debug_mode_exposes_detail_and_trace() {
        let err = ApiError::new(VisageError::GenerationError("model overloaded".into()), true);
        let body = err.body();
        assert_eq!(body.error, "Generation error: model overloaded");
        assert!(body.trace.unwrap().contains("GenerationError"));
    }
}
