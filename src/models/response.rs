use serde::{Deserialize, Serialize};

use super::image::GeneratedImageSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub failed: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl From<GeneratedImageSet> for GenerateResponse {
    fn from(set: GeneratedImageSet) -> Self {
        Self {
            images: set.images,
            failed: set.failed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}
