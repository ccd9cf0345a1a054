use actix_multipart::{Field, Multipart};
use actix_web::{get, web, HttpResponse};
use bytes::BytesMut;
use futures::TryStreamExt;
use uuid::Uuid;

use crate::{
    error::{Result, VisageError},
    models::{
        request::{GenerationRequest, ParentImage},
        response::{GenerateResponse, HealthResponse},
    },
    server::{error::ApiError, AppState},
};

/// `POST /generate`, mounted by `server::routes` behind the CORS policy.
pub async fn generate(
    state: web::Data<AppState>,
    payload: Multipart,
) -> std::result::Result<HttpResponse, ApiError> {
    let request_id = Uuid::new_v4();
    log::info!("[req:{}] POST /generate", request_id);

    let outcome = match state.orchestrator() {
        Ok(orchestrator) => match read_form(payload, state.max_upload_bytes).await {
            Ok(request) => orchestrator.generate(request).await,
            Err(e) => Err(e),
        },
        Err(e) => Err(e),
    };

    match outcome {
        Ok(set) => {
            log::info!(
                "[req:{}] generated {} images ({} failed)",
                request_id,
                set.images.len(),
                set.failed
            );
            Ok(HttpResponse::Ok().json(GenerateResponse::from(set)))
        }
        Err(e) => Err(state.reject(request_id, e)),
    }
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse { ok: true })
}

/// Drains the multipart body into a `GenerationRequest`, enforcing the total size limit.
pub async fn read_form(mut payload: Multipart, limit: usize) -> Result<GenerationRequest> {
    let mut request = GenerationRequest::default();
    let mut total = 0usize;

    while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
        let disposition = field.content_disposition();
        let name = disposition.get_name().unwrap_or_default().to_string();
        let file_name = disposition.get_filename().map(str::to_string);
        let content_type = field.content_type().map(|m| m.essence_str().to_string());

        let data = read_field(&mut field, &mut total, limit).await?;

        match name.as_str() {
            "father" | "mother" => {
                let image = ParentImage {
                    file_name,
                    content_type,
                    bytes: data,
                };
                if name == "father" {
                    request.father = Some(image);
                } else {
                    request.mother = Some(image);
                }
            }
            "gender" => request.gender = Some(text_field("gender", data)?),
            "age" => request.age = Some(text_field("age", data)?),
            other => log::debug!("Ignoring unknown form field '{}'", other),
        }
    }

    Ok(request)
}

async fn read_field(field: &mut Field, total: &mut usize, limit: usize) -> Result<bytes::Bytes> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.try_next().await.map_err(malformed)? {
        *total += chunk.len();
        if *total > limit {
            return Err(VisageError::InvalidInput(format!(
                "Upload too large (limit is {} bytes).",
                limit
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

fn text_field(name: &str, data: bytes::Bytes) -> Result<String> {
    String::from_utf8(data.to_vec())
        .map_err(|_| VisageError::InvalidInput(format!("Field '{}' must be UTF-8 text.", name)))
}

fn malformed(e: actix_multipart::MultipartError) -> VisageError {
    VisageError::InvalidInput(format!("Malformed multipart body: {}", e))
}
