use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Value};

use super::backend::forward;
use super::SharedState;
use crate::error::{AppError, AppResult};
use crate::gallery::image::ImageFile;

pub const FILE_FIELD: &str = "file";

pub async fn health_check() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// `POST /api/enhance`: relays the backend bytes, always labelled as PNG.
pub async fn enhance_handler(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let result = async {
        let multipart = multipart.map_err(|e| AppError::Form(e.body_text()))?;
        let upload = read_upload(multipart).await?;
        let backend_url = state.backend_url();
        forward(&state.http, &backend_url, &upload).await
    }
    .await;

    match result {
        Ok(bytes) => Ok(([(CONTENT_TYPE, "image/png")], bytes).into_response()),
        Err(e) => {
            log::error!("Error calling backend: {}", e);
            Err(e)
        }
    }
}

/// Pulls the `file` field out of the form. Other fields are ignored.
async fn read_upload(mut multipart: Multipart) -> AppResult<ImageFile> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or("image").to_string();
        let mime = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        return Ok(ImageFile::new(name, mime, bytes));
    }
    Err(AppError::MissingFile)
}
