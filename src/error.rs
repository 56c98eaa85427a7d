use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Body returned by the proxy for every failure. Callers cannot tell an
/// unreachable backend from a rejected upload.
pub const ENHANCE_ERROR_MESSAGE: &str = "Error enhancing image";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Invalid form: {0}")]
    Form(String),

    #[error("Form has no `file` field")]
    MissingFile,

    #[error("Backend responded with status: {status}")]
    Backend { status: u16 },

    #[error("Proxy error: {status} - {message}")]
    Proxy { status: u16, message: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("An enhancement batch is already running")]
    EnhanceInProgress,

    #[error("No images to enhance")]
    NothingToEnhance,
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("AppError", 2)?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

impl AppError {
    fn kind(&self) -> &str {
        match self {
            AppError::Http(_) => "http",
            AppError::Json(_) => "json",
            AppError::Io(_) => "io",
            AppError::Multipart(_) => "multipart",
            AppError::Form(_) => "form",
            AppError::MissingFile => "missing_file",
            AppError::Backend { .. } => "backend",
            AppError::Proxy { .. } => "proxy",
            AppError::Config(_) => "config",
            AppError::EnhanceInProgress => "enhance_in_progress",
            AppError::NothingToEnhance => "nothing_to_enhance",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": ENHANCE_ERROR_MESSAGE })),
        )
            .into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
