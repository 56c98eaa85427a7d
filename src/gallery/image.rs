use base64::Engine;
use bytes::Bytes;
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

use crate::error::AppResult;

/// Extensions the drop target lets through in addition to any `image/*` type.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["jpeg", "png", "jpg", "gif"];

/// A dropped file: name, declared type and contents.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    pub mime: Option<String>,
    pub bytes: Bytes,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime: Option<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime,
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: &Path) -> AppResult<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let mime = mime_from_name(&name).map(str::to_string);
        Ok(Self::new(name, mime, bytes))
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }

    /// MIME type to label the upload with.
    pub fn content_type(&self) -> &str {
        self.mime
            .as_deref()
            .or_else(|| mime_from_name(&self.name))
            .unwrap_or("application/octet-stream")
    }
}

pub fn mime_from_name(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Drop-target filter: any `image/*` type or one of the listed extensions.
pub fn is_accepted(file: &ImageFile) -> bool {
    let mime_ok = file
        .mime
        .as_deref()
        .is_some_and(|m| m.to_ascii_lowercase().starts_with("image/"));
    let ext_ok = file
        .extension()
        .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()));
    mime_ok || ext_ok
}

/// Ephemeral reference used to display image bytes. Not persisted or shared.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayHandle {
    pub id: Uuid,
    pub data_uri: String,
}

impl DisplayHandle {
    pub fn for_bytes(mime: &str, bytes: &[u8]) -> Self {
        let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self {
            id: Uuid::new_v4(),
            data_uri: format!("data:{};base64,{}", mime, b64),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub id: Uuid,
    pub file: ImageFile,
    pub preview: DisplayHandle,
    pub enhanced: Option<DisplayHandle>,
    pub enhanced_bytes: Option<Bytes>,
}

impl UploadedImage {
    pub fn new(file: ImageFile) -> Self {
        let preview = DisplayHandle::for_bytes(file.content_type(), &file.bytes);
        Self {
            id: Uuid::new_v4(),
            file,
            preview,
            enhanced: None,
            enhanced_bytes: None,
        }
    }

    /// Backend output is always treated as PNG.
    pub fn set_enhanced(&mut self, bytes: Bytes) {
        self.enhanced = Some(DisplayHandle::for_bytes("image/png", &bytes));
        self.enhanced_bytes = Some(bytes);
    }

    pub fn is_enhanced(&self) -> bool {
        self.enhanced_bytes.is_some()
    }

    pub fn summary(&self) -> ImageSummary {
        ImageSummary {
            id: self.id,
            name: self.file.name.clone(),
            size_bytes: self.file.bytes.len(),
            preview: self.preview.clone(),
            enhanced: self.enhanced.clone(),
        }
    }
}

/// What a renderer needs to draw one card.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSummary {
    pub id: Uuid,
    pub name: String,
    pub size_bytes: usize,
    pub preview: DisplayHandle,
    pub enhanced: Option<DisplayHandle>,
}
