use bytes::Bytes;
use reqwest::multipart::{Form, Part};

use crate::config::join_url;
use crate::error::{AppError, AppResult};
use crate::gallery::image::ImageFile;

pub const BACKEND_ENHANCE_PATH: &str = "/enhance";

/// Re-posts the upload to `{backend_url}/enhance` and returns the raw body.
pub async fn forward(
    http: &reqwest::Client,
    backend_url: &str,
    upload: &ImageFile,
) -> AppResult<Bytes> {
    let url = join_url(backend_url, BACKEND_ENHANCE_PATH);

    let mut part = Part::bytes(upload.bytes.to_vec()).file_name(upload.name.clone());
    if let Some(mime) = &upload.mime {
        part = part.mime_str(mime)?;
    }
    let form = Form::new().part("file", part);

    log::info!(
        "[proxy] Forwarding {} ({} bytes) to {}",
        upload.name,
        upload.bytes.len(),
        url
    );
    let response = http.post(&url).multipart(form).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Backend {
            status: status.as_u16(),
        });
    }

    Ok(response.bytes().await?)
}
