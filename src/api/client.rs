use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};

use crate::config::join_url;
use crate::error::{AppError, AppResult};
use crate::gallery::batch::Enhancer;
use crate::gallery::image::ImageFile;

pub const ENHANCE_PATH: &str = "/api/enhance";

/// Talks to the proxy endpoint on behalf of the gallery.
pub struct EnhanceClient {
    http: reqwest::Client,
    proxy_url: String,
}

impl EnhanceClient {
    pub fn new(proxy_url: impl Into<String>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("image-enhancer/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            proxy_url: proxy_url.into(),
        })
    }

    pub async fn enhance_file(&self, file: &ImageFile) -> AppResult<Bytes> {
        let url = join_url(&self.proxy_url, ENHANCE_PATH);
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(file.content_type())?;
        let form = Form::new().part("file", part);

        let response = self.http.post(&url).multipart(form).send().await?;
        let response = check_response(response).await?;
        Ok(response.bytes().await?)
    }
}

async fn check_response(response: reqwest::Response) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".into());
    Err(AppError::Proxy {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl Enhancer for EnhanceClient {
    async fn enhance(&self, file: &ImageFile) -> AppResult<Bytes> {
        self.enhance_file(file).await
    }
}
