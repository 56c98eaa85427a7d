pub mod backend;
pub mod routes;
pub mod server;

use crate::config::AppConfig;
use crate::error::AppResult;
use std::sync::Arc;

/// Shared proxy state. Requests share nothing mutable.
pub struct ProxyState {
    pub http: reqwest::Client,
    pub config: AppConfig,
    /// Pinned backend URL; when unset it is resolved per request.
    pub backend_override: Option<String>,
}

pub type SharedState = Arc<ProxyState>;

impl ProxyState {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("image-enhancer-proxy/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            config,
            backend_override: None,
        })
    }

    pub fn with_backend(mut self, backend_url: impl Into<String>) -> Self {
        self.backend_override = Some(backend_url.into());
        self
    }

    pub fn backend_url(&self) -> String {
        self.backend_override
            .clone()
            .unwrap_or_else(|| self.config.resolve_backend_url())
    }
}
