pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod gallery;
pub mod proxy;

use api::client::EnhanceClient;
use config::AppConfig;
use error::AppResult;
use events::EventBus;
use gallery::batch::Enhancer;
use gallery::collection::ImageGallery;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Client-side state: the gallery and what it talks to.
pub struct AppState {
    pub gallery: Arc<RwLock<ImageGallery>>,
    pub enhancer: Arc<dyn Enhancer>,
    pub events: EventBus,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig, enhancer: Arc<dyn Enhancer>) -> Self {
        Self {
            gallery: Arc::new(RwLock::new(ImageGallery::new())),
            enhancer,
            events: EventBus::default(),
            config,
        }
    }

    /// State whose enhancement calls go to the configured proxy.
    pub fn with_proxy(config: AppConfig) -> AppResult<Self> {
        let client = EnhanceClient::new(config.proxy_url.clone())?;
        Ok(Self::new(config, Arc::new(client)))
    }
}

pub fn init_logging() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("image_enhancer=info"),
    )
    .init();
}
