use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Environment variable holding the enhancement backend base URL.
pub const BACKEND_URL_VAR: &str = "BACKEND_URL";

/// Local development backend.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Used when `BACKEND_URL` is not set.
    #[serde(default)]
    pub backend_url: Option<String>,
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
}

fn default_proxy_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_allowed_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            proxy_url: default_proxy_url(),
            bind_address: default_bind_address(),
            port: default_port(),
            allowed_origin: default_allowed_origin(),
            max_upload_bytes: default_max_upload_bytes(),
            download_dir: None,
        }
    }
}

impl AppConfig {
    pub fn config_dir() -> AppResult<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| AppError::Config("Cannot find home directory".into()))?;
        Ok(home.join(".image-enhancer"))
    }

    pub fn config_path() -> AppResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    pub fn load() -> AppResult<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Err(AppError::Config(format!(
                "Config file not found at {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the config file, falling back to defaults when it is missing or broken.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            log::warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn validate(&self) -> AppResult<()> {
        parse_base_url(&self.proxy_url)?;
        if let Some(backend) = &self.backend_url {
            parse_base_url(backend)?;
        }
        Ok(())
    }

    /// Backend base URL for the current request: `BACKEND_URL`, then the
    /// config file, then the local default.
    pub fn resolve_backend_url(&self) -> String {
        self.backend_url_from(std::env::var(BACKEND_URL_VAR).ok())
    }

    /// Same order as `resolve_backend_url`, with the env value passed in.
    /// A blank value counts as unset.
    pub fn backend_url_from(&self, env_value: Option<String>) -> String {
        match env_value {
            Some(url) if !url.trim().is_empty() => url,
            _ => self
                .backend_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
        }
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn parse_base_url(raw: &str) -> AppResult<Url> {
    let url = Url::parse(raw).map_err(|e| AppError::Config(format!("Invalid URL {}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::Config(format!(
            "Unsupported scheme {} in {}",
            other, raw
        ))),
    }
}

/// Joins a base URL and an absolute path without doubling the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
