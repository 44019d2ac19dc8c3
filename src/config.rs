//! Configuration loader and validator for the movie browser data layer.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub catalog: Catalog,
    pub images: Images,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Remote catalog (TMDB) settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Catalog {
    #[serde(default = "default_catalog_base")]
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Poster/backdrop download settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Images {
    #[serde(default = "default_image_base")]
    pub base_url: String,
    #[serde(default = "default_image_size")]
    pub size: String,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_page_size() -> u32 {
    20
}

fn default_catalog_base() -> String {
    "https://api.themoviedb.org/3/".into()
}

fn default_language() -> String {
    "en-US".into()
}

fn default_timeout_ms() -> u64 {
    15_000
}

fn default_image_base() -> String {
    "https://image.tmdb.org/t/p/".into()
}

fn default_image_size() -> String {
    "w500".into()
}

fn default_cache_capacity() -> usize {
    200
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.app.data_dir)
    }

    /// Default SQLite URL inside `app.data_dir`.
    pub fn database_url(&self) -> String {
        format!(
            "sqlite://{}/movies.db",
            self.app.data_dir.trim_end_matches('/')
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.catalog.request_timeout_ms)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    if cfg.app.page_size == 0 {
        return Err(ConfigError::Invalid("app.page_size must be > 0"));
    }

    if cfg.catalog.api_key.trim().is_empty() {
        return Err(ConfigError::Invalid("catalog.api_key must be non-empty"));
    }
    if Url::parse(&cfg.catalog.base_url).is_err() {
        return Err(ConfigError::Invalid("catalog.base_url must be a valid URL"));
    }
    if cfg.catalog.request_timeout_ms == 0 {
        return Err(ConfigError::Invalid("catalog.request_timeout_ms must be > 0"));
    }

    if Url::parse(&cfg.images.base_url).is_err() {
        return Err(ConfigError::Invalid("images.base_url must be a valid URL"));
    }
    if cfg.images.size.trim().is_empty() {
        return Err(ConfigError::Invalid("images.size must be non-empty"));
    }

    Ok(())
}

/// Returns a complete sample configuration.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"
  page_size: 20

catalog:
  base_url: "https://api.themoviedb.org/3/"
  api_key: "YOUR_TMDB_API_KEY"
  language: "en-US"
  request_timeout_ms: 15000

images:
  base_url: "https://image.tmdb.org/t/p/"
  size: "w500"
  cache_capacity: 200
"#
}
