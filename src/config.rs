use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::services::preferences::DEFAULT_API_URL;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
    /// Web origins allowed besides extension pages, e.g. a local dev build
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
            allowed_origins: Vec::new(),
        }
    }
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8787 }

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Directory holding `sync.json` and `local.json`
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self { dir: default_storage_dir() }
    }
}

fn default_storage_dir() -> PathBuf { PathBuf::from(".pinkvanity") }

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    /// Used until the options page stores an `apiUrl`
    #[serde(default = "default_api_url")]
    pub default_url: String,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_size")]
    pub cache_size: u64,
    /// Mirror recorded savings to the matching API
    #[serde(default = "default_sync_savings")]
    pub sync_savings: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            default_url: default_api_url(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_size: default_cache_size(),
            sync_savings: default_sync_savings(),
        }
    }
}

impl ApiSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn default_api_url() -> String { DEFAULT_API_URL.to_string() }
fn default_cache_ttl_secs() -> u64 { 300 }
fn default_cache_size() -> u64 { 500 }
fn default_sync_savings() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisSettings {
    /// Quiet period after a navigation before the page is analyzed
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self { debounce_ms: default_debounce_ms() }
    }
}

impl AnalysisSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_debounce_ms() -> u64 { 1000 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl LogFormat {
    /// Unknown names fall back to compact
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Compact,
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with PINKVANITY__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., PINKVANITY__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("PINKVANITY")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
