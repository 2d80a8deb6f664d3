use serde::Deserialize;
use service_core::config::{self as core_config, ObservabilityConfig};
use service_core::error::AppError;
use std::path::PathBuf;
use std::time::Duration;

/// Worker address variable used by earlier deployments of the gateway.
pub const LEGACY_WORKER_URL_ENV: &str = "PY_WORKER_URL";
const WORKER_URL_ENV: &str = "APP__WORKER__URL";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub worker: WorkerSettings,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    /// `0` binds a random port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Comma separated list of browser origins allowed to call the gateway.
    /// Empty allows any origin.
    #[serde(default)]
    pub cors_origins: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: String::new(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl ServerSettings {
    pub fn allowed_origins(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkerSettings {
    /// Base URL of the inference worker; every relay call targets it.
    #[serde(default = "default_worker_url")]
    pub url: String,
    /// Upper bound on a single relay call, connect through body.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            url: default_worker_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl WorkerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Absolute URL of a worker operation, e.g. `endpoint("/ask")`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url.trim_end_matches('/'), path)
    }
}

fn default_worker_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

impl Settings {
    pub fn validate(&self) -> Result<(), AppError> {
        let url = reqwest::Url::parse(&self.worker.url).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "worker.url '{}' is not a valid URL: {}",
                self.worker.url,
                e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "worker.url must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.worker.timeout_secs == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "worker.timeout_secs must be greater than zero"
            )));
        }
        Ok(())
    }
}

fn configuration_file() -> PathBuf {
    let base_path = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    // Running from the crate directory or from the workspace root.
    let configuration_directory = if base_path.ends_with("chatpdf-gateway") {
        base_path.join("config")
    } else {
        base_path.join("chatpdf-gateway").join("config")
    };

    configuration_directory.join("base")
}

pub fn get_configuration() -> Result<Settings, AppError> {
    let file = configuration_file();
    let mut builder = core_config::builder(&file.to_string_lossy());

    if std::env::var(WORKER_URL_ENV).is_err() {
        if let Ok(url) = std::env::var(LEGACY_WORKER_URL_ENV) {
            builder = builder.set_override("worker.url", url)?;
        }
    }

    let settings: Settings = builder.build()?.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}
