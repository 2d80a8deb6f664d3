use crate::error::AppError;
use config::{Config as Cfg, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Prefix for environment overrides, e.g. `APP__WORKER__URL`.
pub const ENV_PREFIX: &str = "APP";

#[derive(Debug, Deserialize, Clone)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP collector endpoint. Span export is disabled when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Layered configuration builder: optional file, then `APP__*` environment.
///
/// `.env` is loaded first so its values take part in the environment layer.
/// Callers may add defaults or overrides before building.
pub fn builder(configuration_file: &str) -> ConfigBuilder<DefaultState> {
    dotenvy::dotenv().ok();

    Cfg::builder()
        .add_source(File::with_name(configuration_file).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
}

pub fn load<T: DeserializeOwned>(configuration_file: &str) -> Result<T, AppError> {
    let config = builder(configuration_file).build()?;
    Ok(config.try_deserialize()?)
}
