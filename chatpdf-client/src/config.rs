use crate::error::ClientError;
use config::{Config, Environment};
use serde::Deserialize;
use std::time::Duration;

pub const ENV_PREFIX: &str = "CHATPDF";

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSettings {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_server_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClientSettings {
    /// Read `CHATPDF_SERVER_URL` and `CHATPDF_TIMEOUT_SECS`, after loading `.env`.
    pub fn load() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();

        let settings = Config::builder()
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize::<ClientSettings>()?;

        Ok(settings)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.server_url.trim_end_matches('/'), path)
    }
}
