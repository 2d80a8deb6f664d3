use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("File '{0}' is empty")]
    EmptyFile(String),

    #[error("Upload rejected by gateway with status {0}")]
    UploadFailed(StatusCode),

    #[error("Question rejected by gateway with status {0}")]
    AskFailed(StatusCode),

    #[error("Gateway response carried no answer text")]
    MissingAnswer,

    #[error("Could not reach gateway: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
