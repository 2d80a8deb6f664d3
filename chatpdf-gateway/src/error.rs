//! Relay failure taxonomy.
//!
//! Every worker-facing failure collapses into one opaque error per operation.
//! The underlying [`RelayError`] is for logs only and never reaches the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use service_core::error::AppError;
use std::time::Duration;
use thiserror::Error;

/// Why a single relay call to the worker failed.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("worker did not respond within {0:?}")]
    Timeout(Duration),

    #[error("failed to reach worker: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("worker responded with {status}: {body}")]
    WorkerApplication { status: StatusCode, body: String },
}

impl RelayError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Timeout(_) => "timeout",
            RelayError::Transport(_) => "transport",
            RelayError::WorkerApplication { .. } => "worker_error",
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed or incomplete request. The worker is not contacted.
    #[error("{0}")]
    ClientInput(String),

    /// Upload exceeded the configured body limit. The worker is not contacted.
    #[error("Uploaded file exceeds the upload size limit")]
    UploadTooLarge,

    #[error("Worker upload failed")]
    UploadFailed(#[source] RelayError),

    #[error("Worker RAG failed")]
    AskFailed(#[source] RelayError),
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::ClientInput(reason) => AppError::BadRequest(anyhow::anyhow!(reason)),
            GatewayError::UploadTooLarge => {
                AppError::PayloadTooLarge(anyhow::anyhow!(err.to_string()))
            }
            // Display is the fixed per-operation message; the source stays out.
            GatewayError::UploadFailed(_) | GatewayError::AskFailed(_) => {
                AppError::BadGateway(err.to_string())
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
