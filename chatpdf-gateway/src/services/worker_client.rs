//! Client for the inference worker.
//!
//! The worker is an opaque capability with two HTTP operations. Responses are
//! passed through untouched; only the HTTP status is inspected.

use crate::config::WorkerSettings;
use crate::error::RelayError;
use crate::models::{AskRequest, UploadRequest, WorkerResponse};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{header::CONTENT_TYPE, Client};
use service_core::error::AppError;
use service_core::observability::{TracedClientExt, TracedRequest};
use std::time::Instant;

pub const PROCESS_DOCUMENT_PATH: &str = "/process-pdf";
pub const ANSWER_QUESTION_PATH: &str = "/ask";

/// The two worker operations the gateway relays to.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Forward one document. The upload bytes are dropped when this returns.
    async fn process_document(
        &self,
        upload: UploadRequest,
        request_id: Option<&str>,
    ) -> Result<WorkerResponse, RelayError>;

    async fn answer_question(
        &self,
        ask: &AskRequest,
        request_id: Option<&str>,
    ) -> Result<WorkerResponse, RelayError>;
}

/// HTTP implementation of [`Worker`].
///
/// Holds only an immutable connection pool, so one instance is shared by all
/// concurrent requests.
pub struct HttpWorker {
    client: Client,
    settings: WorkerSettings,
}

impl HttpWorker {
    pub fn new(settings: WorkerSettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(settings.timeout())
            .build()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Failed to build worker HTTP client: {}", e))
            })?;

        tracing::info!(
            worker_url = %settings.url,
            timeout_secs = settings.timeout_secs,
            "Worker client configured"
        );

        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    fn classify(&self, err: reqwest::Error) -> RelayError {
        if err.is_timeout() {
            RelayError::Timeout(self.settings.timeout())
        } else {
            RelayError::Transport(err)
        }
    }

    async fn relay(
        &self,
        operation: &'static str,
        request: TracedRequest,
        request_id: Option<&str>,
    ) -> Result<WorkerResponse, RelayError> {
        let start = Instant::now();

        let result = match request
            .timeout(self.settings.timeout())
            .send_with_request_id(request_id)
            .await
        {
            Ok(response) => self.read_response(response).await,
            Err(e) => Err(self.classify(e)),
        };

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::counter!("worker_relay_total", "operation" => operation, "outcome" => outcome)
            .increment(1);
        metrics::histogram!("worker_relay_duration_seconds", "operation" => operation)
            .record(start.elapsed().as_secs_f64());

        result
    }

    async fn read_response(&self, response: reqwest::Response) -> Result<WorkerResponse, RelayError> {
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
            return Err(RelayError::WorkerApplication { status, body });
        }

        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = response.bytes().await.map_err(|e| self.classify(e))?;

        Ok(WorkerResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Multipart part for an upload. The handler only admits parseable MIME
/// types; anything else is sent without a content type.
fn file_part(upload: UploadRequest) -> Part {
    let length = upload.bytes.len() as u64;
    let bytes = upload.bytes;
    let filename = upload.filename;
    let part = || {
        Part::stream_with_length(reqwest::Body::from(bytes.clone()), length)
            .file_name(filename.clone())
    };

    part().mime_str(&upload.mime_type).unwrap_or_else(|e| {
        tracing::warn!(mime_type = %upload.mime_type, error = %e, "Dropping unusable content type");
        part()
    })
}

#[async_trait]
impl Worker for HttpWorker {
    async fn process_document(
        &self,
        upload: UploadRequest,
        request_id: Option<&str>,
    ) -> Result<WorkerResponse, RelayError> {
        let url = self.settings.endpoint(PROCESS_DOCUMENT_PATH);
        let form = Form::new().part("file", file_part(upload));

        self.relay(
            "process_document",
            self.client.traced_post(&url).multipart(form),
            request_id,
        )
        .await
    }

    async fn answer_question(
        &self,
        ask: &AskRequest,
        request_id: Option<&str>,
    ) -> Result<WorkerResponse, RelayError> {
        let url = self.settings.endpoint(ANSWER_QUESTION_PATH);

        self.relay(
            "answer_question",
            self.client.traced_post(&url).json(ask),
            request_id,
        )
        .await
    }
}
