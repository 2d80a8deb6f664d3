//! HTTP access to the chatpdf gateway.

use crate::config::ClientSettings;
use crate::error::ClientError;
use crate::session::{SessionId, UploadFile};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use service_core::observability::TracedClientExt;

pub const UPLOAD_PATH: &str = "/chatpdf/upload";
pub const ASK_PATH: &str = "/chatpdf/ask";

/// Gateway operations a chat session depends on.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn upload(&self, file: &UploadFile) -> Result<Value, ClientError>;

    async fn ask(&self, session_id: &SessionId, question: &str) -> Result<Value, ClientError>;
}

#[derive(Serialize)]
struct AskBody<'a> {
    session_id: &'a str,
    question: &'a str,
}

pub struct GatewayClient {
    client: Client,
    settings: ClientSettings,
}

impl GatewayClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(settings.timeout()).build()?;
        Ok(Self { client, settings })
    }

    pub fn server_url(&self) -> &str {
        &self.settings.server_url
    }
}

#[async_trait]
impl Gateway for GatewayClient {
    async fn upload(&self, file: &UploadFile) -> Result<Value, ClientError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.filename.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .traced_post(&self.settings.endpoint(UPLOAD_PATH))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, filename = %file.filename, "Gateway rejected upload");
            return Err(ClientError::UploadFailed(status));
        }

        // The worker's upload reply is informational only.
        match response.json::<Value>().await {
            Ok(body) => Ok(body),
            Err(e) => {
                tracing::debug!(filename = %file.filename, error = %e, "Upload reply is not JSON");
                Ok(Value::Null)
            }
        }
    }

    async fn ask(&self, session_id: &SessionId, question: &str) -> Result<Value, ClientError> {
        let body = AskBody {
            session_id: session_id.as_str(),
            question,
        };

        let response = self
            .client
            .traced_post(&self.settings.endpoint(ASK_PATH))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, session_id = %session_id, "Gateway rejected question");
            return Err(ClientError::AskFailed(status));
        }

        Ok(response.json::<Value>().await?)
    }
}

/// Answer text from a worker reply: the first string among `answer` and `prompt`.
pub fn answer_text(body: &Value) -> Option<&str> {
    ["answer", "prompt"]
        .iter()
        .find_map(|field| body.get(field).and_then(Value::as_str))
}
