use crate::error::GatewayError;
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A single uploaded document, held only for the duration of one relay call.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

/// Ask body as received from the client, before validation.
#[derive(Debug, Deserialize, Validate)]
pub struct AskPayload {
    #[validate(required(message = "session_id is required"))]
    pub session_id: Option<String>,
    #[validate(required(message = "question is required"))]
    pub question: Option<String>,
    pub top_k: Option<u32>,
    pub include_history: Option<bool>,
    pub history_limit: Option<u32>,
}

/// Ask body forwarded to the worker. Optional tuning fields are sent only
/// when the client supplied them, so the worker's own defaults apply.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AskRequest {
    pub session_id: String,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_history: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_limit: Option<u32>,
}

impl TryFrom<AskPayload> for AskRequest {
    type Error = GatewayError;

    fn try_from(payload: AskPayload) -> Result<Self, Self::Error> {
        // Both fields present exactly when validation passes; its errors name
        // whichever are missing.
        let missing = payload.validate().err();

        match payload.session_id.zip(payload.question) {
            Some((session_id, question)) => Ok(AskRequest {
                session_id,
                question,
                top_k: payload.top_k,
                include_history: payload.include_history,
                history_limit: payload.history_limit,
            }),
            None => Err(GatewayError::ClientInput(
                missing.map(|e| e.to_string()).unwrap_or_default(),
            )),
        }
    }
}

/// Successful worker reply, returned to the client byte for byte.
#[derive(Debug, Clone)]
pub struct WorkerResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl IntoResponse for WorkerResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        if let Some(content_type) = self.content_type {
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, content_type);
        }
        response
    }
}
