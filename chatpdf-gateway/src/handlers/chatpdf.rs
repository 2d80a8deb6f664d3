use crate::error::GatewayError;
use crate::models::{AskPayload, AskRequest, UploadRequest};
use crate::AppState;
use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use service_core::middleware::tracing::RequestId;

/// Multipart field carrying the document.
pub const FILE_FIELD: &str = "file";

pub async fn upload_handler(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, GatewayError> {
    let mut multipart = multipart.map_err(|e| GatewayError::ClientInput(e.body_text()))?;
    let upload = read_file_field(&mut multipart).await?;

    let filename = upload.filename.clone();
    let size = upload.bytes.len();
    let request_id = request_id.as_ref().map(|Extension(id)| id.0.as_str());

    match state.worker.process_document(upload, request_id).await {
        Ok(response) => {
            tracing::info!(file_name = %filename, size, "Document relayed to worker");
            Ok(response.into_response())
        }
        Err(e) => {
            tracing::error!(
                file_name = %filename,
                kind = e.kind(),
                error = %e,
                "UPLOAD relay failed"
            );
            Err(GatewayError::UploadFailed(e))
        }
    }
}

pub async fn ask_handler(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    payload: Result<Json<AskPayload>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let Json(payload) = payload.map_err(|e| GatewayError::ClientInput(e.body_text()))?;
    let ask = AskRequest::try_from(payload)?;
    let request_id = request_id.as_ref().map(|Extension(id)| id.0.as_str());

    match state.worker.answer_question(&ask, request_id).await {
        Ok(response) => {
            tracing::info!(session_id = %ask.session_id, "Question relayed to worker");
            Ok(response.into_response())
        }
        Err(e) => {
            tracing::error!(
                session_id = %ask.session_id,
                kind = e.kind(),
                error = %e,
                "ASK relay failed"
            );
            Err(GatewayError::AskFailed(e))
        }
    }
}

/// Find the `file` file part and buffer it. Other parts, including plain
/// form fields named `file`, are skipped.
async fn read_file_field(multipart: &mut Multipart) -> Result<UploadRequest, GatewayError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name() else {
            continue;
        };

        let filename = if filename.is_empty() {
            "unnamed".to_string()
        } else {
            filename.to_string()
        };
        let mime_type = mime_type_of(field.content_type())?;
        let bytes = field.bytes().await.map_err(multipart_error)?;

        if bytes.is_empty() {
            return Err(GatewayError::ClientInput(format!(
                "Uploaded file '{}' is empty",
                filename
            )));
        }

        return Ok(UploadRequest {
            filename,
            mime_type,
            bytes,
        });
    }

    Err(GatewayError::ClientInput("No file uploaded".to_string()))
}

fn mime_type_of(content_type: Option<&str>) -> Result<String, GatewayError> {
    match content_type {
        None => Ok(mime::APPLICATION_OCTET_STREAM.to_string()),
        Some(value) => value
            .parse::<mime::Mime>()
            .map(|m| m.to_string())
            .map_err(|_| GatewayError::ClientInput(format!("Invalid file content type '{}'", value))),
    }
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> GatewayError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GatewayError::UploadTooLarge
    } else {
        GatewayError::ClientInput(format!("Failed to read multipart body: {}", err.body_text()))
    }
}
