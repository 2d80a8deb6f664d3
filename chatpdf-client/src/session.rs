use crate::error::ClientError;
use crate::gateway::{answer_text, Gateway};
use crate::transcript::{render, Message, Role, Transcript};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Assistant text shown in place of an answer when a question fails.
pub const ASK_FALLBACK: &str = "❌ Error reaching AI worker.";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(format!("sess-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|source| ClientError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string());

        Ok(Self::new(filename, mime_type_for(path), bytes))
    }
}

pub fn mime_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// One chat view: a session id plus its transcript.
///
/// Both submit operations take `&self`, so a session can be shared across
/// tasks. The transcript lock is never held across a gateway call.
pub struct ChatSession {
    id: SessionId,
    gateway: Arc<dyn Gateway>,
    transcript: Mutex<Transcript>,
}

/// Mint a fresh session against `gateway`.
pub fn start_session(gateway: Arc<dyn Gateway>) -> ChatSession {
    ChatSession::with_id(SessionId::generate(), gateway)
}

impl ChatSession {
    pub fn with_id(id: SessionId, gateway: Arc<dyn Gateway>) -> Self {
        tracing::debug!(session_id = %id, "Chat session started");
        Self {
            id,
            gateway,
            transcript: Mutex::new(Transcript::new()),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Upload one file. On failure a system notice is still appended and the
    /// error is returned for the caller to surface.
    pub async fn submit_upload(&self, file: UploadFile) -> Result<Message, ClientError> {
        if file.bytes.is_empty() {
            return Err(ClientError::EmptyFile(file.filename));
        }

        match self.gateway.upload(&file).await {
            Ok(_) => {
                tracing::info!(session_id = %self.id, filename = %file.filename, "File uploaded");
                Ok(self.append(Role::System, format!("Uploaded: {}", file.filename)))
            }
            Err(e) => {
                tracing::error!(
                    session_id = %self.id,
                    filename = %file.filename,
                    error = %e,
                    "Upload failed"
                );
                self.append(Role::System, format!("Upload failed: {}", file.filename));
                Err(e)
            }
        }
    }

    /// Ask a question. Returns the appended assistant message, or `None` when
    /// `text` is blank.
    pub async fn submit_question(&self, text: &str) -> Option<Message> {
        if text.trim().is_empty() {
            return None;
        }

        self.append(Role::User, text);

        let answer = match self.gateway.ask(&self.id, text).await {
            Ok(body) => answer_text(&body)
                .map(str::to_string)
                .ok_or(ClientError::MissingAnswer),
            Err(e) => Err(e),
        };

        let content = match answer {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!(session_id = %self.id, error = %e, "Question failed");
                ASK_FALLBACK.to_string()
            }
        };

        Some(self.append(Role::Assistant, content))
    }

    pub fn transcript(&self) -> Vec<Message> {
        self.lock().messages().to_vec()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn render(&self) -> String {
        render(self.lock().messages())
    }

    fn append(&self, role: Role, content: impl Into<String>) -> Message {
        self.lock().append(role, content)
    }

    fn lock(&self) -> MutexGuard<'_, Transcript> {
        // Appends cannot panic midway, so a poisoned transcript is still whole.
        self.transcript
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
