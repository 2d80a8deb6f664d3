//! End-to-end chat workflow test harness.
//!
//! Spins up, in-process, a fake inference worker and a real chatpdf gateway
//! pointed at it, then drives them through `chatpdf_client` sessions.
//!
//! ## Usage
//!
//! ```bash
//! cargo test -p workflow-tests
//! ```

use anyhow::{anyhow, Context, Result};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chatpdf_client::config::ClientSettings;
use chatpdf_client::{ChatSession, GatewayClient, SessionId};
use chatpdf_gateway::config::{ServerSettings, Settings, WorkerSettings};
use chatpdf_gateway::startup::Application;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};
use tokio::net::TcpListener;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,workflow_tests=debug,chatpdf_gateway=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// How the fake worker answers.
#[derive(Debug, Clone)]
pub enum WorkerMode {
    /// Keep uploaded filenames and per-session question history, and answer
    /// with a prompt assembled from both.
    Rag,
    /// Return fixed bodies.
    Scripted { upload: Value, ask: Value },
    /// Answer every call with a 500.
    Broken,
}

#[derive(Debug, Deserialize)]
struct AskBody {
    session_id: String,
    question: String,
    #[serde(default = "default_include_history")]
    include_history: bool,
    #[serde(default = "default_history_limit")]
    history_limit: usize,
}

fn default_include_history() -> bool {
    true
}

fn default_history_limit() -> usize {
    10
}

#[derive(Default)]
struct WorkerStore {
    documents: Vec<String>,
    histories: HashMap<String, Vec<String>>,
}

#[derive(Clone)]
struct WorkerState {
    mode: WorkerMode,
    store: Arc<Mutex<WorkerStore>>,
}

pub struct FakeWorker {
    pub address: String,
    state: WorkerState,
}

impl FakeWorker {
    pub async fn spawn(mode: WorkerMode) -> Result<Self> {
        let state = WorkerState {
            mode,
            store: Arc::new(Mutex::new(WorkerStore::default())),
        };

        let app = Router::new()
            .route("/process-pdf", post(process_pdf))
            .route("/ask", post(ask))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind fake worker")?;
        let address = format!("http://{}", listener.local_addr()?);

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        tracing::debug!(%address, "Fake worker listening");
        Ok(Self { address, state })
    }

    pub fn documents(&self) -> Vec<String> {
        self.lock().documents.clone()
    }

    /// Questions the worker has seen for `session_id`, oldest first.
    pub fn history(&self, session_id: &str) -> Vec<String> {
        self.lock()
            .histories
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WorkerStore> {
        self.state
            .store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn process_pdf(State(state): State<WorkerState>, mut multipart: Multipart) -> Response {
    let mut filename = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            filename = field.file_name().map(str::to_string);
            let _ = field.bytes().await;
        }
    }

    match &state.mode {
        WorkerMode::Broken => {
            (StatusCode::INTERNAL_SERVER_ERROR, "worker exploded").into_response()
        }
        WorkerMode::Scripted { upload, .. } => Json(upload.clone()).into_response(),
        WorkerMode::Rag => {
            let Some(filename) = filename else {
                return (StatusCode::BAD_REQUEST, "no file").into_response();
            };
            let mut store = state.store.lock().unwrap_or_else(|p| p.into_inner());
            store.documents.push(filename);
            Json(json!({
                "message": "PDF processed successfully",
                "document_id": store.documents.len(),
                "total_chunks": 1,
            }))
            .into_response()
        }
    }
}

async fn ask(State(state): State<WorkerState>, Json(body): Json<AskBody>) -> Response {
    match &state.mode {
        WorkerMode::Broken => {
            (StatusCode::INTERNAL_SERVER_ERROR, "worker exploded").into_response()
        }
        WorkerMode::Scripted { ask, .. } => Json(ask.clone()).into_response(),
        WorkerMode::Rag => {
            let mut store = state.store.lock().unwrap_or_else(|p| p.into_inner());

            let mut prompt = String::from("RELEVANT DOCUMENTS:\n");
            for (i, document) in store.documents.iter().enumerate() {
                prompt.push_str(&format!("[DOC {}] {}\n", i + 1, document));
            }

            let history = store.histories.entry(body.session_id.clone()).or_default();
            if body.include_history && !history.is_empty() {
                prompt.push_str("CONVERSATION HISTORY:\n");
                let skip = history.len().saturating_sub(body.history_limit);
                for question in &history[skip..] {
                    prompt.push_str(&format!("USER: {}\n", question));
                }
            }
            prompt.push_str(&format!("USER QUESTION:\n{}\n", body.question));
            history.push(body.question.clone());

            Json(json!({
                "prompt": prompt,
                "retrieved": store.documents,
                "session_id": body.session_id,
            }))
            .into_response()
        }
    }
}

/// A fake worker with a gateway in front of it.
pub struct ChatStack {
    pub worker: FakeWorker,
    pub gateway_url: String,
}

impl ChatStack {
    pub async fn spawn(mode: WorkerMode) -> Result<Self> {
        init_tracing();
        let worker = FakeWorker::spawn(mode).await?;
        let gateway_url = spawn_gateway(&worker.address, 5).await?;
        Ok(Self {
            worker,
            gateway_url,
        })
    }

    pub fn gateway_client(&self) -> Result<GatewayClient> {
        client_for(&self.gateway_url)
    }

    /// A chat session with a fixed id against this stack's gateway.
    pub fn session(&self, id: &str) -> Result<ChatSession> {
        Ok(ChatSession::with_id(
            SessionId::from(id),
            Arc::new(self.gateway_client()?),
        ))
    }
}

pub fn client_for(gateway_url: &str) -> Result<GatewayClient> {
    let settings = ClientSettings {
        server_url: gateway_url.to_string(),
        timeout_secs: 10,
    };
    GatewayClient::new(settings).map_err(|e| anyhow!("Failed to build gateway client: {}", e))
}

/// Start a gateway on a random port relaying to `worker_url`.
pub async fn spawn_gateway(worker_url: &str, timeout_secs: u64) -> Result<String> {
    let settings = Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..ServerSettings::default()
        },
        worker: WorkerSettings {
            url: worker_url.to_string(),
            timeout_secs,
        },
        ..Settings::default()
    };

    let app = Application::build(settings)
        .await
        .map_err(|e| anyhow!("Failed to build gateway: {}", e))?;
    let address = format!("http://127.0.0.1:{}", app.port());

    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    Ok(address)
}

/// An address nothing listens on.
pub async fn unreachable_url() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = format!("http://{}", listener.local_addr()?);
    drop(listener);
    Ok(address)
}
