#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chatpdf_gateway::config::{ServerSettings, Settings, WorkerSettings};
use chatpdf_gateway::startup::Application;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// Body the fake worker returns for uploads. Odd spacing and key order make
/// any re-serialization by the gateway visible.
pub const UPLOAD_REPLY: &str =
    "{ \"total_chunks\":3,  \"message\": \"PDF processed successfully\", \"document_id\": 12 }";

pub const WORKER_ERROR_DETAIL: &str = "psycopg2.OperationalError: could not connect to server";

#[derive(Clone, Copy, Debug)]
pub enum Behaviour {
    Succeed,
    /// Sleep before answering.
    Delay(Duration),
    /// Answer 500 with an internal error message.
    Fail,
}

#[derive(Debug, Clone)]
pub struct ReceivedUpload {
    pub field: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct FakeWorkerState {
    pub behaviour: Behaviour,
    pub hits: Arc<AtomicUsize>,
    pub uploads: Arc<Mutex<Vec<ReceivedUpload>>>,
    pub asks: Arc<Mutex<Vec<serde_json::Value>>>,
    pub request_ids: Arc<Mutex<Vec<Option<String>>>>,
}

pub struct FakeWorker {
    pub address: String,
    pub state: FakeWorkerState,
}

impl FakeWorker {
    pub async fn spawn(behaviour: Behaviour) -> Self {
        let state = FakeWorkerState {
            behaviour,
            hits: Arc::new(AtomicUsize::new(0)),
            uploads: Arc::new(Mutex::new(Vec::new())),
            asks: Arc::new(Mutex::new(Vec::new())),
            request_ids: Arc::new(Mutex::new(Vec::new())),
        };

        let app = Router::new()
            .route("/process-pdf", post(process_pdf))
            .route("/ask", post(ask))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake worker");
        let address = format!("http://{}", listener.local_addr().unwrap());

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        FakeWorker { address, state }
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }
}

async fn record(state: &FakeWorkerState, headers: &HeaderMap) -> Option<Response> {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.request_ids.lock().unwrap().push(
        headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );

    match state.behaviour {
        Behaviour::Succeed => None,
        Behaviour::Delay(delay) => {
            tokio::time::sleep(delay).await;
            None
        }
        Behaviour::Fail => {
            Some((StatusCode::INTERNAL_SERVER_ERROR, WORKER_ERROR_DETAIL).into_response())
        }
    }
}

async fn process_pdf(
    State(state): State<FakeWorkerState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    while let Ok(Some(field)) = multipart.next_field().await {
        let received = ReceivedUpload {
            field: field.name().unwrap_or_default().to_string(),
            filename: field.file_name().map(str::to_string),
            content_type: field.content_type().map(str::to_string),
            bytes: field.bytes().await.map(|b| b.to_vec()).unwrap_or_default(),
        };
        state.uploads.lock().unwrap().push(received);
    }

    if let Some(response) = record(&state, &headers).await {
        return response;
    }

    (
        [("content-type", "application/json")],
        Bytes::from_static(UPLOAD_REPLY.as_bytes()),
    )
        .into_response()
}

async fn ask(
    State(state): State<FakeWorkerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let payload: serde_json::Value = serde_json::from_slice(&body).unwrap_or_default();
    state.asks.lock().unwrap().push(payload.clone());

    if let Some(response) = record(&state, &headers).await {
        return response;
    }

    let session_id = payload["session_id"].as_str().unwrap_or_default();
    let question = payload["question"].as_str().unwrap_or_default();

    axum::Json(serde_json::json!({
        "prompt": format!("[{}] {}", session_id, question),
        "retrieved": [],
        "session_id": session_id,
    }))
    .into_response()
}

pub struct TestApp {
    pub address: String,
    pub worker: FakeWorker,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn(behaviour: Behaviour) -> Self {
        Self::spawn_with_timeout(behaviour, 15).await
    }

    pub async fn spawn_with_timeout(behaviour: Behaviour, timeout_secs: u64) -> Self {
        let worker = FakeWorker::spawn(behaviour).await;
        let address = spawn_gateway(&worker.address, timeout_secs).await;

        TestApp {
            address,
            worker,
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_file(&self, filename: &str, mime: &str, bytes: &[u8]) -> reqwest::Response {
        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(bytes.to_vec())
                .file_name(filename.to_string())
                .mime_str(mime)
                .unwrap(),
        );

        self.client
            .post(self.url("/chatpdf/upload"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_ask(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url("/chatpdf/ask"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

/// Start a gateway on a random port pointing at `worker_url`.
pub async fn spawn_gateway(worker_url: &str, timeout_secs: u64) -> String {
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
        .expect("Failed to build application");
    let address = format!("http://127.0.0.1:{}", app.port());

    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    address
}

/// An address nothing listens on.
pub async fn unreachable_worker_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    address
}
