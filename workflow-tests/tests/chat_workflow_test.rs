//! Client -> gateway -> worker scenarios.

mod common;

use chatpdf_client::session::ASK_FALLBACK;
use chatpdf_client::{ChatSession, ClientError, Role, SessionId};
use serde_json::json;
use std::sync::Arc;
use workflow_tests::{client_for, spawn_gateway, unreachable_url, WorkerMode};

#[tokio::test]
async fn upload_then_ask_builds_the_transcript() {
    let stack = common::setup(WorkerMode::Scripted {
        upload: json!({"status": "ok"}),
        ask: json!({"prompt": "This document discusses..."}),
    })
    .await;
    let session = stack.session("s1").unwrap();

    let notice = session.submit_upload(common::pdf("doc.pdf")).await.unwrap();
    assert_eq!(notice.role, Role::System);
    assert_eq!(notice.content, "Uploaded: doc.pdf");

    let answer = session.submit_question("What is the summary?").await.unwrap();
    assert_eq!(answer.content, "This document discusses...");

    let transcript = session.transcript();
    let turns: Vec<(Role, &str)> = transcript
        .iter()
        .map(|m| (m.role, m.content.as_str()))
        .collect();
    assert_eq!(
        turns,
        vec![
            (Role::System, "Uploaded: doc.pdf"),
            (Role::User, "What is the summary?"),
            (Role::Assistant, "This document discusses..."),
        ]
    );
}

#[tokio::test]
async fn unreachable_worker_yields_fallback_answer() {
    let worker_url = unreachable_url().await.unwrap();
    let gateway_url = spawn_gateway(&worker_url, 2).await.unwrap();
    let session = ChatSession::with_id(
        SessionId::from("s1"),
        Arc::new(client_for(&gateway_url).unwrap()),
    );

    let answer = session.submit_question("Anyone there?").await.unwrap();

    assert_eq!(answer.role, Role::Assistant);
    assert_eq!(answer.content, ASK_FALLBACK);
    assert_eq!(session.transcript().len(), 2);
}

#[tokio::test]
async fn unreachable_gateway_yields_fallback_answer() {
    let gateway_url = unreachable_url().await.unwrap();
    let session = ChatSession::with_id(
        SessionId::from("s1"),
        Arc::new(client_for(&gateway_url).unwrap()),
    );

    let answer = session.submit_question("Hello?").await.unwrap();
    assert_eq!(answer.content, ASK_FALLBACK);
}

#[tokio::test]
async fn broken_worker_fails_upload_without_leaking_details() {
    let stack = common::setup(WorkerMode::Broken).await;
    let session = stack.session("s1").unwrap();

    let err = session
        .submit_upload(common::pdf("doc.pdf"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::UploadFailed(status) if status.as_u16() == 502));
    assert!(!err.to_string().contains("exploded"));
    let transcript = session.transcript();
    assert_eq!(transcript.len(), 1);
    assert_eq!(transcript[0].content, "Upload failed: doc.pdf");

    let answer = session.submit_question("Still there?").await.unwrap();
    assert_eq!(answer.content, ASK_FALLBACK);
}

#[tokio::test]
async fn uploaded_documents_reach_the_worker() {
    let stack = common::setup(WorkerMode::Rag).await;
    let session = stack.session("s1").unwrap();

    session.submit_upload(common::pdf("a.pdf")).await.unwrap();
    session.submit_upload(common::pdf("b.pdf")).await.unwrap();

    assert_eq!(stack.worker.documents(), vec!["a.pdf", "b.pdf"]);

    let answer = session.submit_question("Compare them").await.unwrap();
    assert!(answer.content.contains("[DOC 1] a.pdf"));
    assert!(answer.content.contains("[DOC 2] b.pdf"));
    assert!(answer.content.contains("USER QUESTION:\nCompare them"));
}

#[tokio::test]
async fn blank_question_never_reaches_the_worker() {
    let stack = common::setup(WorkerMode::Rag).await;
    let session = stack.session("s1").unwrap();

    assert!(session.submit_question("   ").await.is_none());

    assert!(session.transcript().is_empty());
    assert!(stack.worker.history("s1").is_empty());
}
