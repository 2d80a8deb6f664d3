//! Concurrent sessions sharing one gateway stay independent.

mod common;

use futures::future::join_all;
use workflow_tests::WorkerMode;

#[tokio::test]
async fn worker_history_is_scoped_per_session() {
    let stack = common::setup(WorkerMode::Rag).await;
    let alice = stack.session("sess-alice").unwrap();
    let bob = stack.session("sess-bob").unwrap();

    alice.submit_question("alice first").await.unwrap();
    bob.submit_question("bob first").await.unwrap();
    let answer = alice.submit_question("alice second").await.unwrap();

    assert!(answer.content.contains("USER: alice first"));
    assert!(!answer.content.contains("bob"));
    assert_eq!(stack.worker.history("sess-alice"), vec!["alice first", "alice second"]);
    assert_eq!(stack.worker.history("sess-bob"), vec!["bob first"]);
}

#[tokio::test]
async fn concurrent_sessions_keep_their_own_transcripts() {
    let stack = common::setup(WorkerMode::Rag).await;
    let sessions: Vec<_> = (0..6)
        .map(|i| stack.session(&format!("sess-{}", i)).unwrap())
        .collect();

    join_all(
        sessions
            .iter()
            .enumerate()
            .map(|(i, session)| async move {
                let question = format!("question from {}", i);
                session.submit_question(&question).await
            }),
    )
    .await;

    for (i, session) in sessions.iter().enumerate() {
        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].content, format!("question from {}", i));
        assert!(transcript[1]
            .content
            .ends_with(&format!("USER QUESTION:\nquestion from {}\n", i)));
        assert_eq!(
            stack.worker.history(&format!("sess-{}", i)),
            vec![format!("question from {}", i)]
        );
    }
}

#[tokio::test]
async fn gateway_stays_healthy_under_chat_load() {
    let stack = common::setup(WorkerMode::Rag).await;
    let session = stack.session("sess-load").unwrap();

    for n in 0..5 {
        session.submit_question(&format!("q{}", n)).await.unwrap();
    }

    let health: serde_json::Value = reqwest::get(format!("{}/health", stack.gateway_url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(session.transcript().len(), 10);
}
