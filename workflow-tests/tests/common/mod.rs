//! Common helpers for chat workflow tests.

#![allow(dead_code)]

use chatpdf_client::UploadFile;
use workflow_tests::{ChatStack, WorkerMode};

pub async fn setup(mode: WorkerMode) -> ChatStack {
    ChatStack::spawn(mode)
        .await
        .expect("Failed to start worker and gateway")
}

pub fn pdf(name: &str) -> UploadFile {
    UploadFile::new(name, "application/pdf", b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n".to_vec())
}
