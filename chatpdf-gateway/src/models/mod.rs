pub mod relay;

pub use relay::{AskPayload, AskRequest, UploadRequest, WorkerResponse};
