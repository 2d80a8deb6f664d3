//! Chat client for the chatpdf gateway.
//!
//! A [`session::ChatSession`] owns one session id and an append-only
//! transcript, and turns uploads and questions into gateway calls.

pub mod command;
pub mod config;
pub mod error;
pub mod gateway;
pub mod session;
pub mod transcript;

pub use error::ClientError;
pub use gateway::{Gateway, GatewayClient};
pub use session::{ChatSession, SessionId, UploadFile};
pub use transcript::{Message, Role, Transcript};
