pub mod app;
pub mod chatpdf;

pub use app::{health_check, metrics};
pub use chatpdf::{ask_handler, upload_handler};
