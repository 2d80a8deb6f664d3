pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

use services::Worker;
use std::sync::Arc;

/// Shared application state. Holds no per-request or per-session data.
#[derive(Clone)]
pub struct AppState {
    pub worker: Arc<dyn Worker>,
}

impl AppState {
    pub fn new(worker: Arc<dyn Worker>) -> Self {
        Self { worker }
    }
}
