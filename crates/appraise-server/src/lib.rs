//! HTTP boundary: `POST /predict` and `GET /health`.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod tracing_setup;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

pub use crate::config::AppConfig;
pub use crate::error::ApiError;
pub use crate::state::AppState;

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/predict", post(routes::predict))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
