//! Route definitions for the companion service.

use crate::app_state::AppState;
use crate::handlers::{
    health_handler, register_token_handler, stream_token_handler, test_webhook_handler,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the `/api` router over the shared state.
pub fn routes(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/stream-token", post(stream_token_handler))
        .route("/notifications/register", post(register_token_handler))
        .route("/notifications/test-webhook", post(test_webhook_handler))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .route("/health", get(health_handler))
}
