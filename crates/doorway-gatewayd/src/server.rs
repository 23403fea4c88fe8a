//! HTTP surface of the gateway.
//!
//! One envelope endpoint and a health probe. The envelope endpoint accepts
//! a binary-encoded request envelope in the body and answers with a
//! binary-encoded response envelope; the status code is an auxiliary
//! signal (400 malformed, 404 unknown device or kind, 406 authentication
//! or time-sync refusal, 200 otherwise — including protocol-level failure
//! payloads).

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;

use crate::dispatch::Dispatcher;

/// Builds the gateway router.
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/proto", post(proto))
        .route("/healthz", get(healthz))
        .with_state(dispatcher)
}

async fn proto(State(dispatcher): State<Arc<Dispatcher>>, body: Bytes) -> impl IntoResponse {
    dispatcher.dispatch(&body).await
}

async fn healthz() -> &'static str {
    "ok"
}
