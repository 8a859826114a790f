//! Liveness probe and the shutdown flag behind it.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parking_lot::RwLock;
use std::sync::Arc;

/// Process-wide "shutting down" flag.
///
/// Cloned into the probe handler and flipped once by the node when graceful
/// shutdown begins. The probe takes a read lock on every call; initiation
/// takes the write lock.
#[derive(Debug, Clone, Default)]
pub struct ShutdownState {
    inner: Arc<RwLock<bool>>,
}

impl ShutdownState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark shutdown as started. Idempotent; there is no way back.
    pub fn initiate(&self) {
        let mut shutting_down = self.inner.write();
        if !*shutting_down {
            *shutting_down = true;
            tracing::info!("Shutdown initiated, health probe now reports unavailable");
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.inner.read()
    }
}

/// Health probe handler.
///
/// GET /healthz
///
/// Returns 200 OK while serving, 503 once shutdown has started so load
/// balancers stop routing new traffic here.
pub async fn healthz_handler(State(state): State<ShutdownState>) -> Response {
    if state.is_shutting_down() {
        (StatusCode::SERVICE_UNAVAILABLE, "shutting down").into_response()
    } else {
        (StatusCode::OK, "OK").into_response()
    }
}
