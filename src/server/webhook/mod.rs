mod handlers;
mod signature;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{Router, routing::post};

use crate::server::AppState;

pub use signature::{SIGNATURE_HEADER, sign_payload, verify_signature};

/// GitHub caps webhook payloads at 25 MB.
pub const MAX_DELIVERY_BYTES: usize = 25 * 1024 * 1024;

pub fn webhook_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/github", post(handlers::receive_github))
        .layer(DefaultBodyLimit::max(MAX_DELIVERY_BYTES))
}
