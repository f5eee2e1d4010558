use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::webhook::webhook_router;
use crate::ingest::Ingestor;
use crate::store::Store;

pub struct AppState {
    pub ingestor: Ingestor,
    /// When set, every delivery must carry a valid `X-Hub-Signature-256`.
    pub webhook_secret: Option<String>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, webhook_secret: Option<String>) -> Self {
        Self {
            ingestor: Ingestor::new(store),
            webhook_secret: webhook_secret.filter(|s| !s.is_empty()),
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/webhooks", webhook_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
