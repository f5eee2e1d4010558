use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use chrono::Utc;
use hooksync::server::webhook::sign_payload;
use hooksync::server::{AppState, create_router};
use hooksync::store::{SqliteStore, Store};
use hooksync::types::{Project, ProjectStatus};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const SECRET: &str = "It's a Secret to Everybody";

/// An in-process router backed by a throwaway database.
pub struct TestApp {
    _temp_dir: TempDir,
    pub store: Arc<SqliteStore>,
    router: Router,
    secret: Option<String>,
}

impl TestApp {
    pub fn new(secret: Option<&str>) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = Arc::new(SqliteStore::new(temp_dir.path().join("hooksync.db")).expect("open store"));
        store.initialize().expect("initialize store");

        let state = Arc::new(AppState::new(store.clone(), secret.map(str::to_string)));
        Self {
            _temp_dir: temp_dir,
            store,
            router: create_router(state),
            secret: secret.map(str::to_string),
        }
    }

    pub fn add_project(&self, id: &str, full_name: &str, installation_id: Option<i64>) {
        let now = Utc::now();
        self.store
            .create_project(&Project {
                id: id.to_string(),
                github_full_name: full_name.to_string(),
                github_app_installation_id: installation_id,
                status: ProjectStatus::Verified,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            })
            .expect("create project");
    }

    /// Sends a delivery signed with the app's secret, if it has one.
    pub async fn deliver(&self, delivery_id: &str, event: &str, body: &str) -> (StatusCode, Value) {
        let signature = self
            .secret
            .as_deref()
            .map(|secret| sign_payload(body.as_bytes(), secret).expect("sign payload"));
        self.post_webhook(Some(delivery_id), Some(event), signature.as_deref(), body)
            .await
    }

    pub async fn post_webhook(
        &self,
        delivery_id: Option<&str>,
        event: Option<&str>,
        signature: Option<&str>,
        body: &str,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method("POST")
            .uri("/webhooks/github")
            .header("content-type", "application/json");
        if let Some(delivery_id) = delivery_id {
            request = request.header("X-GitHub-Delivery", delivery_id);
        }
        if let Some(event) = event {
            request = request.header("X-GitHub-Event", event);
        }
        if let Some(signature) = signature {
            request = request.header("X-Hub-Signature-256", signature);
        }

        let request = request
            .body(Body::from(body.to_string()))
            .expect("build request");
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}
