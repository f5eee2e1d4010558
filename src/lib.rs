//! # Hooksync
//!
//! Ingests GitHub App webhooks into a local SQLite projection and keeps the
//! set of authorized repositories in step with the App's installations.
//! Usable both as a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! hooksync = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hooksync::config::{GithubAppConfig, ReconcilerConfig};
//! use hooksync::reconcile::Reconciler;
//! use hooksync::server::{AppState, create_router};
//! use hooksync::store::{SqliteStore, Store};
//!
//! let store: Arc<dyn Store> = Arc::new(SqliteStore::new("./data/hooksync.db").unwrap());
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(store.clone(), Some("webhook-secret".into())));
//! let router = create_router(state);
//! let mut reconciler =
//!     Reconciler::new(store, GithubAppConfig::default(), ReconcilerConfig::default()).spawn();
//! // Serve with axum, then `reconciler.shutdown().await`.
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `hooksync` binary. Disable with `default-features = false`.

pub mod config;
pub mod error;
pub mod github;
pub mod ingest;
pub mod reconcile;
pub mod server;
pub mod store;
pub mod types;
