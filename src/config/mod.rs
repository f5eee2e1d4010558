mod file;
mod server;

pub use file::{FileConfig, GithubSection, ReconcilerSection, ServerSection};
pub use server::{
    DEFAULT_API_BASE_URL, DEFAULT_RECONCILE_INTERVAL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT,
    GithubAppConfig, ReconcilerConfig, ServerConfig,
};
