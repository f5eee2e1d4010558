mod app;
mod client;

pub use app::{AppClaims, AppCredentials};
pub use client::{GithubAppClient, InstallationRepository, InstallationToken, RepositoryOwner};
