use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::app::AppCredentials;
use crate::config::GithubAppConfig;
use crate::error::{Error, RemoteError, Result};

const API_VERSION: &str = "2022-11-28";
const PAGE_SIZE: usize = 100;
const MAX_ERROR_BODY: usize = 800;

/// Installation-scoped access token.
#[derive(Clone, Deserialize)]
pub struct InstallationToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for InstallationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallationToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryOwner {
    pub id: i64,
    pub login: String,
    /// "User" or "Organization"
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstallationRepository {
    pub id: i64,
    pub full_name: String,
    pub name: String,
    #[serde(default)]
    pub private: bool,
    pub owner: RepositoryOwner,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Deserialize)]
struct RepositoryPage {
    #[serde(default)]
    repositories: Vec<InstallationRepository>,
}

/// Client for the app-authenticated installation endpoints.
///
/// Non-2xx answers surface as [`RemoteError`] with the status preserved; only a
/// 404 becomes [`RemoteError::NotFound`].
#[derive(Clone)]
pub struct GithubAppClient {
    http: reqwest::Client,
    api_base: String,
    credentials: AppCredentials,
}

impl GithubAppClient {
    pub fn new(config: &GithubAppConfig) -> Result<Self> {
        let credentials = AppCredentials::new(&config.app_id, &config.private_key)?;
        Self::with_credentials(config, credentials)
    }

    pub fn with_credentials(config: &GithubAppConfig, credentials: AppCredentials) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| Error::Config(format!("invalid user agent: {e}")))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create github api client: {e}")))?;

        Ok(Self {
            http,
            api_base: config.api_base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    #[must_use]
    pub fn credentials(&self) -> &AppCredentials {
        &self.credentials
    }

    /// Exchanges a fresh app assertion for a token scoped to one installation.
    ///
    /// Doubles as the liveness probe: a 404 means the installation is gone.
    pub async fn mint_installation_token(&self, installation_id: i64) -> Result<InstallationToken> {
        let assertion = self.credentials.mint_assertion()?;
        let url = format!(
            "{}/app/installations/{installation_id}/access_tokens",
            self.api_base
        );

        self.send_json(self.http.post(url).bearer_auth(assertion)).await
    }

    pub async fn list_installation_repositories(
        &self,
        token: &str,
    ) -> Result<Vec<InstallationRepository>> {
        let url = format!("{}/installation/repositories", self.api_base);
        let per_page = PAGE_SIZE.to_string();
        let mut page = 1_u32;
        let mut repositories = Vec::new();

        loop {
            let page_value = page.to_string();
            let chunk: RepositoryPage = self
                .send_json(
                    self.http
                        .get(&url)
                        .bearer_auth(token)
                        .query(&[("per_page", per_page.as_str()), ("page", page_value.as_str())]),
                )
                .await?;

            let chunk_len = chunk.repositories.len();
            repositories.extend(chunk.repositories);
            if chunk_len < PAGE_SIZE {
                break;
            }
            page = page.saturating_add(1);
        }

        Ok(repositories)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(RemoteError::Transport)?;
        let status = response.status();

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| Error::from(RemoteError::Decode(e.to_string())));
        }

        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::from_status(status.as_u16(), truncate_for_error(&body)).into())
    }
}

fn truncate_for_error(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
