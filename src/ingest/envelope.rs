//! Webhook payload decoding.
//!
//! The loose [`Envelope`] never fails: each sub-object is decoded on its own and
//! anything missing or malformed simply comes back as `None`. Installation
//! payloads use the strict [`InstallationPayload`] decoder because they drive
//! destructive state changes.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::Result;

/// Event types this service understands, from the `X-GitHub-Event` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Issues,
    PullRequest,
    PullRequestReview,
    Push,
    Installation,
    InstallationRepositories,
    Other(String),
}

impl EventKind {
    #[must_use]
    pub fn parse(event: &str) -> Self {
        match event.trim() {
            "issues" => EventKind::Issues,
            "pull_request" => EventKind::PullRequest,
            "pull_request_review" => EventKind::PullRequestReview,
            "push" => EventKind::Push,
            "installation" => EventKind::Installation,
            "installation_repositories" => EventKind::InstallationRepositories,
            other => EventKind::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Issues => "issues",
            EventKind::PullRequest => "pull_request",
            EventKind::PullRequestReview => "pull_request_review",
            EventKind::Push => "push",
            EventKind::Installation => "installation",
            EventKind::InstallationRepositories => "installation_repositories",
            EventKind::Other(other) => other,
        }
    }

    /// Events that mean repository content moved and a full resync is worthwhile.
    #[must_use]
    pub fn implies_repository_activity(&self) -> bool {
        matches!(
            self,
            EventKind::Issues | EventKind::PullRequest | EventKind::Push
        )
    }

    #[must_use]
    pub fn carries_issue(&self) -> bool {
        matches!(self, EventKind::Issues)
    }

    #[must_use]
    pub fn carries_pull_request(&self) -> bool {
        matches!(self, EventKind::PullRequest | EventKind::PullRequestReview)
    }

    #[must_use]
    pub fn is_installation_lifecycle(&self) -> bool {
        matches!(
            self,
            EventKind::Installation | EventKind::InstallationRepositories
        )
    }
}

/// Treats JSON `null` the same as an absent field.
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RepositoryRef {
    #[serde(default, deserialize_with = "nullable")]
    pub full_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserRef {
    #[serde(default, deserialize_with = "nullable")]
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IssuePayload {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub number: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub state: String,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub body: String,
    #[serde(default, deserialize_with = "nullable")]
    pub html_url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub user: UserRef,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PullRequestPayload {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub number: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub state: String,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub body: String,
    #[serde(default, deserialize_with = "nullable")]
    pub html_url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub user: UserRef,
    #[serde(default, deserialize_with = "nullable")]
    pub merged: bool,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
}

/// Best-effort view of any webhook payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub action: String,
    pub repository: Option<RepositoryRef>,
    pub sender: Option<UserRef>,
    pub issue: Option<IssuePayload>,
    pub pull_request: Option<PullRequestPayload>,
}

impl Envelope {
    /// Decodes what it can. Invalid JSON yields an empty envelope.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        let value: Value = match serde_json::from_slice(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, "webhook payload is not valid JSON");
                return Self::default();
            }
        };

        Self {
            action: value
                .get("action")
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            repository: sub_object(&value, "repository"),
            sender: sub_object(&value, "sender"),
            issue: sub_object(&value, "issue"),
            pull_request: sub_object(&value, "pull_request"),
        }
    }

    #[must_use]
    pub fn repository_full_name(&self) -> Option<&str> {
        self.repository
            .as_ref()
            .map(|r| r.full_name.trim())
            .filter(|name| !name.is_empty())
    }

    /// Login of the account that triggered the delivery.
    #[must_use]
    pub fn sender_login(&self) -> Option<&str> {
        self.sender
            .as_ref()
            .map(|s| s.login.trim())
            .filter(|login| !login.is_empty())
    }
}

fn sub_object<T: DeserializeOwned>(value: &Value, key: &str) -> Option<T> {
    let field = value.get(key).filter(|v| !v.is_null())?;
    match T::deserialize(field) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::debug!(field = key, error = %e, "skipping malformed webhook sub-object");
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstallationInfo {
    pub id: i64,
}

/// Strict decode of `installation` / `installation_repositories` payloads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstallationPayload {
    pub action: String,
    pub installation: InstallationInfo,
    #[serde(default, deserialize_with = "nullable")]
    pub repositories_added: Vec<RepositoryRef>,
    #[serde(default, deserialize_with = "nullable")]
    pub repositories_removed: Vec<RepositoryRef>,
    #[serde(default, deserialize_with = "nullable")]
    pub repository_selection: String,
}

impl InstallationPayload {
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let mut payload: Self = serde_json::from_slice(raw)?;
        payload.action = payload.action.trim().to_ascii_lowercase();
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_classification() {
        assert_eq!(EventKind::parse("issues"), EventKind::Issues);
        assert_eq!(
            EventKind::parse("workflow_run"),
            EventKind::Other("workflow_run".to_string())
        );
        assert!(EventKind::Push.implies_repository_activity());
        assert!(!EventKind::PullRequestReview.implies_repository_activity());
        assert!(EventKind::PullRequestReview.carries_pull_request());
        assert!(EventKind::InstallationRepositories.is_installation_lifecycle());
        assert!(!EventKind::Other("star".into()).is_installation_lifecycle());
        assert_eq!(EventKind::parse("pull_request").as_str(), "pull_request");
    }

    #[test]
    fn test_parse_issue_event() {
        let raw = br#"{
            "action": "opened",
            "repository": {"full_name": "acme/widgets", "id": 1},
            "sender": {"login": "octocat"},
            "issue": {
                "id": 9001,
                "number": 7,
                "state": "open",
                "title": "Broken",
                "body": null,
                "html_url": "https://github.com/acme/widgets/issues/7",
                "user": {"login": "octocat"},
                "created_at": "2024-05-01T10:00:00Z",
                "updated_at": "2024-05-01T10:00:00Z",
                "closed_at": null,
                "labels": []
            }
        }"#;

        let env = Envelope::parse(raw);
        assert_eq!(env.action, "opened");
        assert_eq!(env.repository_full_name(), Some("acme/widgets"));
        assert_eq!(env.sender_login(), Some("octocat"));
        let issue = env.issue.unwrap();
        assert_eq!(issue.id, 9001);
        assert_eq!(issue.body, "");
        assert_eq!(issue.user.login, "octocat");
        assert!(issue.closed_at.is_none());
        assert!(env.pull_request.is_none());
    }

    #[test]
    fn test_parse_invalid_json_yields_empty_envelope() {
        let env = Envelope::parse(b"not json at all");
        assert_eq!(env, Envelope::default());
    }

    #[test]
    fn test_malformed_sub_object_does_not_poison_the_rest() {
        let raw = br#"{
            "action": "opened",
            "repository": {"full_name": "acme/widgets"},
            "issue": "this should be an object",
            "pull_request": {"number": 3}
        }"#;

        let env = Envelope::parse(raw);
        assert_eq!(env.repository_full_name(), Some("acme/widgets"));
        assert!(env.issue.is_none());
        // No id, so there is no key to upsert under.
        assert!(env.pull_request.is_none());
    }

    #[test]
    fn test_blank_repository_name_is_absent() {
        let env = Envelope::parse(br#"{"repository": {"full_name": "  "}, "sender": {"login": null}}"#);
        assert_eq!(env.repository_full_name(), None);
        assert_eq!(env.sender_login(), None);
    }

    #[test]
    fn test_pull_request_with_nulls() {
        let raw = br#"{
            "action": "closed",
            "pull_request": {
                "id": 555, "number": 12, "state": "closed", "title": null,
                "user": null, "merged": null, "merged_at": "2024-05-02T08:00:00Z"
            }
        }"#;

        let pr = Envelope::parse(raw).pull_request.unwrap();
        assert_eq!(pr.title, "");
        assert_eq!(pr.user.login, "");
        assert!(!pr.merged);
        assert!(pr.merged_at.is_some());
    }

    #[test]
    fn test_installation_payload_strict_decode() {
        let raw = br#"{
            "action": "Removed",
            "installation": {"id": 123, "account": {"login": "acme"}},
            "repository_selection": "selected",
            "repositories_added": [],
            "repositories_removed": [{"full_name": "acme/widgets"}, {"full_name": "acme/gears"}]
        }"#;

        let payload = InstallationPayload::parse(raw).unwrap();
        assert_eq!(payload.action, "removed");
        assert_eq!(payload.installation.id, 123);
        assert_eq!(payload.repositories_removed.len(), 2);
        assert!(payload.repositories_added.is_empty());
    }

    #[test]
    fn test_installation_payload_without_id_is_rejected() {
        let raw = br#"{"action": "deleted", "installation": {}}"#;
        assert!(InstallationPayload::parse(raw).is_err());
        assert!(InstallationPayload::parse(b"{}").is_err());
    }
}
