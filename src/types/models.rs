use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    PendingVerification,
    Verified,
    Rejected,
}

impl ProjectStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::PendingVerification => "pending_verification",
            ProjectStatus::Verified => "verified",
            ProjectStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_verification" => Ok(ProjectStatus::PendingVerification),
            "verified" => Ok(ProjectStatus::Verified),
            "rejected" => Ok(ProjectStatus::Rejected),
            other => Err(format!("unknown project status: {other}")),
        }
    }
}

/// A locally tracked repository. Deletion is a tombstone in `deleted_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub github_full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_app_installation_id: Option<i64>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Project {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ProjectStatus::Verified && self.deleted_at.is_none()
    }

    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.status == ProjectStatus::Rejected && self.deleted_at.is_some()
    }
}

/// Append-only audit row, one per webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationEvent {
    pub delivery_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub repo_full_name: String,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub payload: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueSnapshot {
    pub project_id: String,
    pub github_issue_id: i64,
    pub number: i64,
    pub state: String,
    pub title: String,
    pub body: String,
    pub author_login: String,
    pub url: String,
    pub created_at_github: Option<DateTime<Utc>>,
    pub updated_at_github: Option<DateTime<Utc>>,
    pub closed_at_github: Option<DateTime<Utc>>,
    pub last_seen_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestSnapshot {
    pub project_id: String,
    pub github_pr_id: i64,
    pub number: i64,
    pub state: String,
    pub title: String,
    pub body: String,
    pub author_login: String,
    pub url: String,
    pub merged: bool,
    pub merged_at_github: Option<DateTime<Utc>>,
    pub created_at_github: Option<DateTime<Utc>>,
    pub updated_at_github: Option<DateTime<Utc>>,
    pub closed_at_github: Option<DateTime<Utc>>,
    pub last_seen_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncJobType {
    SyncIssues,
    SyncPrs,
}

impl SyncJobType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncJobType::SyncIssues => "sync_issues",
            SyncJobType::SyncPrs => "sync_prs",
        }
    }
}

impl FromStr for SyncJobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sync_issues" => Ok(SyncJobType::SyncIssues),
            "sync_prs" => Ok(SyncJobType::SyncPrs),
            other => Err(format!("unknown sync job type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncJobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl SyncJobStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncJobStatus::Pending => "pending",
            SyncJobStatus::Running => "running",
            SyncJobStatus::Completed => "completed",
            SyncJobStatus::Failed => "failed",
        }
    }
}

impl FromStr for SyncJobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SyncJobStatus::Pending),
            "running" => Ok(SyncJobStatus::Running),
            "completed" => Ok(SyncJobStatus::Completed),
            "failed" => Ok(SyncJobStatus::Failed),
            other => Err(format!("unknown sync job status: {other}")),
        }
    }
}

/// Work ticket picked up by the external sync worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncJob {
    pub id: String,
    pub project_id: String,
    pub job_type: SyncJobType,
    pub status: SyncJobStatus,
    pub run_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
