mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Every mutation is a single statement, so concurrent callers never need an
/// in-process lock beyond the one guarding the connection.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Project operations
    fn create_project(&self, project: &Project) -> Result<()>;
    fn get_project(&self, id: &str) -> Result<Option<Project>>;
    fn find_project_id_by_full_name(&self, full_name: &str) -> Result<Option<String>>;
    fn list_projects(&self) -> Result<Vec<Project>>;

    // Installation lifecycle. Each returns the number of projects changed.
    fn list_active_installation_ids(&self) -> Result<Vec<i64>>;
    fn revoke_installation(&self, installation_id: i64, at: DateTime<Utc>) -> Result<usize>;
    fn revoke_repository(
        &self,
        full_name: &str,
        installation_id: i64,
        at: DateTime<Utc>,
    ) -> Result<usize>;
    fn restore_repository(
        &self,
        full_name: &str,
        installation_id: i64,
        at: DateTime<Utc>,
    ) -> Result<usize>;

    // Audit events. `record_event` returns false when the delivery was already recorded.
    fn record_event(&self, event: &IntegrationEvent) -> Result<bool>;
    fn get_event(&self, delivery_id: &str) -> Result<Option<IntegrationEvent>>;
    fn count_events(&self) -> Result<i64>;

    // Snapshot operations
    fn upsert_issue(&self, issue: &IssueSnapshot) -> Result<()>;
    fn get_issue(&self, project_id: &str, github_issue_id: i64) -> Result<Option<IssueSnapshot>>;
    fn list_issues(&self, project_id: &str) -> Result<Vec<IssueSnapshot>>;
    fn upsert_pull_request(&self, pr: &PullRequestSnapshot) -> Result<()>;
    fn get_pull_request(
        &self,
        project_id: &str,
        github_pr_id: i64,
    ) -> Result<Option<PullRequestSnapshot>>;
    fn list_pull_requests(&self, project_id: &str) -> Result<Vec<PullRequestSnapshot>>;

    // Sync job operations
    fn enqueue_sync_jobs(&self, project_id: &str, run_at: DateTime<Utc>) -> Result<usize>;
    fn list_sync_jobs(&self, project_id: &str) -> Result<Vec<SyncJob>>;

    fn close(&self) -> Result<()>;
}
