use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn parse_optional_datetime(s: Option<String>) -> Option<DateTime<Utc>> {
    s.map(|s| parse_datetime(&s))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_text<T: FromStr<Err = String>>(idx: usize, value: String) -> rusqlite::Result<T> {
    value
        .parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

const PROJECT_COLUMNS: &str =
    "id, github_full_name, github_app_installation_id, status, created_at, updated_at, deleted_at";

fn row_to_project(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        github_full_name: row.get(1)?,
        github_app_installation_id: row.get(2)?,
        status: parse_text(3, row.get(3)?)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        updated_at: parse_datetime(&row.get::<_, String>(5)?),
        deleted_at: parse_optional_datetime(row.get(6)?),
    })
}

const ISSUE_COLUMNS: &str = "project_id, github_issue_id, number, state, title, body, author_login, url,
     created_at_github, updated_at_github, closed_at_github, last_seen_at";

fn row_to_issue(row: &Row<'_>) -> rusqlite::Result<IssueSnapshot> {
    Ok(IssueSnapshot {
        project_id: row.get(0)?,
        github_issue_id: row.get(1)?,
        number: row.get(2)?,
        state: row.get(3)?,
        title: row.get(4)?,
        body: row.get(5)?,
        author_login: row.get(6)?,
        url: row.get(7)?,
        created_at_github: parse_optional_datetime(row.get(8)?),
        updated_at_github: parse_optional_datetime(row.get(9)?),
        closed_at_github: parse_optional_datetime(row.get(10)?),
        last_seen_at: parse_datetime(&row.get::<_, String>(11)?),
    })
}

const PULL_REQUEST_COLUMNS: &str = "project_id, github_pr_id, number, state, title, body, author_login, url,
     merged, merged_at_github, created_at_github, updated_at_github, closed_at_github, last_seen_at";

fn row_to_pull_request(row: &Row<'_>) -> rusqlite::Result<PullRequestSnapshot> {
    Ok(PullRequestSnapshot {
        project_id: row.get(0)?,
        github_pr_id: row.get(1)?,
        number: row.get(2)?,
        state: row.get(3)?,
        title: row.get(4)?,
        body: row.get(5)?,
        author_login: row.get(6)?,
        url: row.get(7)?,
        merged: row.get(8)?,
        merged_at_github: parse_optional_datetime(row.get(9)?),
        created_at_github: parse_optional_datetime(row.get(10)?),
        updated_at_github: parse_optional_datetime(row.get(11)?),
        closed_at_github: parse_optional_datetime(row.get(12)?),
        last_seen_at: parse_datetime(&row.get::<_, String>(13)?),
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Project operations

    fn create_project(&self, project: &Project) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO projects (id, github_full_name, github_app_installation_id, status, created_at, updated_at, deleted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                project.id,
                project.github_full_name,
                project.github_app_installation_id,
                project.status.as_str(),
                format_datetime(&project.created_at),
                format_datetime(&project.updated_at),
                project.deleted_at.as_ref().map(format_datetime),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::AlreadyExists(project.github_full_name.clone()))
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
            params![id],
            row_to_project,
        )
        .optional()
        .map_err(Error::from)
    }

    fn find_project_id_by_full_name(&self, full_name: &str) -> Result<Option<String>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id FROM projects WHERE github_full_name = ?1",
            params![full_name],
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_projects(&self) -> Result<Vec<Project>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY github_full_name"
        ))?;

        let rows = stmt.query_map([], row_to_project)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Installation lifecycle

    fn list_active_installation_ids(&self) -> Result<Vec<i64>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT github_app_installation_id FROM projects
             WHERE github_app_installation_id IS NOT NULL AND deleted_at IS NULL
             ORDER BY github_app_installation_id",
        )?;

        let rows = stmt.query_map([], |row| row.get(0))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn revoke_installation(&self, installation_id: i64, at: DateTime<Utc>) -> Result<usize> {
        let rows = self.conn().execute(
            "UPDATE projects SET deleted_at = ?2, status = 'rejected', updated_at = ?2
             WHERE github_app_installation_id = ?1 AND deleted_at IS NULL",
            params![installation_id, format_datetime(&at)],
        )?;
        Ok(rows)
    }

    fn revoke_repository(
        &self,
        full_name: &str,
        installation_id: i64,
        at: DateTime<Utc>,
    ) -> Result<usize> {
        let rows = self.conn().execute(
            "UPDATE projects SET deleted_at = ?3, status = 'rejected', updated_at = ?3
             WHERE github_full_name = ?1
               AND (github_app_installation_id = ?2 OR github_app_installation_id IS NULL)
               AND deleted_at IS NULL",
            params![full_name, installation_id, format_datetime(&at)],
        )?;
        Ok(rows)
    }

    fn restore_repository(
        &self,
        full_name: &str,
        installation_id: i64,
        at: DateTime<Utc>,
    ) -> Result<usize> {
        let rows = self.conn().execute(
            "UPDATE projects SET deleted_at = NULL, status = 'verified', updated_at = ?3
             WHERE github_full_name = ?1
               AND github_app_installation_id = ?2
               AND deleted_at IS NOT NULL",
            params![full_name, installation_id, format_datetime(&at)],
        )?;
        Ok(rows)
    }

    // Audit events

    fn record_event(&self, event: &IntegrationEvent) -> Result<bool> {
        let rows = self.conn().execute(
            "INSERT INTO github_events (delivery_id, project_id, repo_full_name, event, action, payload, received_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (delivery_id) DO NOTHING",
            params![
                event.delivery_id,
                event.project_id,
                event.repo_full_name,
                event.event,
                event.action,
                event.payload,
                format_datetime(&event.received_at),
            ],
        )?;
        Ok(rows > 0)
    }

    fn get_event(&self, delivery_id: &str) -> Result<Option<IntegrationEvent>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT delivery_id, project_id, repo_full_name, event, action, payload, received_at
             FROM github_events WHERE delivery_id = ?1",
            params![delivery_id],
            |row| {
                Ok(IntegrationEvent {
                    delivery_id: row.get(0)?,
                    project_id: row.get(1)?,
                    repo_full_name: row.get(2)?,
                    event: row.get(3)?,
                    action: row.get(4)?,
                    payload: row.get(5)?,
                    received_at: parse_datetime(&row.get::<_, String>(6)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn count_events(&self) -> Result<i64> {
        let conn = self.conn();
        let count = conn.query_row("SELECT COUNT(*) FROM github_events", [], |row| row.get(0))?;
        Ok(count)
    }

    // Snapshot operations

    fn upsert_issue(&self, issue: &IssueSnapshot) -> Result<()> {
        self.conn().execute(
            "INSERT INTO github_issues (project_id, github_issue_id, number, state, title, body, author_login, url,
                                        created_at_github, updated_at_github, closed_at_github, last_seen_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT (project_id, github_issue_id) DO UPDATE SET
                number = excluded.number,
                state = excluded.state,
                title = excluded.title,
                body = excluded.body,
                author_login = excluded.author_login,
                url = excluded.url,
                created_at_github = excluded.created_at_github,
                updated_at_github = excluded.updated_at_github,
                closed_at_github = excluded.closed_at_github,
                last_seen_at = excluded.last_seen_at",
            params![
                issue.project_id,
                issue.github_issue_id,
                issue.number,
                issue.state,
                issue.title,
                issue.body,
                issue.author_login,
                issue.url,
                issue.created_at_github.as_ref().map(format_datetime),
                issue.updated_at_github.as_ref().map(format_datetime),
                issue.closed_at_github.as_ref().map(format_datetime),
                format_datetime(&issue.last_seen_at),
            ],
        )?;
        Ok(())
    }

    fn get_issue(&self, project_id: &str, github_issue_id: i64) -> Result<Option<IssueSnapshot>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {ISSUE_COLUMNS} FROM github_issues WHERE project_id = ?1 AND github_issue_id = ?2"
            ),
            params![project_id, github_issue_id],
            row_to_issue,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_issues(&self, project_id: &str) -> Result<Vec<IssueSnapshot>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ISSUE_COLUMNS} FROM github_issues WHERE project_id = ?1 ORDER BY number"
        ))?;

        let rows = stmt.query_map(params![project_id], row_to_issue)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn upsert_pull_request(&self, pr: &PullRequestSnapshot) -> Result<()> {
        self.conn().execute(
            "INSERT INTO github_pull_requests (project_id, github_pr_id, number, state, title, body, author_login, url,
                                               merged, merged_at_github, created_at_github, updated_at_github,
                                               closed_at_github, last_seen_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT (project_id, github_pr_id) DO UPDATE SET
                number = excluded.number,
                state = excluded.state,
                title = excluded.title,
                body = excluded.body,
                author_login = excluded.author_login,
                url = excluded.url,
                merged = excluded.merged,
                merged_at_github = excluded.merged_at_github,
                created_at_github = excluded.created_at_github,
                updated_at_github = excluded.updated_at_github,
                closed_at_github = excluded.closed_at_github,
                last_seen_at = excluded.last_seen_at",
            params![
                pr.project_id,
                pr.github_pr_id,
                pr.number,
                pr.state,
                pr.title,
                pr.body,
                pr.author_login,
                pr.url,
                pr.merged,
                pr.merged_at_github.as_ref().map(format_datetime),
                pr.created_at_github.as_ref().map(format_datetime),
                pr.updated_at_github.as_ref().map(format_datetime),
                pr.closed_at_github.as_ref().map(format_datetime),
                format_datetime(&pr.last_seen_at),
            ],
        )?;
        Ok(())
    }

    fn get_pull_request(
        &self,
        project_id: &str,
        github_pr_id: i64,
    ) -> Result<Option<PullRequestSnapshot>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {PULL_REQUEST_COLUMNS} FROM github_pull_requests WHERE project_id = ?1 AND github_pr_id = ?2"
            ),
            params![project_id, github_pr_id],
            row_to_pull_request,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_pull_requests(&self, project_id: &str) -> Result<Vec<PullRequestSnapshot>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PULL_REQUEST_COLUMNS} FROM github_pull_requests WHERE project_id = ?1 ORDER BY number"
        ))?;

        let rows = stmt.query_map(params![project_id], row_to_pull_request)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Sync job operations

    fn enqueue_sync_jobs(&self, project_id: &str, run_at: DateTime<Utc>) -> Result<usize> {
        let now = format_datetime(&Utc::now());
        let rows = self.conn().execute(
            "INSERT INTO sync_jobs (id, project_id, job_type, status, run_at, created_at)
             VALUES (?1, ?3, ?4, 'pending', ?6, ?7),
                    (?2, ?3, ?5, 'pending', ?6, ?7)",
            params![
                Uuid::new_v4().to_string(),
                Uuid::new_v4().to_string(),
                project_id,
                SyncJobType::SyncIssues.as_str(),
                SyncJobType::SyncPrs.as_str(),
                format_datetime(&run_at),
                now,
            ],
        )?;
        Ok(rows)
    }

    fn list_sync_jobs(&self, project_id: &str) -> Result<Vec<SyncJob>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, project_id, job_type, status, run_at, created_at
             FROM sync_jobs WHERE project_id = ?1 ORDER BY created_at, job_type",
        )?;

        let rows = stmt.query_map(params![project_id], |row| {
            Ok(SyncJob {
                id: row.get(0)?,
                project_id: row.get(1)?,
                job_type: parse_text(2, row.get(2)?)?,
                status: parse_text(3, row.get(3)?)?,
                run_at: parse_datetime(&row.get::<_, String>(4)?),
                created_at: parse_datetime(&row.get::<_, String>(5)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store(temp: &TempDir) -> SqliteStore {
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        store
    }

    fn project(id: &str, full_name: &str, installation_id: Option<i64>) -> Project {
        let now = Utc::now();
        Project {
            id: id.to_string(),
            github_full_name: full_name.to_string(),
            github_app_installation_id: installation_id,
            status: ProjectStatus::Verified,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn issue(project_id: &str, state: &str, title: &str) -> IssueSnapshot {
        IssueSnapshot {
            project_id: project_id.to_string(),
            github_issue_id: 9001,
            number: 7,
            state: state.to_string(),
            title: title.to_string(),
            body: String::new(),
            author_login: "octocat".to_string(),
            url: "https://github.com/acme/widgets/issues/7".to_string(),
            created_at_github: Some(Utc::now()),
            updated_at_github: None,
            closed_at_github: None,
            last_seen_at: Utc::now(),
        }
    }

    #[test]
    fn test_initialize_creates_tables() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"projects".to_string()));
        assert!(tables.contains(&"github_events".to_string()));
        assert!(tables.contains(&"github_issues".to_string()));
        assert!(tables.contains(&"github_pull_requests".to_string()));
        assert!(tables.contains(&"sync_jobs".to_string()));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);
        store.initialize().unwrap();
    }

    #[test]
    fn test_project_crud() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        store.create_project(&project("p-1", "acme/widgets", Some(123))).unwrap();

        let fetched = store.get_project("p-1").unwrap().unwrap();
        assert_eq!(fetched.github_full_name, "acme/widgets");
        assert_eq!(fetched.github_app_installation_id, Some(123));
        assert!(fetched.is_active());

        let id = store.find_project_id_by_full_name("acme/widgets").unwrap();
        assert_eq!(id.as_deref(), Some("p-1"));
        assert!(store.find_project_id_by_full_name("acme/other").unwrap().is_none());

        let duplicate = store.create_project(&project("p-2", "acme/widgets", None));
        assert!(matches!(duplicate, Err(Error::AlreadyExists(_))));
    }

    #[test]
    fn test_record_event_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);

        let event = IntegrationEvent {
            delivery_id: "d1".to_string(),
            project_id: None,
            repo_full_name: "acme/widgets".to_string(),
            event: "issues".to_string(),
            action: Some("opened".to_string()),
            payload: "{}".to_string(),
            received_at: Utc::now(),
        };

        assert!(store.record_event(&event).unwrap());
        assert!(!store.record_event(&event).unwrap());
        assert_eq!(store.count_events().unwrap(), 1);

        let stored = store.get_event("d1").unwrap().unwrap();
        assert_eq!(stored.action.as_deref(), Some("opened"));
        assert!(stored.project_id.is_none());
    }

    #[test]
    fn test_issue_upsert_overwrites_all_fields() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);
        store.create_project(&project("p-1", "acme/widgets", Some(123))).unwrap();

        store.upsert_issue(&issue("p-1", "open", "Broken")).unwrap();

        let mut closed = issue("p-1", "closed", "Broken (fixed)");
        closed.closed_at_github = Some(Utc::now());
        store.upsert_issue(&closed).unwrap();

        let issues = store.list_issues("p-1").unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].state, "closed");
        assert_eq!(issues[0].title, "Broken (fixed)");
        assert!(issues[0].closed_at_github.is_some());
    }

    #[test]
    fn test_pull_request_upsert() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);
        store.create_project(&project("p-1", "acme/widgets", Some(123))).unwrap();

        let mut pr = PullRequestSnapshot {
            project_id: "p-1".to_string(),
            github_pr_id: 555,
            number: 12,
            state: "open".to_string(),
            title: "Add feature".to_string(),
            body: "body".to_string(),
            author_login: "octocat".to_string(),
            url: "https://github.com/acme/widgets/pull/12".to_string(),
            merged: false,
            merged_at_github: None,
            created_at_github: None,
            updated_at_github: None,
            closed_at_github: None,
            last_seen_at: Utc::now(),
        };
        store.upsert_pull_request(&pr).unwrap();

        pr.state = "closed".to_string();
        pr.merged = true;
        pr.merged_at_github = Some(Utc::now());
        store.upsert_pull_request(&pr).unwrap();

        let fetched = store.get_pull_request("p-1", 555).unwrap().unwrap();
        assert!(fetched.merged);
        assert_eq!(fetched.state, "closed");
        assert_eq!(store.list_pull_requests("p-1").unwrap().len(), 1);
    }

    #[test]
    fn test_enqueue_sync_jobs_inserts_pair() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);
        store.create_project(&project("p-1", "acme/widgets", None)).unwrap();

        assert_eq!(store.enqueue_sync_jobs("p-1", Utc::now()).unwrap(), 2);
        assert_eq!(store.enqueue_sync_jobs("p-1", Utc::now()).unwrap(), 2);

        let jobs = store.list_sync_jobs("p-1").unwrap();
        assert_eq!(jobs.len(), 4);
        assert!(jobs.iter().all(|j| j.status == SyncJobStatus::Pending));
        assert_eq!(
            jobs.iter()
                .filter(|j| j.job_type == SyncJobType::SyncIssues)
                .count(),
            2
        );
    }

    #[test]
    fn test_revoke_installation_only_touches_active_rows() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);
        store.create_project(&project("p-1", "acme/widgets", Some(123))).unwrap();
        store.create_project(&project("p-2", "acme/gears", Some(123))).unwrap();
        store.create_project(&project("p-3", "acme/other", Some(456))).unwrap();

        assert_eq!(store.list_active_installation_ids().unwrap(), vec![123, 456]);

        assert_eq!(store.revoke_installation(123, Utc::now()).unwrap(), 2);
        assert_eq!(store.revoke_installation(123, Utc::now()).unwrap(), 0);

        assert!(store.get_project("p-1").unwrap().unwrap().is_revoked());
        assert!(store.get_project("p-3").unwrap().unwrap().is_active());
        assert_eq!(store.list_active_installation_ids().unwrap(), vec![456]);
    }

    #[test]
    fn test_revoke_repository_matches_null_installation() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);
        store.create_project(&project("p-1", "acme/widgets", None)).unwrap();
        store.create_project(&project("p-2", "acme/gears", Some(999))).unwrap();

        assert_eq!(store.revoke_repository("acme/widgets", 123, Utc::now()).unwrap(), 1);
        assert_eq!(store.revoke_repository("acme/gears", 123, Utc::now()).unwrap(), 0);
        assert!(store.get_project("p-2").unwrap().unwrap().is_active());
    }

    #[test]
    fn test_restore_requires_matching_installation() {
        let temp = TempDir::new().unwrap();
        let store = test_store(&temp);
        store.create_project(&project("p-1", "acme/widgets", Some(123))).unwrap();
        store.create_project(&project("p-2", "acme/gears", Some(999))).unwrap();
        store.revoke_installation(123, Utc::now()).unwrap();
        store.revoke_installation(999, Utc::now()).unwrap();

        assert_eq!(store.restore_repository("acme/widgets", 123, Utc::now()).unwrap(), 1);
        assert_eq!(store.restore_repository("acme/gears", 123, Utc::now()).unwrap(), 0);

        assert!(store.get_project("p-1").unwrap().unwrap().is_active());
        assert!(store.get_project("p-2").unwrap().unwrap().is_revoked());
        assert_eq!(store.restore_repository("acme/widgets", 123, Utc::now()).unwrap(), 0);
    }
}
