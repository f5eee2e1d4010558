pub const SCHEMA: &str = r#"
-- Locally tracked repositories. Soft-deleted via deleted_at, never removed.
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    github_full_name TEXT NOT NULL UNIQUE,    -- owner/repo
    github_app_installation_id INTEGER,       -- NULL until the app is installed
    status TEXT NOT NULL DEFAULT 'pending_verification',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT                           -- tombstone
);

-- Webhook audit log, one row per delivery
CREATE TABLE IF NOT EXISTS github_events (
    delivery_id TEXT PRIMARY KEY,
    project_id TEXT REFERENCES projects(id),
    repo_full_name TEXT NOT NULL DEFAULT '',
    event TEXT NOT NULL,
    action TEXT,
    payload TEXT NOT NULL,
    received_at TEXT NOT NULL
);

-- Latest known state of remote issues
CREATE TABLE IF NOT EXISTS github_issues (
    project_id TEXT NOT NULL REFERENCES projects(id),
    github_issue_id INTEGER NOT NULL,
    number INTEGER NOT NULL,
    state TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    body TEXT NOT NULL DEFAULT '',
    author_login TEXT NOT NULL DEFAULT '',
    url TEXT NOT NULL DEFAULT '',
    created_at_github TEXT,
    updated_at_github TEXT,
    closed_at_github TEXT,
    last_seen_at TEXT NOT NULL,
    PRIMARY KEY (project_id, github_issue_id)
);

-- Latest known state of remote pull requests
CREATE TABLE IF NOT EXISTS github_pull_requests (
    project_id TEXT NOT NULL REFERENCES projects(id),
    github_pr_id INTEGER NOT NULL,
    number INTEGER NOT NULL,
    state TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    body TEXT NOT NULL DEFAULT '',
    author_login TEXT NOT NULL DEFAULT '',
    url TEXT NOT NULL DEFAULT '',
    merged INTEGER NOT NULL DEFAULT 0,
    merged_at_github TEXT,
    created_at_github TEXT,
    updated_at_github TEXT,
    closed_at_github TEXT,
    last_seen_at TEXT NOT NULL,
    PRIMARY KEY (project_id, github_pr_id)
);

-- Work tickets for the sync worker (duplicates are tolerated)
CREATE TABLE IF NOT EXISTS sync_jobs (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(id),
    job_type TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    run_at TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_projects_installation ON projects(github_app_installation_id);
CREATE INDEX IF NOT EXISTS idx_github_events_project ON github_events(project_id);
CREATE INDEX IF NOT EXISTS idx_sync_jobs_project ON sync_jobs(project_id);
CREATE INDEX IF NOT EXISTS idx_sync_jobs_status ON sync_jobs(status, run_at);
"#;
