use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::envelope::{Envelope, EventKind, InstallationPayload, IssuePayload, PullRequestPayload};
use super::lifecycle::{InstallationTransition, TransitionOutcome, apply_transition};
use crate::store::Store;
use crate::types::{IntegrationEvent, IssueSnapshot, PullRequestSnapshot};

/// A delivery as handed over by the webhook receiver.
#[derive(Debug, Clone, Default)]
pub struct InboundEvent {
    pub delivery_id: String,
    pub event: String,
    pub action: String,
    /// May be empty; the payload's `repository.full_name` is used instead.
    pub repo_full_name: String,
    pub payload: Vec<u8>,
}

/// What a single `ingest` call managed to do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub audit_recorded: bool,
    pub duplicate: bool,
    pub issue_upserted: bool,
    pub pull_request_upserted: bool,
    pub sync_jobs_enqueued: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installation: Option<TransitionOutcome>,
}

#[derive(Clone)]
pub struct Ingestor {
    store: Arc<dyn Store>,
}

impl Ingestor {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Applies one delivery. Safe to call again for the same delivery ID.
    ///
    /// Every step is independent: a failing step is logged and skipped, and
    /// no error ever reaches the caller.
    pub fn ingest(&self, inbound: &InboundEvent) -> IngestReport {
        let mut report = IngestReport::default();
        let kind = EventKind::parse(&inbound.event);
        let envelope = Envelope::parse(&inbound.payload);
        let now = Utc::now();

        let repo_full_name = match inbound.repo_full_name.trim() {
            "" => envelope.repository_full_name().unwrap_or_default().to_string(),
            name => name.to_string(),
        };
        let action = match inbound.action.trim() {
            "" => envelope.action.clone(),
            action => action.to_string(),
        };

        let project_id = self.resolve_project(&repo_full_name, &inbound.delivery_id);
        report.project_id = project_id.clone();

        if inbound.delivery_id.trim().is_empty() {
            warn!(event = kind.as_str(), "delivery has no id; skipping audit row");
        } else {
            let event = IntegrationEvent {
                delivery_id: inbound.delivery_id.clone(),
                project_id: project_id.clone(),
                repo_full_name: repo_full_name.clone(),
                event: kind.as_str().to_string(),
                action: (!action.is_empty()).then(|| action.clone()),
                payload: String::from_utf8_lossy(&inbound.payload).into_owned(),
                received_at: now,
            };
            self.record_audit(&event, &mut report);
        }

        if let Some(project_id) = project_id.as_deref() {
            if kind.carries_issue() {
                if let Some(issue) = &envelope.issue {
                    report.issue_upserted = self.upsert_issue(project_id, issue, now, inbound);
                }
            }
            if kind.carries_pull_request() {
                if let Some(pr) = &envelope.pull_request {
                    report.pull_request_upserted =
                        self.upsert_pull_request(project_id, pr, now, inbound);
                }
            }

            if kind.implies_repository_activity() {
                match self.store.enqueue_sync_jobs(project_id, now) {
                    Ok(rows) => report.sync_jobs_enqueued = rows,
                    Err(e) => error!(
                        delivery_id = %inbound.delivery_id,
                        project_id,
                        error = %e,
                        "failed to enqueue sync jobs"
                    ),
                }
            }
        }

        if kind.is_installation_lifecycle() {
            report.installation = self.handle_installation(&kind, inbound);
        }

        info!(
            delivery_id = %inbound.delivery_id,
            event = kind.as_str(),
            action = %action,
            repo = %repo_full_name,
            sender = envelope.sender_login().unwrap_or_default(),
            duplicate = report.duplicate,
            "ingested webhook delivery"
        );

        report
    }

    fn resolve_project(&self, repo_full_name: &str, delivery_id: &str) -> Option<String> {
        if repo_full_name.is_empty() {
            return None;
        }
        match self.store.find_project_id_by_full_name(repo_full_name) {
            Ok(Some(id)) => Some(id),
            Ok(None) => {
                debug!(repo = %repo_full_name, "no project registered for repository");
                None
            }
            Err(e) => {
                error!(delivery_id, repo = %repo_full_name, error = %e, "failed to resolve project");
                None
            }
        }
    }

    fn record_audit(&self, event: &IntegrationEvent, report: &mut IngestReport) {
        match self.store.record_event(event) {
            Ok(true) => report.audit_recorded = true,
            Ok(false) => {
                debug!(delivery_id = %event.delivery_id, "delivery already recorded");
                report.duplicate = true;
            }
            Err(e) => error!(
                delivery_id = %event.delivery_id,
                error = %e,
                "failed to record webhook event"
            ),
        }
    }

    fn upsert_issue(
        &self,
        project_id: &str,
        issue: &IssuePayload,
        now: DateTime<Utc>,
        inbound: &InboundEvent,
    ) -> bool {
        let snapshot = IssueSnapshot {
            project_id: project_id.to_string(),
            github_issue_id: issue.id,
            number: issue.number,
            state: issue.state.clone(),
            title: issue.title.clone(),
            body: issue.body.clone(),
            author_login: issue.user.login.clone(),
            url: issue.html_url.clone(),
            created_at_github: issue.created_at,
            updated_at_github: issue.updated_at,
            closed_at_github: issue.closed_at,
            last_seen_at: now,
        };

        match self.store.upsert_issue(&snapshot) {
            Ok(()) => true,
            Err(e) => {
                error!(
                    delivery_id = %inbound.delivery_id,
                    project_id,
                    issue = issue.number,
                    error = %e,
                    "failed to upsert issue snapshot"
                );
                false
            }
        }
    }

    fn upsert_pull_request(
        &self,
        project_id: &str,
        pr: &PullRequestPayload,
        now: DateTime<Utc>,
        inbound: &InboundEvent,
    ) -> bool {
        let snapshot = PullRequestSnapshot {
            project_id: project_id.to_string(),
            github_pr_id: pr.id,
            number: pr.number,
            state: pr.state.clone(),
            title: pr.title.clone(),
            body: pr.body.clone(),
            author_login: pr.user.login.clone(),
            url: pr.html_url.clone(),
            merged: pr.merged,
            merged_at_github: pr.merged_at,
            created_at_github: pr.created_at,
            updated_at_github: pr.updated_at,
            closed_at_github: pr.closed_at,
            last_seen_at: now,
        };

        match self.store.upsert_pull_request(&snapshot) {
            Ok(()) => true,
            Err(e) => {
                error!(
                    delivery_id = %inbound.delivery_id,
                    project_id,
                    pull_request = pr.number,
                    error = %e,
                    "failed to upsert pull request snapshot"
                );
                false
            }
        }
    }

    fn handle_installation(
        &self,
        kind: &EventKind,
        inbound: &InboundEvent,
    ) -> Option<TransitionOutcome> {
        let payload = match InstallationPayload::parse(&inbound.payload) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(
                    delivery_id = %inbound.delivery_id,
                    event = kind.as_str(),
                    error = %e,
                    "failed to parse installation payload"
                );
                return None;
            }
        };

        let transition = InstallationTransition::from_payload(kind, &payload);
        Some(apply_transition(self.store.as_ref(), &transition))
    }
}
