use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{GithubAppConfig, ReconcilerConfig};
use crate::error::{Error, Result};
use crate::github::GithubAppClient;
use crate::ingest::{InstallationTransition, apply_transition};
use crate::store::Store;

/// Tally of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Installations probed.
    pub checked: usize,
    pub active: usize,
    /// Installations the remote confirmed as gone.
    pub revoked_installations: usize,
    pub rows_revoked: usize,
    /// Probes that failed without proving anything; no state was touched.
    pub inconclusive: usize,
}

/// Periodically probes every installation still referenced by an active
/// project and revokes the projects of installations that no longer exist.
pub struct Reconciler {
    store: Arc<dyn Store>,
    github: GithubAppConfig,
    config: ReconcilerConfig,
    cancel: CancellationToken,
}

impl Reconciler {
    pub fn new(store: Arc<dyn Store>, github: GithubAppConfig, config: ReconcilerConfig) -> Self {
        Self {
            store,
            github,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Starts the background loop. Without app credentials nothing is spawned
    /// and the returned handle is inert.
    pub fn spawn(self) -> ReconcilerHandle {
        if !self.github.is_configured() {
            warn!("github app integration is not configured; installation reconciler disabled");
            return ReconcilerHandle::disabled();
        }

        info!(
            interval_secs = self.config.interval.as_secs(),
            "starting installation reconciler"
        );
        let cancel = self.cancel.clone();
        let task = tokio::spawn(self.run());
        ReconcilerHandle::running(cancel, task)
    }

    async fn run(self) {
        let period = self.config.interval;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = interval.tick() => {
                    match self.run_once().await {
                        Ok(report) if report.checked > 0 => info!(
                            checked = report.checked,
                            revoked_installations = report.revoked_installations,
                            rows_affected = report.rows_revoked,
                            inconclusive = report.inconclusive,
                            "installation reconciliation pass finished"
                        ),
                        Ok(_) => {}
                        Err(e) => warn!(error = %e, "installation reconciliation pass failed"),
                    }
                }
            }
        }

        info!("installation reconciler stopped");
    }

    /// Runs a single pass. Probes are sequential; a pending shutdown abandons
    /// the remaining probes, never a revocation already under way.
    pub async fn run_once(&self) -> Result<ReconcileReport> {
        if !self.github.is_configured() {
            return Err(Error::Config(
                "github app integration is not configured".to_string(),
            ));
        }

        let mut report = ReconcileReport::default();

        let store = self.store.clone();
        let installation_ids =
            tokio::task::spawn_blocking(move || store.list_active_installation_ids()).await??;
        if installation_ids.is_empty() {
            debug!("no active installations to reconcile");
            return Ok(report);
        }

        let client = GithubAppClient::new(&self.github)?;

        for installation_id in installation_ids {
            let probe = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(installation_id, "shutdown requested; abandoning reconciliation pass");
                    break;
                }
                result = client.mint_installation_token(installation_id) => result,
            };
            report.checked += 1;

            match probe {
                Ok(_) => report.active += 1,
                Err(e) if e.is_remote_not_found() => {
                    info!(installation_id, "installation no longer exists; revoking its projects");
                    let store = self.store.clone();
                    let outcome = tokio::task::spawn_blocking(move || {
                        apply_transition(
                            store.as_ref(),
                            &InstallationTransition::Uninstalled { installation_id },
                        )
                    })
                    .await?;
                    report.revoked_installations += 1;
                    report.rows_revoked += outcome.revoked;
                }
                Err(e) => {
                    warn!(installation_id, error = %e, "installation probe inconclusive; leaving projects untouched");
                    report.inconclusive += 1;
                }
            }
        }

        Ok(report)
    }
}

/// Owner's side of a running reconciler.
#[derive(Debug)]
pub struct ReconcilerHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ReconcilerHandle {
    fn disabled() -> Self {
        Self {
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    fn running(cancel: CancellationToken, task: JoinHandle<()>) -> Self {
        Self {
            cancel,
            task: Some(task),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Signals the loop and waits for it to exit.
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "installation reconciler task ended abnormally");
            }
        }
    }
}
