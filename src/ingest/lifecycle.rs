//! Installation lifecycle transitions.
//!
//! Project state relative to an installation is inferred from the row:
//! active is `verified` with no tombstone, revoked is `rejected` with one.
//! Every transition is a conditional bulk update guarded on the current
//! tombstone, so webhook deliveries and liveness probes can apply the same
//! transition in any order and converge.

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use super::envelope::{EventKind, InstallationPayload, RepositoryRef};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallationTransition {
    /// The whole installation is gone; revoke every project bound to it.
    Uninstalled { installation_id: i64 },
    /// Repositories were taken out of the installation's scope.
    RepositoriesRemoved {
        installation_id: i64,
        repositories: Vec<String>,
    },
    /// Repositories were (re)granted to the installation.
    RepositoriesAdded {
        installation_id: i64,
        repositories: Vec<String>,
    },
    /// Any other action (`created`, `suspend`, ...) leaves projects alone.
    Ignored {
        installation_id: i64,
        action: String,
    },
}

impl InstallationTransition {
    #[must_use]
    pub fn from_payload(kind: &EventKind, payload: &InstallationPayload) -> Self {
        let installation_id = payload.installation.id;

        match (payload.action.as_str(), kind) {
            ("deleted", _) => InstallationTransition::Uninstalled { installation_id },
            ("removed", EventKind::InstallationRepositories) => {
                InstallationTransition::RepositoriesRemoved {
                    installation_id,
                    repositories: names(&payload.repositories_removed),
                }
            }
            ("added", EventKind::InstallationRepositories) => {
                InstallationTransition::RepositoriesAdded {
                    installation_id,
                    repositories: names(&payload.repositories_added),
                }
            }
            (action, _) => InstallationTransition::Ignored {
                installation_id,
                action: action.to_string(),
            },
        }
    }

    #[must_use]
    pub fn installation_id(&self) -> i64 {
        match self {
            InstallationTransition::Uninstalled { installation_id }
            | InstallationTransition::RepositoriesRemoved {
                installation_id, ..
            }
            | InstallationTransition::RepositoriesAdded {
                installation_id, ..
            }
            | InstallationTransition::Ignored {
                installation_id, ..
            } => *installation_id,
        }
    }
}

fn names(repos: &[RepositoryRef]) -> Vec<String> {
    repos
        .iter()
        .map(|r| r.full_name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome {
    pub revoked: usize,
    pub restored: usize,
    pub failed: usize,
}

/// Applies a transition. Zero affected rows is a normal outcome; per-repository
/// failures are logged and the remaining repositories are still processed.
pub fn apply_transition(store: &dyn Store, transition: &InstallationTransition) -> TransitionOutcome {
    let mut outcome = TransitionOutcome::default();
    let now = Utc::now();

    match transition {
        InstallationTransition::Uninstalled { installation_id } => {
            match store.revoke_installation(*installation_id, now) {
                Ok(rows) => {
                    info!(
                        installation_id,
                        rows_affected = rows,
                        "marked projects as deleted for installation"
                    );
                    outcome.revoked = rows;
                }
                Err(e) => {
                    error!(installation_id, error = %e, "failed to revoke projects for installation");
                    outcome.failed += 1;
                }
            }
        }
        InstallationTransition::RepositoriesRemoved {
            installation_id,
            repositories,
        } => {
            info!(
                installation_id,
                count = repositories.len(),
                "removing repositories from installation"
            );
            for repo in repositories {
                match store.revoke_repository(repo, *installation_id, now) {
                    Ok(0) => warn!(repo = %repo, installation_id, "no active project to revoke"),
                    Ok(rows) => {
                        info!(repo = %repo, installation_id, "marked project as deleted");
                        outcome.revoked += rows;
                    }
                    Err(e) => {
                        error!(repo = %repo, installation_id, error = %e, "failed to revoke project");
                        outcome.failed += 1;
                    }
                }
            }
        }
        InstallationTransition::RepositoriesAdded {
            installation_id,
            repositories,
        } => {
            for repo in repositories {
                match store.restore_repository(repo, *installation_id, now) {
                    Ok(0) => {}
                    Ok(rows) => {
                        info!(repo = %repo, installation_id, "restored project");
                        outcome.restored += rows;
                    }
                    Err(e) => {
                        error!(repo = %repo, installation_id, error = %e, "failed to restore project");
                        outcome.failed += 1;
                    }
                }
            }
        }
        InstallationTransition::Ignored {
            installation_id,
            action,
        } => {
            tracing::debug!(installation_id, action = %action, "installation action needs no project change");
        }
    }

    outcome
}
