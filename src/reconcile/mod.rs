//! Background liveness checks for GitHub App installations.

mod liveness;

pub use liveness::{ReconcileReport, Reconciler, ReconcilerHandle};
