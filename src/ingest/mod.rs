//! Webhook ingestion: payload decoding, the per-delivery engine, and the
//! installation lifecycle transitions it shares with the reconciler.

mod engine;
pub mod envelope;
pub mod lifecycle;

pub use engine::{InboundEvent, IngestReport, Ingestor};
pub use envelope::{Envelope, EventKind, InstallationPayload};
pub use lifecycle::{InstallationTransition, TransitionOutcome, apply_transition};
