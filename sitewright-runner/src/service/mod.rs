//! Service layer
//!
//! Services contain the runner's business logic: orchestrating builds,
//! delivering their outcomes, reading their logs and tracking runs.
//!
//! The notifier is trait-based so orchestration can be tested without a
//! live callback endpoint.

mod build_log;
mod notifier;
mod orchestrator;
mod registry;

pub use build_log::{
    BuildLogError, BuildLogReader, COMPLETE_MARKER, FAILURE_MARKERS, classify, parse_stats, tail,
};
pub use notifier::{NotifyError, OutcomeNotifier, WebhookNotifier};
pub use orchestrator::{Accepted, Orchestrator, StartHook, SubmitError};
pub use registry::RunRegistry;
