//! Sitewright Runner
//!
//! Runs site builds as external processes and reports their outcome.
//!
//! Architecture:
//! - Configuration: one explicit [`Config`] built at startup
//! - Supervisor: launches the build program in its own process group, enforces
//!   the wall-clock limit and kills the whole group on timeout
//! - Services: the job orchestrator, the outcome notifier, the build-log
//!   reader and the in-memory run registry
//!
//! Only the Unix process model is supported.

pub mod config;
pub mod service;
pub mod supervisor;

pub use config::Config;
pub use service::{
    BuildLogError, BuildLogReader, Orchestrator, OutcomeNotifier, RunRegistry, SubmitError,
    WebhookNotifier,
};
pub use supervisor::{
    CommandSpec, KillOutcome, ProcessGroup, ProcessOutput, ProcessSupervisor, SupervisorError,
};
