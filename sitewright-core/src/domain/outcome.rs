//! Outcome domain types

use serde::{Deserialize, Serialize};

use crate::domain::job::{JobId, JobState};

/// The single terminal result of a job run
///
/// Exactly one outcome is produced per run and it never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Build program exited 0
    Success {
        subject: String,
        job_id: JobId,
        /// Public URL of the site, when a public base address is configured
        site_url: Option<String>,
    },
    /// Build program exited non-zero or was terminated by a signal
    Failure {
        error: String,
        exit_code: Option<i32>,
    },
    /// Build program outlived the wall-clock limit and its process group was killed
    Timeout { subject: String, limit_secs: u64 },
    /// Orchestration itself failed (spawn failure, panic, ...)
    InternalError { error: String },
}

impl Outcome {
    /// The terminal lifecycle state this outcome corresponds to
    pub fn terminal_state(&self) -> JobState {
        match self {
            Outcome::Success { .. } => JobState::Succeeded,
            Outcome::Failure { .. } => JobState::Failed,
            Outcome::Timeout { .. } => JobState::TimedOut,
            Outcome::InternalError { .. } => JobState::Errored,
        }
    }

    /// Status word used in callback payloads: `success`, `error` or `timeout`
    pub fn status_label(&self) -> &'static str {
        match self {
            Outcome::Success { .. } => "success",
            Outcome::Failure { .. } | Outcome::InternalError { .. } => "error",
            Outcome::Timeout { .. } => "timeout",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// Composes the public URL of a site from the public base address and its job id
pub fn public_site_url(base: &str, job_id: &JobId) -> String {
    format!("{}/{}/index.html", base.trim_end_matches('/'), job_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        let success = Outcome::Success {
            subject: "A".to_string(),
            job_id: JobId::from_subject("A"),
            site_url: None,
        };
        let failure = Outcome::Failure {
            error: "disk full".to_string(),
            exit_code: Some(1),
        };
        let timeout = Outcome::Timeout {
            subject: "A".to_string(),
            limit_secs: 900,
        };
        let internal = Outcome::InternalError {
            error: "spawn failed".to_string(),
        };

        assert_eq!(success.terminal_state(), JobState::Succeeded);
        assert_eq!(failure.terminal_state(), JobState::Failed);
        assert_eq!(timeout.terminal_state(), JobState::TimedOut);
        assert_eq!(internal.terminal_state(), JobState::Errored);

        assert_eq!(success.status_label(), "success");
        assert_eq!(failure.status_label(), "error");
        assert_eq!(timeout.status_label(), "timeout");
        assert_eq!(internal.status_label(), "error");
    }

    #[test]
    fn test_public_site_url() {
        let id = JobId::from_subject("Luigi's Salon");
        assert_eq!(
            public_site_url("http://192.168.0.114/", &id),
            "http://192.168.0.114/luigis-salon/index.html"
        );
    }
}
