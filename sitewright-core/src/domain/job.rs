//! Job domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Normalizes a subject name into a filesystem- and URL-safe slug
///
/// Lower-cases the name, joins its whitespace-separated tokens with single
/// hyphens and drops every character outside `[a-z0-9-]`. Leading, trailing
/// and repeated whitespace never changes the result.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

/// Returned when a raw string is not a valid job id
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid job id '{0}': expected a non-empty slug of [a-z0-9-]")]
pub struct InvalidJobId(pub String);

/// Deterministic identifier of a build, derived from its subject name
///
/// Names the build program's output directory and keys log lookups.
/// Distinct subjects may share a job id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Derives the job id of a subject name
    pub fn from_subject(name: &str) -> Self {
        Self(slugify(name))
    }

    /// Accepts an already slugged id, e.g. from a status query path
    pub fn parse(raw: &str) -> Result<Self, InvalidJobId> {
        let valid = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(InvalidJobId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lifecycle state of one job run
///
/// `Accepted -> Running -> {Succeeded | Failed | TimedOut | Errored}`.
/// A run may also go straight from `Accepted` to `Errored` when the build
/// program cannot be launched. Terminal states are sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Accepted,
    Running,
    Succeeded,
    Failed,
    TimedOut,
    Errored,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::TimedOut | JobState::Errored
        )
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(self, next: JobState) -> bool {
        match (self, next) {
            (JobState::Accepted, JobState::Running) => true,
            (JobState::Accepted, JobState::Errored) => true,
            (JobState::Running, next) => next.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Accepted => "accepted",
            JobState::Running => "running",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
            JobState::TimedOut => "timed_out",
            JobState::Errored => "errored",
        };
        f.write_str(s)
    }
}

/// Snapshot of one run as kept by the in-memory run registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub job_id: JobId,
    pub business_name: String,
    pub state: JobState,
    pub accepted_at: chrono::DateTime<chrono::Utc>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Luigi's Hair Salon"), "luigis-hair-salon");
        assert_eq!(slugify("Pizzeria 2000"), "pizzeria-2000");
    }

    #[test]
    fn test_slugify_whitespace_and_case_variations_agree() {
        let a = slugify("Luigi's Hair Salon  ");
        let b = slugify("luigi's   hair salon");
        let c = slugify("\tLUIGI'S HAIR\nSALON");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_slugify_output_alphabet() {
        let slug = slugify("Caffè & Bar «Roma» #1 — Ristorante/Pizzeria");
        assert!(
            slug.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        );
    }

    #[test]
    fn test_slugify_keeps_existing_hyphens() {
        assert_eq!(slugify("Bed-and-Breakfast Sole"), "bed-and-breakfast-sole");
    }

    #[test]
    fn test_slugify_symbols_only() {
        assert_eq!(slugify("!!! ???"), "-");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn test_job_id_parse() {
        assert!(JobId::parse("luigis-salon").is_ok());
        assert!(JobId::parse("").is_err());
        assert!(JobId::parse("../etc").is_err());
        assert!(JobId::parse("Luigi").is_err());
    }

    #[test]
    fn test_job_id_serializes_as_plain_string() {
        let id = JobId::from_subject("Da Mario");
        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("da-mario"));
    }

    #[test]
    fn test_state_transitions() {
        assert!(JobState::Accepted.can_transition_to(JobState::Running));
        assert!(JobState::Accepted.can_transition_to(JobState::Errored));
        assert!(!JobState::Accepted.can_transition_to(JobState::Succeeded));
        assert!(JobState::Running.can_transition_to(JobState::Succeeded));
        assert!(JobState::Running.can_transition_to(JobState::TimedOut));
        assert!(!JobState::Running.can_transition_to(JobState::Accepted));
    }

    #[test]
    fn test_terminal_states_are_sinks() {
        let all = [
            JobState::Accepted,
            JobState::Running,
            JobState::Succeeded,
            JobState::Failed,
            JobState::TimedOut,
            JobState::Errored,
        ];
        for from in all.iter().filter(|s| s.is_terminal()) {
            for to in all {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }
}
