//! Run registry
//!
//! In-memory bookkeeping of job runs for observability. Nothing here is
//! persisted and nothing here gates admission: a restart forgets every run,
//! and the build logs stay the durable record.

use chrono::Utc;
use sitewright_core::domain::job::{JobId, JobState, RunSummary};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};
use uuid::Uuid;

/// Finished runs kept for listing
const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Thread-safe registry of accepted runs
#[derive(Debug)]
pub struct RunRegistry {
    runs: Mutex<HashMap<Uuid, RunSummary>>,
    history_limit: usize,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(history_limit: usize) -> Self {
        Self {
            runs: Mutex::new(HashMap::new()),
            history_limit,
        }
    }

    fn runs(&self) -> MutexGuard<'_, HashMap<Uuid, RunSummary>> {
        // Entries are plain data; a panicked writer cannot leave them half-updated
        self.runs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records a newly accepted run
    ///
    /// Returns how many other runs for the same job id are still in flight.
    /// Those runs share an output folder with the new one and are not
    /// serialized against it.
    pub fn register(&self, run_id: Uuid, job_id: &JobId, business_name: &str) -> usize {
        let mut runs = self.runs();

        let in_flight = runs
            .values()
            .filter(|run| run.job_id == *job_id && !run.state.is_terminal())
            .count();

        if in_flight > 0 {
            warn!(
                "Job {} already has {} run(s) in flight; run {} will share its output folder",
                job_id, in_flight, run_id
            );
        }

        runs.insert(
            run_id,
            RunSummary {
                run_id,
                job_id: job_id.clone(),
                business_name: business_name.to_string(),
                state: JobState::Accepted,
                accepted_at: Utc::now(),
                started_at: None,
                finished_at: None,
            },
        );

        in_flight
    }

    /// Moves a run to `next`, refusing transitions the state machine forbids
    ///
    /// Returns whether the transition was applied.
    pub fn transition(&self, run_id: Uuid, next: JobState) -> bool {
        let mut runs = self.runs();

        let Some(run) = runs.get_mut(&run_id) else {
            warn!("Transition to {} for unknown run {}", next, run_id);
            return false;
        };

        if !run.state.can_transition_to(next) {
            warn!(
                "Rejected transition {} -> {} for run {}",
                run.state, next, run_id
            );
            return false;
        }

        debug!("Run {} ({}): {} -> {}", run_id, run.job_id, run.state, next);
        run.state = next;
        match next {
            JobState::Running => run.started_at = Some(Utc::now()),
            state if state.is_terminal() => run.finished_at = Some(Utc::now()),
            _ => {}
        }

        if next.is_terminal() {
            prune(&mut runs, self.history_limit);
        }

        true
    }

    pub fn get(&self, run_id: Uuid) -> Option<RunSummary> {
        self.runs().get(&run_id).cloned()
    }

    /// All known runs, most recently accepted first
    pub fn list(&self) -> Vec<RunSummary> {
        let mut runs: Vec<RunSummary> = self.runs().values().cloned().collect();
        runs.sort_by(|a, b| b.accepted_at.cmp(&a.accepted_at));
        runs
    }

    /// Number of runs that have not reached a terminal state
    pub fn in_flight(&self) -> usize {
        self.runs()
            .values()
            .filter(|run| !run.state.is_terminal())
            .count()
    }
}

impl Default for RunRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Drops the oldest finished runs beyond `limit`
fn prune(runs: &mut HashMap<Uuid, RunSummary>, limit: usize) {
    let mut finished: Vec<(Uuid, chrono::DateTime<Utc>)> = runs
        .values()
        .filter_map(|run| run.finished_at.map(|at| (run.run_id, at)))
        .collect();

    if finished.len() <= limit {
        return;
    }

    finished.sort_by_key(|(_, at)| *at);
    let excess = finished.len() - limit;
    for (run_id, _) in finished.into_iter().take(excess) {
        runs.remove(&run_id);
    }
}
