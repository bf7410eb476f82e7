//! Shared handler state

use sitewright_runner::{BuildLogReader, Orchestrator};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub logs: Arc<BuildLogReader>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, logs: BuildLogReader) -> Self {
        Self {
            orchestrator,
            logs: Arc::new(logs),
        }
    }
}
