//! Site build DTOs for the HTTP surface

use serde::{Deserialize, Serialize};

use crate::domain::build_log::{BuildStats, BuildStatus, LogSnapshot};
use crate::domain::job::JobId;

/// Synchronous acknowledgment returned when a build request is accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Always `"processing"`
    pub status: String,
    pub message: String,
    pub site_slug: JobId,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub site_url: Option<String>,
}

impl SubmitResponse {
    pub fn processing(site_slug: JobId, site_url: Option<String>) -> Self {
        Self {
            status: "processing".to_string(),
            message: "Job added to queue.".to_string(),
            site_slug,
            site_url,
        }
    }
}

/// Response of a build-log status query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildLogResponse {
    pub slug: JobId,
    pub build_status: BuildStatus,
    pub stats: BuildStats,
    pub log: String,
}

impl From<LogSnapshot> for BuildLogResponse {
    fn from(snapshot: LogSnapshot) -> Self {
        Self {
            slug: snapshot.job_id,
            build_status: snapshot.status,
            stats: snapshot.stats,
            log: snapshot.log,
        }
    }
}

/// Query parameters of a build-log status query
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BuildLogQuery {
    /// Return only the last N lines of the log; zero or negative returns everything
    #[serde(default)]
    pub lines: i64,
}

impl BuildLogQuery {
    /// Line window for the log reader, where 0 means the full log
    pub fn tail_lines(&self) -> usize {
        usize::try_from(self.lines).unwrap_or(0)
    }
}
