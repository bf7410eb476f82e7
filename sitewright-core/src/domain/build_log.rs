//! Build log domain types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::job::JobId;

/// Build state inferred from the markers at the end of a build log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    InProgress,
    Complete,
    Failed,
}

impl BuildStatus {
    pub fn is_finished(self) -> bool {
        !matches!(self, BuildStatus::InProgress)
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildStatus::InProgress => "in_progress",
            BuildStatus::Complete => "complete",
            BuildStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Statistics parsed out of a build log
///
/// Every field is independent; a missing pattern simply leaves its field unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildStats {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub total_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub images_generated: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub images_total: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub images_failed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub estimated_cost_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub assets_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub total_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub site_url: Option<String>,
}

impl BuildStats {
    pub fn is_empty(&self) -> bool {
        *self == BuildStats::default()
    }
}

/// A fresh view of one job's build log
///
/// Recomputed on every query; the log is appended to by the build program
/// while it is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSnapshot {
    pub job_id: JobId,
    pub status: BuildStatus,
    pub stats: BuildStats,
    /// Full log text, or its last N lines when a tail was requested
    pub log: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats_serialize_to_empty_object() {
        let stats = BuildStats::default();
        assert!(stats.is_empty());
        assert_eq!(serde_json::to_value(&stats).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn test_partial_stats_omit_missing_fields() {
        let stats = BuildStats {
            images_generated: Some(7),
            images_total: Some(8),
            ..Default::default()
        };
        assert!(!stats.is_empty());
        assert_eq!(
            serde_json::to_value(&stats).unwrap(),
            serde_json::json!({"images_generated": 7, "images_total": 8})
        );
    }

    #[test]
    fn test_build_status_wire_names() {
        assert_eq!(
            serde_json::to_value(BuildStatus::InProgress).unwrap(),
            serde_json::json!("in_progress")
        );
        assert_eq!(BuildStatus::Complete.to_string(), "complete");
        assert!(BuildStatus::Failed.is_finished());
        assert!(!BuildStatus::InProgress.is_finished());
    }
}
