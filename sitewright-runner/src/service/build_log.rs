//! Build log service
//!
//! Derives live build status from the append-only log the build program
//! writes into its output folder. The log is read fresh on every query:
//! the build program appends to it concurrently and nothing is cached.
//!
//! Status is a heuristic over the trailing bytes of the log. Statistics are
//! independent pattern searches over the whole text; any of them may be
//! missing, e.g. while the build is still running.

use regex::Regex;
use sitewright_core::domain::build_log::{BuildStats, BuildStatus, LogSnapshot};
use sitewright_core::domain::job::JobId;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

/// Written by the build program once the public site is ready
pub const COMPLETE_MARKER: &str = "🌐 Open:";

/// Any of these near the end of the log means the build failed
pub const FAILURE_MARKERS: &[&str] = &["❌ Failed", "exit 1"];

/// Build log service error type
#[derive(Debug, Error)]
pub enum BuildLogError {
    #[error("No {file_name} for '{job_id}'. Build may not have started yet.")]
    NotFound { job_id: JobId, file_name: String },

    #[error("failed to read build log {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Reads build logs and classifies them
#[derive(Debug, Clone)]
pub struct BuildLogReader {
    sites_dir: PathBuf,
    log_file_name: String,
    tail_window: usize,
}

impl BuildLogReader {
    pub fn new(sites_dir: impl Into<PathBuf>, log_file_name: impl Into<String>) -> Self {
        Self {
            sites_dir: sites_dir.into(),
            log_file_name: log_file_name.into(),
            tail_window: 2000,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.sites_path(), config.log_file_name.clone())
            .with_tail_window(config.log_tail_window)
    }

    pub fn with_tail_window(mut self, bytes: usize) -> Self {
        self.tail_window = bytes;
        self
    }

    /// Location of a job's build log
    pub fn log_path(&self, job_id: &JobId) -> PathBuf {
        self.sites_dir
            .join(job_id.as_str())
            .join(&self.log_file_name)
    }

    /// Current status, statistics and log text of a job
    ///
    /// With `tail_lines > 0` only the last `tail_lines` lines of the log are
    /// returned; status and statistics always use the full text.
    pub async fn status(
        &self,
        job_id: &JobId,
        tail_lines: usize,
    ) -> Result<LogSnapshot, BuildLogError> {
        let path = self.log_path(job_id);
        let bytes = read_log(&path).await.map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                BuildLogError::NotFound {
                    job_id: job_id.clone(),
                    file_name: self.log_file_name.clone(),
                }
            } else {
                BuildLogError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        let status = classify(&bytes, self.tail_window);
        let text = String::from_utf8_lossy(&bytes);
        let stats = parse_stats(&text);

        debug!(
            "Build log for {}: {} bytes, status {}",
            job_id,
            bytes.len(),
            status
        );

        Ok(LogSnapshot {
            job_id: job_id.clone(),
            status,
            stats,
            log: tail(&text, tail_lines),
        })
    }
}

async fn read_log(path: &Path) -> io::Result<Vec<u8>> {
    // A directory where the log should be is as good as no log
    if tokio::fs::metadata(path).await?.is_dir() {
        return Err(io::Error::from(io::ErrorKind::NotFound));
    }
    tokio::fs::read(path).await
}

/// Classifies a log from the markers in its last `window` bytes
///
/// Completion wins over failure when both are present.
pub fn classify(log: &[u8], window: usize) -> BuildStatus {
    let start = log.len().saturating_sub(window);
    // The window may start mid-character; lossy decoding keeps the rest intact
    let tail = String::from_utf8_lossy(&log[start..]);

    if tail.contains(COMPLETE_MARKER) {
        BuildStatus::Complete
    } else if FAILURE_MARKERS.iter().any(|marker| tail.contains(marker)) {
        BuildStatus::Failed
    } else {
        BuildStatus::InProgress
    }
}

/// Last `lines` lines of `text`; `0` keeps everything
pub fn tail(text: &str, lines: usize) -> String {
    if lines == 0 {
        return text.to_string();
    }

    let all: Vec<&str> = text.lines().collect();
    let skip = all.len().saturating_sub(lines);
    all[skip..].join("\n")
}

static RE_TOTAL_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Total time:\s+(\d+m\s+\d+s)").unwrap());
static RE_MODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Mode:\s+(\w+)\s+\(([^)]+)\)").unwrap());
static RE_GENERATED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Generated:\s+(\d+)\s*/\s*(\d+)").unwrap());
static RE_FAILED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Failed:\s+(\d+)").unwrap());
static RE_COST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Total:\s+~?\$?(\d+(?:\.\d+)?)").unwrap());
static RE_ASSETS_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Assets size:\s+(\S+)").unwrap());
static RE_TOTAL_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Total size:\s+(\S+)").unwrap());
static RE_SITE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Open:\s+(https?://\S+)").unwrap());

fn capture<'t>(re: &Regex, text: &'t str, group: usize) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(group))
        .map(|m| m.as_str().trim())
}

/// Extracts build statistics from a log
///
/// Never fails; every pattern that does not match leaves its field unset.
pub fn parse_stats(log: &str) -> BuildStats {
    let mut stats = BuildStats {
        total_time: capture(&RE_TOTAL_TIME, log, 1).map(str::to_string),
        assets_size: capture(&RE_ASSETS_SIZE, log, 1).map(str::to_string),
        total_size: capture(&RE_TOTAL_SIZE, log, 1).map(str::to_string),
        site_url: capture(&RE_SITE_URL, log, 1).map(str::to_string),
        images_failed: capture(&RE_FAILED, log, 1).and_then(|n| n.parse().ok()),
        estimated_cost_usd: capture(&RE_COST, log, 1).and_then(|n| n.parse().ok()),
        ..Default::default()
    };

    if let Some(caps) = RE_MODE.captures(log) {
        stats.mode = Some(format!("{} ({})", &caps[1], caps[2].trim()));
    }

    if let Some(caps) = RE_GENERATED.captures(log) {
        stats.images_generated = caps[1].parse().ok();
        stats.images_total = caps[2].parse().ok();
    }

    stats
}
