//! Runner configuration
//!
//! Defines every operator-tunable parameter of the runner: where the build
//! program lives, how long a build may run, where build logs are found and
//! how public site URLs are composed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sitewright_core::domain::job::JobId;
use sitewright_core::domain::outcome::public_site_url;

/// Runner configuration
///
/// Built once at startup and shared read-only with the orchestrator,
/// the notifier and the build-log reader.
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory of the build program; relative paths resolve against it
    pub work_dir: PathBuf,

    /// Path of the build program (e.g. "./create.sh")
    pub build_script: PathBuf,

    /// Hard wall-clock ceiling for one build
    pub build_timeout: Duration,

    /// Directory holding one `<slug>/` output folder per build
    pub sites_dir: PathBuf,

    /// File name of the build log inside each output folder
    pub log_file_name: String,

    /// Public web root where built sites are served, without trailing slash
    pub remote_site_url: Option<String>,

    /// Upper bound for the single callback delivery attempt
    pub callback_timeout: Duration,

    /// Trailing bytes of a log inspected for completion/failure markers
    pub log_tail_window: usize,
}

impl Config {
    /// Creates a new configuration with defaults rooted at `work_dir`
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            build_script: PathBuf::from("./create.sh"),
            build_timeout: Duration::from_secs(900), // 15 minutes
            sites_dir: PathBuf::from("sites"),
            log_file_name: "build.log".to_string(),
            remote_site_url: None,
            callback_timeout: Duration::from_secs(30),
            log_tail_window: 2000,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Recognized environment variables (all optional):
    /// - SITEWRIGHT_WORK_DIR (default: ".")
    /// - BUILD_SCRIPT (default: "./create.sh")
    /// - BUILD_TIMEOUT (seconds, default: 900)
    /// - SITES_DIR (default: "sites")
    /// - BUILD_LOG_NAME (default: "build.log")
    /// - REMOTE_SITE_URL (default: unset)
    /// - CALLBACK_TIMEOUT (seconds, default: 30)
    /// - LOG_TAIL_WINDOW (bytes, default: 2000)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    ///
    /// Unparseable numeric values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::new(
            lookup("SITEWRIGHT_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        );

        if let Some(script) = lookup("BUILD_SCRIPT") {
            config.build_script = PathBuf::from(script);
        }

        if let Some(timeout) = lookup("BUILD_TIMEOUT").and_then(|s| s.parse::<u64>().ok()) {
            config.build_timeout = Duration::from_secs(timeout);
        }

        if let Some(dir) = lookup("SITES_DIR") {
            config.sites_dir = PathBuf::from(dir);
        }

        if let Some(name) = lookup("BUILD_LOG_NAME") {
            config.log_file_name = name;
        }

        config.remote_site_url = lookup("REMOTE_SITE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        if let Some(timeout) = lookup("CALLBACK_TIMEOUT").and_then(|s| s.parse::<u64>().ok()) {
            config.callback_timeout = Duration::from_secs(timeout);
        }

        if let Some(window) = lookup("LOG_TAIL_WINDOW").and_then(|s| s.parse::<usize>().ok()) {
            config.log_tail_window = window;
        }

        config
    }

    /// Sets the public web root
    pub fn with_remote_site_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.remote_site_url = Some(url.trim_end_matches('/').to_string());
        self
    }

    /// Sets the build timeout
    pub fn with_build_timeout(mut self, timeout: Duration) -> Self {
        self.build_timeout = timeout;
        self
    }

    /// Sets the build program path
    pub fn with_build_script(mut self, script: impl Into<PathBuf>) -> Self {
        self.build_script = script.into();
        self
    }

    /// Absolute-or-work-dir-relative path of the build program
    pub fn script_path(&self) -> PathBuf {
        self.resolve(&self.build_script)
    }

    /// Directory containing the per-site output folders
    pub fn sites_path(&self) -> PathBuf {
        self.resolve(&self.sites_dir)
    }

    /// Public URL of a site, when a public web root is configured
    pub fn site_url(&self, job_id: &JobId) -> Option<String> {
        self.remote_site_url
            .as_deref()
            .map(|base| public_site_url(base, job_id))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.work_dir.join(path)
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.build_script.as_os_str().is_empty() {
            anyhow::bail!("build_script cannot be empty");
        }

        if self.build_timeout.is_zero() {
            anyhow::bail!("build_timeout must be greater than 0");
        }

        if self.log_file_name.is_empty() {
            anyhow::bail!("log_file_name cannot be empty");
        }

        if self.log_tail_window == 0 {
            anyhow::bail!("log_tail_window must be greater than 0");
        }

        if let Some(url) = &self.remote_site_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("remote_site_url must start with http:// or https://");
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.build_timeout, Duration::from_secs(900));
        assert_eq!(config.log_tail_window, 2000);
        assert_eq!(config.script_path(), PathBuf::from("./create.sh"));
        assert_eq!(config.sites_path(), PathBuf::from("./sites"));
        assert!(config.remote_site_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("SITEWRIGHT_WORK_DIR", "/srv/factory"),
            ("BUILD_TIMEOUT", "120"),
            ("REMOTE_SITE_URL", "http://192.168.0.114/"),
            ("LOG_TAIL_WINDOW", "4096"),
        ]));

        assert_eq!(config.build_timeout, Duration::from_secs(120));
        assert_eq!(config.log_tail_window, 4096);
        assert_eq!(config.remote_site_url.as_deref(), Some("http://192.168.0.114"));
        assert_eq!(config.script_path(), PathBuf::from("/srv/factory/./create.sh"));
        assert_eq!(config.sites_path(), PathBuf::from("/srv/factory/sites"));
    }

    #[test]
    fn test_from_lookup_ignores_garbage_numbers() {
        let config = Config::from_lookup(lookup_from(&[("BUILD_TIMEOUT", "fifteen")]));
        assert_eq!(config.build_timeout, Duration::from_secs(900));
    }

    #[test]
    fn test_blank_remote_url_is_unset() {
        let config = Config::from_lookup(lookup_from(&[("REMOTE_SITE_URL", "  ")]));
        assert!(config.remote_site_url.is_none());
    }

    #[test]
    fn test_absolute_script_path_is_kept() {
        let config = Config::new("/srv").with_build_script("/opt/factory/create.sh");
        assert_eq!(config.script_path(), PathBuf::from("/opt/factory/create.sh"));
    }

    #[test]
    fn test_site_url() {
        let id = JobId::from_subject("Luigi's Salon");
        assert_eq!(Config::default().site_url(&id), None);

        let config = Config::default().with_remote_site_url("https://sites.example/");
        assert_eq!(
            config.site_url(&id).as_deref(),
            Some("https://sites.example/luigis-salon/index.html")
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.build_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
        config.build_timeout = Duration::from_secs(2);

        config.remote_site_url = Some("ftp://nope".to_string());
        assert!(config.validate().is_err());
        config.remote_site_url = None;

        config.log_tail_window = 0;
        assert!(config.validate().is_err());
        config.log_tail_window = 10;

        assert!(config.validate().is_ok());
    }
}
