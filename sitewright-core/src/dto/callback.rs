//! Callback payload DTO

use serde::{Deserialize, Serialize};

use crate::domain::job::JobId;
use crate::domain::outcome::Outcome;

/// Flat status record POSTed once to the caller's callback address
///
/// `status` is one of `success`, `error` or `timeout`; the remaining fields
/// depend on the outcome and are omitted when not applicable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackPayload {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub site_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub site_slug: Option<JobId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timeout_seconds: Option<u64>,
}

impl CallbackPayload {
    fn with_status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            business_name: None,
            site_url: None,
            site_slug: None,
            error: None,
            exit_code: None,
            timeout_seconds: None,
        }
    }
}

fn describe_limit(secs: u64) -> String {
    if secs >= 60 && secs % 60 == 0 {
        format!("{}-minute", secs / 60)
    } else {
        format!("{}-second", secs)
    }
}

impl From<&Outcome> for CallbackPayload {
    fn from(outcome: &Outcome) -> Self {
        let mut payload = Self::with_status(outcome.status_label());

        match outcome {
            Outcome::Success {
                subject,
                job_id,
                site_url,
            } => {
                payload.business_name = Some(subject.clone());
                // Callers without a public base only get the slug to locate the site
                match site_url {
                    Some(url) => payload.site_url = Some(url.clone()),
                    None => payload.site_slug = Some(job_id.clone()),
                }
            }
            Outcome::Failure { error, exit_code } => {
                payload.error = Some(error.clone());
                payload.exit_code = *exit_code;
            }
            Outcome::Timeout {
                subject,
                limit_secs,
            } => {
                payload.business_name = Some(subject.clone());
                payload.error = Some(format!(
                    "Build exceeded {} timeout and was killed.",
                    describe_limit(*limit_secs)
                ));
                payload.timeout_seconds = Some(*limit_secs);
            }
            Outcome::InternalError { error } => {
                payload.error = Some(error.clone());
            }
        }

        payload
    }
}
