//! Build submission and build-log endpoints

use crate::SiteClient;
use crate::error::{ClientError, Result};
use sitewright_core::domain::job::JobId;
use sitewright_core::domain::request::BuildRequest;
use sitewright_core::dto::site::{BuildLogResponse, SubmitResponse};

impl SiteClient {
    /// Submit a build request
    ///
    /// Returns the server's acknowledgment; the outcome itself goes to the
    /// request's `webhook_url`.
    pub async fn submit(&self, req: &BuildRequest) -> Result<SubmitResponse> {
        if req.business_name.trim().is_empty() {
            return Err(ClientError::InvalidRequest(
                "business_name cannot be empty".to_string(),
            ));
        }

        let url = format!("{}/generate-site", self.base_url);
        tracing::debug!("Submitting build for '{}' to {}", req.business_name, url);
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Current status, statistics and log of a build
    ///
    /// # Arguments
    /// * `job_id` - The build's slug
    /// * `lines` - Only return the last N log lines; 0 returns everything
    pub async fn build_log(&self, job_id: &JobId, lines: usize) -> Result<BuildLogResponse> {
        let url = format!("{}/build-log/{}", self.base_url, job_id);
        let response = self
            .client
            .get(&url)
            .query(&[("lines", lines)])
            .send()
            .await?;

        self.handle_response(response).await
    }
}
