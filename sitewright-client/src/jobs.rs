//! Run registry endpoint

use crate::SiteClient;
use crate::error::Result;
use sitewright_core::domain::job::RunSummary;

impl SiteClient {
    /// List the runs known to the server, most recent first
    pub async fn list_jobs(&self) -> Result<Vec<RunSummary>> {
        let url = format!("{}/jobs", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
