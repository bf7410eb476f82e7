//! Build request domain types

use serde::{Deserialize, Serialize};

use crate::domain::job::JobId;

/// A request to build one review site
///
/// The four descriptive fields are forwarded verbatim, in order, as the
/// positional arguments of the external build program. The request is
/// immutable once accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    /// Human-readable subject name; the job id is derived from it
    pub business_name: String,
    /// Business category
    pub niche: String,
    pub address: String,
    /// Contact phone number
    pub tel: String,
    /// Where the single outcome notification is POSTed
    pub webhook_url: String,
}

impl BuildRequest {
    /// Job id derived from the subject name
    pub fn job_id(&self) -> JobId {
        JobId::from_subject(&self.business_name)
    }

    /// Positional arguments for the build program: name, category, address, contact
    pub fn build_args(&self) -> [&str; 4] {
        [&self.business_name, &self.niche, &self.address, &self.tel]
    }
}
