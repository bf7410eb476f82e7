//! Outcome notifier
//!
//! Delivers a job's outcome to the callback address supplied with its
//! request. One attempt, no retry, no queue: a failed delivery is reported
//! to the caller of `deliver` (which logs it) and the job stays terminal.

use async_trait::async_trait;
use reqwest::Client;
use sitewright_core::domain::outcome::Outcome;
use sitewright_core::dto::callback::CallbackPayload;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

/// Notification error type
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The callback could not be reached or timed out
    #[error("callback request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The callback answered with a non-2xx status
    #[error("callback rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Delivers outcomes to callers
#[async_trait]
pub trait OutcomeNotifier: Send + Sync {
    /// Makes a single best-effort delivery attempt
    async fn deliver(&self, callback_url: &str, outcome: &Outcome) -> Result<(), NotifyError>;
}

/// Notifier POSTing a flat JSON status record to an HTTP callback
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
}

impl WebhookNotifier {
    /// Creates a notifier whose single attempt is bounded by `timeout`
    pub fn new(timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn from_config(config: &Config) -> Result<Self, NotifyError> {
        Self::new(config.callback_timeout)
    }

    /// Uses an already configured HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OutcomeNotifier for WebhookNotifier {
    async fn deliver(&self, callback_url: &str, outcome: &Outcome) -> Result<(), NotifyError> {
        let payload = CallbackPayload::from(outcome);
        debug!("Posting '{}' outcome to {}", payload.status, callback_url);

        let response = self.client.post(callback_url).json(&payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use sitewright_core::domain::job::JobId;

    fn success() -> Outcome {
        Outcome::Success {
            subject: "Luigi's Salon".to_string(),
            job_id: JobId::from_subject("Luigi's Salon"),
            site_url: Some("http://sites.example/luigis-salon/index.html".to_string()),
        }
    }

    #[tokio::test]
    async fn test_deliver_posts_flat_payload_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/webhook/site")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "status": "success",
                "business_name": "Luigi's Salon",
                "site_url": "http://sites.example/luigis-salon/index.html"
            })))
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let notifier = WebhookNotifier::new(Duration::from_secs(5)).unwrap();
        notifier
            .deliver(&format!("{}/webhook/site", server.url()), &success())
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_2xx_is_rejected_without_retry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .with_status(503)
            .with_body("busy")
            .expect(1)
            .create_async()
            .await;

        let notifier = WebhookNotifier::new(Duration::from_secs(5)).unwrap();
        let err = notifier
            .deliver(&format!("{}/hook", server.url()), &success())
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::Rejected { status: 503, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_callback_is_an_error() {
        let notifier = WebhookNotifier::new(Duration::from_secs(2)).unwrap();
        // Port 9 (discard) on localhost is closed in test environments
        let err = notifier
            .deliver("http://127.0.0.1:9/hook", &success())
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::Request(_)));
    }
}
