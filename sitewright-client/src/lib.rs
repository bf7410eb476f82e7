//! Sitewright HTTP Client
//!
//! A small, typed HTTP client for the Sitewright build server, used by the
//! CLI.
//!
//! # Example
//!
//! ```no_run
//! use sitewright_client::SiteClient;
//! use sitewright_core::domain::request::BuildRequest;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = SiteClient::new("http://localhost:8000");
//!
//!     let ack = client.submit(&BuildRequest {
//!         business_name: "Da Mario".to_string(),
//!         niche: "pizzeria".to_string(),
//!         address: "Piazza Verdi 3".to_string(),
//!         tel: "0187 111111".to_string(),
//!         webhook_url: "http://n8n.local/webhook/site".to_string(),
//!     }).await?;
//!
//!     println!("Building {}", ack.site_slug);
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;
mod sites;

pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the Sitewright build server
#[derive(Debug, Clone)]
pub struct SiteClient {
    /// Base URL of the server (e.g., "http://localhost:8000")
    base_url: String,
    client: Client,
}

impl SiteClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a client around a configured reqwest Client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the server answers its health endpoint
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from(response).await);
        }

        Ok(())
    }

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))
    }
}

/// Turns a failed response into an API error, unwrapping `{"error": ...}`
/// bodies into their message
async fn error_from(response: reqwest::Response) -> ClientError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| value.get("error")?.as_str().map(str::to_string))
        .unwrap_or(body);

    ClientError::api_error(status, message)
}
