use anyhow::{Context, Result};
use std::time::Duration;

use crate::api::error::UsageError;
use crate::api::response::{UsageResponse, parse_usage_xml};
use crate::config::ApiConfig;

const USAGE_ENDPOINT: &str = "usage-xml.php";

/// HTTP client for the Aquiss usage API
#[derive(Debug, Clone)]
pub struct UsageApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl UsageApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("aquiss-usage/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn usage_url(&self) -> String {
        format!("{}/{}", self.base_url, USAGE_ENDPOINT)
    }

    /// Fetch the current usage for `hash_key`.
    ///
    /// A server-side rejection (anything other than `Valid`) is still returned
    /// as `Ok`; callers decide whether that is an invalid credential.
    pub async fn fetch_usage(&self, hash_key: &str) -> Result<UsageResponse, UsageError> {
        let url = self.usage_url();
        tracing::debug!(%url, "fetching usage");

        let response = self
            .client
            .get(&url)
            .query(&[("hashkey", hash_key)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UsageError::Status(response.status()));
        }

        let body = response.text().await?;
        parse_usage_xml(&body)
    }

    /// True when the server accepts `hash_key`
    pub async fn validate_hash_code(&self, hash_key: &str) -> bool {
        match self.fetch_usage(hash_key).await {
            Ok(response) => response.is_valid(),
            Err(e) => {
                tracing::debug!(error = %e, "hash code validation request failed");
                false
            }
        }
    }
}
