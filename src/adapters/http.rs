use crate::utils::error::{RenamerError, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Store pages refuse requests without a browser User-Agent.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn get_html(&self, url: &str) -> Result<String> {
        tracing::debug!("Fetching page: {}", url);
        let response = self.client.get(url).send().await?;
        tracing::debug!("Page response status: {}", response.status());

        if response.status() != StatusCode::OK {
            return Err(RenamerError::StatusError {
                status: response.status().to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .user_agent(DEFAULT_USER_AGENT)
                .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
                .build()
                .unwrap_or_default(),
        }
    }
}
