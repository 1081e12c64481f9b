use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::ApiConfig;
use crate::domain::PageRequest;
use crate::models::CardImage;

/// Failure of a single page fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS, timeout or body-read failure.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Card API returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// Message shown in place of the grid.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(e) if e.is_timeout() => {
                "The card server took too long to respond. Please try again.".to_string()
            }
            Self::Transport(_) => {
                "Could not reach the card server. Check your connection and try again.".to_string()
            }
            Self::Status { status, .. } => {
                format!("Failed to fetch cards (server responded with {status}).")
            }
            Self::Malformed(_) => "The card server sent an unexpected response.".to_string(),
        }
    }
}

/// Source of result pages. The engine only ever talks to this seam.
#[async_trait]
pub trait CardSource: Send + Sync {
    /// Fetches one page of results.
    ///
    /// # Errors
    ///
    /// - Returns [`FetchError::Transport`] when the request cannot complete
    /// - Returns [`FetchError::Status`] on a non-2xx response
    /// - Returns [`FetchError::Malformed`] when the body is not the expected JSON
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<CardImage>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    image_rows: Option<Vec<CardImage>>,
}

/// Parses a response body. A missing or null `image_rows` is an empty page.
pub fn parse_page(body: &str) -> Result<Vec<CardImage>, FetchError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;
    Ok(response.image_rows.unwrap_or_default())
}

#[derive(Clone)]
pub struct CardApiClient {
    client: Client,
    endpoint: Url,
}

impl CardApiClient {
    /// Builds a client from the `[api]` config section.
    ///
    /// # Errors
    /// Returns an error if the endpoint is not a valid URL or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &ApiConfig) -> anyhow::Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| anyhow::anyhow!("Invalid card API endpoint {}: {e}", config.endpoint))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self { client, endpoint })
    }

    #[must_use]
    pub fn build_url(&self, request: &PageRequest) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in request.query_pairs() {
                pairs.append_pair(name, &value);
            }
        }
        url
    }
}

#[async_trait]
impl CardSource for CardApiClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<CardImage>, FetchError> {
        let url = self.build_url(request);
        debug!(url = %url, page = request.page, "Fetching card page");

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let body = response.text().await?;
        parse_page(&body)
    }
}
