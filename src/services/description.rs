//! Best-effort fetch of a report's rich-text description.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{AppError, AppResult};

/// HTTP connect timeout for description fetches.
const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// HTTP total timeout for description fetches.
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Loads the HTML document a report's `descriptionUrl` points at.
#[async_trait]
pub trait DescriptionFetcher: Send + Sync + 'static {
    async fn fetch(&self, url: &str) -> AppResult<String>;
}

/// reqwest-backed fetcher. No credentials are sent: description links are public.
pub struct HttpDescriptionFetcher {
    client: reqwest::Client,
}

impl HttpDescriptionFetcher {
    pub fn new() -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Upstream {
                status: None,
                message: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DescriptionFetcher for HttpDescriptionFetcher {
    async fn fetch(&self, url: &str) -> AppResult<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Fetch the description, degrading to an empty string on any failure.
pub async fn fetch_or_empty(fetcher: &dyn DescriptionFetcher, url: Option<&str>) -> String {
    let Some(url) = url.filter(|u| !u.trim().is_empty()) else {
        return String::new();
    };
    match fetcher.fetch(url).await {
        Ok(html) => html,
        Err(e) => {
            warn!("Could not read report description from {}: {}", url, e);
            String::new()
        }
    }
}
