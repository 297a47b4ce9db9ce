//! In-process stand-ins for remote collaborators, used by unit tests.

use async_trait::async_trait;

use crate::error::{AppError, AppResult};
use crate::services::description::DescriptionFetcher;

/// Description fetcher returning a fixed body, or failing.
pub struct StubDescriptions(pub Option<String>);

#[async_trait]
impl DescriptionFetcher for StubDescriptions {
    async fn fetch(&self, _url: &str) -> AppResult<String> {
        self.0
            .clone()
            .ok_or_else(|| AppError::upstream(503, "description host down"))
    }
}
