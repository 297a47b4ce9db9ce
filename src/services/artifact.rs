//! Cached PDF generation.
//!
//! A rendered report is stored under a key derived from the report id and
//! the date window. Once a key exists in storage it is served from there and
//! never rendered again, even if the report or its workshops change.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::DateRange;
use crate::services::aggregator::ReportAggregator;
use crate::services::description::{DescriptionFetcher, fetch_or_empty};
use crate::services::renderer::{PdfDocument, ReportRenderer};
use crate::store::ArtifactStore;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Deterministic artifact file name for a report and date window.
pub fn artifact_key(report_id: i32, start: Option<NaiveDate>, end: Option<NaiveDate>) -> String {
    let mut key = format!("report_{}", report_id);
    if let Some(start) = start {
        key.push_str(&format!("_from_{}", start));
    }
    if let Some(end) = end {
        key.push_str(&format!("_to_{}", end));
    }
    key.push_str(".pdf");
    key
}

/// Result of a generate call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfArtifact {
    /// Already stored; `url` is its public link.
    Cached { key: String, url: String },
    /// Freshly rendered.
    Rendered { key: String, bytes: Vec<u8> },
}

/// Orchestrates lookup, rendering and storage of report PDFs.
pub struct PdfService {
    aggregator: Arc<ReportAggregator>,
    artifacts: Arc<dyn ArtifactStore>,
    renderer: Arc<dyn ReportRenderer>,
    descriptions: Arc<dyn DescriptionFetcher>,
    folder: String,
    await_store: bool,
}

impl PdfService {
    pub fn new(
        aggregator: Arc<ReportAggregator>,
        artifacts: Arc<dyn ArtifactStore>,
        renderer: Arc<dyn ReportRenderer>,
        descriptions: Arc<dyn DescriptionFetcher>,
        folder: impl Into<String>,
    ) -> Self {
        Self {
            aggregator,
            artifacts,
            renderer,
            descriptions,
            folder: folder.into().trim_matches('/').to_string(),
            await_store: false,
        }
    }

    /// Wait for the artifact write before returning from [`PdfService::generate`].
    pub fn await_store(mut self, await_store: bool) -> Self {
        self.await_store = await_store;
        self
    }

    fn path(&self, key: &str) -> String {
        if self.folder.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", self.folder, key)
        }
    }

    /// Serve the stored artifact for this key, or render and store it.
    ///
    /// Two concurrent misses on the same key may both render; the second
    /// write replaces the first with equivalent bytes.
    pub async fn generate(&self, report_id: i32, range: DateRange) -> AppResult<PdfArtifact> {
        let key = artifact_key(report_id, range.start, range.end);
        let path = self.path(&key);

        match self.artifacts.probe(&path).await {
            Ok(true) => {
                debug!("Serving cached artifact {}", path);
                return Ok(PdfArtifact::Cached {
                    url: self.artifacts.public_url(&path),
                    key,
                });
            }
            Ok(false) => {}
            Err(e) => debug!("Artifact probe for {} failed, rendering: {}", path, e),
        }

        let report = self
            .aggregator
            .gateway()
            .find_by_id(report_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {}", report_id)))?;
        let workshops = self.aggregator.workshops_for_report(report_id, &range).await?;
        let description =
            fetch_or_empty(self.descriptions.as_ref(), report.description_url.as_deref()).await;

        let document = PdfDocument::new(report, &workshops, description);
        let renderer = Arc::clone(&self.renderer);
        let bytes = tokio::task::spawn_blocking(move || renderer.render(&document))
            .await
            .map_err(|e| AppError::Render(format!("render task failed: {}", e)))??;

        info!(
            "Rendered {} ({} workshops, {} bytes)",
            key,
            workshops.len(),
            bytes.len()
        );

        self.store(path, bytes.clone()).await;
        Ok(PdfArtifact::Rendered { key, bytes })
    }

    /// Persist an artifact. A failed write only costs the cache entry.
    async fn store(&self, path: String, bytes: Vec<u8>) {
        let artifacts = Arc::clone(&self.artifacts);
        let write = async move {
            if let Err(e) = artifacts.put(&path, bytes, PDF_CONTENT_TYPE).await {
                warn!("Failed to store artifact {}: {}", path, e);
            }
        };

        if self.await_store {
            write.await;
        } else {
            tokio::spawn(write);
        }
    }
}
