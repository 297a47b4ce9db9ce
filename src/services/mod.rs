//! Business logic services.

pub mod aggregator;
pub mod artifact;
pub mod cache_sync;
pub mod description;
pub mod renderer;
pub mod report_gateway;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregator::ReportAggregator;
pub use artifact::{PdfArtifact, PdfService, artifact_key};
pub use cache_sync::{
    SyncOutcome, WorkshopCacheSynchronizer, WorkshopEventSender, start_cache_sync_task,
    workshop_event_channel,
};
pub use description::{DescriptionFetcher, HttpDescriptionFetcher};
pub use renderer::{ReportRenderer, SimplePdfRenderer};
pub use report_gateway::{HttpReportGateway, ReportGateway};
pub use storage::Storage;
