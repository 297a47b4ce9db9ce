//! Storage seams used by the services.
//!
//! The workshop cache is split into a read capability and a write capability:
//! request handling only ever receives a [`WorkshopCacheReader`], and the
//! cache synchronizer is the single holder of a [`WorkshopCacheWriter`].
//!
//! | Trait | Implemented by | Used by |
//! |-------|----------------|---------|
//! | [`ExtensionStore`] | `DbPool`, [`memory::InMemoryExtensionStore`] | aggregator, PDF service |
//! | [`WorkshopCacheReader`] | `DbPool`, [`memory::InMemoryWorkshopCache`] | aggregator, cache API |
//! | [`WorkshopCacheWriter`] | `DbPool`, [`memory::InMemoryWorkshopCache`] | cache synchronizer |
//! | [`ArtifactStore`] | `Storage` (S3), [`memory::InMemoryArtifactStore`] | artifact cache |
//!
//! [`memory::InMemoryReportGateway`] fills the same role for the remote
//! report service's `ReportGateway`.

pub mod memory;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{NewWorkshopExtension, WorkshopCacheSnapshot, WorkshopExtension};

/// CRUD over locally owned workshop rows.
#[async_trait]
pub trait ExtensionStore: Send + Sync + 'static {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<WorkshopExtension>>;

    /// Rows for a report, ordered by id.
    async fn find_by_report_id(&self, report_id: i32) -> AppResult<Vec<WorkshopExtension>>;

    /// Insert a batch of rows; either all are stored or none.
    async fn insert_many(
        &self,
        rows: Vec<NewWorkshopExtension>,
    ) -> AppResult<Vec<WorkshopExtension>>;

    /// Returns whether a row was deleted.
    async fn delete_by_id(&self, id: i32) -> AppResult<bool>;

    /// Returns the number of rows deleted.
    async fn delete_by_report_id(&self, report_id: i32) -> AppResult<u64>;
}

/// Read access to the workshop cache.
#[async_trait]
pub trait WorkshopCacheReader: Send + Sync + 'static {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<WorkshopCacheSnapshot>>;

    /// All snapshots ordered by id, optionally filtered by status (case-insensitive).
    async fn find_all(&self, status: Option<&str>) -> AppResult<Vec<WorkshopCacheSnapshot>>;
}

/// Write access to the workshop cache. There is no delete: snapshots live forever.
#[async_trait]
pub trait WorkshopCacheWriter: WorkshopCacheReader {
    /// Store a snapshot. An existing snapshot with the same id is overwritten,
    /// so two writers racing on a new id both succeed.
    async fn insert(&self, snapshot: WorkshopCacheSnapshot) -> AppResult<WorkshopCacheSnapshot>;

    /// Update an existing snapshot in place, keeping its id.
    async fn update(&self, snapshot: WorkshopCacheSnapshot) -> AppResult<WorkshopCacheSnapshot>;
}

/// Object storage holding rendered artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync + 'static {
    /// Create or replace the object at `path`.
    async fn put(&self, path: &str, data: Vec<u8>, content_type: &str) -> AppResult<()>;

    /// Whether an object exists at `path`. Errors are left for the caller to interpret.
    async fn probe(&self, path: &str) -> AppResult<bool>;

    /// Public link to the object at `path`.
    fn public_url(&self, path: &str) -> String;
}
