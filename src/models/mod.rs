//! Domain models for the report workshop service.

pub mod report;
pub mod view;
pub mod workshop;

// Re-export commonly used types
pub use report::{Report, trimester_rank};
pub use view::{
    CacheListQuery, CompositeReportView, DateFilterQuery, ExistsQuery, ExistsResponse,
    ReportFilter, ReportWithWorkshopsRequest, WorkshopInput, WorkshopView,
};
pub use workshop::{
    DateRange, EventRejection, NewWorkshopExtension, WorkshopCacheSnapshot, WorkshopEvent,
    WorkshopExtension,
};
