//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Report Workshop Service",
        version = "0.1.0",
        description = "Activity reports with their workshops, resolved against the workshop cache, plus cached PDF export"
    ),
    servers(
        (url = "/api", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Report endpoints
        api::reports_workshop::list_reports,
        api::reports_workshop::get_report_filtered,
        api::reports_workshop::create_report,
        api::reports_workshop::update_report,
        api::reports_workshop::disable_report,
        api::reports_workshop::restore_report,
        api::reports_workshop::hard_delete_report,
        api::reports_workshop::generate_pdf,
        api::reports_workshop::report_exists,
        api::reports_workshop::get_workshop,
        api::reports_workshop::delete_workshop,
        // Workshop cache endpoints
        api::workshop_cache::list_cache,
        api::workshop_cache::get_cache,
        api::workshop_events::ingest_event,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Reports
            models::Report,
            models::WorkshopInput,
            models::WorkshopView,
            models::ReportWithWorkshopsRequest,
            models::CompositeReportView,
            models::ExistsResponse,
            // Workshop cache
            models::WorkshopCacheSnapshot,
            models::WorkshopEvent,
            api::workshop_events::EventAccepted,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Reports", description = "Reports with their workshops"),
        (name = "Workshops", description = "Single workshop rows"),
        (name = "Workshop cache", description = "Cached workshops fed by workshop events"),
    )
)]
pub struct ApiDoc;
