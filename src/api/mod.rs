//! API endpoint modules.

pub mod health;
pub mod openapi;
pub mod reports_workshop;
pub mod workshop_cache;
pub mod workshop_events;

use actix_web::web;

pub use health::configure_health_routes;
pub use openapi::ApiDoc;
pub use reports_workshop::configure_routes as configure_report_routes;
pub use workshop_cache::configure_routes as configure_cache_routes;
pub use workshop_events::configure_routes as configure_event_routes;

/// Every route served under `/api`.
pub fn configure_api_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(configure_report_routes)
        .configure(configure_cache_routes)
        .configure(configure_event_routes);
}
