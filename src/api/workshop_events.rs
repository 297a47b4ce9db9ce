//! Workshop event ingress.
//!
//! Payloads are queued as-is; validation happens in the cache synchronizer,
//! which drops unusable events with a log.

use actix_web::{HttpResponse, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppResult;
use crate::models::WorkshopEvent;
use crate::services::WorkshopEventSender;

#[derive(Debug, Serialize, ToSchema)]
pub struct EventAccepted {
    pub status: &'static str,
}

/// Queue a workshop lifecycle event.
#[utoipa::path(
    post,
    path = "/workshop-events",
    tag = "Workshop cache",
    request_body = WorkshopEvent,
    responses(
        (status = 202, description = "Event queued", body = EventAccepted),
        (status = 503, description = "Synchronizer not running", body = crate::error::ErrorResponse),
    )
)]
pub async fn ingest_event(
    sender: web::Data<WorkshopEventSender>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    sender.send(body.to_vec()).await?;
    Ok(HttpResponse::Accepted().json(EventAccepted { status: "accepted" }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/workshop-events").route(web::post().to(ingest_event)));
}
