//! Liveness and readiness endpoints.
//!
//! Readiness covers the two things only this process owns: the local
//! database and the workshop cache synchronizer. The remote report service
//! and object storage are left out; their outages surface per request.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, get, web};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::services::WorkshopEventSender;

/// Liveness response.
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

/// Readiness response.
#[derive(Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    status: &'static str,
    database: &'static str,
    /// Whether workshop events are still being applied to the cache.
    cache_sync: &'static str,
}

fn readiness(database_ok: bool, sync_running: bool) -> (StatusCode, ReadyResponse) {
    let code = if database_ok && sync_running {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = ReadyResponse {
        status: if code == StatusCode::OK { "ready" } else { "not_ready" },
        database: if database_ok { "connected" } else { "unreachable" },
        cache_sync: if sync_running { "running" } else { "stopped" },
    };
    (code, body)
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Process is up", body = HealthResponse)
    )
)]
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness probe.
///
/// 503 when the database doesn't answer or the cache synchronizer has
/// stopped, since listings would then serve stale workshop data.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready to serve", body = ReadyResponse),
        (status = 503, description = "Database or cache synchronizer down", body = ReadyResponse)
    )
)]
#[get("/ready")]
pub async fn ready(pool: web::Data<DbPool>, events: web::Data<WorkshopEventSender>) -> HttpResponse {
    let database_ok = match pool.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Readiness check: database unreachable: {}", e);
            false
        }
    };
    let sync_running = events.is_running();
    if !sync_running {
        tracing::error!("Readiness check: workshop cache synchronizer has stopped");
    }

    let (code, body) = readiness(database_ok, sync_running);
    HttpResponse::build(code).json(body)
}

pub fn configure_health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(ready);
}
