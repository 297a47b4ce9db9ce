//! Workshop cache API handlers (read-only).

use actix_web::{HttpResponse, web};

use crate::error::{AppError, AppResult};
use crate::models::{CacheListQuery, WorkshopCacheSnapshot};
use crate::store::WorkshopCacheReader;

/// List cached workshops, optionally by status.
#[utoipa::path(
    get,
    path = "/workshop-cache",
    tag = "Workshop cache",
    params(CacheListQuery),
    responses((status = 200, description = "Cached workshops ordered by id", body = Vec<WorkshopCacheSnapshot>))
)]
pub async fn list_cache(
    cache: web::Data<dyn WorkshopCacheReader>,
    query: web::Query<CacheListQuery>,
) -> AppResult<HttpResponse> {
    let snapshots = cache.find_all(query.status.as_deref()).await?;
    Ok(HttpResponse::Ok().json(snapshots))
}

#[utoipa::path(
    get,
    path = "/workshop-cache/{id}",
    tag = "Workshop cache",
    params(("id" = i32, Path, description = "Workshop id")),
    responses(
        (status = 200, description = "Cached workshop", body = WorkshopCacheSnapshot),
        (status = 404, description = "Not cached", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_cache(
    cache: web::Data<dyn WorkshopCacheReader>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let snapshot = cache
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Workshop cache {}", id)))?;
    Ok(HttpResponse::Ok().json(snapshot))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/workshop-cache").route(web::get().to(list_cache)))
        .service(web::resource("/workshop-cache/{id}").route(web::get().to(get_cache)));
}
