//! Report workshop API handlers.

use actix_web::http::header;
use actix_web::{HttpResponse, web};

use crate::error::{AppError, AppResult};
use crate::middleware::ArtifactOutcome;
use crate::models::{
    CompositeReportView, DateFilterQuery, ExistsQuery, ExistsResponse, ReportFilter,
    ReportWithWorkshopsRequest, WorkshopView,
};
use crate::services::artifact::PDF_CONTENT_TYPE;
use crate::services::{PdfArtifact, PdfService, ReportAggregator};

/// List reports with their workshops.
///
/// Reports without any workshop in the date window are left out.
#[utoipa::path(
    get,
    path = "/reports-workshop",
    tag = "Reports",
    params(ReportFilter),
    responses(
        (status = 200, description = "Reports sorted by year and trimester", body = Vec<CompositeReportView>),
        (status = 502, description = "Remote report service failed", body = crate::error::ErrorResponse),
    )
)]
pub async fn list_reports(
    aggregator: web::Data<ReportAggregator>,
    query: web::Query<ReportFilter>,
) -> AppResult<HttpResponse> {
    let views = aggregator.find_filtered(&query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(views))
}

/// Get one report with its workshops in the date window.
///
/// Responds `null` when the report does not exist.
#[utoipa::path(
    get,
    path = "/reports-workshop/{id}/filtered",
    tag = "Reports",
    params(
        ("id" = i32, Path, description = "Report id"),
        DateFilterQuery
    ),
    responses(
        (status = 200, description = "Report with its workshops, or null", body = CompositeReportView),
    )
)]
pub async fn get_report_filtered(
    aggregator: web::Data<ReportAggregator>,
    path: web::Path<i32>,
    query: web::Query<DateFilterQuery>,
) -> AppResult<HttpResponse> {
    let view = aggregator
        .find_by_id_with_date_filter(path.into_inner(), &query.range())
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

#[utoipa::path(
    post,
    path = "/reports-workshop",
    tag = "Reports",
    request_body = ReportWithWorkshopsRequest,
    responses(
        (status = 201, description = "Report created", body = CompositeReportView),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
    )
)]
pub async fn create_report(
    aggregator: web::Data<ReportAggregator>,
    body: web::Json<ReportWithWorkshopsRequest>,
) -> AppResult<HttpResponse> {
    let view = aggregator.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(view))
}

/// Update a report and replace its workshops.
#[utoipa::path(
    put,
    path = "/reports-workshop/{id}",
    tag = "Reports",
    params(("id" = i32, Path, description = "Report id")),
    request_body = ReportWithWorkshopsRequest,
    responses(
        (status = 200, description = "Report updated", body = CompositeReportView),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
    )
)]
pub async fn update_report(
    aggregator: web::Data<ReportAggregator>,
    path: web::Path<i32>,
    body: web::Json<ReportWithWorkshopsRequest>,
) -> AppResult<HttpResponse> {
    let view = aggregator.update(path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Disable (soft-delete) a report.
#[utoipa::path(
    delete,
    path = "/reports-workshop/{id}",
    tag = "Reports",
    params(("id" = i32, Path, description = "Report id")),
    responses((status = 204, description = "Report disabled"))
)]
pub async fn disable_report(
    aggregator: web::Data<ReportAggregator>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    aggregator.disable(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    put,
    path = "/reports-workshop/restore/{id}",
    tag = "Reports",
    params(("id" = i32, Path, description = "Report id")),
    responses((status = 204, description = "Report restored"))
)]
pub async fn restore_report(
    aggregator: web::Data<ReportAggregator>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    aggregator.restore(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Delete a report remotely and its workshops locally.
#[utoipa::path(
    delete,
    path = "/reports-workshop/hard-delete/{id}",
    tag = "Reports",
    params(("id" = i32, Path, description = "Report id")),
    responses((status = 204, description = "Report deleted"))
)]
pub async fn hard_delete_report(
    aggregator: web::Data<ReportAggregator>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    aggregator.delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Download the report PDF.
///
/// Redirects to the stored copy when one exists for this date window.
#[utoipa::path(
    get,
    path = "/reports-workshop/{id}/pdf",
    tag = "Reports",
    params(
        ("id" = i32, Path, description = "Report id"),
        DateFilterQuery
    ),
    responses(
        (status = 200, description = "Rendered PDF", content_type = "application/pdf", body = Vec<u8>),
        (status = 302, description = "Redirect to the stored PDF"),
        (status = 404, description = "Report not found", body = crate::error::ErrorResponse),
        (status = 500, description = "Rendering failed", body = crate::error::ErrorResponse),
    )
)]
pub async fn generate_pdf(
    pdf: web::Data<PdfService>,
    path: web::Path<i32>,
    query: web::Query<DateFilterQuery>,
) -> AppResult<HttpResponse> {
    let (mut response, outcome) = match pdf.generate(path.into_inner(), query.range()).await? {
        PdfArtifact::Cached { key, url } => (
            HttpResponse::Found()
                .insert_header((header::LOCATION, url))
                .finish(),
            ArtifactOutcome { key, cached: true },
        ),
        PdfArtifact::Rendered { key, bytes } => (
            HttpResponse::Ok()
                .content_type(PDF_CONTENT_TYPE)
                .insert_header((
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", key),
                ))
                .body(bytes),
            ArtifactOutcome { key, cached: false },
        ),
    };
    response.extensions_mut().insert(outcome);
    Ok(response)
}

/// Whether a report already exists for a year and trimester.
#[utoipa::path(
    get,
    path = "/reports-workshop/exists",
    tag = "Reports",
    params(ExistsQuery),
    responses((status = 200, description = "Existence flag", body = ExistsResponse))
)]
pub async fn report_exists(
    aggregator: web::Data<ReportAggregator>,
    query: web::Query<ExistsQuery>,
) -> AppResult<HttpResponse> {
    let exists = aggregator.exists(query.year, &query.trimester).await?;
    Ok(HttpResponse::Ok().json(ExistsResponse { exists }))
}

#[utoipa::path(
    get,
    path = "/reports-workshop/workshops/{id}",
    tag = "Workshops",
    params(("id" = i32, Path, description = "Workshop row id")),
    responses(
        (status = 200, description = "Workshop", body = WorkshopView),
        (status = 404, description = "Workshop not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_workshop(
    aggregator: web::Data<ReportAggregator>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let view = aggregator
        .find_workshop(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Workshop {}", id)))?;
    Ok(HttpResponse::Ok().json(view))
}

#[utoipa::path(
    delete,
    path = "/reports-workshop/workshops/{id}",
    tag = "Workshops",
    params(("id" = i32, Path, description = "Workshop row id")),
    responses(
        (status = 204, description = "Workshop deleted"),
        (status = 404, description = "Workshop not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn delete_workshop(
    aggregator: web::Data<ReportAggregator>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    if !aggregator.delete_workshop(id).await? {
        return Err(AppError::NotFound(format!("Workshop {}", id)));
    }
    Ok(HttpResponse::NoContent().finish())
}

/// Configure report workshop routes.
///
/// Literal segments are registered before `{id}` so they are not captured by it.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/reports-workshop")
            .route(web::get().to(list_reports))
            .route(web::post().to(create_report)),
    )
    .service(web::resource("/reports-workshop/exists").route(web::get().to(report_exists)))
    .service(
        web::resource("/reports-workshop/workshops/{id}")
            .route(web::get().to(get_workshop))
            .route(web::delete().to(delete_workshop)),
    )
    .service(web::resource("/reports-workshop/restore/{id}").route(web::put().to(restore_report)))
    .service(
        web::resource("/reports-workshop/hard-delete/{id}")
            .route(web::delete().to(hard_delete_report)),
    )
    .service(
        web::resource("/reports-workshop/{id}/filtered").route(web::get().to(get_report_filtered)),
    )
    .service(web::resource("/reports-workshop/{id}/pdf").route(web::get().to(generate_pdf)))
    .service(
        web::resource("/reports-workshop/{id}")
            .route(web::put().to(update_report))
            .route(web::delete().to(disable_report)),
    );
}
