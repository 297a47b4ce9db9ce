//! Shared fixtures and a test app factory.

use std::sync::Arc;

use actix_web::dev::ServiceResponse;
use actix_web::{App, test, web};
use async_trait::async_trait;
use chrono::NaiveDate;

use report_workshop_lib::error::AppResult;
use report_workshop_lib::middleware::{ForwardAuthorization, RequestLogger};
use report_workshop_lib::models::{Report, WorkshopCacheSnapshot};
use report_workshop_lib::services::{
    DescriptionFetcher, PdfService, ReportAggregator, SimplePdfRenderer,
    WorkshopEventSender, start_cache_sync_task,
};
use report_workshop_lib::store::memory::{
    InMemoryArtifactStore, InMemoryExtensionStore, InMemoryReportGateway, InMemoryWorkshopCache,
};
use report_workshop_lib::store::{WorkshopCacheReader, WorkshopCacheWriter};

pub const ARTIFACT_BASE_URL: &str = "http://objects.test/reports";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn report(id: i32, year: i32, trimester: &str, status: &str) -> Report {
    Report {
        id: Some(id),
        year,
        trimester: trimester.to_string(),
        description_url: None,
        schedule_url: None,
        status: Some(status.to_string()),
    }
}

pub struct FixedDescription(pub &'static str);

#[async_trait]
impl DescriptionFetcher for FixedDescription {
    async fn fetch(&self, _url: &str) -> AppResult<String> {
        Ok(self.0.to_string())
    }
}

/// Collaborators behind a test app, kept so tests can inspect them.
pub struct TestContext {
    pub reports: Arc<InMemoryReportGateway>,
    pub extensions: Arc<InMemoryExtensionStore>,
    pub cache: Arc<InMemoryWorkshopCache>,
    pub artifacts: Arc<InMemoryArtifactStore>,
    pub events: WorkshopEventSender,
}

impl TestContext {
    pub fn new(reports: Vec<Report>) -> Self {
        let cache = Arc::new(InMemoryWorkshopCache::new());
        let (events, _handle) =
            start_cache_sync_task(cache.clone() as Arc<dyn WorkshopCacheWriter>, 16);
        Self {
            reports: Arc::new(InMemoryReportGateway::with_reports(reports)),
            extensions: Arc::new(InMemoryExtensionStore::new()),
            cache,
            artifacts: Arc::new(InMemoryArtifactStore::new(ARTIFACT_BASE_URL)),
            events,
        }
    }

    /// Seed a cache snapshot directly, bypassing the event channel.
    pub async fn seed_snapshot(&self, id: i32, name: &str, start: NaiveDate, end: NaiveDate) {
        self.cache
            .insert(WorkshopCacheSnapshot {
                id,
                name: name.to_string(),
                date_start: Some(start),
                date_end: Some(end),
                status: Some("A".to_string()),
            })
            .await
            .expect("seed snapshot");
    }
}

pub async fn create_test_app(
    ctx: &TestContext,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse,
    Error = actix_web::Error,
> {
    let reader: Arc<dyn WorkshopCacheReader> = ctx.cache.clone();
    let aggregator = Arc::new(ReportAggregator::new(
        ctx.reports.clone(),
        ctx.extensions.clone(),
        reader.clone(),
        4,
    ));
    let pdf = PdfService::new(
        aggregator.clone(),
        ctx.artifacts.clone(),
        Arc::new(SimplePdfRenderer::new()),
        Arc::new(FixedDescription("<p>Resumen del trimestre</p>")),
        "pdf",
    )
    .await_store(true);

    test::init_service(
        App::new()
            .wrap(ForwardAuthorization)
            .wrap(RequestLogger)
            .app_data(web::Data::from(aggregator))
            .app_data(web::Data::new(pdf))
            .app_data(web::Data::from(reader))
            .app_data(web::Data::new(ctx.events.clone()))
            .service(
                web::scope("/api")
                    .configure(report_workshop_lib::api::configure_report_routes)
                    .configure(report_workshop_lib::api::configure_cache_routes)
                    .configure(report_workshop_lib::api::configure_event_routes),
            ),
    )
    .await
}
