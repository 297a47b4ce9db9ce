//! Report workshop service - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use report_workshop_lib::api::{self, ApiDoc};
use report_workshop_lib::config::Config;
use report_workshop_lib::db::DbPool;
use report_workshop_lib::middleware;
use report_workshop_lib::services::{
    self, HttpDescriptionFetcher, HttpReportGateway, PdfService, ReportAggregator,
    SimplePdfRenderer, Storage,
};
use report_workshop_lib::store::{ArtifactStore, ExtensionStore, WorkshopCacheReader};

fn exit_with(message: &str, err: impl std::fmt::Display) -> ! {
    error!("{}: {}", message, err);
    std::process::exit(1);
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        std::process::exit(1);
    }

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL, CORE_SERVICE_URL and S3_* must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Report Workshop Service");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    // Local store
    let pool = DbPool::new(&config)
        .await
        .unwrap_or_else(|e| exit_with("Failed to initialize database", e));
    info!("Database connection established");
    pool.run_migrations()
        .await
        .unwrap_or_else(|e| exit_with("Failed to run migrations", e));

    // Artifact storage
    let storage = Storage::new(&config.storage)
        .await
        .unwrap_or_else(|e| exit_with("Failed to initialize S3 storage", e));

    // Remote collaborators
    let gateway = HttpReportGateway::new(&config.core_service)
        .unwrap_or_else(|e| exit_with("Failed to build report service client", e));
    info!("Remote report service: {}", config.core_service.base_url);
    let descriptions = HttpDescriptionFetcher::new()
        .unwrap_or_else(|e| exit_with("Failed to build description client", e));

    // Workshop cache synchronizer: the only writer of the cache
    let pool = Arc::new(pool);
    let (event_sender, _sync_handle) =
        services::start_cache_sync_task(pool.clone(), config.event_channel_capacity);

    let extensions: Arc<dyn ExtensionStore> = pool.clone();
    let cache: Arc<dyn WorkshopCacheReader> = pool.clone();
    let artifacts: Arc<dyn ArtifactStore> = Arc::new(storage);

    let aggregator = Arc::new(ReportAggregator::new(
        Arc::new(gateway),
        extensions,
        cache.clone(),
        config.fan_out,
    ));
    let pdf = PdfService::new(
        aggregator.clone(),
        artifacts,
        Arc::new(SimplePdfRenderer::new()),
        Arc::new(descriptions),
        config.pdf.folder.clone(),
    )
    .await_store(config.pdf.await_store);

    info!(
        "Aggregation fan-out {}, PDF folder '{}' ({})",
        config.fan_out,
        config.pdf.folder,
        if config.pdf.await_store {
            "synchronous store"
        } else {
            "fire-and-forget store"
        }
    );

    // Shared state
    let bind_address = config.bind_address();
    let is_development = config.is_development();
    let pool_data = web::Data::from(pool);
    let aggregator_data = web::Data::from(aggregator);
    let pdf_data = web::Data::new(pdf);
    let cache_data: web::Data<dyn WorkshopCacheReader> = web::Data::from(cache);
    let events_data = web::Data::new(event_sender);
    let openapi = ApiDoc::openapi();

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    // Start HTTP server
    let server = HttpServer::new(move || {
        let cors = if is_development {
            // Permissive CORS for development
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
                .expose_headers(vec![
                    header::CONTENT_DISPOSITION,
                    header::LOCATION,
                    header::HeaderName::from_static(middleware::REQUEST_ID_HEADER),
                ])
                .max_age(3600)
        } else {
            // Restrictive CORS for production (same-origin only)
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
                .expose_headers(vec![
                    header::CONTENT_DISPOSITION,
                    header::LOCATION,
                    header::HeaderName::from_static(middleware::REQUEST_ID_HEADER),
                ])
                .max_age(3600)
        };

        App::new()
            // Token capture runs innermost so handlers see it
            .wrap(middleware::ForwardAuthorization)
            .wrap(middleware::RequestLogger)
            .wrap(cors)
            .app_data(pool_data.clone())
            .app_data(aggregator_data.clone())
            .app_data(pdf_data.clone())
            .app_data(cache_data.clone())
            .app_data(events_data.clone())
            .service(web::scope("/api").configure(api::configure_api_routes))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
