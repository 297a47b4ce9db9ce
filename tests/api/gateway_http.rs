//! `HttpReportGateway` against a fake remote report service on a local socket.

use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use serde_json::json;

use report_workshop_lib::auth::{CallerToken, with_caller_token};
use report_workshop_lib::config::CoreServiceSettings;
use report_workshop_lib::error::AppError;
use report_workshop_lib::services::{HttpReportGateway, ReportGateway};

use super::common::report;

/// Authorization headers and query strings seen by the fake service.
#[derive(Default)]
struct Seen {
    authorization: Mutex<Vec<Option<String>>>,
    queries: Mutex<Vec<String>>,
}

impl Seen {
    fn record(&self, req: &HttpRequest) {
        let auth = req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.authorization.lock().unwrap().push(auth);
        self.queries
            .lock()
            .unwrap()
            .push(req.query_string().to_string());
    }

    fn last_authorization(&self) -> Option<String> {
        self.authorization.lock().unwrap().last().cloned().flatten()
    }
}

async fn list(req: HttpRequest, seen: web::Data<Seen>) -> HttpResponse {
    seen.record(&req);
    HttpResponse::Ok().json(vec![report(1, 2024, "abril-junio", "A")])
}

async fn get_one(req: HttpRequest, seen: web::Data<Seen>, path: web::Path<i32>) -> HttpResponse {
    seen.record(&req);
    match path.into_inner() {
        1 => HttpResponse::Ok().json(report(1, 2024, "abril-junio", "A")),
        _ => HttpResponse::NotFound().body("no such report"),
    }
}

async fn conflict(req: HttpRequest, seen: web::Data<Seen>) -> HttpResponse {
    seen.record(&req);
    HttpResponse::Conflict().json(json!({ "message": "duplicate trimester" }))
}

async fn exist(req: HttpRequest, seen: web::Data<Seen>) -> HttpResponse {
    seen.record(&req);
    HttpResponse::Ok().json(req.query_string().contains("year=2024"))
}

async fn broken(req: HttpRequest, seen: web::Data<Seen>) -> HttpResponse {
    seen.record(&req);
    HttpResponse::InternalServerError().body("boom")
}

/// Start the fake service and return its base URL.
fn start_fake_service(seen: Arc<Seen>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
    let port = listener.local_addr().expect("no local addr").port();
    let seen = web::Data::from(seen);

    let server = HttpServer::new(move || {
        App::new().app_data(seen.clone()).service(
            web::scope("/api/reports")
                .route("", web::get().to(list))
                .route("", web::post().to(conflict))
                .route("/exist", web::get().to(exist))
                .route("/disable/{id}", web::put().to(broken))
                .route("/{id}", web::get().to(get_one)),
        )
    })
    .workers(1)
    .listen(listener)
    .expect("failed to listen")
    .disable_signals()
    .run();

    tokio::spawn(server);
    format!("http://127.0.0.1:{}", port)
}

fn gateway(base_url: &str, service_token: Option<&str>) -> HttpReportGateway {
    HttpReportGateway::new(&CoreServiceSettings {
        base_url: base_url.to_string(),
        token: service_token.map(|t| t.to_string().into()),
        timeout_secs: 5,
    })
    .expect("gateway")
}

#[actix_rt::test]
async fn test_lookup_maps_remote_404_to_none() {
    let seen = Arc::new(Seen::default());
    let gateway = gateway(&start_fake_service(seen), None);

    let found = gateway.find_by_id(1).await.unwrap();
    assert_eq!(found.unwrap().trimester, "abril-junio");
    assert!(gateway.find_by_id(2).await.unwrap().is_none());
}

#[actix_rt::test]
async fn test_remote_errors_keep_their_status() {
    let seen = Arc::new(Seen::default());
    let gateway = gateway(&start_fake_service(seen), None);

    let err = gateway
        .create(&report(0, 2024, "abril-junio", "A"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Upstream { status: Some(409), .. }));

    let err = gateway.disable(1).await.unwrap_err();
    assert!(matches!(err, AppError::Upstream { status: Some(500), .. }));
}

#[actix_rt::test]
async fn test_caller_token_wins_over_service_token() {
    let seen = Arc::new(Seen::default());
    let gateway = gateway(&start_fake_service(seen.clone()), Some("service-secret"));

    gateway.find_all().await.unwrap();
    assert_eq!(
        seen.last_authorization().as_deref(),
        Some("Bearer service-secret")
    );

    with_caller_token(Some(CallerToken::new("caller-jwt")), async {
        gateway.find_all().await.unwrap();
    })
    .await;
    assert_eq!(seen.last_authorization().as_deref(), Some("Bearer caller-jwt"));
}

#[actix_rt::test]
async fn test_no_authorization_without_any_token() {
    let seen = Arc::new(Seen::default());
    let gateway = gateway(&start_fake_service(seen.clone()), None);

    gateway.find_all().await.unwrap();
    assert!(seen.last_authorization().is_none());
}

#[actix_rt::test]
async fn test_exists_encodes_query() {
    let seen = Arc::new(Seen::default());
    let gateway = gateway(&start_fake_service(seen.clone()), None);

    assert!(
        gateway
            .exists_by_year_and_trimester(2024, "abril junio")
            .await
            .unwrap()
    );
    assert!(
        !gateway
            .exists_by_year_and_trimester(2023, "abril-junio")
            .await
            .unwrap()
    );
    let queries = seen.queries.lock().unwrap();
    assert_eq!(queries[0], "year=2024&trimester=abril%20junio");
}
