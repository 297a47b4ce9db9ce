//! Request logging middleware.
//!
//! Every request gets an id, echoed back in `X-Request-Id` (a caller-supplied
//! id is kept), and one completion line logged under the `api` target. PDF
//! downloads also log which artifact was served and whether it came from
//! storage or was rendered for this request.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::StatusCode;
use actix_web::http::header::{AUTHORIZATION, HeaderName, HeaderValue};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::time::Instant;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied request id that is kept as is.
const MAX_REQUEST_ID_LEN: usize = 64;

/// Which report artifact a response carried.
///
/// Handlers attach it to the response extensions; the logger reads it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactOutcome {
    pub key: String,
    /// Served from storage rather than rendered for this request.
    pub cached: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Info,
    Warn,
    Error,
}

fn severity(status: StatusCode) -> Severity {
    if status.is_server_error() {
        Severity::Error
    } else if status.is_client_error() {
        Severity::Warn
    } else {
        Severity::Info
    }
}

/// The caller's id when it is short printable ASCII, a fresh one otherwise.
fn request_id(req: &ServiceRequest) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::now_v7().to_string())
}

macro_rules! log_completion {
    ($level:ident, $line:expr, $message:literal) => {
        tracing::$level!(
            target: "api",
            method = %$line.method,
            route = %$line.route,
            request_id = %$line.request_id,
            forwards_token = $line.forwards_token,
            status = $line.status.as_u16(),
            duration_ms = $line.duration_ms,
            artifact_key = $line.artifact.as_ref().map(|a| a.key.as_str()),
            artifact_cached = $line.artifact.as_ref().map(|a| a.cached),
            $message
        )
    };
}

struct CompletionLine {
    method: String,
    route: String,
    request_id: String,
    forwards_token: bool,
    status: StatusCode,
    duration_ms: u64,
    artifact: Option<ArtifactOutcome>,
}

impl CompletionLine {
    fn emit(&self) {
        match severity(self.status) {
            Severity::Info => log_completion!(info, self, "Request completed"),
            Severity::Warn => log_completion!(warn, self, "Request rejected"),
            Severity::Error => log_completion!(error, self, "Request failed"),
        }
    }
}

/// Request logger middleware factory.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware { service }))
    }
}

/// Request logger middleware service.
pub struct RequestLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let request_id = request_id(&req);
        let method = req.method().to_string();
        // Route template keeps ids out of the field, so lines group per endpoint
        let route = req
            .match_pattern()
            .unwrap_or_else(|| req.path().to_string());
        let forwards_token = req.headers().contains_key(AUTHORIZATION);

        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.await?;

            if let Ok(value) = HeaderValue::from_str(&request_id) {
                res.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }

            let artifact = res.response().extensions().get::<ArtifactOutcome>().cloned();
            CompletionLine {
                method,
                route,
                request_id,
                forwards_token,
                status: res.status(),
                duration_ms: start.elapsed().as_millis() as u64,
                artifact,
            }
            .emit();

            Ok(res)
        })
    }
}
