//! Client for the remote report service, the owner of report records.
//!
//! Remote 404 on a lookup resolves to `None`; every other failure is
//! propagated as [`AppError::Upstream`] with the remote status, without retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::auth::current_caller_token;
use crate::config::CoreServiceSettings;
use crate::error::{AppError, AppResult};
use crate::models::Report;

/// Path of the report resource on the remote service.
const REPORTS_PATH: &str = "/api/reports";
/// HTTP connect timeout for remote report calls.
const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Read/write proxy to the authoritative report records.
#[async_trait]
pub trait ReportGateway: Send + Sync + 'static {
    async fn find_all(&self) -> AppResult<Vec<Report>>;

    /// `None` when the remote service answers 404.
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Report>>;

    async fn create(&self, report: &Report) -> AppResult<Report>;

    async fn update(&self, id: i32, report: &Report) -> AppResult<Report>;

    async fn disable(&self, id: i32) -> AppResult<()>;

    async fn restore(&self, id: i32) -> AppResult<()>;

    async fn delete(&self, id: i32) -> AppResult<()>;

    async fn exists_by_year_and_trimester(&self, year: i32, trimester: &str) -> AppResult<bool>;
}

/// reqwest-backed gateway.
///
/// Outgoing calls carry the caller's bearer token when the request being
/// served had one, otherwise the configured service token, otherwise nothing.
pub struct HttpReportGateway {
    client: reqwest::Client,
    base_url: String,
    service_token: Option<SecretString>,
}

impl HttpReportGateway {
    pub fn new(settings: &CoreServiceSettings) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AppError::Upstream {
                status: None,
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            service_token: settings.token.clone(),
        })
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}{}{}", self.base_url, REPORTS_PATH, suffix)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = current_caller_token() {
            request.bearer_auth(token.expose())
        } else if let Some(token) = &self.service_token {
            request.bearer_auth(token.expose_secret())
        } else {
            request
        }
    }

    async fn send(&self, request: RequestBuilder) -> AppResult<Response> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(
            status = status.as_u16(),
            "Remote report service returned an error: {}", body
        );
        Err(AppError::upstream(status.as_u16(), body))
    }
}

#[async_trait]
impl ReportGateway for HttpReportGateway {
    async fn find_all(&self) -> AppResult<Vec<Report>> {
        let response = self.send(self.client.get(self.url(""))).await?;
        Ok(response.json().await?)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Report>> {
        let request = self.client.get(self.url(&format!("/{}", id)));
        match self.send(request).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(AppError::Upstream {
                status: Some(status),
                ..
            }) if status == StatusCode::NOT_FOUND.as_u16() => {
                debug!("Report {} not found remotely", id);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn create(&self, report: &Report) -> AppResult<Report> {
        let response = self.send(self.client.post(self.url("")).json(report)).await?;
        Ok(response.json().await?)
    }

    async fn update(&self, id: i32, report: &Report) -> AppResult<Report> {
        let request = self.client.put(self.url(&format!("/{}", id))).json(report);
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    async fn disable(&self, id: i32) -> AppResult<()> {
        self.send(self.client.put(self.url(&format!("/disable/{}", id))))
            .await?;
        Ok(())
    }

    async fn restore(&self, id: i32) -> AppResult<()> {
        self.send(self.client.put(self.url(&format!("/restore/{}", id))))
            .await?;
        Ok(())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        self.send(self.client.delete(self.url(&format!("/{}", id))))
            .await?;
        Ok(())
    }

    async fn exists_by_year_and_trimester(&self, year: i32, trimester: &str) -> AppResult<bool> {
        let suffix = format!(
            "/exist?year={}&trimester={}",
            year,
            urlencoding::encode(trimester)
        );
        let response = self.send(self.client.get(self.url(&suffix))).await?;
        Ok(response.json().await?)
    }
}
