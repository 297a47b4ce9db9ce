//! Request payloads, query parameters and composite read models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::report::Report;
use super::workshop::{DateRange, NewWorkshopExtension, WorkshopCacheSnapshot, WorkshopExtension};
use crate::error::{AppError, AppResult};

/// A workshop entry as sent by clients on create/update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopInput {
    /// Ignored on write: rows are recreated on every update.
    #[serde(default)]
    pub id: Option<i32>,
    /// Id of a cached workshop; when set, name and dates are taken from the cache.
    #[serde(default, rename = "workshopId")]
    pub workshop_cache_id: Option<i32>,
    #[serde(default)]
    pub workshop_name: Option<String>,
    #[serde(default)]
    pub workshop_date_start: Option<NaiveDate>,
    #[serde(default)]
    pub workshop_date_end: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "imageUrl")]
    pub image_urls: Vec<String>,
}

impl WorkshopInput {
    /// Build the row to insert for `report_id`.
    pub fn into_new(self, report_id: i32) -> NewWorkshopExtension {
        NewWorkshopExtension {
            report_id,
            workshop_cache_id: self.workshop_cache_id,
            workshop_name: self.workshop_name,
            date_start: self.workshop_date_start,
            date_end: self.workshop_date_end,
            description: self.description,
            image_urls: self.image_urls,
        }
    }
}

/// Create/update payload: the report plus its full workshop set.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportWithWorkshopsRequest {
    pub report: Report,
    #[serde(default)]
    pub workshops: Vec<WorkshopInput>,
}

impl ReportWithWorkshopsRequest {
    /// Reject workshop entries that can't stand on their own.
    ///
    /// Unlinked entries must carry a name; linked ones get it from the cache.
    pub fn validate(&self) -> AppResult<()> {
        for (index, workshop) in self.workshops.iter().enumerate() {
            let has_name = workshop
                .workshop_name
                .as_deref()
                .is_some_and(|n| !n.trim().is_empty());
            if workshop.workshop_cache_id.is_none() && !has_name {
                return Err(AppError::InvalidInput(format!(
                    "workshops[{}]: workshopName is required for workshops not linked to the cache",
                    index
                )));
            }
        }
        Ok(())
    }
}

/// A workshop as displayed to clients, resolved against the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopView {
    pub id: i32,
    pub report_id: i32,
    #[serde(rename = "workshopId")]
    pub workshop_cache_id: Option<i32>,
    pub workshop_name: Option<String>,
    pub workshop_date_start: Option<NaiveDate>,
    pub workshop_date_end: Option<NaiveDate>,
    pub description: Option<String>,
    #[serde(rename = "imageUrl")]
    pub image_urls: Vec<String>,
    /// Cache status; only present for cache-linked workshops.
    pub workshop_status: Option<String>,
}

impl WorkshopView {
    /// View of a row using its own stored fields.
    pub fn stored(row: WorkshopExtension) -> Self {
        Self {
            id: row.id,
            report_id: row.report_id,
            workshop_cache_id: row.workshop_cache_id,
            workshop_name: row.workshop_name,
            workshop_date_start: row.date_start,
            workshop_date_end: row.date_end,
            description: row.description,
            image_urls: row.image_urls,
            workshop_status: None,
        }
    }

    /// View of a linked row; the current snapshot supersedes the stored copies.
    pub fn from_snapshot(row: WorkshopExtension, snapshot: &WorkshopCacheSnapshot) -> Self {
        Self {
            workshop_name: Some(snapshot.name.clone()),
            workshop_date_start: snapshot.date_start,
            workshop_date_end: snapshot.date_end,
            workshop_status: snapshot.status.clone(),
            ..Self::stored(row)
        }
    }
}

/// A report with its resolved, filtered and ordered workshops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CompositeReportView {
    pub report: Report,
    pub workshops: Vec<WorkshopView>,
}

/// Workshop date window query parameters.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DateFilterQuery {
    /// Only workshops starting on or after this date (YYYY-MM-DD).
    pub workshop_date_start: Option<NaiveDate>,
    /// Only workshops ending on or before this date (YYYY-MM-DD).
    pub workshop_date_end: Option<NaiveDate>,
}

impl DateFilterQuery {
    pub fn range(&self) -> DateRange {
        DateRange::new(self.workshop_date_start, self.workshop_date_end)
    }
}

/// Listing filters.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReportFilter {
    /// Report status, case-insensitive ("A"/"I").
    pub status: Option<String>,
    /// Trimester label, case-insensitive (e.g. "abril-junio").
    pub trimester: Option<String>,
    pub year: Option<i32>,
    pub workshop_date_start: Option<NaiveDate>,
    pub workshop_date_end: Option<NaiveDate>,
}

impl ReportFilter {
    pub fn range(&self) -> DateRange {
        DateRange::new(self.workshop_date_start, self.workshop_date_end)
    }

    /// Report-level part of the filter.
    pub fn matches(&self, report: &Report) -> bool {
        report.matches_status(self.status.as_deref())
            && report.matches_trimester(self.trimester.as_deref())
            && report.matches_year(self.year)
    }
}

/// Existence check query parameters.
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ExistsQuery {
    pub year: i32,
    pub trimester: String,
}

/// Existence check response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExistsResponse {
    pub exists: bool,
}

/// Workshop cache listing query parameters.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct CacheListQuery {
    /// Cache status, case-insensitive ("A"/"I").
    pub status: Option<String>,
}
