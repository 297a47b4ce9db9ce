//! Workshop models: locally owned extension rows, cache snapshots and lifecycle events.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A stored workshop row attached to a report.
///
/// When `workshop_cache_id` is set, name and dates are copies taken at write
/// time; the cache snapshot is authoritative when reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkshopExtension {
    pub id: i32,
    pub report_id: i32,
    pub workshop_cache_id: Option<i32>,
    pub workshop_name: Option<String>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub description: Option<String>,
    pub image_urls: Vec<String>,
}

/// A workshop row about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkshopExtension {
    pub report_id: i32,
    pub workshop_cache_id: Option<i32>,
    pub workshop_name: Option<String>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub description: Option<String>,
    pub image_urls: Vec<String>,
}

impl NewWorkshopExtension {
    /// Overwrite name and dates with a point-in-time copy of a cache snapshot.
    pub fn copy_snapshot(&mut self, snapshot: &WorkshopCacheSnapshot) {
        self.workshop_name = Some(snapshot.name.clone());
        self.date_start = snapshot.date_start;
        self.date_end = snapshot.date_end;
    }
}

/// Local mirror of an externally owned workshop.
///
/// Only `id` and `name` are guaranteed; the rest is whatever the last event carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopCacheSnapshot {
    pub id: i32,
    pub name: String,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub status: Option<String>,
}

impl WorkshopCacheSnapshot {
    /// Case-insensitive status match; a snapshot without status only passes an absent filter.
    pub fn matches_status(&self, filter: Option<&str>) -> bool {
        filter.is_none_or(|wanted| {
            self.status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(wanted))
        })
    }
}

/// Workshop lifecycle event as published by the workshop service.
///
/// Every field is optional on the wire; [`WorkshopEvent::into_snapshot`]
/// decides whether the event is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WorkshopEvent {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "startDate", default)]
    pub date_start: Option<NaiveDate>,
    #[serde(rename = "endDate", default)]
    pub date_end: Option<NaiveDate>,
    #[serde(rename = "state", default)]
    pub status: Option<String>,
}

/// Why an event could not be applied to the cache.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventRejection {
    #[error("event payload is not valid JSON: {0}")]
    Malformed(String),
    #[error("event is missing required field '{0}'")]
    MissingField(&'static str),
}

impl WorkshopEvent {
    /// Validate the event and turn it into a cache snapshot.
    ///
    /// Only `id` and `name` are required. Missing dates or state are stored
    /// as absent, replacing whatever an earlier event carried.
    pub fn into_snapshot(self) -> Result<WorkshopCacheSnapshot, EventRejection> {
        let id = self.id.ok_or(EventRejection::MissingField("id"))?;
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or(EventRejection::MissingField("name"))?;

        Ok(WorkshopCacheSnapshot {
            id,
            name,
            date_start: self.date_start,
            date_end: self.date_end,
            status: self.status,
        })
    }
}

/// Inclusive workshop date window used by listings and PDF generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// A workshop passes when it starts on/after `start` and ends on/before `end`.
    ///
    /// A bound that is set can't be satisfied by an unknown date.
    pub fn admits(&self, date_start: Option<NaiveDate>, date_end: Option<NaiveDate>) -> bool {
        let start_ok = match self.start {
            None => true,
            Some(bound) => date_start.is_some_and(|d| d >= bound),
        };
        let end_ok = match self.end {
            None => true,
            Some(bound) => date_end.is_some_and(|d| d <= bound),
        };
        start_ok && end_ok
    }
}
