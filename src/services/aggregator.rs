//! Report aggregation.
//!
//! Combines remote reports with the local workshop rows and the workshop
//! cache into [`CompositeReportView`]s, and orchestrates writes that span the
//! remote service and the local store.
//!
//! Resolution rules:
//! - a cache-linked row shows the current snapshot's name, dates and status;
//!   if the snapshot has not arrived yet the row is left out of views
//! - an unlinked row shows its own stored fields
//! - the date window is applied to the resolved dates
//!
//! Writes go remote first. Local rows are only touched once the remote call
//! succeeds, and a local failure after that is not compensated: the remote
//! report stays, without workshops.

use std::cmp::Reverse;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{
    CompositeReportView, DateRange, NewWorkshopExtension, Report, ReportFilter,
    ReportWithWorkshopsRequest, WorkshopExtension, WorkshopInput, WorkshopView, trimester_rank,
};
use crate::services::report_gateway::ReportGateway;
use crate::store::{ExtensionStore, WorkshopCacheReader};

/// Orchestrates the gateway, the extension store and the workshop cache.
pub struct ReportAggregator {
    gateway: Arc<dyn ReportGateway>,
    extensions: Arc<dyn ExtensionStore>,
    cache: Arc<dyn WorkshopCacheReader>,
    fan_out: usize,
}

impl ReportAggregator {
    pub fn new(
        gateway: Arc<dyn ReportGateway>,
        extensions: Arc<dyn ExtensionStore>,
        cache: Arc<dyn WorkshopCacheReader>,
        fan_out: usize,
    ) -> Self {
        Self {
            gateway,
            extensions,
            cache,
            fan_out: fan_out.max(1),
        }
    }

    pub fn gateway(&self) -> &Arc<dyn ReportGateway> {
        &self.gateway
    }

    /// List reports matching `filter`, each with its resolved and
    /// date-filtered workshops.
    ///
    /// Reports left without workshops are dropped. A report whose workshops
    /// can't be loaded is skipped with a warning instead of failing the list.
    /// Sorted by year descending, then trimester order; stable on ties.
    pub async fn find_filtered(&self, filter: &ReportFilter) -> AppResult<Vec<CompositeReportView>> {
        let range = filter.range();
        let reports: Vec<Report> = self
            .gateway
            .find_all()
            .await?
            .into_iter()
            .filter(|report| filter.matches(report))
            .collect();

        let loaded: Vec<(Report, AppResult<Vec<WorkshopExtension>>)> = stream::iter(reports)
            .map(|report| async move {
                let rows = match report.id {
                    Some(id) => self.extensions.find_by_report_id(id).await,
                    None => Ok(Vec::new()),
                };
                (report, rows)
            })
            .buffered(self.fan_out)
            .collect()
            .await;

        // All rows of all reports go through one stream, so at most `fan_out`
        // cache lookups are in flight for the whole listing.
        let mut reports = Vec::with_capacity(loaded.len());
        let mut failures: Vec<Option<AppError>> = Vec::with_capacity(loaded.len());
        let mut pending = Vec::new();
        for (index, (report, rows)) in loaded.into_iter().enumerate() {
            match rows {
                Ok(rows) => {
                    pending.extend(rows.into_iter().map(|row| (index, row)));
                    failures.push(None);
                }
                Err(e) => failures.push(Some(e)),
            }
            reports.push(report);
        }

        let resolved: Vec<(usize, AppResult<Option<WorkshopView>>)> = stream::iter(pending)
            .map(|(index, row)| async move { (index, self.resolve_row(row).await) })
            .buffered(self.fan_out)
            .collect()
            .await;

        let mut workshops: Vec<Vec<WorkshopView>> = reports.iter().map(|_| Vec::new()).collect();
        for (index, view) in resolved {
            match view {
                Ok(Some(view)) => {
                    if range.admits(view.workshop_date_start, view.workshop_date_end) {
                        workshops[index].push(view);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    failures[index].get_or_insert(e);
                }
            }
        }

        let mut views: Vec<CompositeReportView> = reports
            .into_iter()
            .zip(workshops)
            .zip(failures)
            .filter_map(|((report, workshops), failure)| {
                if let Some(e) = failure {
                    warn!("Skipping report {:?} in listing: {}", report.id, e);
                    return None;
                }
                (!workshops.is_empty()).then_some(CompositeReportView { report, workshops })
            })
            .collect();

        sort_views(&mut views);
        Ok(views)
    }

    /// One report with its resolved workshops in `range`.
    ///
    /// Unlike listings, the report is returned even when no workshop passes
    /// the window. `None` when the remote service doesn't know the id.
    pub async fn find_by_id_with_date_filter(
        &self,
        id: i32,
        range: &DateRange,
    ) -> AppResult<Option<CompositeReportView>> {
        let Some(report) = self.gateway.find_by_id(id).await? else {
            return Ok(None);
        };
        let workshops = self.workshops_for_report(id, range).await?;
        Ok(Some(CompositeReportView { report, workshops }))
    }

    /// Resolved workshops of a report that fall in `range`, ordered by row id.
    pub async fn workshops_for_report(
        &self,
        report_id: i32,
        range: &DateRange,
    ) -> AppResult<Vec<WorkshopView>> {
        let rows = self.extensions.find_by_report_id(report_id).await?;
        let views = self.resolve_workshops(rows).await?;
        Ok(views
            .into_iter()
            .filter(|view| range.admits(view.workshop_date_start, view.workshop_date_end))
            .collect())
    }

    /// Resolve rows against the cache, keeping their order.
    pub async fn resolve_workshops(
        &self,
        rows: Vec<WorkshopExtension>,
    ) -> AppResult<Vec<WorkshopView>> {
        let resolved: Vec<AppResult<Option<WorkshopView>>> = stream::iter(rows)
            .map(|row| self.resolve_row(row))
            .buffered(self.fan_out)
            .collect()
            .await;

        let mut views = Vec::with_capacity(resolved.len());
        for view in resolved {
            if let Some(view) = view? {
                views.push(view);
            }
        }
        Ok(views)
    }

    async fn resolve_row(&self, row: WorkshopExtension) -> AppResult<Option<WorkshopView>> {
        let Some(cache_id) = row.workshop_cache_id else {
            return Ok(Some(WorkshopView::stored(row)));
        };
        match self.cache.find_by_id(cache_id).await? {
            Some(snapshot) => Ok(Some(WorkshopView::from_snapshot(row, &snapshot))),
            None => {
                warn!(
                    workshop_id = row.id,
                    cache_id, "Workshop snapshot not cached yet, omitting from view"
                );
                Ok(None)
            }
        }
    }

    /// Create the report remotely, then store its workshops.
    pub async fn create(&self, request: ReportWithWorkshopsRequest) -> AppResult<CompositeReportView> {
        request.validate()?;

        let report = self.gateway.create(&request.report).await?;
        let report_id = report.id.ok_or_else(|| AppError::Upstream {
            status: None,
            message: "remote report service returned a report without id".to_string(),
        })?;

        let workshops = self.store_workshops(report_id, request.workshops).await?;
        info!("Created report {} with {} workshops", report_id, workshops.len());
        Ok(CompositeReportView { report, workshops })
    }

    /// Update the report remotely, then replace its workshops wholesale.
    ///
    /// Rows not present in `request` are gone afterwards; rows that are
    /// present get new ids.
    pub async fn update(
        &self,
        id: i32,
        request: ReportWithWorkshopsRequest,
    ) -> AppResult<CompositeReportView> {
        request.validate()?;

        let report = self.gateway.update(id, &request.report).await?;
        let removed = self.extensions.delete_by_report_id(id).await?;
        let workshops = self.store_workshops(id, request.workshops).await?;
        info!(
            "Updated report {}: replaced {} workshops with {}",
            id,
            removed,
            workshops.len()
        );
        Ok(CompositeReportView { report, workshops })
    }

    async fn store_workshops(
        &self,
        report_id: i32,
        inputs: Vec<WorkshopInput>,
    ) -> AppResult<Vec<WorkshopView>> {
        let rows: Vec<AppResult<NewWorkshopExtension>> = stream::iter(inputs)
            .map(|input| self.prepare_row(report_id, input))
            .buffered(self.fan_out)
            .collect()
            .await;
        let rows = rows.into_iter().collect::<AppResult<Vec<_>>>()?;

        let inserted = self.extensions.insert_many(rows).await?;
        Ok(inserted.into_iter().map(WorkshopView::stored).collect())
    }

    /// Copy the linked snapshot's name and dates onto the row, if cached.
    async fn prepare_row(&self, report_id: i32, input: WorkshopInput) -> AppResult<NewWorkshopExtension> {
        let mut row = input.into_new(report_id);
        if let Some(cache_id) = row.workshop_cache_id {
            match self.cache.find_by_id(cache_id).await? {
                Some(snapshot) => row.copy_snapshot(&snapshot),
                None => warn!(
                    report_id,
                    cache_id, "Linked workshop not cached yet, storing caller fields"
                ),
            }
        }
        Ok(row)
    }

    pub async fn disable(&self, id: i32) -> AppResult<()> {
        self.gateway.disable(id).await
    }

    pub async fn restore(&self, id: i32) -> AppResult<()> {
        self.gateway.restore(id).await
    }

    /// Delete the report remotely, then its local workshops.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.gateway.delete(id).await?;
        let removed = self.extensions.delete_by_report_id(id).await?;
        info!("Deleted report {} and {} workshops", id, removed);
        Ok(())
    }

    pub async fn exists(&self, year: i32, trimester: &str) -> AppResult<bool> {
        self.gateway
            .exists_by_year_and_trimester(year, trimester)
            .await
    }

    /// One workshop row, resolved against the cache.
    ///
    /// Falls back to the stored copies when a linked snapshot is missing, so
    /// an addressed row is never hidden.
    pub async fn find_workshop(&self, id: i32) -> AppResult<Option<WorkshopView>> {
        let Some(row) = self.extensions.find_by_id(id).await? else {
            return Ok(None);
        };
        let snapshot = match row.workshop_cache_id {
            Some(cache_id) => self.cache.find_by_id(cache_id).await?,
            None => None,
        };
        Ok(Some(match snapshot {
            Some(snapshot) => WorkshopView::from_snapshot(row, &snapshot),
            None => WorkshopView::stored(row),
        }))
    }

    pub async fn delete_workshop(&self, id: i32) -> AppResult<bool> {
        self.extensions.delete_by_id(id).await
    }
}

/// Year descending, then trimester order; `sort_by_key` is stable.
fn sort_views(views: &mut [CompositeReportView]) {
    views.sort_by_key(|view| {
        (
            Reverse(view.report.year),
            trimester_rank(&view.report.trimester),
        )
    });
}
