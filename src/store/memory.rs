//! In-memory store implementations.
//!
//! Used by the test suites and handy for running the service without
//! PostgreSQL, S3 or the remote report service. State is lost when the
//! process exits. Each store can be told to fail, to exercise the error paths
//! of its callers.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use super::{ArtifactStore, ExtensionStore, WorkshopCacheReader, WorkshopCacheWriter};
use crate::error::{AppError, AppResult};
use crate::models::{NewWorkshopExtension, Report, WorkshopCacheSnapshot, WorkshopExtension};
use crate::services::ReportGateway;

fn poison_err<T>(_: PoisonError<T>) -> AppError {
    AppError::Database("lock poisoned".to_string())
}

/// Workshop rows kept in a map keyed by id.
#[derive(Debug, Default)]
pub struct InMemoryExtensionStore {
    rows: RwLock<BTreeMap<i32, WorkshopExtension>>,
    next_id: AtomicUsize,
    fail_inserts: AtomicBool,
    failing_reports: RwLock<HashSet<i32>>,
}

impl InMemoryExtensionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `insert_many` fail, as a broken database would.
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Make every following `find_by_report_id` for `report_id` fail.
    pub fn fail_reads_for(&self, report_id: i32) -> AppResult<()> {
        self.failing_reports
            .write()
            .map_err(poison_err)?
            .insert(report_id);
        Ok(())
    }

    pub fn len(&self) -> AppResult<usize> {
        Ok(self.rows.read().map_err(poison_err)?.len())
    }

    pub fn is_empty(&self) -> AppResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl ExtensionStore for InMemoryExtensionStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<WorkshopExtension>> {
        Ok(self.rows.read().map_err(poison_err)?.get(&id).cloned())
    }

    async fn find_by_report_id(&self, report_id: i32) -> AppResult<Vec<WorkshopExtension>> {
        if self.failing_reports.read().map_err(poison_err)?.contains(&report_id) {
            return Err(AppError::Database(format!(
                "Failed to load workshops of report {}: injected failure",
                report_id
            )));
        }
        let rows = self.rows.read().map_err(poison_err)?;
        Ok(rows
            .values()
            .filter(|row| row.report_id == report_id)
            .cloned()
            .collect())
    }

    async fn insert_many(
        &self,
        rows: Vec<NewWorkshopExtension>,
    ) -> AppResult<Vec<WorkshopExtension>> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Database(
                "Failed to insert workshops: injected failure".to_string(),
            ));
        }

        let mut stored = self.rows.write().map_err(poison_err)?;
        let inserted: Vec<WorkshopExtension> = rows
            .into_iter()
            .map(|row| {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i32 + 1;
                WorkshopExtension {
                    id,
                    report_id: row.report_id,
                    workshop_cache_id: row.workshop_cache_id,
                    workshop_name: row.workshop_name,
                    date_start: row.date_start,
                    date_end: row.date_end,
                    description: row.description,
                    image_urls: row.image_urls,
                }
            })
            .collect();
        for row in &inserted {
            stored.insert(row.id, row.clone());
        }
        Ok(inserted)
    }

    async fn delete_by_id(&self, id: i32) -> AppResult<bool> {
        Ok(self.rows.write().map_err(poison_err)?.remove(&id).is_some())
    }

    async fn delete_by_report_id(&self, report_id: i32) -> AppResult<u64> {
        let mut rows = self.rows.write().map_err(poison_err)?;
        let before = rows.len();
        rows.retain(|_, row| row.report_id != report_id);
        Ok((before - rows.len()) as u64)
    }
}

/// Workshop cache snapshots keyed by workshop id.
#[derive(Debug, Default)]
pub struct InMemoryWorkshopCache {
    snapshots: RwLock<BTreeMap<i32, WorkshopCacheSnapshot>>,
    failing_ids: RwLock<HashSet<i32>>,
}

impl InMemoryWorkshopCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following read or write of snapshot `id` fail.
    pub fn fail_for(&self, id: i32) -> AppResult<()> {
        self.failing_ids.write().map_err(poison_err)?.insert(id);
        Ok(())
    }

    fn check(&self, id: i32) -> AppResult<()> {
        if self.failing_ids.read().map_err(poison_err)?.contains(&id) {
            return Err(AppError::Database(format!(
                "Workshop cache {} unavailable: injected failure",
                id
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> AppResult<usize> {
        Ok(self.snapshots.read().map_err(poison_err)?.len())
    }

    pub fn is_empty(&self) -> AppResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl WorkshopCacheReader for InMemoryWorkshopCache {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<WorkshopCacheSnapshot>> {
        self.check(id)?;
        Ok(self.snapshots.read().map_err(poison_err)?.get(&id).cloned())
    }

    async fn find_all(&self, status: Option<&str>) -> AppResult<Vec<WorkshopCacheSnapshot>> {
        let snapshots = self.snapshots.read().map_err(poison_err)?;
        Ok(snapshots
            .values()
            .filter(|s| s.matches_status(status))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl WorkshopCacheWriter for InMemoryWorkshopCache {
    async fn insert(&self, snapshot: WorkshopCacheSnapshot) -> AppResult<WorkshopCacheSnapshot> {
        self.check(snapshot.id)?;
        self.snapshots
            .write()
            .map_err(poison_err)?
            .insert(snapshot.id, snapshot.clone());
        Ok(snapshot)
    }

    async fn update(&self, snapshot: WorkshopCacheSnapshot) -> AppResult<WorkshopCacheSnapshot> {
        self.check(snapshot.id)?;
        let mut snapshots = self.snapshots.write().map_err(poison_err)?;
        match snapshots.get_mut(&snapshot.id) {
            Some(existing) => {
                *existing = snapshot.clone();
                Ok(snapshot)
            }
            None => Err(AppError::NotFound(format!("Workshop cache {}", snapshot.id))),
        }
    }
}

/// Artifact bytes keyed by object path.
#[derive(Debug)]
pub struct InMemoryArtifactStore {
    base_url: String,
    objects: RwLock<HashMap<String, Vec<u8>>>,
    puts: AtomicUsize,
    fail_probes: AtomicBool,
}

impl InMemoryArtifactStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: RwLock::new(HashMap::new()),
            puts: AtomicUsize::new(0),
            fail_probes: AtomicBool::new(false),
        }
    }

    /// Make every following `probe` fail, as an unreachable bucket would.
    pub fn fail_probes(&self, fail: bool) {
        self.fail_probes.store(fail, Ordering::SeqCst);
    }

    /// Number of `put` calls seen so far.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn get(&self, path: &str) -> AppResult<Option<Vec<u8>>> {
        Ok(self.objects.read().map_err(poison_err)?.get(path).cloned())
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn put(&self, path: &str, data: Vec<u8>, _content_type: &str) -> AppResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.objects
            .write()
            .map_err(poison_err)?
            .insert(path.to_string(), data);
        Ok(())
    }

    async fn probe(&self, path: &str) -> AppResult<bool> {
        if self.fail_probes.load(Ordering::SeqCst) {
            return Err(AppError::Storage("probe failed: injected failure".to_string()));
        }
        Ok(self.objects.read().map_err(poison_err)?.contains_key(path))
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Report records held in memory, standing in for the remote report service.
#[derive(Debug, Default)]
pub struct InMemoryReportGateway {
    reports: RwLock<Vec<Report>>,
    failure: RwLock<Option<u16>>,
}

impl InMemoryReportGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reports(reports: Vec<Report>) -> Self {
        Self {
            reports: RwLock::new(reports),
            failure: RwLock::new(None),
        }
    }

    /// Make every following call fail with upstream `status`.
    pub fn fail_with(&self, status: u16) -> AppResult<()> {
        *self.failure.write().map_err(poison_err)? = Some(status);
        Ok(())
    }

    pub fn clear_failure(&self) -> AppResult<()> {
        *self.failure.write().map_err(poison_err)? = None;
        Ok(())
    }

    pub fn get(&self, id: i32) -> AppResult<Option<Report>> {
        Ok(self
            .reports
            .read()
            .map_err(poison_err)?
            .iter()
            .find(|r| r.id == Some(id))
            .cloned())
    }

    pub fn report_count(&self) -> AppResult<usize> {
        Ok(self.reports.read().map_err(poison_err)?.len())
    }

    fn check(&self) -> AppResult<()> {
        match *self.failure.read().map_err(poison_err)? {
            Some(status) => Err(AppError::upstream(status, "injected failure")),
            None => Ok(()),
        }
    }

    fn set_status(&self, id: i32, status: &str) -> AppResult<()> {
        self.check()?;
        let mut reports = self.reports.write().map_err(poison_err)?;
        let report = reports
            .iter_mut()
            .find(|r| r.id == Some(id))
            .ok_or_else(|| AppError::upstream(404, "no such report"))?;
        report.status = Some(status.to_string());
        Ok(())
    }
}

#[async_trait]
impl ReportGateway for InMemoryReportGateway {
    async fn find_all(&self) -> AppResult<Vec<Report>> {
        self.check()?;
        Ok(self.reports.read().map_err(poison_err)?.clone())
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Report>> {
        self.check()?;
        self.get(id)
    }

    async fn create(&self, report: &Report) -> AppResult<Report> {
        self.check()?;
        let mut reports = self.reports.write().map_err(poison_err)?;
        let id = reports.iter().filter_map(|r| r.id).max().unwrap_or(0) + 1;
        let created = Report {
            id: Some(id),
            ..report.clone()
        };
        reports.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: i32, report: &Report) -> AppResult<Report> {
        self.check()?;
        let mut reports = self.reports.write().map_err(poison_err)?;
        let existing = reports
            .iter_mut()
            .find(|r| r.id == Some(id))
            .ok_or_else(|| AppError::upstream(404, "no such report"))?;
        *existing = Report {
            id: Some(id),
            ..report.clone()
        };
        Ok(existing.clone())
    }

    async fn disable(&self, id: i32) -> AppResult<()> {
        self.set_status(id, "I")
    }

    async fn restore(&self, id: i32) -> AppResult<()> {
        self.set_status(id, "A")
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        self.check()?;
        self.reports
            .write()
            .map_err(poison_err)?
            .retain(|r| r.id != Some(id));
        Ok(())
    }

    async fn exists_by_year_and_trimester(&self, year: i32, trimester: &str) -> AppResult<bool> {
        self.check()?;
        Ok(self
            .reports
            .read()
            .map_err(poison_err)?
            .iter()
            .any(|r| r.year == year && r.trimester.eq_ignore_ascii_case(trimester)))
    }
}
