//! Shared report service used by all front-ends
//!
//! Every local mutation goes through this facade, which is what guarantees
//! the two data rules the UI must never bypass: each mutation marks the
//! report pending for sync, and the editing/transition permissions are
//! checked at the point of mutation.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::db::{
    self, Database, PendingTracker, ReportRepository, SettingsRepository, SqlitePendingTracker,
    SqliteReportRepository, SqliteSettingsRepository,
};
use crate::error::{Error, Result};
use crate::lifecycle::{self, TransitionOutcome};
use crate::models::{Actor, Location, Report, ReportId, ReportImage, ReportStatus};
use crate::util::now_ms;
use crate::{geo, util};

/// Fields required to create a report
///
/// Images are deliberately absent: they are attached after the report
/// exists and are never required for creation to succeed.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub kind: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub surface_m2: Option<f64>,
    pub level: Option<u8>,
}

/// Optional field edits applied in one mutation
#[derive(Debug, Clone, Default)]
pub struct ReportEdits {
    pub kind: Option<String>,
    pub description: Option<String>,
    pub surface_m2: Option<f64>,
    pub level: Option<u8>,
}

impl ReportEdits {
    fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.description.is_none()
            && self.surface_m2.is_none()
            && self.level.is_none()
    }
}

/// Thread-safe service over the local store
#[derive(Clone)]
pub struct ReportService {
    db: Arc<Mutex<Database>>,
}

impl ReportService {
    /// Open a service backed by a database file, creating parent dirs
    pub fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let database = Database::open(&db_path)?;
        Ok(Self {
            db: Arc::new(Mutex::new(database)),
        })
    }

    /// Open an in-memory service (primarily for tests)
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            db: Arc::new(Mutex::new(Database::open_in_memory()?)),
        })
    }

    /// Shared handle for the sync engine
    #[must_use]
    pub fn database(&self) -> Arc<Mutex<Database>> {
        Arc::clone(&self.db)
    }

    /// Create a report, resolving its locality once from the coordinates
    pub fn create_report(&self, new: NewReport, actor: &Actor) -> Result<Report> {
        let kind = util::normalize_text_option(Some(new.kind))
            .ok_or_else(|| Error::InvalidInput("report kind must not be empty".to_string()))?;
        let description = util::normalize_text_option(Some(new.description)).ok_or_else(|| {
            Error::InvalidInput("report description must not be empty".to_string())
        })?;
        validate_level(new.level)?;

        let mut location = Location::new(new.latitude, new.longitude);
        geo::resolve(&mut location);

        let mut report = Report::new(kind, description, location, actor.name.clone());
        report.surface_m2 = new.surface_m2;
        report.level = new.level;

        let db = db::lock(&self.db)?;
        let price = SqliteSettingsRepository::new(db.connection()).price_per_m2()?;
        lifecycle::apply_budget(&mut report, price);

        SqliteReportRepository::new(db.connection()).upsert(&report)?;
        SqlitePendingTracker::new(db.connection()).mark(&report.id, now_ms())?;
        tracing::debug!("Created report {} in {:?}", report.id, report.location.locality);
        Ok(report)
    }

    /// Fetch a report by ID
    pub fn get_report(&self, id: &ReportId) -> Result<Option<Report>> {
        let db = db::lock(&self.db)?;
        SqliteReportRepository::new(db.connection()).get(id)
    }

    /// List reports, most recently updated first
    pub fn list_reports(&self, limit: usize, offset: usize) -> Result<Vec<Report>> {
        let db = db::lock(&self.db)?;
        SqliteReportRepository::new(db.connection()).list(limit, offset)
    }

    /// List reports in a given status
    pub fn list_reports_by_status(
        &self,
        status: ReportStatus,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Report>> {
        let db = db::lock(&self.db)?;
        SqliteReportRepository::new(db.connection()).list_by_status(status, limit, offset)
    }

    /// Resolve report IDs by string prefix
    pub fn find_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<ReportId>> {
        let db = db::lock(&self.db)?;
        SqliteReportRepository::new(db.connection()).ids_with_prefix(prefix, limit)
    }

    /// Apply a status transition
    ///
    /// A no-op request returns the unchanged report without touching the
    /// pending tracker.
    pub fn change_status(
        &self,
        id: &ReportId,
        new_status: ReportStatus,
        actor: &Actor,
    ) -> Result<Report> {
        let db = db::lock(&self.db)?;
        let repo = SqliteReportRepository::new(db.connection());
        let mut report = repo
            .get(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        match lifecycle::transition(&mut report, new_status, actor, now_ms())? {
            TransitionOutcome::NoOp => Ok(report),
            TransitionOutcome::Applied => {
                repo.upsert(&report)?;
                SqlitePendingTracker::new(db.connection()).mark(id, now_ms())?;
                Ok(report)
            }
        }
    }

    /// Edit report fields, re-deriving the budget
    pub fn update_details(
        &self,
        id: &ReportId,
        edits: ReportEdits,
        actor: &Actor,
    ) -> Result<Report> {
        if edits.is_empty() {
            return Err(Error::InvalidInput("no fields to edit".to_string()));
        }
        validate_level(edits.level)?;

        let db = db::lock(&self.db)?;
        let repo = SqliteReportRepository::new(db.connection());
        let mut report = repo
            .get(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if !lifecycle::can_edit(actor, &report) {
            return Err(Error::PermissionDenied(format!(
                "{} may not edit report {}",
                actor.name, report.id
            )));
        }

        if let Some(kind) = util::normalize_text_option(edits.kind) {
            report.kind = kind;
        }
        if let Some(description) = util::normalize_text_option(edits.description) {
            report.description = description;
        }
        if let Some(surface) = edits.surface_m2 {
            report.surface_m2 = Some(surface);
        }
        if let Some(level) = edits.level {
            report.level = Some(level);
        }

        let price = SqliteSettingsRepository::new(db.connection()).price_per_m2()?;
        lifecycle::apply_budget(&mut report, price);
        report.touch(now_ms());

        repo.upsert(&report)?;
        SqlitePendingTracker::new(db.connection()).mark(id, now_ms())?;
        Ok(report)
    }

    /// Assign or unassign a contractor (manager only)
    pub fn assign_contractor(
        &self,
        id: &ReportId,
        contractor: Option<String>,
        actor: &Actor,
    ) -> Result<Report> {
        if !actor.is_manager() {
            return Err(Error::PermissionDenied(format!(
                "{} may not assign contractors",
                actor.name
            )));
        }

        let db = db::lock(&self.db)?;
        let repo = SqliteReportRepository::new(db.connection());
        let mut report = repo
            .get(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        report.assigned_contractor = util::normalize_text_option(contractor);
        report.touch(now_ms());

        repo.upsert(&report)?;
        SqlitePendingTracker::new(db.connection()).mark(id, now_ms())?;
        Ok(report)
    }

    /// Attach an image to an existing report
    pub fn add_image(&self, id: &ReportId, image: ReportImage, actor: &Actor) -> Result<Report> {
        let db = db::lock(&self.db)?;
        let repo = SqliteReportRepository::new(db.connection());
        let mut report = repo
            .get(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if !lifecycle::can_edit(actor, &report) {
            return Err(Error::PermissionDenied(format!(
                "{} may not attach images to report {}",
                actor.name, report.id
            )));
        }

        report.images.push(image);
        report.touch(now_ms());

        repo.upsert(&report)?;
        SqlitePendingTracker::new(db.connection()).mark(id, now_ms())?;
        Ok(report)
    }

    /// Current price per m², if configured
    pub fn price_per_m2(&self) -> Result<Option<f64>> {
        let db = db::lock(&self.db)?;
        SqliteSettingsRepository::new(db.connection()).price_per_m2()
    }

    /// Update the global price setting and re-derive affected budgets
    ///
    /// Returns how many reports changed. Re-derived reports are marked
    /// pending so the new budgets reach the remote store.
    pub fn set_price_per_m2(&self, value: f64, actor: &Actor) -> Result<usize> {
        if !actor.is_manager() {
            return Err(Error::PermissionDenied(format!(
                "{} may not change the price setting",
                actor.name
            )));
        }
        if !value.is_finite() || value < 0.0 {
            return Err(Error::InvalidInput(
                "price per m2 must be a non-negative number".to_string(),
            ));
        }

        let db = db::lock(&self.db)?;
        SqliteSettingsRepository::new(db.connection()).set_price_per_m2(value)?;

        const PAGE_SIZE: usize = 200;
        let repo = SqliteReportRepository::new(db.connection());
        let tracker = SqlitePendingTracker::new(db.connection());

        // Collect before mutating: upserts bump updated_at, which would
        // reorder rows under the pagination
        let mut reports = Vec::new();
        let mut offset = 0;
        loop {
            let page = repo.list(PAGE_SIZE, offset)?;
            let page_len = page.len();
            reports.extend(page);
            if page_len < PAGE_SIZE {
                break;
            }
            offset += page_len;
        }

        let mut changed = 0;
        for mut report in reports {
            let previous = report.budget;
            lifecycle::apply_budget(&mut report, Some(value));
            if report.budget != previous {
                report.touch(now_ms());
                repo.upsert(&report)?;
                tracker.mark(&report.id, now_ms())?;
                changed += 1;
            }
        }

        tracing::info!("Price per m2 set to {value}; {changed} budgets re-derived");
        Ok(changed)
    }

    /// Current pending badge count
    pub fn pending_count(&self) -> Result<usize> {
        let db = db::lock(&self.db)?;
        SqlitePendingTracker::new(db.connection()).count()
    }
}

fn validate_level(level: Option<u8>) -> Result<()> {
    match level {
        Some(level) if !(1..=10).contains(&level) => Err(Error::InvalidInput(format!(
            "severity level must be between 1 and 10, got {level}"
        ))),
        _ => Ok(()),
    }
}
