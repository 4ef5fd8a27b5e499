//! Report repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use crate::error::{Error, Result};
use crate::models::{Report, ReportId, ReportImage, ReportStatus, StatusChange};
use rusqlite::{params, Connection, OptionalExtension};

/// Trait for report storage operations
///
/// The core depends only on this contract, not on the storage engine.
/// `upsert` persists the full report including history and images, so the
/// sync engine's pull step can overwrite a row with the remote copy.
pub trait ReportRepository {
    /// Get a report by ID, history and images included
    fn get(&self, id: &ReportId) -> Result<Option<Report>>;

    /// List reports, most recently updated first
    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Report>>;

    /// List reports in a given status, most recently updated first
    fn list_by_status(
        &self,
        status: ReportStatus,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Report>>;

    /// Insert or fully overwrite a report keyed by its ID
    fn upsert(&self, report: &Report) -> Result<()>;

    /// Remove a report and its history/images
    fn delete(&self, id: &ReportId) -> Result<()>;

    /// Resolve report IDs by string prefix (CLI convenience)
    fn ids_with_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<ReportId>>;
}

/// `SQLite` implementation of `ReportRepository`
pub struct SqliteReportRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteReportRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a report row; history and images are loaded separately
    fn parse_report(row: &rusqlite::Row<'_>) -> rusqlite::Result<Report> {
        let id: String = row.get(0)?;
        // A corrupt id must not be replaced with a fresh one; that would
        // silently detach the row from its history and images
        let id: ReportId = id.parse().map_err(|error: uuid::Error| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(error),
            )
        })?;
        let status: String = row.get(1)?;
        Ok(Report {
            id,
            status: status.parse().unwrap_or_default(),
            location: crate::models::Location {
                latitude: row.get(2)?,
                longitude: row.get(3)?,
                locality: row.get(4)?,
                district: row.get(5)?,
            },
            kind: row.get(6)?,
            description: row.get(7)?,
            surface_m2: row.get(8)?,
            level: row.get(9)?,
            price_per_m2: row.get(10)?,
            budget: row.get(11)?,
            assigned_contractor: row.get(12)?,
            reported_by: row.get(13)?,
            created_at: row.get(14)?,
            started_at: row.get(15)?,
            completed_at: row.get(16)?,
            updated_at: row.get(17)?,
            status_history: Vec::new(),
            images: Vec::new(),
        })
    }

    const SELECT_COLUMNS: &'static str = "id, status, latitude, longitude, locality, district, \
         kind, description, surface_m2, level, price_per_m2, budget, assigned_contractor, \
         reported_by, created_at, started_at, completed_at, updated_at";

    fn load_history(&self, id: &ReportId) -> Result<Vec<StatusChange>> {
        let mut stmt = self.conn.prepare(
            "SELECT previous_status, new_status, changed_by, changed_at
             FROM status_history
             WHERE report_id = ?
             ORDER BY id ASC",
        )?;

        let history = stmt
            .query_map(params![id.to_string()], |row| {
                let previous: String = row.get(0)?;
                let new: String = row.get(1)?;
                Ok(StatusChange {
                    previous_status: previous.parse().unwrap_or_default(),
                    new_status: new.parse().unwrap_or_default(),
                    changed_by: row.get(2)?,
                    changed_at: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(history)
    }

    fn load_images(&self, id: &ReportId) -> Result<Vec<ReportImage>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, path FROM report_images WHERE report_id = ? ORDER BY id ASC",
        )?;

        let images = stmt
            .query_map(params![id.to_string()], |row| {
                Ok(ReportImage {
                    url: row.get(0)?,
                    path: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(images)
    }

    fn attach_children(&self, mut report: Report) -> Result<Report> {
        report.status_history = self.load_history(&report.id)?;
        report.images = self.load_images(&report.id)?;
        Ok(report)
    }

    /// Replace the child rows with the report's current sequences
    ///
    /// Append-only ordering is preserved because the in-memory sequences
    /// are themselves append-only and written back in order.
    fn write_children(&self, report: &Report) -> Result<()> {
        self.conn.execute(
            "DELETE FROM status_history WHERE report_id = ?",
            params![report.id.to_string()],
        )?;
        for change in &report.status_history {
            self.conn.execute(
                "INSERT INTO status_history
                 (report_id, previous_status, new_status, changed_by, changed_at)
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    report.id.to_string(),
                    change.previous_status.as_str(),
                    change.new_status.as_str(),
                    change.changed_by,
                    change.changed_at
                ],
            )?;
        }

        self.conn.execute(
            "DELETE FROM report_images WHERE report_id = ?",
            params![report.id.to_string()],
        )?;
        for image in &report.images {
            self.conn.execute(
                "INSERT INTO report_images (report_id, url, path) VALUES (?, ?, ?)",
                params![report.id.to_string(), image.url, image.path],
            )?;
        }

        Ok(())
    }
}

impl ReportRepository for SqliteReportRepository<'_> {
    fn get(&self, id: &ReportId) -> Result<Option<Report>> {
        let sql = format!(
            "SELECT {} FROM reports WHERE id = ?",
            Self::SELECT_COLUMNS
        );
        let report = self
            .conn
            .query_row(&sql, params![id.to_string()], Self::parse_report)
            .optional()?;

        match report {
            Some(report) => Ok(Some(self.attach_children(report)?)),
            None => Ok(None),
        }
    }

    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Report>> {
        let sql = format!(
            "SELECT {} FROM reports ORDER BY updated_at DESC LIMIT ? OFFSET ?",
            Self::SELECT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let reports = stmt
            .query_map(params![limit as i64, offset as i64], Self::parse_report)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        reports
            .into_iter()
            .map(|report| self.attach_children(report))
            .collect()
    }

    fn list_by_status(
        &self,
        status: ReportStatus,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Report>> {
        let sql = format!(
            "SELECT {} FROM reports WHERE status = ? ORDER BY updated_at DESC LIMIT ? OFFSET ?",
            Self::SELECT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let reports = stmt
            .query_map(
                params![status.as_str(), limit as i64, offset as i64],
                Self::parse_report,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        reports
            .into_iter()
            .map(|report| self.attach_children(report))
            .collect()
    }

    fn upsert(&self, report: &Report) -> Result<()> {
        self.conn.execute(
            "INSERT INTO reports (
                 id, status, latitude, longitude, locality, district,
                 kind, description, surface_m2, level, price_per_m2, budget,
                 assigned_contractor, reported_by, created_at, started_at,
                 completed_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 status = excluded.status,
                 latitude = excluded.latitude,
                 longitude = excluded.longitude,
                 locality = excluded.locality,
                 district = excluded.district,
                 kind = excluded.kind,
                 description = excluded.description,
                 surface_m2 = excluded.surface_m2,
                 level = excluded.level,
                 price_per_m2 = excluded.price_per_m2,
                 budget = excluded.budget,
                 assigned_contractor = excluded.assigned_contractor,
                 reported_by = excluded.reported_by,
                 created_at = excluded.created_at,
                 started_at = excluded.started_at,
                 completed_at = excluded.completed_at,
                 updated_at = excluded.updated_at",
            params![
                report.id.to_string(),
                report.status.as_str(),
                report.location.latitude,
                report.location.longitude,
                report.location.locality,
                report.location.district,
                report.kind,
                report.description,
                report.surface_m2,
                report.level,
                report.price_per_m2,
                report.budget,
                report.assigned_contractor,
                report.reported_by,
                report.created_at,
                report.started_at,
                report.completed_at,
                report.updated_at
            ],
        )?;

        self.write_children(report)
    }

    fn delete(&self, id: &ReportId) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM reports WHERE id = ?", params![id.to_string()])?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        Ok(())
    }

    fn ids_with_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<ReportId>> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM reports WHERE id LIKE ? ORDER BY updated_at DESC LIMIT ?",
        )?;

        let ids = stmt
            .query_map(params![format!("{prefix}%"), limit as i64], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(ids
            .into_iter()
            .filter_map(|id| id.parse::<ReportId>().ok())
            .collect())
    }
}
