//! Durable pending-sync markers
//!
//! One marker per report with unsynced local changes. Markers are created
//! by every mutating local operation and cleared only after the sync engine
//! confirms the remote store accepted the push — never speculatively.

use crate::error::Result;
use crate::models::ReportId;
use rusqlite::{params, Connection};

/// Trait for the pending tracker
pub trait PendingTracker {
    /// Mark a report as having unsynced local changes (idempotent)
    fn mark(&self, id: &ReportId, now_ms: i64) -> Result<()>;

    /// Clear the marker after a confirmed remote write
    fn clear(&self, id: &ReportId) -> Result<()>;

    /// Whether the report currently has unsynced local changes
    fn is_pending(&self, id: &ReportId) -> Result<bool>;

    /// Number of pending markers; drives the UI badge
    fn count(&self) -> Result<usize>;

    /// Pending report IDs in mark order
    fn list(&self) -> Result<Vec<ReportId>>;
}

/// `SQLite` implementation of `PendingTracker`
pub struct SqlitePendingTracker<'a> {
    conn: &'a Connection,
}

impl<'a> SqlitePendingTracker<'a> {
    /// Create a new tracker with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl PendingTracker for SqlitePendingTracker<'_> {
    fn mark(&self, id: &ReportId, now_ms: i64) -> Result<()> {
        // OR IGNORE keeps the earliest mark time on repeat mutations
        self.conn.execute(
            "INSERT OR IGNORE INTO pending_sync (report_id, marked_at) VALUES (?, ?)",
            params![id.to_string(), now_ms],
        )?;
        Ok(())
    }

    fn clear(&self, id: &ReportId) -> Result<()> {
        self.conn.execute(
            "DELETE FROM pending_sync WHERE report_id = ?",
            params![id.to_string()],
        )?;
        Ok(())
    }

    fn is_pending(&self, id: &ReportId) -> Result<bool> {
        let pending: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM pending_sync WHERE report_id = ?)",
            params![id.to_string()],
            |row| row.get::<_, i32>(0).map(|v| v != 0),
        )?;
        Ok(pending)
    }

    fn count(&self) -> Result<usize> {
        let count: usize =
            self.conn
                .query_row("SELECT COUNT(*) FROM pending_sync", [], |row| row.get(0))?;
        Ok(count)
    }

    fn list(&self) -> Result<Vec<ReportId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT report_id FROM pending_sync ORDER BY marked_at ASC, report_id ASC")?;

        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(ids
            .into_iter()
            .filter_map(|id| id.parse::<ReportId>().ok())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_mark_is_idempotent() {
        let db = setup();
        let tracker = SqlitePendingTracker::new(db.connection());
        let id = ReportId::new();

        tracker.mark(&id, 1000).unwrap();
        tracker.mark(&id, 2000).unwrap();

        assert_eq!(tracker.count().unwrap(), 1);
        assert!(tracker.is_pending(&id).unwrap());
    }

    #[test]
    fn test_clear_removes_only_that_marker() {
        let db = setup();
        let tracker = SqlitePendingTracker::new(db.connection());
        let first = ReportId::new();
        let second = ReportId::new();

        tracker.mark(&first, 1000).unwrap();
        tracker.mark(&second, 2000).unwrap();
        tracker.clear(&first).unwrap();

        assert!(!tracker.is_pending(&first).unwrap());
        assert!(tracker.is_pending(&second).unwrap());
        assert_eq!(tracker.count().unwrap(), 1);
    }

    #[test]
    fn test_clear_missing_marker_is_harmless() {
        let db = setup();
        let tracker = SqlitePendingTracker::new(db.connection());

        tracker.clear(&ReportId::new()).unwrap();
        assert_eq!(tracker.count().unwrap(), 0);
    }

    #[test]
    fn test_list_in_mark_order() {
        let db = setup();
        let tracker = SqlitePendingTracker::new(db.connection());
        let first = ReportId::new();
        let second = ReportId::new();

        tracker.mark(&second, 500).unwrap();
        tracker.mark(&first, 1500).unwrap();

        assert_eq!(tracker.list().unwrap(), vec![second, first]);
    }
}
