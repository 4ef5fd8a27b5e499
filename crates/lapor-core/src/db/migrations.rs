//! Database migrations

use crate::error::Result;
use rusqlite::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn)?;

    if version < 1 {
        migrate_v1(conn)?;
    }
    if version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Get the current schema version
fn get_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get::<_, i32>(0).map(|v| v != 0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    Ok(version)
}

/// Migration to version 1: reports, history, images, settings
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "BEGIN;
         CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY
         );
         CREATE TABLE IF NOT EXISTS reports (
             id TEXT PRIMARY KEY,
             status TEXT NOT NULL,
             latitude REAL NOT NULL,
             longitude REAL NOT NULL,
             locality TEXT,
             district TEXT,
             kind TEXT NOT NULL,
             description TEXT NOT NULL,
             surface_m2 REAL,
             level INTEGER,
             price_per_m2 REAL,
             budget REAL,
             assigned_contractor TEXT,
             reported_by TEXT NOT NULL,
             created_at INTEGER NOT NULL,
             started_at INTEGER,
             completed_at INTEGER,
             updated_at INTEGER NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_reports_updated ON reports(updated_at DESC);
         CREATE INDEX IF NOT EXISTS idx_reports_status ON reports(status);
         CREATE TABLE IF NOT EXISTS status_history (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             report_id TEXT NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
             previous_status TEXT NOT NULL,
             new_status TEXT NOT NULL,
             changed_by TEXT NOT NULL,
             changed_at INTEGER NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_status_history_report ON status_history(report_id);
         CREATE TABLE IF NOT EXISTS report_images (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             report_id TEXT NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
             url TEXT NOT NULL,
             path TEXT NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_report_images_report ON report_images(report_id);
         CREATE TABLE IF NOT EXISTS settings (
             key TEXT PRIMARY KEY,
             value TEXT NOT NULL
         );
         INSERT INTO schema_version (version) VALUES (1);
         COMMIT;",
    )?;

    tracing::info!("Migrated database to version 1");
    Ok(())
}

/// Migration to version 2: durable pending-sync markers
fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "BEGIN;
         CREATE TABLE IF NOT EXISTS pending_sync (
             report_id TEXT PRIMARY KEY,
             marked_at INTEGER NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_pending_sync_marked ON pending_sync(marked_at);
         INSERT INTO schema_version (version) VALUES (2);
         COMMIT;",
    )?;

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}
