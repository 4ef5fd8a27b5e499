//! Database layer for Lapor

mod connection;
mod migrations;
mod pending;
mod report_repository;
mod settings_repository;

pub use connection::{lock, Database};
pub use pending::{PendingTracker, SqlitePendingTracker};
pub use report_repository::{ReportRepository, SqliteReportRepository};
pub use settings_repository::{SettingsRepository, SqliteSettingsRepository};
