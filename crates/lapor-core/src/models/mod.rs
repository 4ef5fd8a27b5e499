//! Data models for Lapor

mod actor;
mod report;
mod sync_run;

pub use actor::{Actor, Role};
pub use report::{Location, Report, ReportId, ReportImage, ReportStatus, StatusChange};
pub use sync_run::{RecordError, SyncRun, SyncRunStatus};
