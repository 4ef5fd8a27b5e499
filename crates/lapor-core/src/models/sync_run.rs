//! Summary of one reconciliation pass

use serde::{Deserialize, Serialize};

use super::ReportId;

/// Whole-run outcome category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunStatus {
    /// The run walked both the pending set and the remote collection
    Completed,
    /// The remote endpoint was unreachable; nothing was touched
    Offline,
}

/// A per-record failure recorded during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordError {
    pub report_id: ReportId,
    pub message: String,
}

/// Ephemeral record of one `full_sync` invocation
///
/// Not persisted; drives UI feedback (summary line, badge refresh). Failed
/// records keep their pending markers and are retried on the next run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRun {
    /// Unix ms
    pub started_at: i64,
    /// Unix ms
    pub finished_at: i64,
    pub status: SyncRunStatus,
    /// Local records accepted by the remote store
    pub pushed: usize,
    /// Remote records inserted or overwritten locally
    pub pulled: usize,
    /// Records left untouched (up to date, or local pending edit wins)
    pub skipped: usize,
    /// Records whose push failed; markers retained
    pub failed: usize,
    /// First error observed, run-level or per-record
    pub first_error: Option<String>,
    pub record_errors: Vec<RecordError>,
}

impl SyncRun {
    /// Start a new run record at the given time
    #[must_use]
    pub const fn begin(started_at: i64) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            status: SyncRunStatus::Completed,
            pushed: 0,
            pulled: 0,
            skipped: 0,
            failed: 0,
            first_error: None,
            record_errors: Vec::new(),
        }
    }

    /// Record an error message, keeping only the first as the headline
    pub fn note_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        if self.first_error.is_none() {
            self.first_error = Some(message);
        }
    }

    /// Record a per-record failure
    pub fn note_record_error(&mut self, report_id: ReportId, message: impl Into<String>) {
        let message = message.into();
        self.note_error(message.clone());
        self.record_errors.push(RecordError { report_id, message });
    }

    /// True when every record was either pushed, pulled, or legitimately skipped
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        matches!(self.status, SyncRunStatus::Completed) && self.failed == 0
    }
}
