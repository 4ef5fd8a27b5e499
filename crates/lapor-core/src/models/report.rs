//! Report model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A unique identifier for a report, using UUID v7 (time-sortable)
///
/// Assigned once at local creation time and reused as the remote document
/// key, so pushing the same report twice is an upsert rather than a
/// duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(Uuid);

impl ReportId {
    /// Create a new unique report ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReportId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Lifecycle status of a report
///
/// Ordered: under normal operation a report only moves forward through
/// `New -> InProgress -> Done`. Managers may override to any state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Freshly reported, not yet picked up
    #[default]
    New,
    /// A contractor is working on it
    InProgress,
    /// Repair finished
    Done,
}

impl ReportStatus {
    /// Stable string form used in the database and the wire format
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            other => Err(format!("unknown report status: {other}")),
        }
    }
}

/// Where the defect is
///
/// Latitude/longitude are required. The locality/district pair is resolved
/// once at creation time from the static locality table and never
/// recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
}

impl Location {
    /// Create a location from raw coordinates, locality unresolved
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            locality: None,
            district: None,
        }
    }
}

/// One immutable entry in a report's status history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub previous_status: ReportStatus,
    pub new_status: ReportStatus,
    /// Display name of the actor who made the change
    pub changed_by: String,
    /// Unix ms
    pub changed_at: i64,
}

/// A photo attached to a report after it exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportImage {
    /// Public URL served by the image store
    pub url: String,
    /// Storage path/key of the original upload
    pub path: String,
}

/// A road defect report, the central entity of the system
///
/// The local store owns the on-device working copy; the remote store owns
/// the cross-device authoritative copy. `updated_at` doubles as the sync
/// revision compared during reconciliation and is not user-visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub status: ReportStatus,
    pub location: Location,
    /// Defect classification, e.g. "pothole"
    pub kind: String,
    pub description: String,
    /// Damaged surface in m²
    #[serde(default)]
    pub surface_m2: Option<f64>,
    /// Severity 1-10
    #[serde(default)]
    pub level: Option<u8>,
    /// Snapshot of the global price setting used for the current budget
    #[serde(default)]
    pub price_per_m2: Option<f64>,
    /// Derived: `price_per_m2 * level * surface_m2`, never edited directly
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub assigned_contractor: Option<String>,
    pub reported_by: String,
    /// Unix ms, set once at creation
    pub created_at: i64,
    /// Unix ms, set exactly once when status first becomes `in_progress`
    #[serde(default)]
    pub started_at: Option<i64>,
    /// Unix ms, set exactly once when status first becomes `done`
    #[serde(default)]
    pub completed_at: Option<i64>,
    /// Unix ms of the last local mutation; the sync revision
    pub updated_at: i64,
    /// Append-only, ordered by `changed_at` ascending
    #[serde(default)]
    pub status_history: Vec<StatusChange>,
    #[serde(default)]
    pub images: Vec<ReportImage>,
}

impl Report {
    /// Create a new report in status `New`
    #[must_use]
    pub fn new(
        kind: impl Into<String>,
        description: impl Into<String>,
        location: Location,
        reported_by: impl Into<String>,
    ) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: ReportId::new(),
            status: ReportStatus::New,
            location,
            kind: kind.into(),
            description: description.into(),
            surface_m2: None,
            level: None,
            price_per_m2: None,
            budget: None,
            assigned_contractor: None,
            reported_by: reported_by.into(),
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
            status_history: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Bump the sync revision after a local mutation
    pub fn touch(&mut self, now_ms: i64) {
        self.updated_at = now_ms;
    }
}
