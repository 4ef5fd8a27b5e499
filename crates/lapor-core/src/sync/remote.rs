//! Remote store client
//!
//! The authoritative cross-device collection, reachable only when online.
//! Every operation distinguishes an *unreachable* endpoint (retry later,
//! nothing attempted) from a *rejected* record (remote-side validation or
//! permission failure, recorded per record).

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::error::Error;
use crate::models::{Report, ReportId};
use crate::util::{compact_text, is_http_url, normalize_text_option};

/// Failure modes of a remote store operation
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Endpoint could not be reached; fully recoverable, retry later
    #[error("Remote store unreachable: {0}")]
    Unreachable(String),
    /// The remote side refused the request for this specific record
    #[error("Remote store rejected the request: {0}")]
    Rejected(String),
}

impl RemoteError {
    /// Whether this failure means the endpoint itself is down
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Contract of the authoritative remote report collection
///
/// Upsert semantics throughout: reports are keyed by their stable local
/// `id`, so re-sending an already-accepted report is harmless.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Cheap connectivity check, performed before any reconciliation work
    async fn ping(&self) -> RemoteResult<()>;

    /// Fetch one report by ID
    async fn get(&self, id: &ReportId) -> RemoteResult<Option<Report>>;

    /// Fetch the entire collection
    async fn list_all(&self) -> RemoteResult<Vec<Report>>;

    /// Create-or-overwrite a report keyed by its ID
    async fn upsert(&self, report: &Report) -> RemoteResult<()>;
}

/// HTTP implementation of [`RemoteStore`]
#[derive(Clone)]
pub struct HttpRemoteStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemoteStore {
    /// Create a client for the given base endpoint
    pub fn new(endpoint: impl Into<String>) -> crate::Result<Self> {
        let base_url = normalize_endpoint(endpoint.into())?;
        Ok(Self {
            base_url,
            client: reqwest::Client::new(),
        })
    }

    fn report_url(&self, id: &ReportId) -> String {
        format!("{}/reports/{id}", self.base_url)
    }

    fn transport_error(error: &reqwest::Error) -> RemoteError {
        RemoteError::Unreachable(compact_text(&error.to_string()))
    }
}

impl RemoteStore for HttpRemoteStore {
    async fn ping(&self) -> RemoteResult<()> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|error| Self::transport_error(&error))?;

        if response.status().is_success() {
            Ok(())
        } else {
            // A dead gateway answers too; still no point starting a run
            Err(RemoteError::Unreachable(format!(
                "health check returned HTTP {}",
                response.status().as_u16()
            )))
        }
    }

    async fn get(&self, id: &ReportId) -> RemoteResult<Option<Report>> {
        let response = self
            .client
            .get(self.report_url(id))
            .send()
            .await
            .map_err(|error| Self::transport_error(&error))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Rejected(parse_api_error(status, &body)));
        }

        let report = response
            .json::<Report>()
            .await
            .map_err(|error| RemoteError::Rejected(format!("invalid report payload: {error}")))?;
        Ok(Some(report))
    }

    async fn list_all(&self) -> RemoteResult<Vec<Report>> {
        let response = self
            .client
            .get(format!("{}/reports", self.base_url))
            .send()
            .await
            .map_err(|error| Self::transport_error(&error))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Rejected(parse_api_error(status, &body)));
        }

        response
            .json::<Vec<Report>>()
            .await
            .map_err(|error| RemoteError::Rejected(format!("invalid report payload: {error}")))
    }

    async fn upsert(&self, report: &Report) -> RemoteResult<()> {
        let response = self
            .client
            .put(self.report_url(&report.id))
            .json(report)
            .send()
            .await
            .map_err(|error| Self::transport_error(&error))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(RemoteError::Rejected(parse_api_error(status, &body)))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", compact_text(trimmed), status.as_u16())
    }
}

fn normalize_endpoint(raw: String) -> crate::Result<String> {
    let endpoint = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::InvalidInput("remote endpoint must not be empty".to_string()))?;
    if is_http_url(&endpoint) {
        Ok(endpoint.trim_end_matches('/').to_string())
    } else {
        Err(Error::InvalidInput(
            "remote endpoint must include http:// or https://".to_string(),
        ))
    }
}

/// In-memory [`RemoteStore`] used by tests
///
/// Behaves like the real collection (upsert keyed by id), with switches to
/// simulate the endpoint going offline or rejecting specific records.
#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    reports: Mutex<HashMap<ReportId, Report>>,
    offline: AtomicBool,
    rejected: Mutex<HashSet<ReportId>>,
}

impl MemoryRemoteStore {
    /// Create an empty, online store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle reachability
    pub fn set_online(&self, online: bool) {
        self.offline.store(!online, Ordering::SeqCst);
    }

    /// Make upserts of the given report fail with `Rejected`
    pub fn reject_upserts_of(&self, id: ReportId) {
        lock_recover(&self.rejected).insert(id);
    }

    /// Directly seed or overwrite a stored report (test setup)
    pub fn put(&self, report: Report) {
        lock_recover(&self.reports).insert(report.id, report);
    }

    /// Stored copy of a report, if any
    #[must_use]
    pub fn stored(&self, id: &ReportId) -> Option<Report> {
        lock_recover(&self.reports).get(id).cloned()
    }

    /// Number of stored reports
    #[must_use]
    pub fn len(&self) -> usize {
        lock_recover(&self.reports).len()
    }

    /// Whether the store holds no reports
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_online(&self) -> RemoteResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(RemoteError::Unreachable(
                "remote store is offline".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

fn lock_recover<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl RemoteStore for MemoryRemoteStore {
    async fn ping(&self) -> RemoteResult<()> {
        self.check_online()
    }

    async fn get(&self, id: &ReportId) -> RemoteResult<Option<Report>> {
        self.check_online()?;
        Ok(lock_recover(&self.reports).get(id).cloned())
    }

    async fn list_all(&self) -> RemoteResult<Vec<Report>> {
        self.check_online()?;
        let mut reports: Vec<Report> = lock_recover(&self.reports).values().cloned().collect();
        reports.sort_by_key(|report| report.id.to_string());
        Ok(reports)
    }

    async fn upsert(&self, report: &Report) -> RemoteResult<()> {
        self.check_online()?;
        if lock_recover(&self.rejected).contains(&report.id) {
            return Err(RemoteError::Rejected(format!(
                "validation failed for report {}",
                report.id
            )));
        }
        lock_recover(&self.reports).insert(report.id, report.clone());
        Ok(())
    }
}
