//! Report lifecycle state machine
//!
//! Validates and applies status transitions, stamps `started_at` and
//! `completed_at` exactly once, appends an immutable history entry per
//! applied transition, and derives the repair budget. Authorization is
//! consolidated into [`can_transition`] and [`can_edit`] so callers never
//! re-implement role checks.

use crate::error::{Error, Result};
use crate::models::{Actor, Report, ReportStatus, StatusChange};

/// Outcome of a transition request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Status changed; one history entry was appended
    Applied,
    /// `new_status` equals the current status; nothing changed
    NoOp,
}

/// Whether `actor` may move `report` to `new_status`
///
/// Citizens may only move a report forward along `new -> in_progress ->
/// done`. Managers may override to any state.
#[must_use]
pub fn can_transition(actor: &Actor, report: &Report, new_status: ReportStatus) -> bool {
    actor.is_manager() || new_status > report.status
}

/// Whether `actor` may edit the report's fields
///
/// A citizen may only edit a report they created, and only while it is
/// still `new`. Once work has started, only a manager may edit it.
#[must_use]
pub fn can_edit(actor: &Actor, report: &Report) -> bool {
    actor.is_manager()
        || (actor.name == report.reported_by && report.status == ReportStatus::New)
}

/// Apply a status transition at time `now_ms`
///
/// A request for the current status is an idempotent skip, not an error.
/// An applied transition appends exactly one history entry, stamps
/// `started_at`/`completed_at` on their first occurrence only, and bumps
/// the sync revision. The caller is responsible for persisting the report
/// and marking it pending.
pub fn transition(
    report: &mut Report,
    new_status: ReportStatus,
    actor: &Actor,
    now_ms: i64,
) -> Result<TransitionOutcome> {
    if new_status == report.status {
        return Ok(TransitionOutcome::NoOp);
    }

    if !can_transition(actor, report, new_status) {
        return Err(Error::PermissionDenied(format!(
            "{} may not move report {} from {} to {}",
            actor.name, report.id, report.status, new_status
        )));
    }

    report.status_history.push(StatusChange {
        previous_status: report.status,
        new_status,
        changed_by: actor.name.clone(),
        changed_at: now_ms,
    });

    if new_status == ReportStatus::InProgress && report.started_at.is_none() {
        report.started_at = Some(now_ms);
    }
    if new_status == ReportStatus::Done && report.completed_at.is_none() {
        report.completed_at = Some(now_ms);
    }

    report.status = new_status;
    report.touch(now_ms);
    Ok(TransitionOutcome::Applied)
}

/// Derive the repair budget from its three inputs
///
/// `budget = price_per_m2 * level * surface_m2` when all inputs are
/// present; `None` otherwise. Pure; the global price setting is passed in
/// explicitly.
#[must_use]
pub fn recompute_budget(
    surface_m2: Option<f64>,
    level: Option<u8>,
    price_per_m2: Option<f64>,
) -> Option<f64> {
    Some(price_per_m2? * f64::from(level?) * surface_m2?)
}

/// Re-derive a report's budget against the given price setting
///
/// Stores the price snapshot alongside the result so the budget is never
/// kept without the inputs it was derived from.
pub fn apply_budget(report: &mut Report, price_per_m2: Option<f64>) {
    report.price_per_m2 = price_per_m2;
    report.budget = recompute_budget(report.surface_m2, report.level, price_per_m2);
}
