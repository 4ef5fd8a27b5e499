//! Reconciliation engine
//!
//! Drains the pending set against the remote store, then pulls remote-only
//! and remote-newer reports back, under the local-pending-wins /
//! otherwise-remote-wins conflict rule. One record's failure never aborts
//! the batch; the whole run short-circuits only when the endpoint is
//! unreachable before any work begins.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::db::{
    self, Database, PendingTracker, ReportRepository, SqlitePendingTracker,
    SqliteReportRepository,
};
use crate::error::{Error, Result};
use crate::models::{ReportId, SyncRun, SyncRunStatus};
use crate::sync::RemoteStore;
use crate::util::now_ms;

/// Per-record checkpoint reported to the progress callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncProgress {
    Pushed(ReportId),
    PushFailed(ReportId),
    Pulled(ReportId),
}

type ProgressCallback = Box<dyn Fn(&SyncProgress) + Send + Sync>;

/// Orchestrates full reconciliation passes against one remote store
///
/// Owns the pending-marker lifecycle during a run; owns neither store's
/// data. All load-bearing state (markers, rows) is durable, so a run
/// interrupted by a crash is simply retried from persisted state.
pub struct SyncEngine<R> {
    db: Arc<Mutex<Database>>,
    remote: R,
    in_flight: AtomicBool,
    progress: Option<ProgressCallback>,
}

impl<R: RemoteStore> SyncEngine<R> {
    /// Create an engine over a shared database handle and a remote store
    pub fn new(db: Arc<Mutex<Database>>, remote: R) -> Self {
        Self {
            db,
            remote,
            in_flight: AtomicBool::new(false),
            progress: None,
        }
    }

    /// Install a per-record progress callback
    #[must_use]
    pub fn with_progress(
        mut self,
        callback: impl Fn(&SyncProgress) + Send + Sync + 'static,
    ) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Current pending badge count; consistent with what the next run
    /// would attempt
    pub fn pending_count(&self) -> Result<usize> {
        let db = db::lock(&self.db)?;
        SqlitePendingTracker::new(db.connection()).count()
    }

    /// Run one full reconciliation pass
    ///
    /// Safe to call redundantly: with no deltas on either side the run
    /// pushes and pulls nothing. A call while another run is in flight is
    /// rejected immediately with [`Error::SyncInProgress`], never
    /// interleaved. Markers appearing mid-run are left for the next run.
    pub async fn full_sync(&self) -> Result<SyncRun> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::SyncInProgress);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let mut run = SyncRun::begin(now_ms());

        // Connectivity gate: nothing is touched on a dead connection
        if let Err(error) = self.remote.ping().await {
            tracing::warn!("Sync skipped, remote unreachable: {error}");
            run.status = SyncRunStatus::Offline;
            run.note_error(error.to_string());
            run.finished_at = now_ms();
            return Ok(run);
        }

        // Snapshot the pending set; markers added after this point belong
        // to the next run
        let pending_ids = {
            let db = db::lock(&self.db)?;
            SqlitePendingTracker::new(db.connection()).list()?
        };

        for id in pending_ids {
            self.push_one(id, &mut run).await?;
        }

        self.pull_all(&mut run).await?;

        run.finished_at = now_ms();
        tracing::info!(
            "Sync finished: {} pushed, {} pulled, {} skipped, {} failed",
            run.pushed,
            run.pulled,
            run.skipped,
            run.failed
        );
        Ok(run)
    }

    /// Push one pending report; failures are recorded, never propagated
    async fn push_one(&self, id: ReportId, run: &mut SyncRun) -> Result<()> {
        let report = {
            let db = db::lock(&self.db)?;
            SqliteReportRepository::new(db.connection()).get(&id)?
        };

        let Some(report) = report else {
            // Stale marker pointing at a report that no longer exists
            tracing::warn!("Pending marker references missing report {id}; dropping marker");
            let db = db::lock(&self.db)?;
            SqlitePendingTracker::new(db.connection()).clear(&id)?;
            run.skipped += 1;
            return Ok(());
        };

        match self.remote.upsert(&report).await {
            Ok(()) => {
                // A local edit may have landed while the push was in
                // flight; the remote then holds the pre-edit snapshot and
                // the marker must survive for the next run. The revision
                // check and the clear share one lock scope, the same lock
                // every mutation marks under.
                let db = db::lock(&self.db)?;
                let current = SqliteReportRepository::new(db.connection()).get(&id)?;
                let unchanged =
                    current.map_or(true, |local| local.updated_at <= report.updated_at);
                if unchanged {
                    // Push is an idempotent upsert: a crash before this
                    // clear only costs a harmless re-push on the next run
                    SqlitePendingTracker::new(db.connection()).clear(&id)?;
                }
                run.pushed += 1;
                self.report_progress(&SyncProgress::Pushed(id));
            }
            Err(error) => {
                tracing::warn!("Push failed for report {id}: {error}");
                run.failed += 1;
                run.note_record_error(id, error.to_string());
                self.report_progress(&SyncProgress::PushFailed(id));
            }
        }
        Ok(())
    }

    /// Pull remote-only and remote-newer reports into the local store
    async fn pull_all(&self, run: &mut SyncRun) -> Result<()> {
        let remote_reports = match self.remote.list_all().await {
            Ok(reports) => reports,
            Err(error) => {
                tracing::warn!("Pull enumeration failed: {error}");
                run.note_error(error.to_string());
                return Ok(());
            }
        };

        for remote_report in remote_reports {
            let id = remote_report.id;
            let pulled = {
                let db = db::lock(&self.db)?;
                let repo = SqliteReportRepository::new(db.connection());
                let tracker = SqlitePendingTracker::new(db.connection());

                match repo.get(&id)? {
                    None => {
                        // Created on another device; pulls never mark pending
                        repo.upsert(&remote_report)?;
                        true
                    }
                    Some(local) => {
                        if tracker.is_pending(&id)?
                            || remote_report.updated_at <= local.updated_at
                        {
                            // Local pending edit wins, or nothing newer
                            false
                        } else {
                            repo.upsert(&remote_report)?;
                            true
                        }
                    }
                }
            };

            if pulled {
                run.pulled += 1;
                self.report_progress(&SyncProgress::Pulled(id));
            } else {
                run.skipped += 1;
            }
        }
        Ok(())
    }

    fn report_progress(&self, progress: &SyncProgress) {
        if let Some(callback) = &self.progress {
            callback(progress);
        }
    }
}

/// Releases the in-flight flag on every exit path
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Actor;
    use crate::service::{NewReport, ReportService};
    use crate::sync::{MemoryRemoteStore, RemoteResult};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    fn setup() -> (ReportService, SyncEngine<MemoryRemoteStore>) {
        let service = ReportService::open_in_memory().unwrap();
        let engine = SyncEngine::new(service.database(), MemoryRemoteStore::new());
        (service, engine)
    }

    fn sample_new(description: &str) -> NewReport {
        NewReport {
            kind: "pothole".to_string(),
            description: description.to_string(),
            latitude: -6.9175,
            longitude: 107.6098,
            surface_m2: Some(50.0),
            level: Some(5),
        }
    }

    #[tokio::test]
    async fn offline_run_touches_nothing() {
        let (service, engine) = setup();
        service
            .create_report(sample_new("offline hole"), &Actor::citizen("budi"))
            .unwrap();
        engine.remote.set_online(false);

        let run = engine.full_sync().await.unwrap();
        assert_eq!(run.status, SyncRunStatus::Offline);
        assert_eq!((run.pushed, run.pulled, run.failed), (0, 0, 0));
        assert!(run.first_error.is_some());
        assert_eq!(engine.pending_count().unwrap(), 1);
        assert!(engine.remote.is_empty());
    }

    #[tokio::test]
    async fn offline_create_then_sync_pushes_and_clears_marker() {
        let (service, engine) = setup();
        let report = service
            .create_report(sample_new("created offline"), &Actor::citizen("budi"))
            .unwrap();
        assert_eq!(engine.pending_count().unwrap(), 1);

        let run = engine.full_sync().await.unwrap();
        assert_eq!(run.pushed, 1);
        assert_eq!(run.failed, 0);
        assert!(run.is_clean());
        assert_eq!(engine.pending_count().unwrap(), 0);
        assert_eq!(
            engine.remote.stored(&report.id).unwrap().description,
            "created offline"
        );
    }

    #[tokio::test]
    async fn second_sync_without_writes_is_a_noop() {
        let (service, engine) = setup();
        service
            .create_report(sample_new("one"), &Actor::citizen("budi"))
            .unwrap();

        engine.full_sync().await.unwrap();
        let second = engine.full_sync().await.unwrap();

        assert_eq!(second.pushed, 0);
        assert_eq!(second.pulled, 0);
        assert_eq!(engine.pending_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn rejected_record_does_not_abort_the_batch() {
        let (service, engine) = setup();
        let good = service
            .create_report(sample_new("fine"), &Actor::citizen("budi"))
            .unwrap();
        let bad = service
            .create_report(sample_new("cursed"), &Actor::citizen("budi"))
            .unwrap();
        engine.remote.reject_upserts_of(bad.id);

        let run = engine.full_sync().await.unwrap();
        assert_eq!(run.pushed, 1);
        assert_eq!(run.failed, 1);
        assert_eq!(run.record_errors.len(), 1);
        assert_eq!(run.record_errors[0].report_id, bad.id);

        // No silent loss: the failed report is still pending with a
        // recorded error; the pushed one is cleared
        assert_eq!(engine.pending_count().unwrap(), 1);
        assert!(engine.remote.stored(&good.id).is_some());
        assert!(engine.remote.stored(&bad.id).is_none());
    }

    #[tokio::test]
    async fn pull_inserts_remote_only_reports_without_marking_pending() {
        let (service, engine) = setup();
        let remote_report = crate::models::Report::new(
            "crack",
            "reported from another device",
            crate::models::Location::new(-6.9, 107.6),
            "siti",
        );
        engine.remote.put(remote_report.clone());

        let run = engine.full_sync().await.unwrap();
        assert_eq!(run.pulled, 1);
        assert_eq!(engine.pending_count().unwrap(), 0);

        let local = service.get_report(&remote_report.id).unwrap().unwrap();
        assert_eq!(local.description, "reported from another device");
    }

    #[tokio::test]
    async fn newer_remote_revision_overwrites_clean_local_copy() {
        let (service, engine) = setup();
        let report = service
            .create_report(sample_new("original"), &Actor::citizen("budi"))
            .unwrap();
        engine.full_sync().await.unwrap();

        // Manager edits the report elsewhere; remote revision moves ahead
        let mut remote_copy = engine.remote.stored(&report.id).unwrap();
        remote_copy.assigned_contractor = Some("CV Aspal Jaya".to_string());
        remote_copy.touch(remote_copy.updated_at + 1000);
        engine.remote.put(remote_copy);

        let run = engine.full_sync().await.unwrap();
        assert_eq!(run.pulled, 1);

        let local = service.get_report(&report.id).unwrap().unwrap();
        assert_eq!(local.assigned_contractor.as_deref(), Some("CV Aspal Jaya"));
    }

    #[tokio::test]
    async fn pending_local_edit_wins_over_newer_remote_revision() {
        let (service, engine) = setup();
        let citizen = Actor::citizen("budi");
        let report = service
            .create_report(sample_new("original"), &citizen)
            .unwrap();
        engine.full_sync().await.unwrap();

        // Remote moves ahead...
        let mut remote_copy = engine.remote.stored(&report.id).unwrap();
        remote_copy.description = "remote wording".to_string();
        remote_copy.touch(remote_copy.updated_at + 10_000);
        engine.remote.put(remote_copy);

        // ...but the local user edited too, so the local copy is pending
        let edited = service
            .update_details(
                &report.id,
                crate::service::ReportEdits {
                    description: Some("local wording".to_string()),
                    ..crate::service::ReportEdits::default()
                },
                &citizen,
            )
            .unwrap();

        let run = engine.full_sync().await.unwrap();
        assert_eq!(run.pushed, 1);
        assert_eq!(run.pulled, 0);

        // The local edit survived on both sides
        let local = service.get_report(&report.id).unwrap().unwrap();
        assert_eq!(local.description, "local wording");
        assert_eq!(
            engine.remote.stored(&report.id).unwrap().description,
            "local wording"
        );
        assert_eq!(local.updated_at, edited.updated_at);
    }

    #[tokio::test]
    async fn stale_marker_for_missing_report_is_dropped_with_a_skip() {
        let (service, engine) = setup();
        let ghost = ReportId::new();
        {
            let db = service.database();
            let db = db::lock(&db).unwrap();
            SqlitePendingTracker::new(db.connection())
                .mark(&ghost, 1000)
                .unwrap();
        }

        let run = engine.full_sync().await.unwrap();
        assert_eq!(run.pushed, 0);
        assert_eq!(run.skipped, 1);
        assert_eq!(engine.pending_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn progress_callback_sees_each_record() {
        let service = ReportService::open_in_memory().unwrap();
        let events: Arc<StdMutex<Vec<SyncProgress>>> = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let engine = SyncEngine::new(service.database(), MemoryRemoteStore::new())
            .with_progress(move |progress| sink.lock().unwrap().push(*progress));

        let local = service
            .create_report(sample_new("mine"), &Actor::citizen("budi"))
            .unwrap();
        let remote_report = crate::models::Report::new(
            "crack",
            "theirs",
            crate::models::Location::new(-6.9, 107.6),
            "siti",
        );
        engine.remote.put(remote_report.clone());

        engine.full_sync().await.unwrap();

        let events = events.lock().unwrap();
        assert!(events.contains(&SyncProgress::Pushed(local.id)));
        assert!(events.contains(&SyncProgress::Pulled(remote_report.id)));
    }

    /// Remote that runs a hook inside `upsert`, before accepting the
    /// record, to interleave local writes with an in-flight push
    struct HookedRemote {
        inner: MemoryRemoteStore,
        on_upsert: StdMutex<Option<Box<dyn FnOnce() + Send>>>,
    }

    impl HookedRemote {
        fn new(hook: impl FnOnce() + Send + 'static) -> Self {
            Self {
                inner: MemoryRemoteStore::new(),
                on_upsert: StdMutex::new(Some(Box::new(hook))),
            }
        }
    }

    impl RemoteStore for HookedRemote {
        async fn ping(&self) -> RemoteResult<()> {
            self.inner.ping().await
        }
        async fn get(&self, id: &ReportId) -> RemoteResult<Option<crate::models::Report>> {
            self.inner.get(id).await
        }
        async fn list_all(&self) -> RemoteResult<Vec<crate::models::Report>> {
            self.inner.list_all().await
        }
        async fn upsert(&self, report: &crate::models::Report) -> RemoteResult<()> {
            if let Some(hook) = self.on_upsert.lock().unwrap().take() {
                hook();
            }
            self.inner.upsert(report).await
        }
    }

    #[tokio::test]
    async fn edit_landing_during_inflight_push_keeps_its_marker() {
        let service = ReportService::open_in_memory().unwrap();
        let citizen = Actor::citizen("budi");
        let report = service
            .create_report(sample_new("original"), &citizen)
            .unwrap();

        // The edit lands after the push snapshot was taken but before the
        // remote confirms it; the sleep keeps the revisions distinct
        let editor = service.clone();
        let edited_id = report.id;
        let engine = SyncEngine::new(
            service.database(),
            HookedRemote::new(move || {
                std::thread::sleep(Duration::from_millis(2));
                editor
                    .update_details(
                        &edited_id,
                        crate::service::ReportEdits {
                            description: Some("edited mid-push".to_string()),
                            ..crate::service::ReportEdits::default()
                        },
                        &Actor::citizen("budi"),
                    )
                    .unwrap();
            }),
        );

        let run = engine.full_sync().await.unwrap();
        assert_eq!(run.pushed, 1);

        // The remote got the pre-edit snapshot, so the marker must survive
        assert_eq!(
            engine.remote.inner.stored(&report.id).unwrap().description,
            "original"
        );
        assert_eq!(engine.pending_count().unwrap(), 1);
        let local = service.get_report(&report.id).unwrap().unwrap();
        assert_eq!(local.description, "edited mid-push");

        // The next run delivers the edit instead of losing it
        let next = engine.full_sync().await.unwrap();
        assert_eq!(next.pushed, 1);
        assert_eq!(
            engine.remote.inner.stored(&report.id).unwrap().description,
            "edited mid-push"
        );
        assert_eq!(engine.pending_count().unwrap(), 0);
    }

    /// Remote whose ping signals it started, then blocks long enough to
    /// observe re-entry
    struct SlowRemote {
        inner: MemoryRemoteStore,
        ping_started: Arc<std::sync::atomic::AtomicBool>,
    }

    impl RemoteStore for SlowRemote {
        async fn ping(&self) -> RemoteResult<()> {
            self.ping_started
                .store(true, std::sync::atomic::Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(100));
            self.inner.ping().await
        }
        async fn get(&self, id: &ReportId) -> RemoteResult<Option<crate::models::Report>> {
            self.inner.get(id).await
        }
        async fn list_all(&self) -> RemoteResult<Vec<crate::models::Report>> {
            self.inner.list_all().await
        }
        async fn upsert(&self, report: &crate::models::Report) -> RemoteResult<()> {
            self.inner.upsert(report).await
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_full_sync_is_rejected_not_interleaved() {
        let service = ReportService::open_in_memory().unwrap();
        let ping_started = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let engine = Arc::new(SyncEngine::new(
            service.database(),
            SlowRemote {
                inner: MemoryRemoteStore::new(),
                ping_started: Arc::clone(&ping_started),
            },
        ));

        let background = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.full_sync().await })
        };

        // Once ping has started, the in-flight flag is guaranteed held
        while !ping_started.load(std::sync::atomic::Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(1));
        }
        let second = engine.full_sync().await;
        assert!(matches!(second, Err(Error::SyncInProgress)));

        let first = background.await.unwrap().unwrap();
        assert_eq!(first.status, SyncRunStatus::Completed);

        // The flag is released, so a later run is accepted again
        engine.full_sync().await.unwrap();
    }

    #[tokio::test]
    async fn markers_added_mid_run_wait_for_the_next_run() {
        // The pending snapshot is taken once per run; a marker created
        // after the snapshot must survive the run untouched
        let (service, engine) = setup();
        engine.full_sync().await.unwrap();

        service
            .create_report(sample_new("late arrival"), &Actor::citizen("budi"))
            .unwrap();
        assert_eq!(engine.pending_count().unwrap(), 1);

        let next = engine.full_sync().await.unwrap();
        assert_eq!(next.pushed, 1);
        assert_eq!(engine.pending_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn rerunning_after_simulated_crash_between_push_and_clear() {
        // A crash after push but before marker clear leaves a marker for
        // an already-pushed report; the retry must re-push harmlessly
        let (service, engine) = setup();
        let report = service
            .create_report(sample_new("crashy"), &Actor::citizen("budi"))
            .unwrap();
        engine.full_sync().await.unwrap();

        // Simulate the stale marker the crash would have left behind
        {
            let db = service.database();
            let db = db::lock(&db).unwrap();
            SqlitePendingTracker::new(db.connection())
                .mark(&report.id, 1000)
                .unwrap();
        }

        let retry = engine.full_sync().await.unwrap();
        assert_eq!(retry.pushed, 1);
        assert_eq!(engine.pending_count().unwrap(), 0);
        assert_eq!(engine.remote.len(), 1);
    }
}
