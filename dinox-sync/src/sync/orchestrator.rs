use std::sync::atomic::{AtomicBool, Ordering};

use dinox_core::{DayNote, DinoxClient, DinoxError};
use time::{OffsetDateTime, UtcOffset};
use tokio::sync::mpsc::UnboundedSender;

use super::checkpoint::{Checkpoint, CheckpointStore};
use super::engine::{Action, ReconcileReport, Reconciler};
use super::error::SyncError;
use super::paths::document_path;
use super::store::DocumentStore;

/// Where changed notes come from.
pub trait NoteSource {
    fn fetch(
        &self,
        token: &str,
        template: &str,
        since: &str,
    ) -> impl Future<Output = Result<Vec<DayNote>, DinoxError>> + Send;
}

impl NoteSource for DinoxClient {
    async fn fetch(
        &self,
        token: &str,
        template: &str,
        since: &str,
    ) -> Result<Vec<DayNote>, DinoxError> {
        self.fetch_notes(token, template, since).await
    }
}

pub trait Clock {
    fn now(&self) -> Checkpoint;
}

/// Wall clock in a fixed local offset.
#[derive(Debug, Clone, Copy)]
pub struct LocalClock {
    offset: UtcOffset,
}

impl LocalClock {
    /// Reads the local offset, falling back to UTC when the platform refuses.
    /// Call before the runtime starts worker threads; some platforms only
    /// answer while the process is single-threaded.
    pub fn detect() -> Self {
        Self {
            offset: UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        }
    }
}

impl Clock for LocalClock {
    fn now(&self) -> Checkpoint {
        Checkpoint::from_offset(OffsetDateTime::now_utc().to_offset(self.offset))
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub template: String,
    pub token: String,
    pub notebook_id: String,
    pub render_locally: bool,
}

impl Settings {
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.token.trim().is_empty() {
            return Err(SyncError::ConfigInvalid(
                "Dinox token must not be empty".to_string(),
            ));
        }
        if self.notebook_id.trim().is_empty() {
            return Err(SyncError::ConfigInvalid(
                "notebook id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub since: Checkpoint,
    pub checkpoint: Checkpoint,
    pub reconcile: ReconcileReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Started { since: Checkpoint },
    Fetched { days: usize, notes: usize },
    NoteApplied { path: String, action: Action },
    Finished(SyncReport),
    Failed { reason: String },
    Reset,
}

/// Load checkpoint, fetch, reconcile, then advance the checkpoint.
///
/// Only one run (or reset) may be active at a time; a second trigger is
/// rejected with [`SyncError::AlreadyRunning`].
pub struct SyncOrchestrator<F, S, C = LocalClock> {
    source: F,
    store: S,
    checkpoints: CheckpointStore,
    settings: Settings,
    clock: C,
    events: Option<UnboundedSender<SyncEvent>>,
    running: AtomicBool,
}

impl<F, S> SyncOrchestrator<F, S, LocalClock> {
    pub fn new(source: F, store: S, checkpoints: CheckpointStore, settings: Settings) -> Self {
        Self {
            source,
            store,
            checkpoints,
            settings,
            clock: LocalClock::detect(),
            events: None,
            running: AtomicBool::new(false),
        }
    }
}

impl<F, S, C> SyncOrchestrator<F, S, C> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> SyncOrchestrator<F, S, C2> {
        SyncOrchestrator {
            source: self.source,
            store: self.store,
            checkpoints: self.checkpoints,
            settings: self.settings,
            clock,
            events: self.events,
            running: self.running,
        }
    }

    pub fn with_events(mut self, events: UnboundedSender<SyncEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn begin(&self) -> Result<RunGuard<'_>, SyncError> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SyncError::AlreadyRunning)?;
        Ok(RunGuard(&self.running))
    }

    fn emit(&self, event: SyncEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

impl<F, S, C> SyncOrchestrator<F, S, C>
where
    F: NoteSource,
    S: DocumentStore,
    C: Clock,
{
    pub async fn run_sync(&self) -> Result<SyncReport, SyncError> {
        let result = match self.begin() {
            Ok(_guard) => self.sync_once().await,
            Err(err) => Err(err),
        };
        match &result {
            Ok(report) => {
                tracing::info!(
                    checkpoint = %report.checkpoint,
                    created = report.reconcile.created,
                    replaced = report.reconcile.replaced,
                    removed = report.reconcile.removed,
                    "sync finished"
                );
                self.emit(SyncEvent::Finished(report.clone()));
            }
            Err(err) => {
                tracing::warn!(error = %err, "sync failed");
                self.emit(SyncEvent::Failed {
                    reason: err.to_string(),
                });
            }
        }
        result
    }

    /// Forgets sync history so the next run imports everything again.
    /// Documents are left alone.
    pub async fn reset(&self) -> Result<(), SyncError> {
        let _guard = self.begin()?;
        self.checkpoints.reset().await?;
        tracing::info!(path = %self.checkpoints.path().display(), "checkpoint reset");
        self.emit(SyncEvent::Reset);
        Ok(())
    }

    async fn sync_once(&self) -> Result<SyncReport, SyncError> {
        self.settings.validate()?;
        let since = self.checkpoints.load().await?;
        // Taken before fetching so notes written during this run are
        // fetched again next time.
        let started_at = self.clock.now();
        tracing::info!(since = %since, "sync started");
        self.emit(SyncEvent::Started { since });

        let days = self
            .source
            .fetch(&self.settings.token, &self.settings.template, &since.format()?)
            .await?;
        let notes: usize = days.iter().map(|day| day.notes.len()).sum();
        tracing::info!(days = days.len(), notes, "notes fetched");
        self.emit(SyncEvent::Fetched {
            days: days.len(),
            notes,
        });

        let mut reconciler = Reconciler::new(&self.store, &self.settings.notebook_id, since);
        if self.settings.render_locally {
            reconciler = reconciler.render_locally(&self.settings.template);
        }
        let reconcile = reconciler
            .apply_all(&days, |date, note, action| {
                self.emit(SyncEvent::NoteApplied {
                    path: document_path(date, note),
                    action: action.clone(),
                })
            })
            .await?;

        self.checkpoints.save(started_at).await?;
        Ok(SyncReport {
            since,
            checkpoint: started_at,
            reconcile,
        })
    }
}

struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
