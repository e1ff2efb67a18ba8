pub mod checkpoint;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod paths;
pub mod store;
pub mod template;

pub use checkpoint::{Checkpoint, CheckpointError, CheckpointStore};
pub use engine::{Action, ReconcileReport, Reconciler};
pub use error::{DocumentOp, SyncError};
pub use orchestrator::{
    Clock, LocalClock, NoteSource, Settings, SyncEvent, SyncOrchestrator, SyncReport,
};
pub use store::DocumentStore;

#[cfg(test)]
pub(crate) mod test_support;
