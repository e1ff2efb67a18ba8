use std::borrow::Cow;

use dinox_core::{DayNote, Note};

use super::checkpoint::Checkpoint;
use super::error::{DocumentOp, SyncError, document_err};
use super::paths::document_path;
use super::store::DocumentStore;
use super::template::render;

/// What reconciling one note did to the notebook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Deletion seen during a first sync; nothing local can match it.
    Skipped,
    Created,
    /// An older mirror at `previous` was removed before recreating.
    Replaced { previous: String },
    Removed { previous: String },
    /// Deleted remotely and no local mirror exists.
    AlreadyAbsent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub replaced: usize,
    pub removed: usize,
    pub skipped: usize,
    pub already_absent: usize,
}

impl ReconcileReport {
    fn record(&mut self, action: &Action) {
        match action {
            Action::Skipped => self.skipped += 1,
            Action::Created => self.created += 1,
            Action::Replaced { .. } => self.replaced += 1,
            Action::Removed { .. } => self.removed += 1,
            Action::AlreadyAbsent => self.already_absent += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.replaced + self.removed + self.skipped + self.already_absent
    }
}

/// Applies remote note state to a notebook, one note at a time.
///
/// Updates are remove-then-create: whatever sits at a note's path is a
/// disposable projection of the remote note, so local edits to it are lost
/// on the next sync that carries that note.
pub struct Reconciler<'a, S> {
    store: &'a S,
    notebook_id: &'a str,
    checkpoint: Checkpoint,
    local_template: Option<&'a str>,
}

impl<'a, S: DocumentStore> Reconciler<'a, S> {
    pub fn new(store: &'a S, notebook_id: &'a str, checkpoint: Checkpoint) -> Self {
        Self {
            store,
            notebook_id,
            checkpoint,
            local_template: None,
        }
    }

    /// Render bodies locally with `template` instead of trusting the
    /// server-rendered `content`.
    pub fn render_locally(mut self, template: &'a str) -> Self {
        self.local_template = Some(template);
        self
    }

    pub async fn apply(&self, date: &str, note: &Note) -> Result<Action, SyncError> {
        let path = document_path(date, note);
        let first_sync = self.checkpoint.is_sentinel();

        let action = if note.is_del {
            if first_sync {
                Action::Skipped
            } else {
                match self.remove_existing(&path).await? {
                    Some(previous) => Action::Removed { previous },
                    None => Action::AlreadyAbsent,
                }
            }
        } else {
            let previous = if first_sync {
                None
            } else {
                self.remove_existing(&path).await?
            };
            self.store
                .create_from_markdown(self.notebook_id, &path, &self.body(note))
                .await
                .map_err(|err| document_err(DocumentOp::Create, &path, err))?;
            match previous {
                Some(previous) => Action::Replaced { previous },
                None => Action::Created,
            }
        };

        tracing::debug!(path = %path, action = ?action, "note reconciled");
        Ok(action)
    }

    /// Walks every note in received order, stopping at the first failure.
    /// Notes applied before the failure stay applied.
    pub async fn apply_all<F>(
        &self,
        days: &[DayNote],
        mut on_action: F,
    ) -> Result<ReconcileReport, SyncError>
    where
        F: FnMut(&str, &Note, &Action),
    {
        let mut report = ReconcileReport::default();
        for day in days {
            for note in &day.notes {
                let action = self.apply(&day.date, note).await?;
                report.record(&action);
                on_action(&day.date, note, &action);
            }
        }
        Ok(report)
    }

    async fn remove_existing(&self, hpath: &str) -> Result<Option<String>, SyncError> {
        let ids = self
            .store
            .ids_by_path(self.notebook_id, hpath)
            .await
            .map_err(|err| document_err(DocumentOp::Resolve, hpath, err))?;
        // Ids start with their creation timestamp, so the smallest is the
        // oldest mirror.
        let Some(id) = ids.into_iter().min() else {
            return Ok(None);
        };
        let path = self
            .store
            .path_of(&id)
            .await
            .map_err(|err| document_err(DocumentOp::PathOf, hpath, err))?;
        self.store
            .remove(self.notebook_id, &path)
            .await
            .map_err(|err| document_err(DocumentOp::Remove, &path, err))?;
        Ok(Some(path))
    }

    fn body<'n>(&self, note: &'n Note) -> Cow<'n, str> {
        match self.local_template {
            Some(template) => Cow::Owned(render(template, note)),
            None => Cow::Borrowed(&note.content),
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
