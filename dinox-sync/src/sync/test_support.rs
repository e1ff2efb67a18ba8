use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

use super::store::DocumentStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Resolve(String),
    PathOf(String),
    Create { hpath: String, markdown: String },
    Remove(String),
}

#[derive(Debug, Error)]
#[error("store refused {0}")]
pub struct StoreFailure(pub String);

/// In-memory notebook that records every call made against it.
#[derive(Default)]
pub struct RecordingStore {
    existing: HashMap<String, Vec<String>>,
    fail_resolve: Option<String>,
    fail_path_of: Option<String>,
    fail_create: Option<String>,
    fail_remove: Option<String>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingStore {
    pub fn with_existing(mut self, hpath: &str, ids: &[&str]) -> Self {
        self.existing.insert(
            hpath.to_string(),
            ids.iter().map(|id| id.to_string()).collect(),
        );
        self
    }

    pub fn failing_resolve(mut self, hpath: &str) -> Self {
        self.fail_resolve = Some(hpath.to_string());
        self
    }

    pub fn failing_path_of(mut self, id: &str) -> Self {
        self.fail_path_of = Some(id.to_string());
        self
    }

    pub fn failing_create(mut self, hpath: &str) -> Self {
        self.fail_create = Some(hpath.to_string());
        self
    }

    pub fn failing_remove(mut self, path: &str) -> Self {
        self.fail_remove = Some(path.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(hook: &Option<String>, target: &str) -> Result<(), StoreFailure> {
        match hook.as_deref() {
            Some(failing) if failing == target => Err(StoreFailure(target.to_string())),
            _ => Ok(()),
        }
    }
}

impl DocumentStore for RecordingStore {
    type Error = StoreFailure;

    async fn ids_by_path(
        &self,
        _notebook: &str,
        hpath: &str,
    ) -> Result<Vec<String>, StoreFailure> {
        self.push(Call::Resolve(hpath.to_string()));
        Self::check(&self.fail_resolve, hpath)?;
        Ok(self.existing.get(hpath).cloned().unwrap_or_default())
    }

    async fn path_of(&self, id: &str) -> Result<String, StoreFailure> {
        self.push(Call::PathOf(id.to_string()));
        Self::check(&self.fail_path_of, id)?;
        Ok(format!("/{id}.sy"))
    }

    async fn create_from_markdown(
        &self,
        _notebook: &str,
        hpath: &str,
        markdown: &str,
    ) -> Result<(), StoreFailure> {
        self.push(Call::Create {
            hpath: hpath.to_string(),
            markdown: markdown.to_string(),
        });
        Self::check(&self.fail_create, hpath)
    }

    async fn remove(&self, _notebook: &str, path: &str) -> Result<(), StoreFailure> {
        self.push(Call::Remove(path.to_string()));
        Self::check(&self.fail_remove, path)
    }
}
