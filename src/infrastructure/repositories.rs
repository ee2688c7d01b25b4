//! Infrastructure implementations of the variable repository

use crate::domain::repositories::{RepositoryError, VariableRepository};
use crate::storage;
use crate::types::value::Value;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// JSON file per session under `<base>/<script_name>/`
pub struct JsonFileVariableRepository {
    base_path: PathBuf,
    script_name: String,
}

impl JsonFileVariableRepository {
    pub fn new<P: Into<PathBuf>>(base_path: P, script_name: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            script_name: script_name.into(),
        }
    }

    fn record_path(&self, session_key: &str) -> Result<PathBuf, RepositoryError> {
        if session_key.is_empty()
            || session_key.starts_with('.')
            || session_key.contains(['/', '\\'])
        {
            return Err(RepositoryError::invalid_format(format!(
                "session key '{session_key}' cannot be used as a file name"
            )));
        }
        Ok(self
            .base_path
            .join(&self.script_name)
            .join(format!("{session_key}.json")))
    }

    async fn read_record(&self, path: &Path) -> Result<BTreeMap<String, Value>, RepositoryError> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            RepositoryError::io(format!("Failed to read {}", path.display()), e)
        })?;

        storage::load_variables(&bytes).map_err(|e| {
            RepositoryError::invalid_format(format!("{}: {e:#}", path.display()))
        })
    }
}

#[async_trait]
impl VariableRepository for JsonFileVariableRepository {
    async fn load(&self, session_key: &str) -> Result<BTreeMap<String, Value>, RepositoryError> {
        let path = self.record_path(session_key)?;
        self.read_record(&path).await
    }

    async fn save(
        &self,
        session_key: &str,
        changed: &BTreeMap<String, Value>,
    ) -> Result<(), RepositoryError> {
        let path = self.record_path(session_key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                RepositoryError::io(
                    format!("Failed to create directory {}", parent.display()),
                    e,
                )
            })?;
        }

        let mut record = self.read_record(&path).await?;
        record.extend(changed.iter().map(|(k, v)| (k.clone(), v.clone())));

        let bytes = storage::save_variables(&record).map_err(|e| {
            RepositoryError::Serialization {
                message: format!("Failed to serialize record: {e:#}"),
            }
        })?;

        log::trace!(
            target: "csbot::storage",
            "writing {} fields to {}",
            record.len(),
            path.display()
        );
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            RepositoryError::io(format!("Failed to write {}", path.display()), e)
        })
    }
}

/// In-memory implementation for testing
///
/// Records every `save` call so tests can assert what was persisted and when.
#[derive(Default)]
pub struct InMemoryVariableRepository {
    records: Mutex<BTreeMap<String, BTreeMap<String, Value>>>,
    saves: Mutex<Vec<(String, BTreeMap<String, Value>)>>,
}

impl InMemoryVariableRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the stored record of a session
    pub fn with_record(
        self,
        session_key: impl Into<String>,
        vars: BTreeMap<String, Value>,
    ) -> Self {
        if let Ok(mut records) = self.records.lock() {
            records.insert(session_key.into(), vars);
        }
        self
    }

    /// Current stored record of a session
    pub fn record(&self, session_key: &str) -> BTreeMap<String, Value> {
        self.records
            .lock()
            .ok()
            .and_then(|records| records.get(session_key).cloned())
            .unwrap_or_default()
    }

    /// Every save call in order, as `(session_key, changed)`
    pub fn save_calls(&self) -> Vec<(String, BTreeMap<String, Value>)> {
        self.saves
            .lock()
            .map(|saves| saves.clone())
            .unwrap_or_default()
    }
}

fn poisoned() -> RepositoryError {
    RepositoryError::Io {
        message: "in-memory store lock poisoned".to_string(),
        source: None,
    }
}

#[async_trait]
impl VariableRepository for InMemoryVariableRepository {
    async fn load(&self, session_key: &str) -> Result<BTreeMap<String, Value>, RepositoryError> {
        let records = self.records.lock().map_err(|_| poisoned())?;
        Ok(records.get(session_key).cloned().unwrap_or_default())
    }

    async fn save(
        &self,
        session_key: &str,
        changed: &BTreeMap<String, Value>,
    ) -> Result<(), RepositoryError> {
        {
            let mut records = self.records.lock().map_err(|_| poisoned())?;
            records
                .entry(session_key.to_string())
                .or_default()
                .extend(changed.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        self.saves
            .lock()
            .map_err(|_| poisoned())?
            .push((session_key.to_string(), changed.clone()));
        Ok(())
    }
}
