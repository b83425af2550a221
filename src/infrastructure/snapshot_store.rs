//! Local snapshot persistence plus the export/import surface. One JSON
//! document mirrors the whole [`AppModel`]; instants are RFC 3339 strings
//! on disk and real `DateTime<Utc>` values in memory (chrono's serde
//! impls do the coercion both ways).

use crate::domain::models::{AppModel, Project, Task};
use crate::infrastructure::error::InfraError;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub trait SnapshotStore: Send + Sync {
    fn load(&self) -> Result<Option<AppModel>, InfraError>;
    fn save(&self, state: &AppModel) -> Result<(), InfraError>;
}

#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SnapshotStore for JsonFileSnapshotStore {
    fn load(&self) -> Result<Option<AppModel>, InfraError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        let state: AppModel = serde_json::from_str(&raw)?;
        Ok(Some(state))
    }

    fn save(&self, state: &AppModel) -> Result<(), InfraError> {
        let formatted = serde_json::to_string_pretty(state)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write-then-rename keeps a crash from truncating the snapshot.
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, format!("{formatted}\n"))?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    state: Mutex<Option<AppModel>>,
    save_count: AtomicUsize,
}

impl InMemorySnapshotStore {
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn load(&self) -> Result<Option<AppModel>, InfraError> {
        let state = self
            .state
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("snapshot lock poisoned: {error}")))?;
        Ok(state.clone())
    }

    fn save(&self, state: &AppModel) -> Result<(), InfraError> {
        let mut slot = self
            .state
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("snapshot lock poisoned: {error}")))?;
        *slot = Some(state.clone());
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// The two collections an external export must carry to be accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPayload {
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
}

pub fn export_json(state: &AppModel) -> Result<String, InfraError> {
    Ok(serde_json::to_string_pretty(state)?)
}

pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("taskflow-export-{}.json", now.format("%Y-%m-%d"))
}

/// Parses an externally supplied export. Anything without both a `tasks`
/// and a `projects` array is rejected before deserialization so the
/// caller's state is never half-replaced.
pub fn parse_import(raw: &str) -> Result<ImportPayload, InfraError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|error| InfraError::InvalidConfig(format!("import payload is not valid JSON: {error}")))?;

    let tasks_value = value
        .get("tasks")
        .filter(|candidate| candidate.is_array())
        .ok_or_else(|| {
            InfraError::InvalidConfig("import payload must contain a tasks array".to_string())
        })?;
    let projects_value = value
        .get("projects")
        .filter(|candidate| candidate.is_array())
        .ok_or_else(|| {
            InfraError::InvalidConfig("import payload must contain a projects array".to_string())
        })?;

    let tasks: Vec<Task> = serde_json::from_value(tasks_value.clone())
        .map_err(|error| InfraError::InvalidConfig(format!("invalid task in import payload: {error}")))?;
    let projects: Vec<Project> = serde_json::from_value(projects_value.clone())
        .map_err(|error| {
            InfraError::InvalidConfig(format!("invalid project in import payload: {error}"))
        })?;

    Ok(ImportPayload { tasks, projects })
}
