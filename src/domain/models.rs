use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Id of the bootstrap project that exists in initial state and can never
/// be removed.
pub const DEFAULT_PROJECT_ID: &str = "miscellaneous";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Todo,
    Active,
    Paused,
    Completed,
    Overdue,
}

/// A unit of work. Subtasks are owned by their parent's `subtasks` list;
/// `parent_id` is informational only and never used for traversal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub project_id: String,
    pub priority: Priority,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// Estimated effort in minutes.
    pub estimated_time: u32,
    /// Recorded effort in minutes.
    pub actual_time: u32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overdue_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_paused_at: Option<DateTime<Utc>>,
    /// Elapsed seconds captured when the task was parked by the timer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<Task>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_overdue: bool,
}

impl Task {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "task.id")?;
        validate_non_empty(&self.title, "task.title")?;
        validate_non_empty(&self.project_id, "task.project_id")?;
        Ok(())
    }
}

/// Shallow-merge update for a task; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_id: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_time: Option<u32>,
    pub actual_time: Option<u32>,
    pub completed_at: Option<DateTime<Utc>>,
    pub paused_time: Option<u32>,
    pub last_paused_at: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
}

impl TaskPatch {
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(project_id) = &self.project_id {
            task.project_id = project_id.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(estimated_time) = self.estimated_time {
            task.estimated_time = estimated_time;
        }
        if let Some(actual_time) = self.actual_time {
            task.actual_time = actual_time;
        }
        if let Some(completed_at) = self.completed_at {
            task.completed_at = Some(completed_at);
        }
        if let Some(paused_time) = self.paused_time {
            task.paused_time = Some(paused_time);
        }
        if let Some(last_paused_at) = self.last_paused_at {
            task.last_paused_at = Some(last_paused_at);
        }
        if let Some(tags) = &self.tags {
            task.tags = tags.clone();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Display hint, opaque to the core logic.
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub is_deletable: bool,
}

impl Project {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "project.id")?;
        validate_non_empty(&self.name, "project.name")?;
        validate_non_empty(&self.color, "project.color")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

impl ProjectPatch {
    pub fn apply_to(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(color) = &self.color {
            project.color = color.clone();
        }
    }
}

/// Elapsed-time snapshot for a task parked mid-timer without being the
/// active one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PausedTaskSnapshot {
    pub elapsed_time: u64,
    pub paused_at: DateTime<Utc>,
}

/// Singleton timer. `elapsed_time` is always recomputed from
/// `start_time` + `paused_time`, never incremented, so it self-corrects
/// after suspension or clock drift.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub is_running: bool,
    pub is_paused: bool,
    pub current_task_id: Option<String>,
    /// Whole seconds of the current segment chain.
    pub elapsed_time: u64,
    pub start_time: Option<DateTime<Utc>>,
    /// Milliseconds carried over from previous segments.
    pub paused_time: u64,
    pub task_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub paused_tasks: HashMap<String, PausedTaskSnapshot>,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            is_running: false,
            is_paused: false,
            current_task_id: None,
            elapsed_time: 0,
            start_time: None,
            paused_time: 0,
            task_start_time: None,
            paused_tasks: HashMap::new(),
        }
    }
}

/// Shallow-merge update for the timer. Nullable fields are doubly
/// optional: the outer `None` means "leave alone", the inner `None`
/// means "clear".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerPatch {
    pub is_running: Option<bool>,
    pub is_paused: Option<bool>,
    pub current_task_id: Option<Option<String>>,
    pub elapsed_time: Option<u64>,
    pub start_time: Option<Option<DateTime<Utc>>>,
    pub paused_time: Option<u64>,
    pub task_start_time: Option<Option<DateTime<Utc>>>,
}

impl TimerPatch {
    /// A fresh running segment bound to `task_id`.
    pub fn running_segment(task_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            is_running: Some(true),
            is_paused: Some(false),
            current_task_id: Some(Some(task_id.to_string())),
            elapsed_time: Some(0),
            start_time: Some(Some(now)),
            paused_time: Some(0),
            task_start_time: Some(Some(now)),
        }
    }

    /// Full reset: no bound task, nothing running.
    pub fn idle() -> Self {
        Self {
            is_running: Some(false),
            is_paused: Some(false),
            current_task_id: Some(None),
            elapsed_time: Some(0),
            start_time: Some(None),
            paused_time: Some(0),
            task_start_time: Some(None),
        }
    }

    pub fn apply_to(&self, timer: &mut TimerState) {
        if let Some(is_running) = self.is_running {
            timer.is_running = is_running;
        }
        if let Some(is_paused) = self.is_paused {
            timer.is_paused = is_paused;
        }
        if let Some(current_task_id) = &self.current_task_id {
            timer.current_task_id = current_task_id.clone();
        }
        if let Some(elapsed_time) = self.elapsed_time {
            timer.elapsed_time = elapsed_time;
        }
        if let Some(start_time) = self.start_time {
            timer.start_time = start_time;
        }
        if let Some(paused_time) = self.paused_time {
            timer.paused_time = paused_time;
        }
        if let Some(task_start_time) = self.task_start_time {
            timer.task_start_time = task_start_time;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub is_loading: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            is_loading: false,
            last_sync: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatusPatch {
    pub is_loading: Option<bool>,
    pub last_sync: Option<Option<DateTime<Utc>>>,
    pub error: Option<Option<String>>,
}

impl SyncStatusPatch {
    pub fn loading() -> Self {
        Self {
            is_loading: Some(true),
            ..Self::default()
        }
    }

    pub fn success(now: DateTime<Utc>) -> Self {
        Self {
            is_loading: Some(false),
            last_sync: Some(Some(now)),
            error: Some(None),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            is_loading: Some(false),
            last_sync: None,
            error: Some(Some(message.into())),
        }
    }

    pub fn clear_error() -> Self {
        Self {
            is_loading: Some(false),
            last_sync: None,
            error: Some(None),
        }
    }

    pub fn apply_to(&self, status: &mut SyncStatus) {
        if let Some(is_loading) = self.is_loading {
            status.is_loading = is_loading;
        }
        if let Some(last_sync) = self.last_sync {
            status.last_sync = last_sync;
        }
        if let Some(error) = &self.error {
            status.error = error.clone();
        }
    }
}

/// Repository descriptor as returned by the GitHub API; field names match
/// the wire format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHubRepo {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub private: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GitHubState {
    pub is_connected: bool,
    /// Held in memory and the local snapshot only; stripped from anything
    /// sent to the remote store.
    pub token: Option<String>,
    pub username: Option<String>,
    pub selected_repo: Option<String>,
    pub repositories: Vec<GitHubRepo>,
    #[serde(default)]
    pub sync_status: SyncStatus,
}

impl Default for GitHubState {
    fn default() -> Self {
        Self {
            is_connected: false,
            token: None,
            username: None,
            selected_repo: None,
            repositories: Vec::new(),
            sync_status: SyncStatus::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PriorityFilter {
    #[default]
    All,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Todo,
    Active,
    Paused,
    Completed,
    Overdue,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Tasks,
    Calendar,
}

/// The whole application state. Constructed once via [`AppModel::bootstrap`],
/// optionally replaced wholesale by a restored snapshot, thereafter mutated
/// exclusively through reducer actions. The derived `Default` is an empty
/// placeholder (no bootstrap project); real initial state comes from
/// [`AppModel::bootstrap`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppModel {
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub timer: TimerState,
    pub selected_project: Option<String>,
    pub search_query: String,
    pub filter_priority: PriorityFilter,
    pub filter_status: StatusFilter,
    pub sidebar_collapsed: bool,
    pub focus_mode: bool,
    pub selected_date: Option<DateTime<Utc>>,
    pub view_mode: ViewMode,
    pub github: GitHubState,
}

impl AppModel {
    pub fn bootstrap(now: DateTime<Utc>) -> Self {
        Self {
            tasks: Vec::new(),
            projects: vec![Project {
                id: DEFAULT_PROJECT_ID.to_string(),
                name: "Miscellaneous".to_string(),
                color: "#10B981".to_string(),
                created_at: now,
                is_deletable: false,
            }],
            timer: TimerState::default(),
            selected_project: None,
            search_query: String::new(),
            filter_priority: PriorityFilter::All,
            filter_status: StatusFilter::All,
            sidebar_collapsed: false,
            focus_mode: false,
            selected_date: None,
            view_mode: ViewMode::Tasks,
            github: GitHubState::default(),
        }
    }
}

/// One row of the analytics time report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: String,
    pub task_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Minutes.
    pub duration: u32,
    /// "YYYY-MM-DD" bucket key.
    pub date: String,
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}
