use crate::application::bootstrap::bootstrap_workspace;
use crate::application::github_sync::{GitHubSyncService, ImportCheckOutcome, SyncError};
use crate::application::reducer::Action;
use crate::application::scheduler::{EffectScheduler, StateChange};
use crate::application::store::{NewTask, NowProvider, Store};
use crate::domain::models::{
    AppModel, GitHubRepo, Priority, PriorityFilter, Project, ProjectPatch, StatusFilter,
    SyncStatus, Task, TaskPatch, TaskStatus, TimeEntry, TimerState, ViewMode, DEFAULT_PROJECT_ID,
};
use crate::infrastructure::config::{load_runtime_tuning, RuntimeTuning};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::github_client::ReqwestGitHubClient;
use crate::infrastructure::snapshot_store::{
    export_file_name, export_json, parse_import, JsonFileSnapshotStore, SnapshotStore,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;

pub struct AppState {
    logs_dir: PathBuf,
    tuning: RuntimeTuning,
    store: Arc<Mutex<Store>>,
    sync: Arc<GitHubSyncService<ReqwestGitHubClient>>,
    scheduler: Arc<EffectScheduler<ReqwestGitHubClient, JsonFileSnapshotStore>>,
    log_guard: Mutex<()>,
}

impl AppState {
    pub fn new(workspace_root: PathBuf, runtime: Handle) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        let config_dir = workspace_root.join("config");
        let logs_dir = workspace_root.join("logs");
        let tuning = load_runtime_tuning(&config_dir);

        let snapshots = Arc::new(JsonFileSnapshotStore::new(&bootstrap.snapshot_path));
        let now_provider: NowProvider = Arc::new(Utc::now);
        let (restored, restore_note) = match snapshots.load() {
            Ok(restored) => (restored, None),
            Err(error) => (
                None,
                Some(format!("snapshot restore failed, using defaults: {error}")),
            ),
        };
        let store = Arc::new(Mutex::new(match restored {
            Some(state) => Store::new(state, now_provider),
            None => Store::bootstrapped(now_provider),
        }));

        let client = Arc::new(ReqwestGitHubClient::new());
        let sync = Arc::new(GitHubSyncService::new(client, Arc::clone(&store)));
        let scheduler = Arc::new(EffectScheduler::new(
            runtime,
            Arc::clone(&store),
            snapshots,
            Arc::clone(&sync),
            tuning.persist_debounce,
            tuning.auto_sync_delay,
        ));

        let state = Self {
            logs_dir,
            tuning,
            store,
            sync,
            scheduler,
            log_guard: Mutex::new(()),
        };
        if let Some(note) = restore_note {
            state.log_error("bootstrap", &note);
        }
        state.log_info(
            "bootstrap",
            &format!("workspace ready at {}", bootstrap.workspace_root.display()),
        );
        Ok(state)
    }

    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        self.log_error(command, &error.to_string());
        error.to_string()
    }

    pub fn sync_command_error(&self, command: &str, error: &SyncError) -> String {
        self.log_error(command, &error.message);
        error.message.clone()
    }

    pub fn log_info(&self, command: &str, message: &str) {
        self.append_log("info", command, message);
    }

    pub fn log_error(&self, command: &str, message: &str) {
        self.append_log("error", command, message);
    }

    fn append_log(&self, level: &str, command: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        let path = self.logs_dir.join("commands.log");
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }

    /// Periodic loops: the 1 s timer recomputation, the 60 s overdue
    /// sweep, and a one-shot import-check for a restored session that is
    /// already connected with a selected repository.
    pub fn spawn_background_loops(&self, runtime: &Handle) {
        let store = Arc::clone(&self.store);
        let tick_period = self.tuning.timer_tick;
        runtime.spawn(async move {
            let mut interval = tokio::time::interval(tick_period);
            loop {
                interval.tick().await;
                if let Ok(mut store) = store.lock() {
                    if store.state().timer.is_running {
                        store.tick();
                    }
                }
            }
        });

        let store = Arc::clone(&self.store);
        let scheduler = Arc::clone(&self.scheduler);
        let sweep_period = self.tuning.overdue_sweep;
        runtime.spawn(async move {
            let mut interval = tokio::time::interval(sweep_period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let changed = match store.lock() {
                    Ok(mut store) => {
                        let before = store.state().tasks.clone();
                        store.check_overdue();
                        before != store.state().tasks
                    }
                    Err(_) => false,
                };
                if changed {
                    scheduler.notify_commit(StateChange::Other);
                }
            }
        });

        let sync = Arc::clone(&self.sync);
        runtime.spawn(async move {
            let _ = sync.import_on_startup().await;
        });
    }

    fn notify(&self, change: StateChange) {
        self.scheduler.notify_commit(change);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportDataResponse {
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportDataResponse {
    pub tasks: usize,
    pub projects: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectGitHubResponse {
    pub username: String,
    pub repositories: Vec<GitHubRepo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectRepoResponse {
    pub imported: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncNowResponse {
    pub sha: String,
}

#[allow(clippy::too_many_arguments)]
pub fn create_task_impl(
    state: &AppState,
    title: String,
    description: Option<String>,
    project_id: Option<String>,
    priority: Option<String>,
    due_date: Option<String>,
    estimated_time: Option<u32>,
    tags: Option<Vec<String>>,
    parent_id: Option<String>,
) -> Result<Task, InfraError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(InfraError::InvalidConfig(
            "title must not be empty".to_string(),
        ));
    }

    let new_task = NewTask {
        title: title.to_string(),
        description: description
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        project_id: project_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_PROJECT_ID)
            .to_string(),
        priority: match priority {
            Some(raw) => parse_priority(&raw)?,
            None => Priority::Medium,
        },
        due_date: match due_date {
            Some(raw) => Some(parse_datetime_input(&raw, "due_date")?),
            None => None,
        },
        estimated_time: estimated_time.unwrap_or(0),
        tags: tags.unwrap_or_default(),
    };

    let task = {
        let mut store = lock_store(state)?;
        match parent_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            Some(parent_id) => store.create_subtask(parent_id, new_task).ok_or_else(|| {
                InfraError::InvalidConfig(format!("parent task not found: {parent_id}"))
            })?,
            None => store.create_task(new_task),
        }
    };

    state.notify(StateChange::TaskData);
    state.log_info("create_task", &format!("created task_id={}", task.id));
    Ok(task)
}

#[allow(clippy::too_many_arguments)]
pub fn update_task_impl(
    state: &AppState,
    task_id: String,
    title: Option<String>,
    description: Option<String>,
    project_id: Option<String>,
    priority: Option<String>,
    status: Option<String>,
    due_date: Option<String>,
    estimated_time: Option<u32>,
    tags: Option<Vec<String>>,
) -> Result<Option<Task>, InfraError> {
    let task_id = task_id.trim();
    if task_id.is_empty() {
        return Err(InfraError::InvalidConfig(
            "task_id must not be empty".to_string(),
        ));
    }
    if let Some(title) = &title {
        if title.trim().is_empty() {
            return Err(InfraError::InvalidConfig(
                "title must not be empty".to_string(),
            ));
        }
    }

    let patch = TaskPatch {
        title: title.map(|value| value.trim().to_string()),
        description,
        project_id,
        priority: match priority {
            Some(raw) => Some(parse_priority(&raw)?),
            None => None,
        },
        status: match status {
            Some(raw) => Some(parse_task_status(&raw)?),
            None => None,
        },
        due_date: match due_date {
            Some(raw) => Some(parse_datetime_input(&raw, "due_date")?),
            None => None,
        },
        estimated_time,
        tags,
        ..TaskPatch::default()
    };

    let updated = {
        let mut store = lock_store(state)?;
        store.update_task(task_id, patch)
    };

    // An absent id is a silent no-op; nothing changed, nothing to sync.
    if updated.is_some() {
        state.notify(StateChange::TaskData);
        state.log_info("update_task", &format!("updated task_id={task_id}"));
    }
    Ok(updated)
}

pub fn delete_task_impl(state: &AppState, task_id: String) -> Result<bool, InfraError> {
    let task_id = task_id.trim();
    if task_id.is_empty() {
        return Err(InfraError::InvalidConfig(
            "task_id must not be empty".to_string(),
        ));
    }

    let removed = {
        let mut store = lock_store(state)?;
        store.delete_task(task_id)
    };
    if removed {
        state.notify(StateChange::TaskData);
        state.log_info("delete_task", &format!("deleted task_id={task_id}"));
    }
    Ok(removed)
}

pub fn toggle_task_complete_impl(
    state: &AppState,
    task_id: String,
) -> Result<Option<Task>, InfraError> {
    let updated = {
        let mut store = lock_store(state)?;
        store.toggle_complete(task_id.trim())
    };
    if let Some(task) = &updated {
        state.notify(StateChange::TaskData);
        state.log_info(
            "toggle_task_complete",
            &format!("task_id={} status={:?}", task.id, task.status),
        );
    }
    Ok(updated)
}

pub fn list_tasks_impl(state: &AppState) -> Result<Vec<Task>, InfraError> {
    let store = lock_store(state)?;
    Ok(store.state().tasks.clone())
}

pub fn create_project_impl(
    state: &AppState,
    name: String,
    color: String,
) -> Result<Project, InfraError> {
    let name = name.trim();
    let color = color.trim();
    if name.is_empty() {
        return Err(InfraError::InvalidConfig(
            "name must not be empty".to_string(),
        ));
    }
    if color.is_empty() {
        return Err(InfraError::InvalidConfig(
            "color must not be empty".to_string(),
        ));
    }

    let project = {
        let mut store = lock_store(state)?;
        store.create_project(name, color)
    };
    state.notify(StateChange::Other);
    state.log_info("create_project", &format!("created project_id={}", project.id));
    Ok(project)
}

pub fn update_project_impl(
    state: &AppState,
    project_id: String,
    name: Option<String>,
    color: Option<String>,
) -> Result<Option<Project>, InfraError> {
    if let Some(name) = &name {
        if name.trim().is_empty() {
            return Err(InfraError::InvalidConfig(
                "name must not be empty".to_string(),
            ));
        }
    }

    let updated = {
        let mut store = lock_store(state)?;
        store.update_project(
            project_id.trim(),
            ProjectPatch {
                name: name.map(|value| value.trim().to_string()),
                color: color.map(|value| value.trim().to_string()),
            },
        )
    };
    if updated.is_some() {
        state.notify(StateChange::Other);
        state.log_info("update_project", &format!("updated project_id={project_id}"));
    }
    Ok(updated)
}

/// Deleting a project also removes its top-level tasks; the bootstrap
/// project is refused.
pub fn delete_project_impl(state: &AppState, project_id: String) -> Result<bool, InfraError> {
    let removed = {
        let mut store = lock_store(state)?;
        store.delete_project(project_id.trim())
    };
    if removed {
        state.notify(StateChange::TaskData);
        state.log_info("delete_project", &format!("deleted project_id={project_id}"));
    }
    Ok(removed)
}

pub fn list_projects_impl(state: &AppState) -> Result<Vec<Project>, InfraError> {
    let store = lock_store(state)?;
    Ok(store.state().projects.clone())
}

pub fn start_timer_impl(state: &AppState, task_id: String) -> Result<TimerState, InfraError> {
    let task_id = task_id.trim();
    if task_id.is_empty() {
        return Err(InfraError::InvalidConfig(
            "task_id must not be empty".to_string(),
        ));
    }

    let timer = {
        let mut store = lock_store(state)?;
        store.start_timer(task_id);
        store.state().timer.clone()
    };
    state.notify(StateChange::TaskData);
    state.log_info("start_timer", &format!("started task_id={task_id}"));
    Ok(timer)
}

pub fn pause_timer_impl(state: &AppState) -> Result<TimerState, InfraError> {
    let timer = {
        let mut store = lock_store(state)?;
        if !store.pause_timer() {
            return Err(InfraError::InvalidConfig(
                "timer is not running".to_string(),
            ));
        }
        store.state().timer.clone()
    };
    state.notify(StateChange::TaskData);
    state.log_info("pause_timer", "paused active timer");
    Ok(timer)
}

pub fn resume_timer_impl(state: &AppState, task_id: String) -> Result<TimerState, InfraError> {
    let task_id = task_id.trim();
    let timer = {
        let mut store = lock_store(state)?;
        if !store.resume_timer(task_id) {
            return Err(InfraError::InvalidConfig(format!(
                "no paused timer for task: {task_id}"
            )));
        }
        store.state().timer.clone()
    };
    state.notify(StateChange::TaskData);
    state.log_info("resume_timer", &format!("resumed task_id={task_id}"));
    Ok(timer)
}

pub fn complete_task_impl(state: &AppState, task_id: String) -> Result<Task, InfraError> {
    let task_id = task_id.trim();
    let completed = {
        let mut store = lock_store(state)?;
        store.complete_task(task_id)
    };
    let Some(task) = completed else {
        return Err(InfraError::InvalidConfig(format!(
            "timer is not bound to task: {task_id}"
        )));
    };
    state.notify(StateChange::TaskData);
    state.log_info(
        "complete_task",
        &format!("completed task_id={task_id} actual_time={}", task.actual_time),
    );
    Ok(task)
}

pub fn cancel_task_impl(state: &AppState, task_id: String) -> Result<Option<Task>, InfraError> {
    let task_id = task_id.trim();
    let cancelled = {
        let mut store = lock_store(state)?;
        store.cancel_task(task_id)
    };
    if cancelled.is_some() {
        state.notify(StateChange::TaskData);
        state.log_info("cancel_task", &format!("cancelled task_id={task_id}"));
    }
    Ok(cancelled)
}

pub fn get_timer_state_impl(state: &AppState) -> Result<TimerState, InfraError> {
    let store = lock_store(state)?;
    Ok(store.state().timer.clone())
}

pub fn get_app_state_impl(state: &AppState) -> Result<AppModel, InfraError> {
    let store = lock_store(state)?;
    Ok(store.state().clone())
}

pub fn set_search_query_impl(state: &AppState, query: String) -> Result<(), InfraError> {
    dispatch_ui_action(state, Action::SetSearchQuery(query))
}

pub fn set_filter_priority_impl(state: &AppState, filter: String) -> Result<(), InfraError> {
    let filter = parse_priority_filter(&filter)?;
    dispatch_ui_action(state, Action::SetFilterPriority(filter))
}

pub fn set_filter_status_impl(state: &AppState, filter: String) -> Result<(), InfraError> {
    let filter = parse_status_filter(&filter)?;
    dispatch_ui_action(state, Action::SetFilterStatus(filter))
}

pub fn set_selected_project_impl(
    state: &AppState,
    project_id: Option<String>,
) -> Result<(), InfraError> {
    dispatch_ui_action(state, Action::SetSelectedProject(project_id))
}

pub fn set_selected_date_impl(state: &AppState, date: Option<String>) -> Result<(), InfraError> {
    let date = match date {
        Some(raw) => Some(parse_datetime_input(&raw, "date")?),
        None => None,
    };
    dispatch_ui_action(state, Action::SetSelectedDate(date))
}

pub fn set_view_mode_impl(state: &AppState, mode: String) -> Result<(), InfraError> {
    let mode = parse_view_mode(&mode)?;
    dispatch_ui_action(state, Action::SetViewMode(mode))
}

pub fn toggle_sidebar_impl(state: &AppState) -> Result<bool, InfraError> {
    dispatch_ui_action(state, Action::ToggleSidebar)?;
    let store = lock_store(state)?;
    Ok(store.state().sidebar_collapsed)
}

pub fn toggle_focus_mode_impl(state: &AppState) -> Result<bool, InfraError> {
    dispatch_ui_action(state, Action::ToggleFocusMode)?;
    let store = lock_store(state)?;
    Ok(store.state().focus_mode)
}

/// Full state as a download artifact; the token stays in because export
/// is a local, user-initiated action (unlike remote sync, which redacts).
pub fn export_data_impl(state: &AppState) -> Result<ExportDataResponse, InfraError> {
    let store = lock_store(state)?;
    let content = export_json(store.state())?;
    let file_name = export_file_name(store.now());
    Ok(ExportDataResponse { file_name, content })
}

pub fn import_data_impl(state: &AppState, json: String) -> Result<ImportDataResponse, InfraError> {
    let payload = parse_import(&json)?;
    let response = ImportDataResponse {
        tasks: payload.tasks.len(),
        projects: payload.projects.len(),
    };

    {
        let mut store = lock_store(state)?;
        store.dispatch(Action::ImportData {
            tasks: payload.tasks,
            projects: payload.projects,
        });
    }
    state.notify(StateChange::Other);
    state.log_info(
        "import_data",
        &format!("imported tasks={} projects={}", response.tasks, response.projects),
    );
    Ok(response)
}

pub fn time_entries_impl(state: &AppState) -> Result<Vec<TimeEntry>, InfraError> {
    let store = lock_store(state)?;
    Ok(store.time_entries())
}

pub fn tasks_for_date_impl(state: &AppState, date: String) -> Result<Vec<Task>, InfraError> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|error| InfraError::InvalidConfig(format!("date must be YYYY-MM-DD: {error}")))?;
    let store = lock_store(state)?;
    Ok(store.tasks_for_date(date))
}

pub async fn connect_github_impl(
    state: &AppState,
    token: String,
) -> Result<ConnectGitHubResponse, SyncError> {
    let summary = state.sync.connect(&token).await?;
    state.notify(StateChange::Other);
    state.log_info(
        "connect_github",
        &format!(
            "connected username={} repositories={}",
            summary.username,
            summary.repositories.len()
        ),
    );
    Ok(ConnectGitHubResponse {
        username: summary.username,
        repositories: summary.repositories,
    })
}

pub fn disconnect_github_impl(state: &AppState) -> Result<(), SyncError> {
    state.sync.disconnect()?;
    state.notify(StateChange::Other);
    state.log_info("disconnect_github", "disconnected");
    Ok(())
}

pub async fn select_github_repo_impl(
    state: &AppState,
    repo_full_name: String,
) -> Result<SelectRepoResponse, SyncError> {
    let outcome = state.sync.select_repository(repo_full_name.trim()).await?;
    state.notify(StateChange::Other);

    let response = match outcome {
        ImportCheckOutcome::Imported => SelectRepoResponse {
            imported: true,
            message: "Task data imported from GitHub.".to_string(),
        },
        ImportCheckOutcome::NoRemoteData => SelectRepoResponse {
            imported: false,
            message: "No existing task data in this repository.".to_string(),
        },
        ImportCheckOutcome::NotConnected => {
            return Err(SyncError {
                message: "Connect to GitHub first.".to_string(),
            });
        }
        // Import failures are reported, not thrown: the selection stands
        // and the error is already in the sync status.
        ImportCheckOutcome::Failed(message) => SelectRepoResponse {
            imported: false,
            message,
        },
    };
    state.log_info(
        "select_github_repo",
        &format!("repo={repo_full_name} imported={}", response.imported),
    );
    Ok(response)
}

pub async fn sync_to_github_impl(state: &AppState) -> Result<SyncNowResponse, SyncError> {
    let summary = state.sync.upload().await?;
    state.notify(StateChange::Other);
    state.log_info("sync_to_github", &format!("uploaded sha={}", summary.sha));
    Ok(SyncNowResponse { sha: summary.sha })
}

pub fn get_sync_status_impl(state: &AppState) -> Result<SyncStatus, InfraError> {
    let store = lock_store(state)?;
    Ok(store.state().github.sync_status.clone())
}

fn dispatch_ui_action(state: &AppState, action: Action) -> Result<(), InfraError> {
    {
        let mut store = lock_store(state)?;
        store.dispatch(action);
    }
    state.notify(StateChange::Other);
    Ok(())
}

fn lock_store(state: &AppState) -> Result<MutexGuard<'_, Store>, InfraError> {
    state
        .store
        .lock()
        .map_err(|error| InfraError::InvalidConfig(format!("state lock poisoned: {error}")))
}

fn parse_priority(value: &str) -> Result<Priority, InfraError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "low" => Ok(Priority::Low),
        "medium" => Ok(Priority::Medium),
        "high" => Ok(Priority::High),
        other => Err(InfraError::InvalidConfig(format!(
            "unsupported priority: {other}"
        ))),
    }
}

fn parse_task_status(value: &str) -> Result<TaskStatus, InfraError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "todo" => Ok(TaskStatus::Todo),
        "active" => Ok(TaskStatus::Active),
        "paused" => Ok(TaskStatus::Paused),
        "completed" => Ok(TaskStatus::Completed),
        "overdue" => Ok(TaskStatus::Overdue),
        other => Err(InfraError::InvalidConfig(format!(
            "unsupported task status: {other}"
        ))),
    }
}

fn parse_priority_filter(value: &str) -> Result<PriorityFilter, InfraError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "all" => Ok(PriorityFilter::All),
        "low" => Ok(PriorityFilter::Low),
        "medium" => Ok(PriorityFilter::Medium),
        "high" => Ok(PriorityFilter::High),
        other => Err(InfraError::InvalidConfig(format!(
            "unsupported priority filter: {other}"
        ))),
    }
}

fn parse_status_filter(value: &str) -> Result<StatusFilter, InfraError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "all" => Ok(StatusFilter::All),
        "todo" => Ok(StatusFilter::Todo),
        "active" => Ok(StatusFilter::Active),
        "paused" => Ok(StatusFilter::Paused),
        "completed" => Ok(StatusFilter::Completed),
        "overdue" => Ok(StatusFilter::Overdue),
        other => Err(InfraError::InvalidConfig(format!(
            "unsupported status filter: {other}"
        ))),
    }
}

fn parse_view_mode(value: &str) -> Result<ViewMode, InfraError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "tasks" => Ok(ViewMode::Tasks),
        "calendar" => Ok(ViewMode::Calendar),
        other => Err(InfraError::InvalidConfig(format!(
            "unsupported view mode: {other}"
        ))),
    }
}

fn parse_datetime_input(value: &str, field_name: &str) -> Result<DateTime<Utc>, InfraError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value.trim()) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("valid midnight")));
    }
    Err(InfraError::InvalidConfig(format!(
        "{field_name} must be RFC3339 or YYYY-MM-DD"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tokio::time::sleep;

    /// Workspace with millisecond-scale effect timings so debounce tests
    /// stay fast.
    fn prepared_workspace() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::create_dir_all(dir.path().join("config")).expect("config dir");
        fs::write(
            dir.path().join("config/settings.json"),
            "{\"schema\":1,\"persistDebounceMs\":20,\"autoSyncDelayMs\":20}",
        )
        .expect("settings");
        dir
    }

    fn app_state(dir: &tempfile::TempDir) -> AppState {
        AppState::new(dir.path().to_path_buf(), Handle::current()).expect("app state")
    }

    #[tokio::test]
    async fn bootstrap_falls_back_silently_on_corrupt_snapshot() {
        let dir = prepared_workspace();
        fs::create_dir_all(dir.path().join("state")).expect("state dir");
        fs::write(dir.path().join("state/taskflow-state.json"), "{ not json")
            .expect("write junk");

        let state = app_state(&dir);
        let tasks = list_tasks_impl(&state).expect("list tasks");
        assert!(tasks.is_empty());
        let projects = list_projects_impl(&state).expect("list projects");
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, DEFAULT_PROJECT_ID);
    }

    #[tokio::test]
    async fn edits_are_debounce_persisted_and_restored_next_launch() {
        let dir = prepared_workspace();
        {
            let state = app_state(&dir);
            create_task_impl(
                &state,
                "Survives restart".to_string(),
                None,
                None,
                None,
                None,
                Some(15),
                None,
                None,
            )
            .expect("create task");
            sleep(Duration::from_millis(120)).await;
        }

        let state = app_state(&dir);
        let tasks = list_tasks_impl(&state).expect("list tasks");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Survives restart");
        assert_eq!(tasks[0].estimated_time, 15);
    }

    #[tokio::test]
    async fn task_crud_flow() {
        let dir = prepared_workspace();
        let state = app_state(&dir);

        let task = create_task_impl(
            &state,
            "Write report".to_string(),
            Some("quarterly numbers".to_string()),
            None,
            Some("high".to_string()),
            Some("2026-08-10".to_string()),
            Some(60),
            Some(vec!["work".to_string()]),
            None,
        )
        .expect("create task");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.project_id, DEFAULT_PROJECT_ID);
        assert!(task.due_date.is_some());

        let updated = update_task_impl(
            &state,
            task.id.clone(),
            Some("Write the report".to_string()),
            None,
            None,
            None,
            Some("active".to_string()),
            None,
            None,
            None,
        )
        .expect("update task")
        .expect("task found");
        assert_eq!(updated.title, "Write the report");
        assert_eq!(updated.status, TaskStatus::Active);

        let ghost = update_task_impl(
            &state,
            "ghost".to_string(),
            Some("whatever".to_string()),
            None,
            None,
            None,
            None,
            None,
            None,
            None,
        )
        .expect("no-op update");
        assert!(ghost.is_none());

        assert!(delete_task_impl(&state, task.id.clone()).expect("delete"));
        assert!(!delete_task_impl(&state, task.id).expect("second delete"));
    }

    #[tokio::test]
    async fn subtasks_are_created_under_their_parent() {
        let dir = prepared_workspace();
        let state = app_state(&dir);

        let parent = create_task_impl(
            &state,
            "Parent".to_string(),
            None,
            None,
            None,
            None,
            None,
            None,
            None,
        )
        .expect("create parent");
        let child = create_task_impl(
            &state,
            "Child".to_string(),
            None,
            None,
            None,
            None,
            None,
            None,
            Some(parent.id.clone()),
        )
        .expect("create child");
        assert_eq!(child.parent_id.as_deref(), Some(parent.id.as_str()));

        let tasks = list_tasks_impl(&state).expect("list");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].subtasks.len(), 1);

        let orphan = create_task_impl(
            &state,
            "Orphan".to_string(),
            None,
            None,
            None,
            None,
            None,
            None,
            Some("missing-parent".to_string()),
        );
        assert!(orphan.is_err());
    }

    #[tokio::test]
    async fn project_lifecycle_and_bootstrap_guard() {
        let dir = prepared_workspace();
        let state = app_state(&dir);

        let project =
            create_project_impl(&state, "Work".to_string(), "#3B82F6".to_string()).expect("create");
        let renamed = update_project_impl(
            &state,
            project.id.clone(),
            Some("Deep Work".to_string()),
            None,
        )
        .expect("update")
        .expect("project found");
        assert_eq!(renamed.name, "Deep Work");
        assert_eq!(renamed.color, "#3B82F6");

        assert!(delete_project_impl(&state, project.id).expect("delete"));
        assert!(!delete_project_impl(&state, DEFAULT_PROJECT_ID.to_string())
            .expect("bootstrap project refused"));
    }

    #[tokio::test]
    async fn timer_command_flow() {
        let dir = prepared_workspace();
        let state = app_state(&dir);
        let task = create_task_impl(
            &state,
            "Focus".to_string(),
            None,
            None,
            None,
            None,
            Some(30),
            None,
            None,
        )
        .expect("create task");

        let timer = start_timer_impl(&state, task.id.clone()).expect("start");
        assert!(timer.is_running);
        assert_eq!(timer.current_task_id.as_deref(), Some(task.id.as_str()));

        let paused = pause_timer_impl(&state).expect("pause");
        assert!(paused.is_paused);
        assert!(pause_timer_impl(&state).is_err());

        let resumed = resume_timer_impl(&state, task.id.clone()).expect("resume");
        assert!(resumed.is_running);

        let completed = complete_task_impl(&state, task.id.clone()).expect("complete");
        assert!(matches!(
            completed.status,
            TaskStatus::Completed | TaskStatus::Overdue
        ));
        assert!(complete_task_impl(&state, task.id).is_err());

        let timer = get_timer_state_impl(&state).expect("timer state");
        assert!(!timer.is_running);
        assert_eq!(timer.current_task_id, None);
    }

    #[tokio::test]
    async fn export_import_roundtrip_through_commands() {
        let dir = prepared_workspace();
        let state = app_state(&dir);
        create_task_impl(
            &state,
            "Exported".to_string(),
            None,
            None,
            None,
            None,
            None,
            None,
            None,
        )
        .expect("create task");

        let export = export_data_impl(&state).expect("export");
        assert!(export.file_name.starts_with("taskflow-export-"));

        delete_task_impl(
            &state,
            list_tasks_impl(&state).expect("list")[0].id.clone(),
        )
        .expect("delete");
        assert!(list_tasks_impl(&state).expect("list").is_empty());

        let summary = import_data_impl(&state, export.content).expect("import");
        assert_eq!(summary.tasks, 1);
        let tasks = list_tasks_impl(&state).expect("list");
        assert_eq!(tasks[0].title, "Exported");
    }

    #[tokio::test]
    async fn malformed_import_reports_error_and_keeps_state() {
        let dir = prepared_workspace();
        let state = app_state(&dir);
        create_task_impl(
            &state,
            "Keep me".to_string(),
            None,
            None,
            None,
            None,
            None,
            None,
            None,
        )
        .expect("create task");

        assert!(import_data_impl(&state, "{\"tasks\": []}".to_string()).is_err());
        assert!(import_data_impl(&state, "garbage".to_string()).is_err());
        assert_eq!(list_tasks_impl(&state).expect("list").len(), 1);
    }

    #[tokio::test]
    async fn ui_filters_round_trip_through_state() {
        let dir = prepared_workspace();
        let state = app_state(&dir);

        set_search_query_impl(&state, "report".to_string()).expect("query");
        set_filter_priority_impl(&state, "high".to_string()).expect("priority");
        set_filter_status_impl(&state, "overdue".to_string()).expect("status");
        set_view_mode_impl(&state, "calendar".to_string()).expect("view");
        assert!(toggle_sidebar_impl(&state).expect("sidebar"));
        assert!(toggle_focus_mode_impl(&state).expect("focus"));
        assert!(set_filter_status_impl(&state, "bogus".to_string()).is_err());

        let model = get_app_state_impl(&state).expect("state");
        assert_eq!(model.search_query, "report");
        assert_eq!(model.filter_priority, PriorityFilter::High);
        assert_eq!(model.filter_status, StatusFilter::Overdue);
        assert_eq!(model.view_mode, ViewMode::Calendar);
        assert!(model.sidebar_collapsed);
        assert!(model.focus_mode);
    }

    #[tokio::test]
    async fn analytics_queries_reflect_completed_work() {
        let dir = prepared_workspace();
        let state = app_state(&dir);
        let task = create_task_impl(
            &state,
            "Measured".to_string(),
            None,
            None,
            None,
            None,
            Some(30),
            None,
            None,
        )
        .expect("create task");

        start_timer_impl(&state, task.id.clone()).expect("start");
        let completed = complete_task_impl(&state, task.id.clone()).expect("complete");
        assert!(completed.completed_at.is_some());

        let today = completed
            .completed_at
            .expect("completed at")
            .format("%Y-%m-%d")
            .to_string();
        let on_day = tasks_for_date_impl(&state, today).expect("tasks for date");
        assert_eq!(on_day.len(), 1);
        assert_eq!(on_day[0].id, task.id);

        assert!(tasks_for_date_impl(&state, "08/06/2026".to_string()).is_err());
    }

    #[tokio::test]
    async fn sync_status_starts_idle() {
        let dir = prepared_workspace();
        let state = app_state(&dir);
        let status = get_sync_status_impl(&state).expect("status");
        assert!(!status.is_loading);
        assert_eq!(status.last_sync, None);
        assert_eq!(status.error, None);
    }
}
