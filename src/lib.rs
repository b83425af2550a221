mod application;
mod domain;
mod infrastructure;

use application::commands::{
    cancel_task_impl, complete_task_impl, connect_github_impl, create_project_impl,
    create_task_impl, delete_project_impl, delete_task_impl, disconnect_github_impl,
    export_data_impl, get_app_state_impl, get_sync_status_impl, get_timer_state_impl,
    import_data_impl, list_projects_impl, list_tasks_impl, pause_timer_impl, resume_timer_impl,
    select_github_repo_impl, set_filter_priority_impl, set_filter_status_impl,
    set_search_query_impl, set_selected_date_impl, set_selected_project_impl, set_view_mode_impl,
    start_timer_impl, sync_to_github_impl, tasks_for_date_impl, time_entries_impl,
    toggle_focus_mode_impl, toggle_sidebar_impl, toggle_task_complete_impl, update_project_impl,
    update_task_impl, AppState, ConnectGitHubResponse, ExportDataResponse, ImportDataResponse,
    SelectRepoResponse, SyncNowResponse,
};
use domain::models::{AppModel, Project, SyncStatus, Task, TimeEntry, TimerState};

#[tauri::command]
fn ping() -> &'static str {
    "pong"
}

#[tauri::command]
fn list_tasks(state: tauri::State<'_, AppState>) -> Result<Vec<Task>, String> {
    list_tasks_impl(state.inner()).map_err(|error| state.command_error("list_tasks", &error))
}

#[tauri::command]
#[allow(clippy::too_many_arguments)]
fn create_task(
    state: tauri::State<'_, AppState>,
    title: String,
    description: Option<String>,
    project_id: Option<String>,
    priority: Option<String>,
    due_date: Option<String>,
    estimated_time: Option<u32>,
    tags: Option<Vec<String>>,
    parent_id: Option<String>,
) -> Result<Task, String> {
    create_task_impl(
        state.inner(),
        title,
        description,
        project_id,
        priority,
        due_date,
        estimated_time,
        tags,
        parent_id,
    )
    .map_err(|error| state.command_error("create_task", &error))
}

#[tauri::command]
#[allow(clippy::too_many_arguments)]
fn update_task(
    state: tauri::State<'_, AppState>,
    task_id: String,
    title: Option<String>,
    description: Option<String>,
    project_id: Option<String>,
    priority: Option<String>,
    status: Option<String>,
    due_date: Option<String>,
    estimated_time: Option<u32>,
    tags: Option<Vec<String>>,
) -> Result<Option<Task>, String> {
    update_task_impl(
        state.inner(),
        task_id,
        title,
        description,
        project_id,
        priority,
        status,
        due_date,
        estimated_time,
        tags,
    )
    .map_err(|error| state.command_error("update_task", &error))
}

#[tauri::command]
fn delete_task(state: tauri::State<'_, AppState>, task_id: String) -> Result<bool, String> {
    delete_task_impl(state.inner(), task_id)
        .map_err(|error| state.command_error("delete_task", &error))
}

#[tauri::command]
fn toggle_task_complete(
    state: tauri::State<'_, AppState>,
    task_id: String,
) -> Result<Option<Task>, String> {
    toggle_task_complete_impl(state.inner(), task_id)
        .map_err(|error| state.command_error("toggle_task_complete", &error))
}

#[tauri::command]
fn list_projects(state: tauri::State<'_, AppState>) -> Result<Vec<Project>, String> {
    list_projects_impl(state.inner()).map_err(|error| state.command_error("list_projects", &error))
}

#[tauri::command]
fn create_project(
    state: tauri::State<'_, AppState>,
    name: String,
    color: String,
) -> Result<Project, String> {
    create_project_impl(state.inner(), name, color)
        .map_err(|error| state.command_error("create_project", &error))
}

#[tauri::command]
fn update_project(
    state: tauri::State<'_, AppState>,
    project_id: String,
    name: Option<String>,
    color: Option<String>,
) -> Result<Option<Project>, String> {
    update_project_impl(state.inner(), project_id, name, color)
        .map_err(|error| state.command_error("update_project", &error))
}

#[tauri::command]
fn delete_project(state: tauri::State<'_, AppState>, project_id: String) -> Result<bool, String> {
    delete_project_impl(state.inner(), project_id)
        .map_err(|error| state.command_error("delete_project", &error))
}

#[tauri::command]
fn start_timer(state: tauri::State<'_, AppState>, task_id: String) -> Result<TimerState, String> {
    start_timer_impl(state.inner(), task_id)
        .map_err(|error| state.command_error("start_timer", &error))
}

#[tauri::command]
fn pause_timer(state: tauri::State<'_, AppState>) -> Result<TimerState, String> {
    pause_timer_impl(state.inner()).map_err(|error| state.command_error("pause_timer", &error))
}

#[tauri::command]
fn resume_timer(state: tauri::State<'_, AppState>, task_id: String) -> Result<TimerState, String> {
    resume_timer_impl(state.inner(), task_id)
        .map_err(|error| state.command_error("resume_timer", &error))
}

#[tauri::command]
fn complete_task(state: tauri::State<'_, AppState>, task_id: String) -> Result<Task, String> {
    complete_task_impl(state.inner(), task_id)
        .map_err(|error| state.command_error("complete_task", &error))
}

#[tauri::command]
fn cancel_task(state: tauri::State<'_, AppState>, task_id: String) -> Result<Option<Task>, String> {
    cancel_task_impl(state.inner(), task_id)
        .map_err(|error| state.command_error("cancel_task", &error))
}

#[tauri::command]
fn get_timer_state(state: tauri::State<'_, AppState>) -> Result<TimerState, String> {
    get_timer_state_impl(state.inner())
        .map_err(|error| state.command_error("get_timer_state", &error))
}

#[tauri::command]
fn get_app_state(state: tauri::State<'_, AppState>) -> Result<AppModel, String> {
    get_app_state_impl(state.inner())
        .map_err(|error| state.command_error("get_app_state", &error))
}

#[tauri::command]
fn set_search_query(state: tauri::State<'_, AppState>, query: String) -> Result<(), String> {
    set_search_query_impl(state.inner(), query)
        .map_err(|error| state.command_error("set_search_query", &error))
}

#[tauri::command]
fn set_filter_priority(state: tauri::State<'_, AppState>, filter: String) -> Result<(), String> {
    set_filter_priority_impl(state.inner(), filter)
        .map_err(|error| state.command_error("set_filter_priority", &error))
}

#[tauri::command]
fn set_filter_status(state: tauri::State<'_, AppState>, filter: String) -> Result<(), String> {
    set_filter_status_impl(state.inner(), filter)
        .map_err(|error| state.command_error("set_filter_status", &error))
}

#[tauri::command]
fn set_selected_project(
    state: tauri::State<'_, AppState>,
    project_id: Option<String>,
) -> Result<(), String> {
    set_selected_project_impl(state.inner(), project_id)
        .map_err(|error| state.command_error("set_selected_project", &error))
}

#[tauri::command]
fn set_selected_date(
    state: tauri::State<'_, AppState>,
    date: Option<String>,
) -> Result<(), String> {
    set_selected_date_impl(state.inner(), date)
        .map_err(|error| state.command_error("set_selected_date", &error))
}

#[tauri::command]
fn set_view_mode(state: tauri::State<'_, AppState>, mode: String) -> Result<(), String> {
    set_view_mode_impl(state.inner(), mode)
        .map_err(|error| state.command_error("set_view_mode", &error))
}

#[tauri::command]
fn toggle_sidebar(state: tauri::State<'_, AppState>) -> Result<bool, String> {
    toggle_sidebar_impl(state.inner())
        .map_err(|error| state.command_error("toggle_sidebar", &error))
}

#[tauri::command]
fn toggle_focus_mode(state: tauri::State<'_, AppState>) -> Result<bool, String> {
    toggle_focus_mode_impl(state.inner())
        .map_err(|error| state.command_error("toggle_focus_mode", &error))
}

#[tauri::command]
fn export_data(state: tauri::State<'_, AppState>) -> Result<ExportDataResponse, String> {
    export_data_impl(state.inner()).map_err(|error| state.command_error("export_data", &error))
}

#[tauri::command]
fn import_data(
    state: tauri::State<'_, AppState>,
    json: String,
) -> Result<ImportDataResponse, String> {
    import_data_impl(state.inner(), json)
        .map_err(|error| state.command_error("import_data", &error))
}

#[tauri::command]
fn time_entries(state: tauri::State<'_, AppState>) -> Result<Vec<TimeEntry>, String> {
    time_entries_impl(state.inner()).map_err(|error| state.command_error("time_entries", &error))
}

#[tauri::command]
fn tasks_for_date(state: tauri::State<'_, AppState>, date: String) -> Result<Vec<Task>, String> {
    tasks_for_date_impl(state.inner(), date)
        .map_err(|error| state.command_error("tasks_for_date", &error))
}

#[tauri::command]
async fn connect_github(
    state: tauri::State<'_, AppState>,
    token: String,
) -> Result<ConnectGitHubResponse, String> {
    connect_github_impl(state.inner(), token)
        .await
        .map_err(|error| state.sync_command_error("connect_github", &error))
}

#[tauri::command]
fn disconnect_github(state: tauri::State<'_, AppState>) -> Result<(), String> {
    disconnect_github_impl(state.inner())
        .map_err(|error| state.sync_command_error("disconnect_github", &error))
}

#[tauri::command]
async fn select_github_repo(
    state: tauri::State<'_, AppState>,
    repo_full_name: String,
) -> Result<SelectRepoResponse, String> {
    select_github_repo_impl(state.inner(), repo_full_name)
        .await
        .map_err(|error| state.sync_command_error("select_github_repo", &error))
}

#[tauri::command]
async fn sync_to_github(state: tauri::State<'_, AppState>) -> Result<SyncNowResponse, String> {
    sync_to_github_impl(state.inner())
        .await
        .map_err(|error| state.sync_command_error("sync_to_github", &error))
}

#[tauri::command]
fn get_sync_status(state: tauri::State<'_, AppState>) -> Result<SyncStatus, String> {
    get_sync_status_impl(state.inner())
        .map_err(|error| state.command_error("get_sync_status", &error))
}

pub fn run() {
    let runtime = tokio::runtime::Runtime::new().expect("failed to build tokio runtime");
    tauri::async_runtime::set(runtime.handle().clone());

    let workspace_root = std::env::current_dir().expect("failed to resolve current directory");
    let app_state = AppState::new(workspace_root, runtime.handle().clone())
        .expect("failed to initialize app state");
    app_state.spawn_background_loops(runtime.handle());

    tauri::Builder::default()
        .manage(app_state)
        .invoke_handler(tauri::generate_handler![
            ping,
            list_tasks,
            create_task,
            update_task,
            delete_task,
            toggle_task_complete,
            list_projects,
            create_project,
            update_project,
            delete_project,
            start_timer,
            pause_timer,
            resume_timer,
            complete_task,
            cancel_task,
            get_timer_state,
            get_app_state,
            set_search_query,
            set_filter_priority,
            set_filter_status,
            set_selected_project,
            set_selected_date,
            set_view_mode,
            toggle_sidebar,
            toggle_focus_mode,
            export_data,
            import_data,
            time_entries,
            tasks_for_date,
            connect_github,
            disconnect_github,
            select_github_repo,
            sync_to_github,
            get_sync_status
        ])
        .run(tauri::generate_context!())
        .expect("failed to run tauri app");
}
