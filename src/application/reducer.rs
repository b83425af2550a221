//! The pure transition function. Every state change in the app flows
//! through [`reduce`]; the current instant is a parameter so the function
//! owns no clock and replays deterministically in tests.

use crate::domain::models::{
    AppModel, GitHubRepo, GitHubState, PausedTaskSnapshot, PriorityFilter, Project, ProjectPatch,
    StatusFilter, SyncStatus, SyncStatusPatch, Task, TaskPatch, TaskStatus, TimerPatch, ViewMode,
};
use crate::domain::task_tree;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub enum Action {
    CreateTask(Task),
    UpdateTask { id: String, patch: TaskPatch },
    DeleteTask(String),
    CreateProject(Project),
    UpdateProject { id: String, patch: ProjectPatch },
    DeleteProject(String),
    SetTimer(TimerPatch),
    PauseTimer,
    ResumeTimer(String),
    TickTimer,
    CheckOverdueTasks,
    SetSelectedProject(Option<String>),
    SetSearchQuery(String),
    SetFilterPriority(PriorityFilter),
    SetFilterStatus(StatusFilter),
    SetSelectedDate(Option<DateTime<Utc>>),
    SetViewMode(ViewMode),
    ToggleSidebar,
    ToggleFocusMode,
    LoadState(Box<AppModel>),
    ImportData {
        tasks: Vec<Task>,
        projects: Vec<Project>,
    },
    SetGitHubConnection {
        token: String,
        username: String,
        repositories: Vec<GitHubRepo>,
    },
    DisconnectGitHub,
    SelectGitHubRepo(String),
    SetSyncStatus(SyncStatusPatch),
}

pub fn reduce(mut state: AppModel, action: Action, now: DateTime<Utc>) -> AppModel {
    match action {
        Action::CreateTask(task) => {
            state.tasks.push(task);
        }
        Action::UpdateTask { id, patch } => {
            task_tree::update_task_by_id(&mut state.tasks, &id, &patch);
        }
        Action::DeleteTask(id) => {
            task_tree::delete_task_by_id(&mut state.tasks, &id);
        }
        Action::CreateProject(project) => {
            state.projects.push(project);
        }
        Action::UpdateProject { id, patch } => {
            if let Some(project) = state.projects.iter_mut().find(|p| p.id == id) {
                patch.apply_to(project);
            }
        }
        Action::DeleteProject(id) => {
            state.projects.retain(|project| project.id != id);
            // The cascade covers top-level tasks only; subtasks of a
            // surviving parent keep their project id.
            state.tasks.retain(|task| task.project_id != id);
        }
        Action::SetTimer(patch) => {
            patch.apply_to(&mut state.timer);
        }
        Action::PauseTimer => {
            if state.timer.is_running {
                if let Some(task_id) = state.timer.current_task_id.clone() {
                    state.timer.paused_tasks.insert(
                        task_id,
                        PausedTaskSnapshot {
                            elapsed_time: state.timer.elapsed_time,
                            paused_at: now,
                        },
                    );
                    state.timer.is_running = false;
                    state.timer.is_paused = true;
                }
            }
        }
        Action::ResumeTimer(task_id) => {
            if let Some(snapshot) = state.timer.paused_tasks.remove(&task_id) {
                state.timer.elapsed_time = snapshot.elapsed_time;
                state.timer.start_time = Some(now);
                // Offset in milliseconds so future ticks continue from the
                // snapshot instead of restarting at zero.
                state.timer.paused_time = snapshot.elapsed_time * 1000;
                state.timer.current_task_id = Some(task_id);
                state.timer.is_running = true;
                state.timer.is_paused = false;
            }
        }
        Action::TickTimer => {
            if state.timer.is_running {
                if let Some(start) = state.timer.start_time {
                    let running_ms = (now - start).num_milliseconds().max(0) as u64;
                    state.timer.elapsed_time = (running_ms + state.timer.paused_time) / 1000;
                }
            }
        }
        Action::CheckOverdueTasks => {
            // Scans top-level tasks only; `is_overdue` makes the sweep
            // run at most once per violation.
            for task in &mut state.tasks {
                if task.status == TaskStatus::Active && !task.is_overdue {
                    if let Some(due_date) = task.due_date {
                        if now > due_date {
                            task.status = TaskStatus::Overdue;
                            task.is_overdue = true;
                            task.overdue_at = Some(now);
                        }
                    }
                }
            }
        }
        Action::SetSelectedProject(project_id) => {
            state.selected_project = project_id;
        }
        Action::SetSearchQuery(query) => {
            state.search_query = query;
        }
        Action::SetFilterPriority(filter) => {
            state.filter_priority = filter;
        }
        Action::SetFilterStatus(filter) => {
            state.filter_status = filter;
        }
        Action::SetSelectedDate(date) => {
            state.selected_date = date;
        }
        Action::SetViewMode(mode) => {
            state.view_mode = mode;
        }
        Action::ToggleSidebar => {
            state.sidebar_collapsed = !state.sidebar_collapsed;
        }
        Action::ToggleFocusMode => {
            state.focus_mode = !state.focus_mode;
        }
        Action::LoadState(full) => {
            state = *full;
        }
        Action::ImportData { tasks, projects } => {
            state.tasks = tasks;
            state.projects = projects;
        }
        Action::SetGitHubConnection {
            token,
            username,
            repositories,
        } => {
            // The user must explicitly pick a repository after connecting.
            state.github = GitHubState {
                is_connected: true,
                token: Some(token),
                username: Some(username),
                selected_repo: None,
                repositories,
                sync_status: SyncStatus::default(),
            };
        }
        Action::DisconnectGitHub => {
            state.github = GitHubState::default();
        }
        Action::SelectGitHubRepo(repo) => {
            state.github.selected_repo = Some(repo);
        }
        Action::SetSyncStatus(patch) => {
            patch.apply_to(&mut state.github.sync_status);
        }
    }
    state
}
