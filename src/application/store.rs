//! The state store: one owned [`AppModel`] plus a typed dispatch. All
//! mutation funnels through [`Store::dispatch`] into the pure reducer;
//! the store itself only adds entity construction (id/created-at
//! stamping) and read-only queries.

use crate::application::reducer::{reduce, Action};
use crate::domain::models::{
    AppModel, Priority, Project, ProjectPatch, Task, TaskPatch, TaskStatus, TimeEntry,
};
use crate::domain::task_tree;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque unique id: prefix, creation micros, process-wide sequence.
pub fn next_id(prefix: &str) -> String {
    let sequence = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{sequence}", Utc::now().timestamp_micros())
}

/// Caller-supplied fields for a new task; everything else is stamped by
/// the store at creation time.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub project_id: String,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_time: u32,
    pub tags: Vec<String>,
}

pub struct Store {
    state: AppModel,
    now_provider: NowProvider,
}

impl Store {
    pub fn new(state: AppModel, now_provider: NowProvider) -> Self {
        Self {
            state,
            now_provider,
        }
    }

    pub fn bootstrapped(now_provider: NowProvider) -> Self {
        let now = now_provider();
        Self::new(AppModel::bootstrap(now), now_provider)
    }

    pub fn state(&self) -> &AppModel {
        &self.state
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.now_provider)()
    }

    pub fn dispatch(&mut self, action: Action) {
        let now = self.now();
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action, now);
    }

    pub fn create_task(&mut self, new_task: NewTask) -> Task {
        let task = self.build_task(new_task, None);
        self.dispatch(Action::CreateTask(task.clone()));
        task
    }

    /// Inserts a subtask under `parent_id`. The reducer cannot express
    /// the nested insert atomically, so the store performs the tree
    /// mutation and commits it wholesale via `LoadState`.
    pub fn create_subtask(&mut self, parent_id: &str, new_task: NewTask) -> Option<Task> {
        if task_tree::find_task_by_id(&self.state.tasks, parent_id).is_none() {
            return None;
        }
        let subtask = self.build_task(new_task, Some(parent_id.to_string()));

        let mut next = self.state.clone();
        task_tree::insert_subtask(&mut next.tasks, parent_id, subtask.clone());
        self.dispatch(Action::LoadState(Box::new(next)));
        Some(subtask)
    }

    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> Option<Task> {
        self.dispatch(Action::UpdateTask {
            id: id.to_string(),
            patch,
        });
        task_tree::find_task_by_id(&self.state.tasks, id).cloned()
    }

    pub fn delete_task(&mut self, id: &str) -> bool {
        let existed = task_tree::find_task_by_id(&self.state.tasks, id).is_some();
        self.dispatch(Action::DeleteTask(id.to_string()));
        existed
    }

    pub fn create_project(&mut self, name: &str, color: &str) -> Project {
        let project = Project {
            id: next_id("prj"),
            name: name.to_string(),
            color: color.to_string(),
            created_at: self.now(),
            is_deletable: true,
        };
        self.dispatch(Action::CreateProject(project.clone()));
        project
    }

    pub fn update_project(&mut self, id: &str, patch: ProjectPatch) -> Option<Project> {
        self.dispatch(Action::UpdateProject {
            id: id.to_string(),
            patch,
        });
        self.state.projects.iter().find(|p| p.id == id).cloned()
    }

    /// Deletes a project unless it is the undeletable bootstrap project.
    /// Top-level tasks of the project are removed by the reducer cascade.
    pub fn delete_project(&mut self, id: &str) -> bool {
        let deletable = self
            .state
            .projects
            .iter()
            .any(|project| project.id == id && project.is_deletable);
        if !deletable {
            return false;
        }
        self.dispatch(Action::DeleteProject(id.to_string()));
        true
    }

    /// Time report rows, one per top-level task with recorded effort.
    pub fn time_entries(&self) -> Vec<TimeEntry> {
        let now = self.now();
        self.state
            .tasks
            .iter()
            .filter(|task| task.actual_time > 0)
            .map(|task| TimeEntry {
                id: next_id("ent"),
                task_id: task.id.clone(),
                start_time: task.created_at,
                end_time: task.completed_at.unwrap_or(now),
                duration: task.actual_time,
                date: task.created_at.format("%Y-%m-%d").to_string(),
            })
            .collect()
    }

    /// Calendar feed: every task (any depth) completed on `date`.
    pub fn tasks_for_date(&self, date: NaiveDate) -> Vec<Task> {
        task_tree::flatten(&self.state.tasks)
            .into_iter()
            .filter(|task| {
                task.completed_at
                    .map(|completed_at| completed_at.date_naive() == date)
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    fn build_task(&self, new_task: NewTask, parent_id: Option<String>) -> Task {
        Task {
            id: next_id("tsk"),
            title: new_task.title,
            description: new_task.description,
            project_id: new_task.project_id,
            priority: new_task.priority,
            status: TaskStatus::Todo,
            due_date: new_task.due_date,
            estimated_time: new_task.estimated_time,
            actual_time: 0,
            created_at: self.now(),
            completed_at: None,
            overdue_at: None,
            last_paused_at: None,
            paused_time: None,
            parent_id,
            subtasks: Vec::new(),
            tags: new_task.tags,
            is_overdue: false,
        }
    }
}
