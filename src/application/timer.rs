//! Timer lifecycle operations. Each is a composite of a task-field
//! update and a timer transition, expressed through the reducer so the
//! store stays the single mutation path.
//!
//! `pause_timer` and `complete_task` dispatch a tick first: elapsed time
//! is recomputed from absolute timestamps at the instant of the
//! operation, not read from the last periodic tick.

use crate::application::reducer::Action;
use crate::application::store::Store;
use crate::domain::models::{Task, TaskPatch, TaskStatus, TimerPatch};
use crate::domain::task_tree;

impl Store {
    /// Binds the timer to `task_id` as a fresh running segment and marks
    /// the task active. Starting while another task is running abandons
    /// that segment: the previous task keeps its `active` status with no
    /// timer backing it.
    pub fn start_timer(&mut self, task_id: &str) {
        let now = self.now();
        self.dispatch(Action::UpdateTask {
            id: task_id.to_string(),
            patch: TaskPatch {
                status: Some(TaskStatus::Active),
                ..TaskPatch::default()
            },
        });
        self.dispatch(Action::SetTimer(TimerPatch::running_segment(task_id, now)));
    }

    /// Parks the running task. Returns false when nothing is running.
    pub fn pause_timer(&mut self) -> bool {
        if !self.state().timer.is_running {
            return false;
        }
        let Some(task_id) = self.state().timer.current_task_id.clone() else {
            return false;
        };

        self.dispatch(Action::TickTimer);
        let elapsed = self.state().timer.elapsed_time;
        let now = self.now();

        self.dispatch(Action::PauseTimer);
        self.dispatch(Action::UpdateTask {
            id: task_id,
            patch: TaskPatch {
                status: Some(TaskStatus::Paused),
                paused_time: Some(elapsed as u32),
                last_paused_at: Some(now),
                ..TaskPatch::default()
            },
        });
        true
    }

    /// Resumes a parked task. Returns false when no snapshot exists for
    /// `task_id`.
    pub fn resume_timer(&mut self, task_id: &str) -> bool {
        if !self.state().timer.paused_tasks.contains_key(task_id) {
            return false;
        }
        self.dispatch(Action::ResumeTimer(task_id.to_string()));
        self.dispatch(Action::UpdateTask {
            id: task_id.to_string(),
            patch: TaskPatch {
                status: Some(TaskStatus::Active),
                ..TaskPatch::default()
            },
        });
        true
    }

    /// Books the timer's elapsed time onto the task and resets the timer
    /// to idle. Only takes effect when the timer is bound to `task_id`.
    pub fn complete_task(&mut self, task_id: &str) -> Option<Task> {
        if self.state().timer.current_task_id.as_deref() != Some(task_id) {
            return None;
        }

        self.dispatch(Action::TickTimer);
        let additional_minutes = (self.state().timer.elapsed_time / 60) as u32;
        let task = task_tree::find_task_by_id(&self.state().tasks, task_id)?;
        let status = if task.is_overdue {
            TaskStatus::Overdue
        } else {
            TaskStatus::Completed
        };
        let actual_time = task.actual_time + additional_minutes;
        let now = self.now();

        self.dispatch(Action::UpdateTask {
            id: task_id.to_string(),
            patch: TaskPatch {
                status: Some(status),
                actual_time: Some(actual_time),
                completed_at: Some(now),
                ..TaskPatch::default()
            },
        });
        self.dispatch(Action::SetTimer(TimerPatch::idle()));
        task_tree::find_task_by_id(&self.state().tasks, task_id).cloned()
    }

    /// Returns the task to `todo`. When it was the bound timer task the
    /// timer resets to idle and the accumulated time is discarded.
    pub fn cancel_task(&mut self, task_id: &str) -> Option<Task> {
        self.dispatch(Action::UpdateTask {
            id: task_id.to_string(),
            patch: TaskPatch {
                status: Some(TaskStatus::Todo),
                ..TaskPatch::default()
            },
        });
        if self.state().timer.current_task_id.as_deref() == Some(task_id) {
            self.dispatch(Action::SetTimer(TimerPatch::idle()));
        }
        task_tree::find_task_by_id(&self.state().tasks, task_id).cloned()
    }

    /// Manual completion toggle. A non-completed task moves to `overdue`
    /// when it was ever overdue, else to `completed`; a completed task
    /// returns unconditionally to `todo`.
    pub fn toggle_complete(&mut self, task_id: &str) -> Option<Task> {
        let task = task_tree::find_task_by_id(&self.state().tasks, task_id)?;
        let patch = if task.status == TaskStatus::Completed {
            TaskPatch {
                status: Some(TaskStatus::Todo),
                ..TaskPatch::default()
            }
        } else {
            TaskPatch {
                status: Some(if task.is_overdue {
                    TaskStatus::Overdue
                } else {
                    TaskStatus::Completed
                }),
                completed_at: Some(self.now()),
                ..TaskPatch::default()
            }
        };
        self.dispatch(Action::UpdateTask {
            id: task_id.to_string(),
            patch,
        });
        task_tree::find_task_by_id(&self.state().tasks, task_id).cloned()
    }

    pub fn tick(&mut self) {
        self.dispatch(Action::TickTimer);
    }

    pub fn check_overdue(&mut self) {
        self.dispatch(Action::CheckOverdueTasks);
    }
}
