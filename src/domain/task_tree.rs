//! Pure functions over the owned task forest. All mutation of subtask
//! lists goes through these helpers; a lookup miss is a silent no-op so
//! callers never have to pre-check existence.

use crate::domain::models::{Task, TaskPatch};

pub fn find_task_by_id<'a>(tasks: &'a [Task], id: &str) -> Option<&'a Task> {
    for task in tasks {
        if task.id == id {
            return Some(task);
        }
        if let Some(found) = find_task_by_id(&task.subtasks, id) {
            return Some(found);
        }
    }
    None
}

/// Shallow-merges `patch` into the task with `id`, wherever it sits in the
/// forest. Returns whether a node was touched.
pub fn update_task_by_id(tasks: &mut [Task], id: &str, patch: &TaskPatch) -> bool {
    for task in tasks {
        if task.id == id {
            patch.apply_to(task);
            return true;
        }
        if update_task_by_id(&mut task.subtasks, id, patch) {
            return true;
        }
    }
    false
}

/// Removes the task with `id` and, with it, its entire subtree. Returns
/// whether a node was removed.
pub fn delete_task_by_id(tasks: &mut Vec<Task>, id: &str) -> bool {
    let before = tasks.len();
    tasks.retain(|task| task.id != id);
    if tasks.len() != before {
        return true;
    }
    for task in tasks.iter_mut() {
        if delete_task_by_id(&mut task.subtasks, id) {
            return true;
        }
    }
    false
}

/// Appends `subtask` to the subtask list of `parent_id`. Returns whether
/// the parent was found.
pub fn insert_subtask(tasks: &mut [Task], parent_id: &str, subtask: Task) -> bool {
    for task in tasks {
        if task.id == parent_id {
            task.subtasks.push(subtask);
            return true;
        }
        if insert_subtask(&mut task.subtasks, parent_id, subtask.clone()) {
            return true;
        }
    }
    false
}

/// Pre-order traversal of every node in the forest.
pub fn flatten(tasks: &[Task]) -> Vec<&Task> {
    let mut result = Vec::new();
    for task in tasks {
        result.push(task);
        result.extend(flatten(&task.subtasks));
    }
    result
}

pub fn count_tasks(tasks: &[Task]) -> usize {
    tasks
        .iter()
        .map(|task| 1 + count_tasks(&task.subtasks))
        .sum()
}
