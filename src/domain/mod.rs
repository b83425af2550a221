pub mod models;
pub mod task_tree;
