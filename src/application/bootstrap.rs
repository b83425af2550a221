use crate::infrastructure::config::ensure_default_configs;
use crate::infrastructure::error::InfraError;
use std::fs;
use std::path::{Path, PathBuf};

const SNAPSHOT_FILE: &str = "taskflow-state.json";

#[derive(Debug)]
pub struct BootstrapResult {
    pub workspace_root: PathBuf,
    pub snapshot_path: PathBuf,
}

pub fn bootstrap_workspace(workspace_root: &Path) -> Result<BootstrapResult, InfraError> {
    let config_dir = workspace_root.join("config");
    let state_dir = workspace_root.join("state");
    let logs_dir = workspace_root.join("logs");

    fs::create_dir_all(&config_dir)?;
    fs::create_dir_all(&state_dir)?;
    fs::create_dir_all(&logs_dir)?;

    ensure_default_configs(&config_dir)?;

    Ok(BootstrapResult {
        workspace_root: workspace_root.to_path_buf(),
        snapshot_path: state_dir.join(SNAPSHOT_FILE),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_creates_workspace_layout() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = bootstrap_workspace(dir.path()).expect("bootstrap");

        assert!(dir.path().join("config").is_dir());
        assert!(dir.path().join("state").is_dir());
        assert!(dir.path().join("logs").is_dir());
        assert!(dir.path().join("config/settings.json").is_file());
        assert_eq!(result.snapshot_path, dir.path().join("state").join(SNAPSHOT_FILE));
    }

    #[test]
    fn bootstrap_is_idempotent() {
        let dir = tempfile::tempdir().expect("temp dir");
        bootstrap_workspace(dir.path()).expect("first bootstrap");
        bootstrap_workspace(dir.path()).expect("second bootstrap");
    }
}
