use crate::infrastructure::error::InfraError;
use std::fs;
use std::path::Path;
use std::time::Duration;

const SETTINGS_JSON: &str = "settings.json";

/// Timing knobs for the background effects. Values come from
/// `config/settings.json`; anything missing or malformed silently falls
/// back to the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeTuning {
    /// Quiet period before the debounced snapshot write.
    pub persist_debounce: Duration,
    /// Delay between a task mutation and its auto-sync upload.
    pub auto_sync_delay: Duration,
    /// Timer recomputation cadence.
    pub timer_tick: Duration,
    /// Overdue sweep cadence.
    pub overdue_sweep: Duration,
}

impl Default for RuntimeTuning {
    fn default() -> Self {
        Self {
            persist_debounce: Duration::from_millis(1_000),
            auto_sync_delay: Duration::from_millis(2_000),
            timer_tick: Duration::from_millis(1_000),
            overdue_sweep: Duration::from_millis(60_000),
        }
    }
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    let path = config_dir.join(SETTINGS_JSON);
    if !path.exists() {
        let defaults = serde_json::json!({
            "schema": 1,
            "persistDebounceMs": 1_000,
            "autoSyncDelayMs": 2_000,
            "timerTickMs": 1_000,
            "overdueSweepMs": 60_000
        });
        let formatted = serde_json::to_string_pretty(&defaults)?;
        fs::write(path, format!("{formatted}\n"))?;
    }
    Ok(())
}

pub fn load_runtime_tuning(config_dir: &Path) -> RuntimeTuning {
    let mut tuning = RuntimeTuning::default();
    let path = config_dir.join(SETTINGS_JSON);
    let Ok(raw) = fs::read_to_string(path) else {
        return tuning;
    };
    let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&raw) else {
        return tuning;
    };

    if let Some(value) = read_millis(&parsed, "persistDebounceMs") {
        tuning.persist_debounce = value;
    }
    if let Some(value) = read_millis(&parsed, "autoSyncDelayMs") {
        tuning.auto_sync_delay = value;
    }
    if let Some(value) = read_millis(&parsed, "timerTickMs") {
        tuning.timer_tick = value;
    }
    if let Some(value) = read_millis(&parsed, "overdueSweepMs") {
        tuning.overdue_sweep = value;
    }
    tuning
}

fn read_millis(parsed: &serde_json::Value, key: &str) -> Option<Duration> {
    parsed
        .get(key)
        .and_then(serde_json::Value::as_u64)
        .filter(|millis| *millis > 0)
        .map(Duration::from_millis)
}
