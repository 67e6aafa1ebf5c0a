use std::{path::Path, sync::Arc};

use serde_json::Value;
use tauri::State;

use crate::{
    append_desktop_log, config_store::ConfigStore, file_paths, BackendBridgeResult,
    BackendBridgeState, BackendState, BridgeValueResult,
};

fn validate_key(key: &str) -> Result<&str, String> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err("Missing config key.".to_string());
    }
    Ok(trimmed)
}

pub(crate) fn get_config_setting(
    store: &ConfigStore,
    key: &str,
    default_value: Option<Value>,
) -> BridgeValueResult {
    match validate_key(key) {
        Ok(key) => BridgeValueResult::value(store.get(key).or(default_value)),
        Err(reason) => BridgeValueResult::failure(reason),
    }
}

/// Persists the value, then runs the key's change task. Either failure is
/// reported to the caller.
pub(crate) fn set_config_setting(store: &ConfigStore, key: &str, value: Value) -> BackendBridgeResult {
    let key = match validate_key(key) {
        Ok(key) => key,
        Err(reason) => return BackendBridgeResult::failure(reason),
    };

    if let Err(error) = store.set(key, value, true) {
        append_desktop_log(&format!("failed to persist config setting {key}: {error}"));
        return BackendBridgeResult::failure(error.to_string());
    }
    if let Err(error) = store.run_change_task(key) {
        append_desktop_log(&format!("config change task for {key} failed: {error}"));
        return BackendBridgeResult::failure(error.to_string());
    }
    BackendBridgeResult::success()
}

pub(crate) fn delete_config_setting(store: &ConfigStore, key: &str) -> BridgeValueResult {
    let key = match validate_key(key) {
        Ok(key) => key,
        Err(reason) => return BridgeValueResult::failure(reason),
    };

    match store.delete(key, true) {
        Ok(removed) => BridgeValueResult::value(Some(Value::Bool(removed))),
        Err(error) => {
            append_desktop_log(&format!("failed to delete config setting {key}: {error}"));
            BridgeValueResult::failure(error.to_string())
        }
    }
}

pub(crate) fn reset_config(store: &ConfigStore) -> BackendBridgeResult {
    match store.reset() {
        Ok(_) => BackendBridgeResult::success(),
        Err(error) => {
            append_desktop_log(&format!("failed to reset config: {error}"));
            BackendBridgeResult::failure(error.to_string())
        }
    }
}

pub(crate) fn unique_file_path(raw_path: &str) -> BridgeValueResult {
    let trimmed = raw_path.trim();
    if trimmed.is_empty() {
        return BridgeValueResult::failure("Missing file path.");
    }
    let unique = file_paths::unique_file_path(Path::new(trimmed));
    BridgeValueResult::value(Some(Value::String(unique.to_string_lossy().to_string())))
}

#[tauri::command]
pub(crate) fn desktop_bridge_is_desktop_runtime() -> bool {
    true
}

#[tauri::command]
pub(crate) fn desktop_bridge_get_backend_state(state: State<'_, BackendState>) -> BackendBridgeState {
    state.bridge_state()
}

#[tauri::command]
pub(crate) fn desktop_bridge_get_config_setting(
    config: State<'_, Arc<ConfigStore>>,
    key: String,
    default_value: Option<Value>,
) -> BridgeValueResult {
    get_config_setting(&config, &key, default_value)
}

#[tauri::command]
pub(crate) fn desktop_bridge_set_config_setting(
    config: State<'_, Arc<ConfigStore>>,
    key: String,
    value: Value,
) -> BackendBridgeResult {
    set_config_setting(&config, &key, value)
}

#[tauri::command]
pub(crate) fn desktop_bridge_delete_config_setting(
    config: State<'_, Arc<ConfigStore>>,
    key: String,
) -> BridgeValueResult {
    delete_config_setting(&config, &key)
}

#[tauri::command]
pub(crate) fn desktop_bridge_reset_config(config: State<'_, Arc<ConfigStore>>) -> BackendBridgeResult {
    reset_config(&config)
}

#[tauri::command]
pub(crate) fn desktop_bridge_unique_file_path(path: String) -> BridgeValueResult {
    unique_file_path(&path)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tracing_subscriber::filter::LevelFilter;

    use super::*;
    use crate::{config_tasks::LOGGER_LEVEL_KEY, logging::LogLevelHandle};

    fn store(dir: &Path) -> ConfigStore {
        ConfigStore::new(
            dir.join("opz_sm_config.json"),
            LogLevelHandle::detached(LevelFilter::INFO),
        )
    }

    #[test]
    fn get_config_setting_falls_back_to_requested_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(dir.path());
        store.set("SIDEBAR_EXPANDED", json!(""), false).expect("set");

        let result = get_config_setting(&store, "SIDEBAR_EXPANDED", Some(json!(false)));
        assert_eq!(result, BridgeValueResult::value(Some(json!(false))));
        assert_eq!(
            get_config_setting(&store, "MISSING", None),
            BridgeValueResult::value(None)
        );
    }

    #[test]
    fn set_config_setting_persists_and_applies_change_task() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(dir.path());

        let result = set_config_setting(&store, LOGGER_LEVEL_KEY, json!("DEBUG"));
        assert_eq!(result, BackendBridgeResult::success());
        assert_eq!(store.log_level().current(), LevelFilter::DEBUG);
        assert!(fs::read_to_string(store.path())
            .expect("read")
            .contains("\"LOGGER_LEVEL\": \"DEBUG\""));
    }

    #[test]
    fn set_config_setting_reports_invalid_log_level() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(dir.path());

        let result = set_config_setting(&store, LOGGER_LEVEL_KEY, json!("LOUD"));
        assert!(!result.ok);
        assert_eq!(result.reason.as_deref(), Some("invalid log level: LOUD"));
    }

    #[test]
    fn set_config_setting_reports_write_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ConfigStore::new(dir.path(), LogLevelHandle::detached(LevelFilter::INFO));

        let result = set_config_setting(&store, "SIDEBAR_EXPANDED", json!(true));
        assert!(!result.ok);
        assert_eq!(store.get("SIDEBAR_EXPANDED"), None);
    }

    #[test]
    fn blank_keys_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(dir.path());

        assert!(!set_config_setting(&store, "  ", json!(1)).ok);
        assert!(!get_config_setting(&store, "", None).ok);
        assert!(!delete_config_setting(&store, "").ok);
    }

    #[test]
    fn delete_and_reset_report_outcomes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(dir.path());
        set_config_setting(&store, "A", json!(1));

        assert_eq!(
            delete_config_setting(&store, "A"),
            BridgeValueResult::value(Some(json!(true)))
        );
        assert_eq!(
            delete_config_setting(&store, "A"),
            BridgeValueResult::value(Some(json!(false)))
        );
        assert_eq!(reset_config(&store), BackendBridgeResult::success());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn unique_file_path_returns_next_free_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let taken = dir.path().join("op1_tape_track_1.aif");
        fs::write(&taken, b"").expect("seed");

        let result = unique_file_path(&taken.to_string_lossy());
        assert_eq!(
            result.value,
            Some(Value::String(
                dir.path()
                    .join("op1_tape_track_1_1.aif")
                    .to_string_lossy()
                    .to_string()
            ))
        );
        assert!(!unique_file_path(" ").ok);
    }
}
