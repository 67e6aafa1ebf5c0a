use std::{
    io,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing_subscriber::reload;

use crate::{
    config_tasks::ChangeTask,
    json_file::{read_json_from_path, write_json_to_path},
    logging::LogLevelHandle,
};

pub(crate) type ConfigMap = Map<String, Value>;

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error accessing config at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config JSON at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("config document at {} is not a JSON object", path.display())]
    NotAnObject { path: PathBuf },

    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("failed to apply log level: {0}")]
    LogReload(#[from] reload::Error),
}

/// Settings mapping mirrored by a JSON document on disk.
///
/// The mutex covers the mapping and the file together: every mutation that
/// persists writes the candidate mapping first and only commits it in memory
/// once the write succeeded, so the two never diverge.
#[derive(Debug)]
pub(crate) struct ConfigStore {
    path: PathBuf,
    entries: Mutex<ConfigMap>,
    log_level: LogLevelHandle,
}

impl ConfigStore {
    pub(crate) fn new(path: impl Into<PathBuf>, log_level: LogLevelHandle) -> Self {
        Self {
            path: path.into(),
            entries: Mutex::new(ConfigMap::new()),
            log_level,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn log_level(&self) -> &LogLevelHandle {
        &self.log_level
    }

    // Mutations commit only after their write succeeded, so a poisoned map is
    // still consistent with the file.
    fn entries(&self) -> MutexGuard<'_, ConfigMap> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the whole mapping with the file contents. A missing file
    /// leaves the mapping untouched.
    pub(crate) fn load(&self) -> Result<ConfigMap, ConfigError> {
        let mut entries = self.entries();
        let loaded = match read_json_from_path(&self.path) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(ConfigError::NotAnObject {
                    path: self.path.clone(),
                })
            }
            Err(ConfigError::NotFound { .. }) => return Ok(entries.clone()),
            Err(error) => return Err(error),
        };
        *entries = loaded;
        Ok(entries.clone())
    }

    pub(crate) fn save(&self) -> Result<(), ConfigError> {
        let entries = self.entries();
        write_json_to_path(&self.path, &*entries)
    }

    pub(crate) fn reset(&self) -> Result<ConfigMap, ConfigError> {
        let mut entries = self.entries();
        write_json_to_path(&self.path, &ConfigMap::new())?;
        entries.clear();
        Ok(entries.clone())
    }

    /// Returns the stored value; an empty string counts as unset.
    pub(crate) fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries();
        match entries.get(key) {
            Some(Value::String(text)) if text.is_empty() => None,
            Some(value) => Some(value.clone()),
            None => None,
        }
    }

    pub(crate) fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    pub(crate) fn set(
        &self,
        key: impl Into<String>,
        value: Value,
        persist: bool,
    ) -> Result<(), ConfigError> {
        let mut entries = self.entries();
        if !persist {
            entries.insert(key.into(), value);
            return Ok(());
        }

        let mut next = entries.clone();
        next.insert(key.into(), value);
        write_json_to_path(&self.path, &next)?;
        *entries = next;
        Ok(())
    }

    pub(crate) fn delete(&self, key: &str, persist: bool) -> Result<bool, ConfigError> {
        let mut entries = self.entries();
        if !entries.contains_key(key) {
            return Ok(false);
        }
        if !persist {
            entries.shift_remove(key);
            return Ok(true);
        }

        let mut next = entries.clone();
        next.shift_remove(key);
        write_json_to_path(&self.path, &next)?;
        *entries = next;
        Ok(true)
    }

    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> ConfigMap {
        self.entries().clone()
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.entries().keys().cloned().collect()
    }

    pub(crate) fn run_change_task(&self, key: &str) -> Result<(), ConfigError> {
        ChangeTask::for_key(key).run(self)
    }

    /// Runs the change task of every stored key in mapping order.
    pub(crate) fn run_all_change_tasks(&self) -> Result<(), ConfigError> {
        for key in self.keys() {
            self.run_change_task(&key)?;
        }
        Ok(())
    }
}
