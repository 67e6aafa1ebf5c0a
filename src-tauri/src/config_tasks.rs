use serde_json::Value;

use crate::{
    config_store::{ConfigError, ConfigStore},
    logging::parse_log_level,
};

pub(crate) const LOGGER_LEVEL_KEY: &str = "LOGGER_LEVEL";
pub(crate) const DEFAULT_LOGGER_LEVEL: &str = "INFO";

/// Side effect bound to a config key. Keys without one map to `Noop` and are
/// stored but otherwise inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChangeTask {
    ApplyLoggerLevel,
    Noop,
}

impl ChangeTask {
    pub(crate) fn for_key(key: &str) -> Self {
        match key {
            LOGGER_LEVEL_KEY => Self::ApplyLoggerLevel,
            _ => Self::Noop,
        }
    }

    pub(crate) fn run(self, store: &ConfigStore) -> Result<(), ConfigError> {
        match self {
            Self::ApplyLoggerLevel => apply_logger_level(store),
            Self::Noop => Ok(()),
        }
    }
}

fn apply_logger_level(store: &ConfigStore) -> Result<(), ConfigError> {
    let value = store.get_or(
        LOGGER_LEVEL_KEY,
        Value::String(DEFAULT_LOGGER_LEVEL.to_string()),
    );
    let Some(name) = value.as_str() else {
        return Err(ConfigError::InvalidValue {
            key: LOGGER_LEVEL_KEY.to_string(),
            reason: format!("expected a level name, got {value}"),
        });
    };
    let level =
        parse_log_level(name).ok_or_else(|| ConfigError::InvalidLogLevel(name.to_uppercase()))?;

    store.log_level().apply(level)?;
    tracing::debug!(target: "desktop::config", %level, "log verbosity updated");
    Ok(())
}
