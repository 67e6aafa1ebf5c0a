use std::time::Duration;

pub(crate) const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000/";
pub(crate) const BACKEND_URL_ENV: &str = "SAMPLE_MANAGER_BACKEND_URL";

pub(crate) const BACKEND_TIMEOUT_ENV: &str = "SAMPLE_MANAGER_BACKEND_TIMEOUT_MS";
pub(crate) const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 30_000;
pub(crate) const BACKEND_TIMEOUT_MIN_MS: u64 = 1_000;
pub(crate) const BACKEND_TIMEOUT_MAX_MS: u64 = 10 * 60 * 1000;

pub(crate) const READY_POLL_INTERVAL_ENV: &str = "SAMPLE_MANAGER_READY_POLL_INTERVAL_MS";
pub(crate) const DEFAULT_READY_POLL_INTERVAL_MS: u64 = 100;
pub(crate) const READY_POLL_INTERVAL_MIN_MS: u64 = 50;
pub(crate) const READY_POLL_INTERVAL_MAX_MS: u64 = 10_000;

pub(crate) const READY_PROBE_TIMEOUT_ENV: &str = "SAMPLE_MANAGER_READY_PROBE_TIMEOUT_MS";
pub(crate) const DEFAULT_READY_PROBE_TIMEOUT_MS: u64 = 1_000;
pub(crate) const READY_PROBE_TIMEOUT_MIN_MS: u64 = 100;
pub(crate) const READY_PROBE_TIMEOUT_MAX_MS: u64 = 30_000;

pub(crate) const BACKEND_CMD_ENV: &str = "SAMPLE_MANAGER_BACKEND_CMD";
pub(crate) const BACKEND_CWD_ENV: &str = "SAMPLE_MANAGER_BACKEND_CWD";
pub(crate) const SOURCE_DIR_ENV: &str = "SAMPLE_MANAGER_SOURCE_DIR";
pub(crate) const ROOT_DIR_ENV: &str = "SAMPLE_MANAGER_ROOT";
pub(crate) const CONFIG_PATH_ENV: &str = "SAMPLE_MANAGER_CONFIG_PATH";
pub(crate) const FFMPEG_PATH_ENV: &str = "FFMPEG_PATH";

pub(crate) const CONFIG_FILE_NAME: &str = "opz_sm_config.json";
pub(crate) const DEFAULT_ROOT_DIR_NAME: &str = ".opz-sample-manager";
pub(crate) const DESKTOP_LOG_FILE: &str = "desktop.log";
pub(crate) const BACKEND_LOG_FILE: &str = "backend.log";

pub(crate) const BACKEND_BINARY_NAME: &str = "opz-sm-backend";
pub(crate) const FFMPEG_BINARY_NAME: &str = "ffmpeg";

pub(crate) const MAIN_WINDOW_LABEL: &str = "main";
pub(crate) const SERVICE_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub(crate) const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(5);
