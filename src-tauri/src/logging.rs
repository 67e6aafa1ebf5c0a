use std::{
    fmt,
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{format::Writer, time::FormatTime},
    layer::SubscriberExt,
    reload,
    util::SubscriberInitExt,
    Registry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DesktopLogCategory {
    Runtime,
    Startup,
    Shutdown,
    Config,
}

pub(crate) fn append_desktop_log(category: DesktopLogCategory, message: &str) {
    match category {
        DesktopLogCategory::Runtime => tracing::info!(target: "desktop", "{message}"),
        DesktopLogCategory::Startup => tracing::info!(target: "desktop::startup", "{message}"),
        DesktopLogCategory::Shutdown => tracing::info!(target: "desktop::shutdown", "{message}"),
        DesktopLogCategory::Config => tracing::info!(target: "desktop::config", "{message}"),
    }
}

pub(crate) fn resolve_desktop_log_path(root_dir: Option<PathBuf>, file_name: &str) -> PathBuf {
    match root_dir {
        Some(root) => root.join("logs").join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Parses a level name the way the settings page writes it (`"DEBUG"`,
/// `"warning"`, ...). Names are case-insensitive.
pub(crate) fn parse_log_level(raw: &str) -> Option<LevelFilter> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "TRACE" | "NOTSET" => Some(LevelFilter::TRACE),
        "DEBUG" => Some(LevelFilter::DEBUG),
        "INFO" => Some(LevelFilter::INFO),
        "WARN" | "WARNING" => Some(LevelFilter::WARN),
        "ERROR" | "CRITICAL" | "FATAL" => Some(LevelFilter::ERROR),
        _ => None,
    }
}

/// Controls the verbosity of the process-wide subscriber.
///
/// A handle created with [`LogLevelHandle::detached`] only records the level,
/// which keeps config tests independent from the global subscriber.
#[derive(Clone)]
pub(crate) struct LogLevelHandle {
    current: Arc<Mutex<LevelFilter>>,
    reload: Option<reload::Handle<LevelFilter, Registry>>,
}

impl fmt::Debug for LogLevelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogLevelHandle")
            .field("current", &self.current())
            .field("attached", &self.reload.is_some())
            .finish()
    }
}

impl LogLevelHandle {
    pub(crate) fn detached(initial: LevelFilter) -> Self {
        Self {
            current: Arc::new(Mutex::new(initial)),
            reload: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn attached(
        initial: LevelFilter,
        reload: reload::Handle<LevelFilter, Registry>,
    ) -> Self {
        Self {
            current: Arc::new(Mutex::new(initial)),
            reload: Some(reload),
        }
    }

    pub(crate) fn current(&self) -> LevelFilter {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn apply(&self, level: LevelFilter) -> Result<(), reload::Error> {
        if let Some(handle) = &self.reload {
            handle.reload(level)?;
        }
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = level;
        Ok(())
    }
}

struct DesktopLogTimer;

impl FormatTime for DesktopLogTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f")
        )
    }
}

fn open_log_file(log_path: &Path) -> Option<fs::File> {
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() && fs::create_dir_all(parent).is_err() {
            return None;
        }
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .ok()
}

/// Installs the global subscriber: stderr plus an optional append-only log
/// file, both behind one reloadable level filter.
pub(crate) fn init_logging(log_path: Option<&Path>, initial: LevelFilter) -> LogLevelHandle {
    let (filter, reload_handle) = reload::Layer::new(initial);
    let file_layer = log_path.and_then(open_log_file).map(|file| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_timer(DesktopLogTimer)
            .with_writer(Mutex::new(file))
    });
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_timer(DesktopLogTimer)
        .with_writer(std::io::stderr);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    LogLevelHandle {
        current: Arc::new(Mutex::new(initial)),
        reload: installed.then_some(reload_handle),
    }
}
