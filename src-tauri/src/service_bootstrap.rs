use std::{
    any::Any,
    io,
    panic::{self, AssertUnwindSafe},
    process::ExitStatus,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use thiserror::Error;

use crate::config_store::ConfigError;

const SHUTDOWN_SLEEP_SLICE: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
pub(crate) enum ServiceError {
    #[error("service startup tasks failed: {0}")]
    Startup(#[from] ConfigError),

    #[error("failed to launch backend: {0}")]
    Launch(String),

    #[error("backend process exited: {0}")]
    Exited(ExitStatus),

    #[error("backend process I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Shared stop flag for the bootstrap threads.
#[derive(Debug, Clone, Default)]
pub(crate) struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn trigger(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub(crate) fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Sleeps for `duration` unless shutdown is requested first. Returns
    /// whether shutdown was requested.
    pub(crate) fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_triggered() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep((deadline - now).min(SHUTDOWN_SLEEP_SLICE));
        }
    }
}

/// A long-running service started off the UI thread.
pub(crate) trait BackgroundService: Send + 'static {
    fn name(&self) -> &str;

    /// Runs once before `serve`; a failure means `serve` never runs.
    fn startup_tasks(&mut self) -> Result<(), ServiceError>;

    /// Runs until the service stops on its own or `shutdown` trips.
    fn serve(&mut self, shutdown: &ShutdownSignal) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone)]
pub(crate) struct ServiceBootstrapper {
    shutdown: ShutdownSignal,
}

impl ServiceBootstrapper {
    pub(crate) fn new(shutdown: ShutdownSignal) -> Self {
        Self { shutdown }
    }

    /// Spawns the service thread and returns at once. Success is not reported
    /// here; readiness is discovered by probing the service.
    pub(crate) fn start<S>(&self, service: S) -> io::Result<JoinHandle<()>>
    where
        S: BackgroundService,
    {
        let shutdown = self.shutdown.clone();
        thread::Builder::new()
            .name(format!("service-{}", service.name()))
            .spawn(move || run_service(service, &shutdown))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "non-string panic payload".to_string()
}

fn run_service<S>(mut service: S, shutdown: &ShutdownSignal)
where
    S: BackgroundService,
{
    let name = service.name().to_string();
    tracing::info!(target: "desktop::startup", service = %name, "service thread starting");

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        service.startup_tasks()?;
        service.serve(shutdown)
    }));
    match outcome {
        Ok(Ok(())) => {
            tracing::info!(target: "desktop::shutdown", service = %name, "service stopped");
        }
        Ok(Err(error)) => {
            tracing::error!(target: "desktop::startup", service = %name, %error, "service thread failed");
        }
        Err(payload) => {
            tracing::error!(
                target: "desktop::startup",
                service = %name,
                panic = %panic_message(payload.as_ref()),
                "service thread panicked"
            );
        }
    }
}

/// Joins `handle` if it finishes within `timeout`; otherwise leaves it
/// detached and returns `None`.
pub(crate) fn join_with_deadline<T>(handle: JoinHandle<T>, timeout: Duration) -> Option<T> {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return None;
        }
        thread::sleep(SHUTDOWN_SLEEP_SLICE);
    }
    handle.join().ok()
}
