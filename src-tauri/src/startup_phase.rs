use std::time::Duration;

/// Where the shell is in its one bootstrap attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) enum StartupPhase {
    #[default]
    AwaitingPlaceholder,
    AwaitingBackend,
    HandedOff,
    Failed(String),
    ShuttingDown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StartupEvent {
    PlaceholderLoaded,
    BackendReady,
    BackendTimedOut { waited: Duration, backend_url: String },
    WatcherUnavailable(String),
    ShutdownRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StartupAction {
    None,
    SpawnReadinessWatcher,
    NavigateToBackend,
    ShowStartupError(String),
}

pub(crate) fn backend_timeout_message(backend_url: &str, waited: Duration) -> String {
    format!(
        "The local service at {backend_url} did not respond within {:.1} seconds.\nRestart the application, or check the backend log for details.",
        waited.as_secs_f64()
    )
}

impl StartupPhase {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingPlaceholder => "awaiting-placeholder",
            Self::AwaitingBackend => "awaiting-backend",
            Self::HandedOff => "handed-off",
            Self::Failed(_) => "failed",
            Self::ShuttingDown => "shutting-down",
        }
    }

    /// The placeholder's load event only leads anywhere the first time, so a
    /// later load of the backend page cannot start a second watcher.
    pub(crate) fn transition(&mut self, event: StartupEvent) -> StartupAction {
        let (next, action) = match (&*self, event) {
            (_, StartupEvent::ShutdownRequested) => (Self::ShuttingDown, StartupAction::None),
            (Self::AwaitingPlaceholder, StartupEvent::PlaceholderLoaded) => {
                (Self::AwaitingBackend, StartupAction::SpawnReadinessWatcher)
            }
            (Self::AwaitingBackend, StartupEvent::BackendReady) => {
                (Self::HandedOff, StartupAction::NavigateToBackend)
            }
            (
                Self::AwaitingBackend,
                StartupEvent::BackendTimedOut {
                    waited,
                    backend_url,
                },
            ) => {
                let message = backend_timeout_message(&backend_url, waited);
                (
                    Self::Failed(message.clone()),
                    StartupAction::ShowStartupError(message),
                )
            }
            (Self::AwaitingBackend, StartupEvent::WatcherUnavailable(reason)) => {
                let message = format!("Failed to start waiting for the local service: {reason}");
                (
                    Self::Failed(message.clone()),
                    StartupAction::ShowStartupError(message),
                )
            }
            _ => return StartupAction::None,
        };
        *self = next;
        action
    }
}
