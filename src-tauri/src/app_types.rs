use std::{
    env,
    sync::{Mutex, MutexGuard, PoisonError},
    thread::JoinHandle,
};

use serde_json::Value;

use crate::{
    backend_config::{self, ReadinessSettings},
    backend_readiness::ReadinessOutcome,
    service_bootstrap::ShutdownSignal,
    startup_phase::{StartupAction, StartupEvent, StartupPhase},
    BACKEND_URL_ENV, DEFAULT_BACKEND_URL,
};

#[derive(Debug)]
pub(crate) struct BackendState {
    pub(crate) backend_url: String,
    pub(crate) readiness: ReadinessSettings,
    pub(crate) shutdown: ShutdownSignal,
    pub(crate) startup_phase: Mutex<StartupPhase>,
    pub(crate) service_thread: Mutex<Option<JoinHandle<()>>>,
    pub(crate) readiness_thread: Mutex<Option<JoinHandle<ReadinessOutcome>>>,
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl BackendState {
    pub(crate) fn new(backend_url: String, readiness: ReadinessSettings) -> Self {
        Self {
            backend_url,
            readiness,
            shutdown: ShutdownSignal::new(),
            startup_phase: Mutex::new(StartupPhase::default()),
            service_thread: Mutex::new(None),
            readiness_thread: Mutex::new(None),
        }
    }

    pub(crate) fn transition(&self, event: StartupEvent) -> StartupAction {
        lock_or_recover(&self.startup_phase).transition(event)
    }

    pub(crate) fn phase(&self) -> StartupPhase {
        lock_or_recover(&self.startup_phase).clone()
    }

    pub(crate) fn store_service_thread(&self, handle: JoinHandle<()>) {
        *lock_or_recover(&self.service_thread) = Some(handle);
    }

    pub(crate) fn store_readiness_thread(&self, handle: JoinHandle<ReadinessOutcome>) {
        *lock_or_recover(&self.readiness_thread) = Some(handle);
    }

    pub(crate) fn take_service_thread(&self) -> Option<JoinHandle<()>> {
        lock_or_recover(&self.service_thread).take()
    }

    pub(crate) fn take_readiness_thread(&self) -> Option<JoinHandle<ReadinessOutcome>> {
        lock_or_recover(&self.readiness_thread).take()
    }

    pub(crate) fn bridge_state(&self) -> BackendBridgeState {
        let phase = self.phase();
        BackendBridgeState {
            phase: phase.as_str(),
            backend_url: self.backend_url.clone(),
            ready: phase == StartupPhase::HandedOff,
            error: match phase {
                StartupPhase::Failed(message) => Some(message),
                _ => None,
            },
        }
    }
}

impl Default for BackendState {
    fn default() -> Self {
        Self::new(
            backend_config::normalize_backend_url(
                &env::var(BACKEND_URL_ENV).unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string()),
                DEFAULT_BACKEND_URL,
            ),
            ReadinessSettings::from_env(),
        )
    }
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BackendBridgeState {
    pub(crate) phase: &'static str,
    pub(crate) backend_url: String,
    pub(crate) ready: bool,
    pub(crate) error: Option<String>,
}

#[derive(Debug, PartialEq, serde::Serialize)]
pub(crate) struct BackendBridgeResult {
    pub(crate) ok: bool,
    pub(crate) reason: Option<String>,
}

impl BackendBridgeResult {
    pub(crate) fn success() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    pub(crate) fn failure(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, PartialEq, serde::Serialize)]
pub(crate) struct BridgeValueResult {
    pub(crate) ok: bool,
    pub(crate) reason: Option<String>,
    pub(crate) value: Option<Value>,
}

impl BridgeValueResult {
    pub(crate) fn value(value: Option<Value>) -> Self {
        Self {
            ok: true,
            reason: None,
            value,
        }
    }

    pub(crate) fn failure(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
            value: None,
        }
    }
}
