use tauri::{AppHandle, Manager};

use crate::{
    append_shutdown_log, service_bootstrap::join_with_deadline, startup_phase::StartupEvent,
    BackendState, SHUTDOWN_JOIN_TIMEOUT,
};

/// Trips the shutdown signal and waits, bounded, for the bootstrap threads.
pub(crate) fn handle_exit_event(app_handle: &AppHandle) {
    let state = app_handle.state::<BackendState>();
    state.transition(StartupEvent::ShutdownRequested);
    state.shutdown.trigger();
    append_shutdown_log("shutdown requested; stopping backend");

    if let Some(handle) = state.take_readiness_thread() {
        match join_with_deadline(handle, SHUTDOWN_JOIN_TIMEOUT) {
            Some(outcome) => append_shutdown_log(&format!("readiness watcher finished: {outcome:?}")),
            None => append_shutdown_log("readiness watcher did not stop in time; detaching"),
        }
    }
    if let Some(handle) = state.take_service_thread() {
        match join_with_deadline(handle, SHUTDOWN_JOIN_TIMEOUT) {
            Some(()) => append_shutdown_log("backend service stopped"),
            None => append_shutdown_log("backend service did not stop in time; detaching"),
        }
    }
}
