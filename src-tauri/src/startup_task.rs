use std::{path::PathBuf, sync::Arc};

use tauri::{AppHandle, Manager, Webview};
use url::Url;

use crate::{
    append_startup_log,
    backend_process::BackendProcessService,
    backend_readiness::{ReadinessOutcome, ReadinessWatcher},
    config_store::ConfigStore,
    main_window,
    runtime_paths::RuntimeMode,
    service_bootstrap::ServiceBootstrapper,
    startup_loading,
    startup_phase::{StartupAction, StartupEvent},
    BackendState,
};

/// Starts the backend service thread. Called once from `setup`, before the
/// placeholder has loaded.
pub(crate) fn spawn_startup_task<F>(app_handle: AppHandle, root_dir: Option<PathBuf>, log: F)
where
    F: Fn(&str),
{
    let state = app_handle.state::<BackendState>();
    let config = app_handle.state::<Arc<ConfigStore>>().inner().clone();
    let runtime_mode = RuntimeMode::detect(app_handle.path().resource_dir().ok());
    log(&format!(
        "starting backend service: bundled={} backend_url={}",
        runtime_mode.is_bundled(),
        state.backend_url
    ));

    let service = BackendProcessService::new(config, runtime_mode, root_dir);
    match ServiceBootstrapper::new(state.shutdown.clone()).start(service) {
        Ok(handle) => state.store_service_thread(handle),
        Err(error) => log(&format!("failed to spawn backend service thread: {error}")),
    }
}

pub(crate) fn handle_page_loaded(webview: &Webview, page_url: &Url) {
    let app_handle = webview.app_handle();
    let state = app_handle.state::<BackendState>();
    if !startup_loading::is_placeholder_page(webview.window().label(), page_url, &state.backend_url)
    {
        return;
    }

    if state.transition(StartupEvent::PlaceholderLoaded) != StartupAction::SpawnReadinessWatcher {
        return;
    }
    append_startup_log("placeholder ready; waiting for backend");
    spawn_readiness_watcher(app_handle.clone());
}

fn spawn_readiness_watcher(app_handle: AppHandle) {
    let state = app_handle.state::<BackendState>();
    let probe_url = match Url::parse(&state.backend_url) {
        Ok(url) => url,
        Err(error) => {
            apply_action(
                &app_handle,
                state.transition(StartupEvent::WatcherUnavailable(format!(
                    "invalid backend URL {}: {error}",
                    state.backend_url
                ))),
            );
            return;
        }
    };

    let watcher = ReadinessWatcher::new(state.readiness, state.shutdown.clone());
    let navigate_handle = app_handle.clone();
    let finished_handle = app_handle.clone();
    let spawned = watcher.spawn(
        probe_url,
        move |_| {
            let state = navigate_handle.state::<BackendState>();
            apply_action(&navigate_handle, state.transition(StartupEvent::BackendReady));
        },
        move |outcome| handle_readiness_outcome(&finished_handle, outcome),
    );

    match spawned {
        Ok(handle) => state.store_readiness_thread(handle),
        Err(error) => apply_action(
            &app_handle,
            state.transition(StartupEvent::WatcherUnavailable(error.to_string())),
        ),
    }
}

fn handle_readiness_outcome(app_handle: &AppHandle, outcome: ReadinessOutcome) {
    let state = app_handle.state::<BackendState>();
    match outcome {
        ReadinessOutcome::Ready { attempts, elapsed } => append_startup_log(&format!(
            "backend ready after {attempts} probe(s) in {}ms",
            elapsed.as_millis()
        )),
        ReadinessOutcome::TimedOut { attempts, elapsed } => {
            append_startup_log(&format!(
                "backend unreachable after {attempts} probe(s) in {}ms",
                elapsed.as_millis()
            ));
            apply_action(
                app_handle,
                state.transition(StartupEvent::BackendTimedOut {
                    waited: elapsed,
                    backend_url: state.backend_url.clone(),
                }),
            );
        }
        ReadinessOutcome::Cancelled { attempts } => append_startup_log(&format!(
            "backend readiness polling cancelled after {attempts} probe(s)"
        )),
    }
}

fn apply_action(app_handle: &AppHandle, action: StartupAction) {
    let state = app_handle.state::<BackendState>();
    let result = match action {
        StartupAction::NavigateToBackend => {
            main_window::navigate_main_window_to_backend(app_handle, &state.backend_url)
        }
        StartupAction::ShowStartupError(message) => {
            main_window::show_startup_error(app_handle, &message)
        }
        StartupAction::SpawnReadinessWatcher | StartupAction::None => Ok(()),
    };
    if let Err(error) = result {
        append_startup_log(&error);
    }
}
