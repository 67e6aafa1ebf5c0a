use tauri::{AppHandle, Manager, WebviewWindow};

use crate::{startup_loading, MAIN_WINDOW_LABEL};

fn main_window(app_handle: &AppHandle) -> Result<WebviewWindow, String> {
    app_handle
        .get_webview_window(MAIN_WINDOW_LABEL)
        .ok_or_else(|| "Main window is unavailable.".to_string())
}

pub(crate) fn navigate_main_window_to_backend(
    app_handle: &AppHandle,
    backend_url: &str,
) -> Result<(), String> {
    let window = main_window(app_handle)?;
    let js = format!(
        "window.location.replace({});",
        serde_json::to_string(backend_url).unwrap_or_else(|_| "\"/\"".to_string())
    );
    window
        .eval(&js)
        .map_err(|error| format!("Failed to navigate to backend: {error}"))
}

pub(crate) fn show_startup_error(app_handle: &AppHandle, message: &str) -> Result<(), String> {
    let window = main_window(app_handle)?;
    window
        .eval(&startup_loading::startup_error_script(message))
        .map_err(|error| format!("Failed to render startup error: {error}"))
}

pub(crate) fn show_main_window<F>(app_handle: &AppHandle, log: F)
where
    F: Fn(&str),
{
    let Ok(window) = main_window(app_handle) else {
        log("show_main_window skipped: main window not found");
        return;
    };

    if let Err(error) = window.unminimize() {
        log(&format!("failed to unminimize main window: {error}"));
    }
    if let Err(error) = window.show() {
        log(&format!("failed to show main window: {error}"));
    }
    if let Err(error) = window.set_focus() {
        log(&format!("failed to focus main window: {error}"));
    }
}
