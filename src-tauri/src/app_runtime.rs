use std::sync::Arc;

use tauri::{webview::PageLoadEvent, Manager, RunEvent};
use tracing_subscriber::filter::LevelFilter;

use crate::{
    append_config_log, append_desktop_log, append_startup_log,
    config_store::ConfigStore,
    exit_events, logging, main_window, runtime_paths, startup_task, BackendState,
    DESKTOP_LOG_FILE,
};

pub(crate) fn run() {
    let root_dir = runtime_paths::default_root_dir();
    let log_path = logging::resolve_desktop_log_path(root_dir.clone(), DESKTOP_LOG_FILE);
    let log_level = logging::init_logging(Some(&log_path), LevelFilter::INFO);

    append_startup_log("desktop process starting");
    append_startup_log(&format!("desktop log path: {}", log_path.display()));

    let config_path = runtime_paths::resolve_config_path(root_dir.as_deref());
    append_config_log(&format!("config path: {}", config_path.display()));
    let config = Arc::new(ConfigStore::new(config_path, log_level));

    let builder = tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app_handle, _args, _cwd| {
            main_window::show_main_window(app_handle, append_desktop_log);
        }))
        .manage(BackendState::default())
        .manage(config)
        .invoke_handler(tauri::generate_handler![
            crate::desktop_bridge_commands::desktop_bridge_is_desktop_runtime,
            crate::desktop_bridge_commands::desktop_bridge_get_backend_state,
            crate::desktop_bridge_commands::desktop_bridge_get_config_setting,
            crate::desktop_bridge_commands::desktop_bridge_set_config_setting,
            crate::desktop_bridge_commands::desktop_bridge_delete_config_setting,
            crate::desktop_bridge_commands::desktop_bridge_reset_config,
            crate::desktop_bridge_commands::desktop_bridge_unique_file_path,
        ])
        .on_page_load(|webview, payload| match payload.event() {
            PageLoadEvent::Started => {
                append_desktop_log(&format!("page-load started: {}", payload.url()));
            }
            PageLoadEvent::Finished => {
                append_desktop_log(&format!("page-load finished: {}", payload.url()));
                startup_task::handle_page_loaded(webview, payload.url());
            }
        })
        .setup(move |app| {
            let app_handle = app.handle().clone();
            startup_task::spawn_startup_task(app_handle, root_dir, append_startup_log);
            Ok(())
        });

    let app = match builder.build(tauri::generate_context!()) {
        Ok(app) => app,
        Err(error) => {
            append_startup_log(&format!("failed to build desktop application: {error}"));
            std::process::exit(1);
        }
    };

    app.run(|app_handle, event| {
        if let RunEvent::Exit = event {
            exit_events::handle_exit_event(app_handle);
        }
    });
}
