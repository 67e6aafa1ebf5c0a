#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app_constants;
mod app_runtime;
mod app_types;
mod backend_config;
mod backend_http;
mod backend_process;
mod backend_readiness;
mod config_store;
mod config_tasks;
mod desktop_bridge_commands;
mod exit_events;
mod file_paths;
mod json_file;
mod launch_plan;
mod logging;
mod main_window;
mod runtime_paths;
mod service_bootstrap;
mod startup_loading;
mod startup_phase;
mod startup_task;

pub(crate) use app_constants::*;
pub(crate) use app_types::{BackendBridgeResult, BackendBridgeState, BackendState, BridgeValueResult};

use logging::DesktopLogCategory;

pub(crate) fn append_desktop_log(message: &str) {
    logging::append_desktop_log(DesktopLogCategory::Runtime, message);
}

pub(crate) fn append_startup_log(message: &str) {
    logging::append_desktop_log(DesktopLogCategory::Startup, message);
}

pub(crate) fn append_shutdown_log(message: &str) {
    logging::append_desktop_log(DesktopLogCategory::Shutdown, message);
}

pub(crate) fn append_config_log(message: &str) {
    logging::append_desktop_log(DesktopLogCategory::Config, message);
}

fn main() {
    app_runtime::run();
}
