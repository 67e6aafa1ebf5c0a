use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    sync::Arc,
};

use crate::{
    config_store::ConfigStore,
    launch_plan::{self, build_debug_command, LaunchPlan},
    runtime_paths::{self, RuntimeMode},
    service_bootstrap::{BackgroundService, ServiceError, ShutdownSignal},
    BACKEND_LOG_FILE, CONFIG_PATH_ENV, FFMPEG_BINARY_NAME, FFMPEG_PATH_ENV, ROOT_DIR_ENV,
    SERVICE_POLL_INTERVAL,
};

/// The local web backend, run as a child process of the shell.
pub(crate) struct BackendProcessService {
    config: Arc<ConfigStore>,
    runtime_mode: RuntimeMode,
    root_dir: Option<PathBuf>,
    plan: Option<LaunchPlan>,
    child: Option<Child>,
}

impl BackendProcessService {
    pub(crate) fn new(
        config: Arc<ConfigStore>,
        runtime_mode: RuntimeMode,
        root_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            config,
            runtime_mode,
            root_dir,
            plan: None,
            child: None,
        }
    }

    #[cfg(test)]
    fn with_plan(mut self, plan: LaunchPlan) -> Self {
        self.plan = Some(plan);
        self
    }

    fn spawn_child(&self, plan: &LaunchPlan) -> Result<Child, ServiceError> {
        if !plan.cwd.exists() {
            fs::create_dir_all(&plan.cwd).map_err(|error| {
                ServiceError::Launch(format!(
                    "Failed to create backend cwd {}: {}",
                    plan.cwd.display(),
                    error
                ))
            })?;
        }

        let mut command = Command::new(&plan.cmd);
        command
            .args(&plan.args)
            .current_dir(&plan.cwd)
            .stdin(Stdio::null())
            .env("PYTHONUNBUFFERED", "1")
            .env(CONFIG_PATH_ENV, self.config.path())
            .env(
                FFMPEG_PATH_ENV,
                runtime_paths::helper_binary_path(&self.runtime_mode, FFMPEG_BINARY_NAME),
            );
        if let Some(root_dir) = &plan.root_dir {
            command.env(ROOT_DIR_ENV, root_dir);
        }

        match backend_log_path(plan.root_dir.as_deref()) {
            Some(log_path) => {
                let (stdout, stderr) = open_backend_log(&log_path)?;
                command.stdout(stdout).stderr(stderr);
            }
            None => {
                command.stdout(Stdio::null()).stderr(Stdio::null());
            }
        }

        command.spawn().map_err(|error| {
            ServiceError::Launch(format!(
                "Failed to spawn backend process with command {:?}: {}",
                build_debug_command(plan),
                error
            ))
        })
    }
}

impl BackgroundService for BackendProcessService {
    fn name(&self) -> &str {
        "backend"
    }

    fn startup_tasks(&mut self) -> Result<(), ServiceError> {
        self.config.load()?;
        self.config.run_all_change_tasks()?;
        if self.plan.is_none() {
            let plan = launch_plan::resolve_launch_plan(&self.runtime_mode, self.root_dir.as_deref())
                .map_err(ServiceError::Launch)?;
            self.plan = Some(plan);
        }
        Ok(())
    }

    fn serve(&mut self, shutdown: &ShutdownSignal) -> Result<(), ServiceError> {
        let plan = self
            .plan
            .clone()
            .ok_or_else(|| ServiceError::Launch("Backend launch plan is unresolved.".to_string()))?;
        tracing::info!(
            target: "desktop::startup",
            command = ?build_debug_command(&plan),
            cwd = %plan.cwd.display(),
            packaged = plan.packaged_mode,
            "launching backend"
        );
        let child = self.spawn_child(&plan)?;
        let child = self.child.insert(child);

        loop {
            if shutdown.sleep(SERVICE_POLL_INTERVAL) {
                stop_child_process(child);
                self.child = None;
                return Ok(());
            }
            if let Some(status) = child.try_wait()? {
                self.child = None;
                return Err(ServiceError::Exited(status));
            }
        }
    }
}

impl Drop for BackendProcessService {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            stop_child_process(child);
        }
    }
}

fn backend_log_path(root_dir: Option<&Path>) -> Option<PathBuf> {
    root_dir.map(|root| root.join("logs").join(BACKEND_LOG_FILE))
}

fn open_backend_log(log_path: &Path) -> Result<(Stdio, Stdio), ServiceError> {
    if let Some(log_parent) = log_path.parent() {
        fs::create_dir_all(log_parent).map_err(|error| {
            ServiceError::Launch(format!(
                "Failed to create backend log directory {}: {}",
                log_parent.display(),
                error
            ))
        })?;
    }
    let stdout_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|error| {
            ServiceError::Launch(format!(
                "Failed to open backend log {}: {}",
                log_path.display(),
                error
            ))
        })?;
    let stderr_file = stdout_file.try_clone()?;
    Ok((Stdio::from(stdout_file), Stdio::from(stderr_file)))
}

fn stop_child_process(child: &mut Child) {
    #[cfg(target_os = "windows")]
    {
        let _ = Command::new("taskkill")
            .args(["/pid", &child.id().to_string(), "/t", "/f"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(Stdio::null())
            .status();
        let _ = child.wait();
    }

    #[cfg(not(target_os = "windows"))]
    {
        let _ = child.kill();
        let _ = child.wait();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::{thread, time::Duration};

    use serde_json::json;
    use tracing_subscriber::filter::LevelFilter;

    use super::*;
    use crate::{config_tasks::LOGGER_LEVEL_KEY, logging::LogLevelHandle};

    fn shell_plan(script: &str, cwd: &Path, root_dir: Option<&Path>) -> LaunchPlan {
        LaunchPlan {
            cmd: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            cwd: cwd.to_path_buf(),
            root_dir: root_dir.map(Path::to_path_buf),
            packaged_mode: false,
        }
    }

    fn config_in(dir: &Path) -> Arc<ConfigStore> {
        Arc::new(ConfigStore::new(
            dir.join("opz_sm_config.json"),
            LogLevelHandle::detached(LevelFilter::INFO),
        ))
    }

    #[test]
    fn startup_tasks_load_config_and_apply_change_tasks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let writer = config_in(dir.path());
        writer
            .set(LOGGER_LEVEL_KEY, json!("DEBUG"), true)
            .expect("seed config");

        let config = config_in(dir.path());
        let mut service = BackendProcessService::new(config.clone(), RuntimeMode::Source, None)
            .with_plan(shell_plan("exit 0", dir.path(), None));
        service.startup_tasks().expect("startup tasks");

        assert_eq!(config.get(LOGGER_LEVEL_KEY), Some(json!("DEBUG")));
        assert_eq!(config.log_level().current(), LevelFilter::DEBUG);
    }

    #[test]
    fn serve_stops_child_when_shutdown_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut service =
            BackendProcessService::new(config_in(dir.path()), RuntimeMode::Source, None)
                .with_plan(shell_plan("sleep 30", dir.path(), None));
        let shutdown = ShutdownSignal::new();
        let trigger = shutdown.clone();
        let waker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            trigger.trigger();
        });

        service.serve(&shutdown).expect("clean stop");
        assert!(service.child.is_none());
        waker.join().expect("waker");
    }

    #[test]
    fn serve_reports_unexpected_exit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut service =
            BackendProcessService::new(config_in(dir.path()), RuntimeMode::Source, None)
                .with_plan(shell_plan("exit 3", dir.path(), None));

        match service.serve(&ShutdownSignal::new()) {
            Err(ServiceError::Exited(status)) => assert_eq!(status.code(), Some(3)),
            other => panic!("expected Exited, got {other:?}"),
        }
    }

    #[test]
    fn serve_passes_config_path_and_appends_backend_log() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("root");
        let config = config_in(dir.path());
        let mut service = BackendProcessService::new(config.clone(), RuntimeMode::Source, None)
            .with_plan(shell_plan(
                "echo \"config=$SAMPLE_MANAGER_CONFIG_PATH ffmpeg=$FFMPEG_PATH\"; exit 1",
                dir.path(),
                Some(&root),
            ));

        assert!(service.serve(&ShutdownSignal::new()).is_err());
        let log = fs::read_to_string(root.join("logs").join(BACKEND_LOG_FILE)).expect("log");
        assert!(log.contains(&format!("config={}", config.path().display())));
        assert!(log.contains("ffmpeg=ffmpeg"));
    }

    #[test]
    fn serve_reports_spawn_failure_as_launch_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut plan = shell_plan("", dir.path(), None);
        plan.cmd = "definitely-not-a-real-backend-binary".to_string();
        let mut service =
            BackendProcessService::new(config_in(dir.path()), RuntimeMode::Source, None)
                .with_plan(plan);

        assert!(matches!(
            service.serve(&ShutdownSignal::new()),
            Err(ServiceError::Launch(_))
        ));
    }
}
