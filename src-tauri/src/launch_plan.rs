use std::{
    env,
    path::{Path, PathBuf},
};

use crate::{
    runtime_paths::{self, RuntimeMode},
    BACKEND_BINARY_NAME, BACKEND_CMD_ENV, BACKEND_CWD_ENV, SOURCE_DIR_ENV,
};

const DEV_ENTRYPOINT: &str = "app.py";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LaunchPlan {
    pub(crate) cmd: String,
    pub(crate) args: Vec<String>,
    pub(crate) cwd: PathBuf,
    pub(crate) root_dir: Option<PathBuf>,
    pub(crate) packaged_mode: bool,
}

pub(crate) fn build_debug_command(plan: &LaunchPlan) -> Vec<String> {
    let mut parts = vec![plan.cmd.clone()];
    parts.extend(plan.args.clone());
    parts
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Custom command from the environment first, then the bundled backend, then
/// a source checkout.
pub(crate) fn resolve_launch_plan(
    mode: &RuntimeMode,
    root_dir: Option<&Path>,
) -> Result<LaunchPlan, String> {
    if let Some(custom_cmd) = env::var(BACKEND_CMD_ENV)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
    {
        let cwd = env_path(BACKEND_CWD_ENV)
            .or_else(detect_source_root)
            .unwrap_or_else(runtime_paths::workspace_root_dir);
        return resolve_custom_launch(&custom_cmd, cwd, root_dir);
    }

    match mode {
        RuntimeMode::Bundled { resource_dir } => resolve_packaged_launch(resource_dir, root_dir),
        RuntimeMode::Source => resolve_dev_launch(root_dir),
    }
}

pub(crate) fn resolve_custom_launch(
    custom_cmd: &str,
    cwd: PathBuf,
    root_dir: Option<&Path>,
) -> Result<LaunchPlan, String> {
    let mut pieces = shlex::split(custom_cmd)
        .ok_or_else(|| format!("Invalid {BACKEND_CMD_ENV}: {custom_cmd}"))?;
    if pieces.is_empty() {
        return Err(format!("{BACKEND_CMD_ENV} is empty."));
    }

    let cmd = pieces.remove(0);
    Ok(LaunchPlan {
        cmd,
        args: pieces,
        cwd,
        root_dir: root_dir.map(Path::to_path_buf),
        packaged_mode: false,
    })
}

pub(crate) fn resolve_packaged_launch(
    resource_dir: &Path,
    root_dir: Option<&Path>,
) -> Result<LaunchPlan, String> {
    let backend_path = runtime_paths::helper_binary_path(
        &RuntimeMode::Bundled {
            resource_dir: resource_dir.to_path_buf(),
        },
        BACKEND_BINARY_NAME,
    );
    if !backend_path.is_file() {
        return Err(format!(
            "Packaged backend executable is missing: {}",
            backend_path.display()
        ));
    }

    let cwd = env_path(BACKEND_CWD_ENV)
        .or_else(|| root_dir.map(Path::to_path_buf))
        .unwrap_or_else(|| resource_dir.to_path_buf());
    Ok(LaunchPlan {
        cmd: backend_path.to_string_lossy().to_string(),
        args: Vec::new(),
        cwd,
        root_dir: root_dir.map(Path::to_path_buf),
        packaged_mode: true,
    })
}

fn is_source_root(candidate: &Path) -> bool {
    candidate.join(DEV_ENTRYPOINT).is_file()
}

fn detect_source_root() -> Option<PathBuf> {
    if let Some(candidate) = env_path(SOURCE_DIR_ENV) {
        if is_source_root(&candidate) {
            return Some(candidate.canonicalize().unwrap_or(candidate));
        }
    }

    let workspace_root = runtime_paths::workspace_root_dir();
    [workspace_root.join("backend"), workspace_root]
        .into_iter()
        .find(|candidate| is_source_root(candidate))
}

fn dev_python_command() -> &'static str {
    if cfg!(target_os = "windows") {
        "python"
    } else {
        "python3"
    }
}

pub(crate) fn resolve_dev_launch(root_dir: Option<&Path>) -> Result<LaunchPlan, String> {
    let source_root = detect_source_root().ok_or_else(|| {
        format!(
            "Cannot locate the backend source directory. Set {SOURCE_DIR_ENV} to a checkout containing {DEV_ENTRYPOINT}, or {BACKEND_CMD_ENV} to a custom command."
        )
    })?;

    Ok(LaunchPlan {
        cmd: dev_python_command().to_string(),
        args: vec![DEV_ENTRYPOINT.to_string()],
        cwd: env_path(BACKEND_CWD_ENV).unwrap_or(source_root),
        root_dir: root_dir.map(Path::to_path_buf),
        packaged_mode: false,
    })
}
