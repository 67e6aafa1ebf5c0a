use std::{
    env,
    path::{Path, PathBuf},
};

use crate::{CONFIG_FILE_NAME, CONFIG_PATH_ENV, DEFAULT_ROOT_DIR_NAME, ROOT_DIR_ENV};

fn non_empty_env_path(key: &str) -> Option<PathBuf> {
    let value = env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(PathBuf::from(trimmed))
}

pub(crate) fn default_root_dir() -> Option<PathBuf> {
    non_empty_env_path(ROOT_DIR_ENV)
        .or_else(|| home::home_dir().map(|home| home.join(DEFAULT_ROOT_DIR_NAME)))
}

pub(crate) fn resolve_config_path(root_dir: Option<&Path>) -> PathBuf {
    if let Some(path) = non_empty_env_path(CONFIG_PATH_ENV) {
        return path;
    }
    match root_dir {
        Some(root) => root.join(CONFIG_FILE_NAME),
        None => PathBuf::from(CONFIG_FILE_NAME),
    }
}

pub(crate) fn workspace_root_dir() -> PathBuf {
    let candidate = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..");
    candidate.canonicalize().unwrap_or(candidate)
}

/// Whether helper binaries ship next to the app or come from the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RuntimeMode {
    Bundled { resource_dir: PathBuf },
    Source,
}

impl RuntimeMode {
    /// A resource dir only counts as a bundle when it carries a `bin/` folder;
    /// dev builds resolve their resource dir to the target directory.
    pub(crate) fn detect(resource_dir: Option<PathBuf>) -> Self {
        match resource_dir {
            Some(dir) if dir.join("bin").is_dir() => Self::Bundled { resource_dir: dir },
            _ => Self::Source,
        }
    }

    pub(crate) fn is_bundled(&self) -> bool {
        matches!(self, Self::Bundled { .. })
    }
}

pub(crate) fn executable_file_name(name: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("{name}.exe")
    } else {
        name.to_string()
    }
}

/// Bundled: `<resources>/bin/<name>[.exe]`. Source: the bare name, left to the
/// system search path.
pub(crate) fn helper_binary_path(mode: &RuntimeMode, name: &str) -> PathBuf {
    match mode {
        RuntimeMode::Bundled { resource_dir } => {
            resource_dir.join("bin").join(executable_file_name(name))
        }
        RuntimeMode::Source => PathBuf::from(name),
    }
}
