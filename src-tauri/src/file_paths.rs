use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

/// Returns `base_path` when nothing occupies it, otherwise the first free
/// `<stem>_<n><ext>` sibling counting from 1. The filesystem is checked on
/// every call; two callers racing for the same name can still collide.
pub(crate) fn unique_file_path(base_path: &Path) -> PathBuf {
    if !base_path.exists() {
        return base_path.to_path_buf();
    }

    let stem = base_path
        .file_stem()
        .map(|stem| stem.to_os_string())
        .unwrap_or_default();
    let extension = base_path.extension().map(|extension| extension.to_os_string());

    (1_u64..)
        .map(|counter| {
            let mut file_name = OsString::from(&stem);
            file_name.push(format!("_{counter}"));
            if let Some(extension) = &extension {
                file_name.push(".");
                file_name.push(extension);
            }
            base_path.with_file_name(file_name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| base_path.to_path_buf())
}
