use std::{
    fs::{self, File},
    io::{self, Write},
    path::Path,
};

use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};

use crate::config_store::ConfigError;

const JSON_INDENT: &[u8] = b"    ";

/// Reads a JSON document that is expected to exist; absence is an error here.
pub(crate) fn read_json_from_path(path: &Path) -> Result<Value, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|error| {
        if error.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source: error,
            }
        }
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn to_pretty_json<T>(value: &T) -> Result<Vec<u8>, ConfigError>
where
    T: Serialize + ?Sized,
{
    let mut buffer = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(JSON_INDENT));
    value
        .serialize(&mut serializer)
        .map_err(ConfigError::Serialize)?;
    Ok(buffer)
}

/// Serializes fully before touching the file, then writes through a single
/// handle and syncs it.
pub(crate) fn write_json_to_path<T>(path: &Path, value: &T) -> Result<(), ConfigError>
where
    T: Serialize + ?Sized,
{
    let bytes = to_pretty_json(value)?;
    let io_error = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
    }
    let mut file = File::create(path).map_err(io_error)?;
    file.write_all(&bytes).map_err(io_error)?;
    file.sync_all().map_err(io_error)
}
