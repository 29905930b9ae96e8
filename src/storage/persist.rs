//! Record files under the repository directory.
//!
//! Every write goes to a temporary file in the target's directory and is
//! renamed into place, so a crash leaves either the old or the new record.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::storage::error::{StorageError, StorageResult};

/// Write bytes to `path` atomically.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    let dir = path.parent().ok_or_else(|| {
        StorageError::Internal(format!("no parent directory for {}", path.display()))
    })?;
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_data()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Serialize `value` as pretty JSON and write it atomically.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    atomic_write(path, &bytes)
}

/// Read a JSON record, reporting a missing file as corruption.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> StorageResult<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StorageError::CorruptedData {
                path: path.to_path_buf(),
                reason: "record file is missing".to_string(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_slice(&bytes)?)
}

/// Read a JSON record, falling back to the default when absent.
pub(crate) fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> StorageResult<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    read_json(path)
}
