//! Atomic file operations for crash-safe persistence.
//!
//! Data is written to a temporary file in the target directory and renamed
//! over the destination, so readers only ever see a complete file. The
//! temporary file is created owner-only (`0600` on Unix), and the rename keeps
//! those permissions, which matters because the credential file holds
//! ciphertexts and bearer tokens.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{PersistenceError, Result};

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            fs::create_dir_all(parent).map_err(|source| PersistenceError::DirectoryError {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Writes `data` to `path` atomically, creating parent directories.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    ensure_parent(path)?;

    let write_err = |source| PersistenceError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    temp_file.write_all(data).map_err(write_err)?;
    temp_file.as_file().sync_all().map_err(write_err)?;
    temp_file.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}

/// Serializes `value` as pretty JSON and writes it atomically.
pub fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    atomic_write(path, &json)
}

/// Reads JSON from `path`, returning `None` if the file does not exist.
pub fn read_json_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistenceError::ReadError {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    Ok(Some(serde_json::from_slice(&data)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn test_write_then_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let mut data = BTreeMap::new();
        data.insert("tg:1".to_string(), "ABT24CCS008".to_string());
        atomic_write_json(&path, &data).unwrap();

        let loaded: Option<BTreeMap<String, String>> = read_json_optional(&path).unwrap();
        assert_eq!(loaded, Some(data));
    }

    #[test]
    fn test_creates_missing_state_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state/nested/credentials.json");

        atomic_write(&path, b"{}").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_overwrite_replaces_whole_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        atomic_write(&path, b"a much longer first version").unwrap();
        atomic_write(&path, b"short").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "short");
    }

    #[test]
    fn test_missing_file_reads_as_none() {
        let dir = tempdir().unwrap();
        let loaded: Option<Vec<String>> =
            read_json_optional(&dir.path().join("missing.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, "{not json").unwrap();

        let result: Result<Option<Vec<String>>> = read_json_optional(&path);
        assert!(matches!(result, Err(PersistenceError::Json(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        atomic_write(&path, b"{}").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }
}
