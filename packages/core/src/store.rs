//! Locked, atomic JSON persistence shared by the favorites store and the
//! folder registry.
//!
//! Each read-modify-write holds an exclusive `flock` on `<file>.lock`, and
//! writes go through a temporary sibling that is renamed over the target,
//! so a reader never observes a half-written file.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use nix::fcntl::{Flock, FlockArg};
use serde::Serialize;
use serde::de::DeserializeOwned;
use snafu::ResultExt;

use crate::error::{IoResultExt, Result, StoreLockSnafu, StoreParseSnafu};

/// Appends `suffix` to the full file name (`folders.json` -> `folders.json.bak`).
pub fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Holds the advisory lock for `path` until dropped.
pub struct StoreLock {
    _lock: Flock<File>,
}

/// Takes an exclusive lock guarding `path`, creating parent directories.
pub fn lock(path: &Path) -> Result<StoreLock> {
    let lock_path = sibling(path, ".lock");
    if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).store_write_context(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .store_write_context(&lock_path)?;

    let lock = Flock::lock(file, FlockArg::LockExclusive)
        .map_err(|(_, errno)| errno)
        .context(StoreLockSnafu { path: &lock_path })?;
    Ok(StoreLock { _lock: lock })
}

/// Reads and parses `path`. Returns `None` when the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).store_read_context(path)?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&content)
        .map(Some)
        .context(StoreParseSnafu { path })
}

/// Serializes `value` with 2-space indentation and atomically replaces `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut content = serde_json::to_string_pretty(value).context(StoreParseSnafu { path })?;
    content.push('\n');

    let tmp = sibling(path, ".tmp");
    {
        let mut file = File::create(&tmp).store_write_context(&tmp)?;
        file.write_all(content.as_bytes()).store_write_context(&tmp)?;
        file.sync_all().store_write_context(&tmp)?;
    }
    fs::rename(&tmp, path).store_write_context(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_sibling_appends_suffix() {
        assert_eq!(
            sibling(Path::new("/tmp/folders.json"), ".bak"),
            PathBuf::from("/tmp/folders.json.bak")
        );
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("data.json");
        let _guard = lock(&path).unwrap();

        let mut value = BTreeMap::new();
        value.insert("favorites".to_string(), vec!["A".to_string()]);
        write_json(&path, &value).unwrap();

        let read: Option<BTreeMap<String, Vec<String>>> = read_json(&path).unwrap();
        assert_eq!(read, Some(value));
        assert!(!sibling(&path, ".tmp").exists());
    }

    #[test]
    fn test_missing_and_empty_files_read_as_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        assert_eq!(read_json::<Vec<String>>(&path).unwrap(), None);

        fs::write(&path, "").unwrap();
        assert_eq!(read_json::<Vec<String>>(&path).unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "[1,").unwrap();
        assert!(matches!(
            read_json::<Vec<u32>>(&path),
            Err(crate::Error::StoreParse { .. })
        ));
    }
}
