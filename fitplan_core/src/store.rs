//! JSON file persistence with file locking.
//!
//! The catalog and the user directory are both stored as whole JSON
//! documents. Reads take a shared lock; writes go to a temp file in the same
//! directory which is synced and renamed over the original. Read-modify-write
//! cycles hold an exclusive lock on a `<file>.lock` sidecar for their whole
//! duration, since the rename replaces the document's inode.

use crate::{Catalog, Error, Result, UserDirectory};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Load a JSON document, or `default()` when it is missing or unreadable
///
/// A corrupt file is logged and replaced by the default.
pub fn load_json<T, F>(path: &Path, default: F) -> Result<T>
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    if !path.exists() {
        tracing::info!("No file at {:?}, using defaults", path);
        return Ok(default());
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open {:?}: {}. Using defaults.", path, e);
            return Ok(default());
        }
    };

    // Acquire shared lock for reading
    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock {:?}: {}. Using defaults.", path, e);
        return Ok(default());
    }

    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    if let Err(e) = reader.read_to_string(&mut contents) {
        let _ = file.unlock();
        tracing::warn!("Failed to read {:?}: {}. Using defaults.", path, e);
        return Ok(default());
    }

    file.unlock()?;

    match serde_json::from_str::<T>(&contents) {
        Ok(value) => {
            tracing::debug!("Loaded {:?}", path);
            Ok(value)
        }
        Err(e) => {
            tracing::warn!("Failed to parse {:?}: {}. Using defaults.", path, e);
            Ok(default())
        }
    }
}

/// Atomically write a JSON document
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "store path missing parent",
        ))
    })?;
    std::fs::create_dir_all(parent)?;

    let contents = serde_json::to_string_pretty(value)?;
    write_atomic(parent, path, contents.as_bytes())?;

    tracing::debug!("Saved {:?}", path);
    Ok(())
}

/// Write `contents` to a temp file in `dir`, sync it and rename it to `path`
pub(crate) fn write_atomic(dir: &Path, path: &Path, contents: &[u8]) -> Result<()> {
    let temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        writer.write_all(contents)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

/// Run `f` while holding the exclusive sidecar lock for `path`
fn with_exclusive_lock<R>(path: &Path, f: impl FnOnce() -> Result<R>) -> Result<R> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let lock = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(lock_path(path))?;
    lock.lock_exclusive()?;

    let out = f();

    lock.unlock()?;
    out
}

/// Load, modify and save a JSON document under the sidecar lock
///
/// Nothing is written when `f` fails.
pub fn update_json<T, D, F, R>(path: &Path, default: D, f: F) -> Result<R>
where
    T: DeserializeOwned + Serialize,
    D: FnOnce() -> T,
    F: FnOnce(&mut T) -> Result<R>,
{
    with_exclusive_lock(path, || {
        let mut value = load_json(path, default)?;
        let out = f(&mut value)?;
        save_json(&value, path)?;
        Ok(out)
    })
}

impl Catalog {
    /// Load a stored catalog; the built-in catalog if none is stored yet
    pub fn load(path: &Path) -> Result<Self> {
        load_json(path, crate::catalog::build_default_catalog)
    }

    /// Load, modify and save the catalog in one step
    pub fn update<F, R>(path: &Path, f: F) -> Result<R>
    where
        F: FnOnce(&mut Catalog) -> Result<R>,
    {
        update_json(path, crate::catalog::build_default_catalog, f)
    }
}

impl UserDirectory {
    pub fn load(path: &Path) -> Result<Self> {
        load_json(path, UserDirectory::default)
    }

    /// Load, modify and save the directory in one step
    pub fn update<F, R>(path: &Path, f: F) -> Result<R>
    where
        F: FnOnce(&mut UserDirectory) -> Result<R>,
    {
        update_json(path, UserDirectory::default, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProgramId, Sex};

    #[test]
    fn test_catalog_roundtrip() {
        crate::logging::init_test();
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("catalog.json");

        let mut catalog = crate::build_default_catalog();
        let p5 = ProgramId::new(5).unwrap();
        if let Some(program) = catalog.programs.get_mut(&p5) {
            program.name = "Renamed".into();
        }
        save_json(&catalog, &path).unwrap();

        let loaded = Catalog::load(&path).unwrap();
        assert_eq!(loaded, catalog);
        assert_eq!(loaded.program(p5).unwrap().name, "Renamed");
    }

    #[test]
    fn test_missing_catalog_is_builtin() {
        let temp_dir = tempfile::tempdir().unwrap();
        let loaded = Catalog::load(&temp_dir.path().join("none.json")).unwrap();
        assert_eq!(&loaded, crate::get_default_catalog());
    }

    #[test]
    fn test_corrupted_file_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("users.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        let directory = UserDirectory::load(&path).unwrap();
        assert!(directory.list().is_empty());
    }

    #[test]
    fn test_update_pattern() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("users.json");

        let id = UserDirectory::update(&path, |dir| dir.add("Ana", Sex::Female)).unwrap();

        let loaded = UserDirectory::load(&path).unwrap();
        assert_eq!(loaded.get(id).unwrap().name, "Ana");
    }

    #[test]
    fn test_failed_update_does_not_save() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("users.json");

        let result = UserDirectory::update(&path, |dir| dir.remove(42));
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_concurrent_updates_keep_every_user() {
        use std::sync::{Arc, Barrier};

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("users.json");
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = path.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    UserDirectory::update(&path, |dir| dir.add(&format!("user{}", i), Sex::Male))
                        .unwrap()
                })
            })
            .collect();

        let mut ids: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=8).collect::<Vec<u32>>());

        let stored = UserDirectory::load(&path).unwrap();
        assert_eq!(stored.list().len(), 8);
    }

    #[test]
    fn test_atomic_save() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("catalog.json");

        save_json(&crate::build_default_catalog(), &path).unwrap();

        // Verify file exists and no stray temp files remain
        assert!(path.exists());
        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "catalog.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only catalog.json, found extras: {:?}",
            extras
        );
    }
}
