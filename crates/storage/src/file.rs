// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-file-per-key store rooted in a directory.
//!
//! Writes go to a temp file that is fsynced and renamed over the target, so
//! readers never observe a torn value. Mutations are serialized across
//! processes by an exclusive advisory lock on `<root>/.store.lock`.

use crate::store::{validate_key, StateStore, StoreError};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

const LOCK_FILE: &str = ".store.lock";
/// `~` cannot appear in a valid key, so temp files never collide with keys
const TMP_SUFFIX: &str = "~tmp";

#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    tmp_counter: AtomicU64,
}

/// Held for the duration of a mutation; the advisory lock drops with the file.
struct StoreLock(File);

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.0.unlock();
    }
}

impl FileStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(LOCK_FILE, e))?;
        Ok(Self { root, tmp_counter: AtomicU64::new(0) })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    fn lock(&self) -> Result<StoreLock, StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.root.join(LOCK_FILE))
            .map_err(|e| StoreError::io(LOCK_FILE, e))?;
        file.lock_exclusive().map_err(|e| StoreError::io(LOCK_FILE, e))?;
        Ok(StoreLock(file))
    }

    fn read(&self, key: &str, path: &Path) -> Result<Option<String>, StoreError> {
        match fs::read(path) {
            Ok(bytes) => {
                String::from_utf8(bytes).map(Some).map_err(|_| StoreError::Encoding(key.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(key, e)),
        }
    }

    fn write_atomic(&self, key: &str, path: &Path, value: &str) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(key, e))?;
        }
        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_file_name(format!(
            "{}.{}.{n}.{TMP_SUFFIX}",
            path.file_name().and_then(|f| f.to_str()).unwrap_or("value"),
            std::process::id()
        ));
        let result = (|| {
            let mut file = File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, path)
        })();
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result.map_err(|e| StoreError::io(key, e))
    }

    fn collect_keys(&self, dir: &Path, prefix: &str, out: &mut Vec<String>) -> Result<(), StoreError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StoreError::io(prefix, e)),
        };
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(prefix, e))?;
            let path = entry.path();
            let Ok(rel) = path.strip_prefix(&self.root) else { continue };
            let Some(key) = rel.to_str() else { continue };
            if path.is_dir() {
                self.collect_keys(&path, prefix, out)?;
            } else if validate_key(key).is_ok() && key.starts_with(prefix) {
                out.push(key.to_string());
            }
        }
        Ok(())
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        self.read(key, &path)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let _guard = self.lock()?;
        self.write_atomic(key, &path, value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let _guard = self.lock()?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(key, e)),
        }
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        let _guard = self.lock()?;
        let current = self.read(key, &path)?;
        if current.as_deref() != expected {
            return Ok(false);
        }
        self.write_atomic(key, &path, new)?;
        Ok(true)
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        self.collect_keys(&self.root, prefix, &mut keys)?;
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
