//! JSON-file attempt store.
//!
//! Records survive restarts. Updates are serialized within the process by a
//! mutex and across processes by an exclusive lock file created next to the
//! data file. The data file is replaced by write-then-rename, so readers never
//! observe a half-written file.
//!
//! A lock left behind by a crashed process is broken once it is older than
//! [`STALE_LOCK_AGE`]. Breaking is itself serialized by a second lock file
//! (`<file>.lock.break`), and staleness is re-checked while holding it, so a
//! process acting on an outdated age check cannot remove a lock another
//! process has just taken.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use warden_types::Identity;

use crate::error::StoreError;
use crate::record::AttemptRecord;
use crate::store::{AttemptStore, StoreResult};

const FORMAT_VERSION: u32 = 1;
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(5);
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

/// Lock files older than this are assumed to belong to a crashed process.
const STALE_LOCK_AGE: Duration = Duration::from_secs(30);

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    records: BTreeMap<Identity, AttemptRecord>,
}

/// Attempt store persisted to a JSON file.
#[derive(Debug)]
pub struct FileAttemptStore {
    path: PathBuf,
    lock_path: PathBuf,
    break_path: PathBuf,
    lock_timeout: Duration,
    local: Mutex<()>,
}

impl FileAttemptStore {
    /// Opens (lazily) a store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = path.file_name().map(OsStr::to_os_string).unwrap_or_default();
        lock_name.push(".lock");
        let lock_path = path.with_file_name(&lock_name);
        lock_name.push(".break");
        let break_path = path.with_file_name(lock_name);

        Self {
            path,
            lock_path,
            break_path,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            local: Mutex::new(()),
        }
    }

    /// Sets how long to wait for another process's lock.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read(&self) -> StoreResult<StoreFile> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoreFile::default()),
            Err(e) => return Err(self.io_error(e)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(StoreFile::default());
        }
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, contents: &StoreFile) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let mut tmp_name = self.path.file_name().map(OsStr::to_os_string).unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        let json = serde_json::to_vec_pretty(contents).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let mut file = File::create(&tmp_path).map_err(|e| self.io_error(e))?;
        file.write_all(&json).map_err(|e| self.io_error(e))?;
        file.sync_all().map_err(|e| self.io_error(e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }

    /// Takes the cross-process lock, waiting up to the lock timeout.
    fn acquire(&self) -> StoreResult<LockFile<'_>> {
        if let Some(parent) = self.lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let deadline = Instant::now() + self.lock_timeout;
        loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&self.lock_path)
            {
                Ok(_) => return Ok(LockFile { path: &self.lock_path }),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if self.break_stale_lock() {
                        continue;
                    }
                    if Instant::now() >= deadline {
                        return Err(StoreError::LockTimeout {
                            path: self.lock_path.clone(),
                        });
                    }
                    thread::sleep(LOCK_RETRY_INTERVAL);
                }
                Err(e) => return Err(self.io_error(e)),
            }
        }
    }

    /// Removes the data lock if it is stale. Returns whether the caller
    /// should retry immediately.
    fn break_stale_lock(&self) -> bool {
        if !lock_age(&self.lock_path).is_some_and(|age| age > STALE_LOCK_AGE) {
            return false;
        }
        let Some(_breaker) = self.claim_breaker() else {
            return false;
        };

        // Another breaker may have replaced the lock since the first check.
        match lock_age(&self.lock_path) {
            None => true,
            Some(age) if age > STALE_LOCK_AGE => {
                warn!(path = %self.lock_path.display(), ?age, "Removing stale attempt-store lock");
                fs::remove_file(&self.lock_path).is_ok()
            }
            Some(_) => false,
        }
    }

    fn claim_breaker(&self) -> Option<LockFile<'_>> {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.break_path)
        {
            Ok(_) => Some(LockFile {
                path: &self.break_path,
            }),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                // A breaker only holds this for a few calls; an old one was abandoned.
                if lock_age(&self.break_path).is_some_and(|age| age > STALE_LOCK_AGE) {
                    warn!(path = %self.break_path.display(), "Removing abandoned lock-breaker file");
                    let _ = fs::remove_file(&self.break_path);
                }
                None
            }
            Err(_) => None,
        }
    }
}

/// Age of a lock file, or `None` if it is missing or unreadable.
fn lock_age(path: &Path) -> Option<Duration> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    SystemTime::now().duration_since(modified).ok()
}

/// Held cross-process lock; released on drop.
struct LockFile<'a> {
    path: &'a Path,
}

impl Drop for LockFile<'_> {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to release attempt-store lock");
        }
    }
}

impl AttemptStore for FileAttemptStore {
    fn load(&self, identity: &Identity) -> StoreResult<Option<AttemptRecord>> {
        Ok(self.read()?.records.remove(identity))
    }

    fn update(
        &self,
        identity: &Identity,
        apply: &mut dyn FnMut(Option<AttemptRecord>) -> Option<AttemptRecord>,
    ) -> StoreResult<Option<AttemptRecord>> {
        let _local = self.local.lock().map_err(|_| StoreError::Poisoned)?;
        let _lock = self.acquire()?;

        let mut contents = self.read()?;
        let current = contents.records.get(identity).cloned();
        let next = apply(current.clone());
        if next == current {
            return Ok(next);
        }

        match &next {
            Some(record) => {
                contents.records.insert(identity.clone(), record.clone());
            }
            None => {
                contents.records.remove(identity);
            }
        }
        contents.version = FORMAT_VERSION;
        self.write(&contents)?;

        debug!(identity = %identity, path = %self.path.display(), "Attempt record written");
        Ok(next)
    }

    fn list(&self) -> StoreResult<Vec<AttemptRecord>> {
        Ok(self.read()?.records.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use tempfile::tempdir;

    fn bump(store: &FileAttemptStore, identity: &Identity) {
        store
            .update(identity, &mut |current| {
                let mut record = current.unwrap_or_else(|| AttemptRecord::new(identity.clone()));
                record.fail_count += 1;
                Some(record)
            })
            .unwrap();
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let store = FileAttemptStore::new(dir.path().join("attempts.json"));
        assert!(store.list().unwrap().is_empty());
        assert!(store.load(&Identity::new("a@b.c")).unwrap().is_none());
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("attempts.json");
        let identity = Identity::new("ana@example.com");

        bump(&FileAttemptStore::new(&path), &identity);
        bump(&FileAttemptStore::new(&path), &identity);

        let reopened = FileAttemptStore::new(&path);
        assert_eq!(reopened.load(&identity).unwrap().unwrap().fail_count, 2);
        assert!(!dir.path().join("nested").join("attempts.json.lock").exists());
    }

    #[test]
    fn test_delete_removes_record() {
        let dir = tempdir().unwrap();
        let store = FileAttemptStore::new(dir.path().join("attempts.json"));
        let identity = Identity::new("ana@example.com");

        bump(&store, &identity);
        assert!(store.remove(&identity).unwrap());
        assert!(store.load(&identity).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("attempts.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileAttemptStore::new(&path);
        assert!(matches!(
            store.load(&Identity::new("a@b.c")),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_held_lock_times_out() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("attempts.json");
        fs::write(dir.path().join("attempts.json.lock"), "").unwrap();

        let store = FileAttemptStore::new(&path).with_lock_timeout(Duration::from_millis(20));
        let result = store.update(&Identity::new("a@b.c"), &mut |c| c);
        assert!(matches!(result, Err(StoreError::LockTimeout { .. })));
    }

    #[test]
    fn test_concurrent_handles_do_not_lose_updates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("attempts.json");
        let identity = Identity::new("ana@example.com");
        let threads = 4;
        let barrier = Arc::new(Barrier::new(threads));

        // Separate store handles stand in for separate processes.
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let store = FileAttemptStore::new(&path);
                let barrier = Arc::clone(&barrier);
                let identity = identity.clone();
                thread::spawn(move || {
                    barrier.wait();
                    bump(&store, &identity);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let store = FileAttemptStore::new(&path);
        assert_eq!(
            store.load(&identity).unwrap().unwrap().fail_count,
            threads as u32
        );
    }

    fn backdated_file(path: &Path, age: Duration) {
        let file = File::create(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn test_stale_lock_is_broken() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("attempts.json");
        let lock = dir.path().join("attempts.json.lock");
        backdated_file(&lock, STALE_LOCK_AGE * 2);

        let store = FileAttemptStore::new(&path).with_lock_timeout(Duration::from_millis(200));
        let identity = Identity::new("ana@example.com");
        bump(&store, &identity);

        assert_eq!(store.load(&identity).unwrap().unwrap().fail_count, 1);
        assert!(!lock.exists());
        assert!(!dir.path().join("attempts.json.lock.break").exists());
    }

    #[test]
    fn test_stale_lock_is_kept_while_another_process_breaks_it() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("attempts.json");
        let lock = dir.path().join("attempts.json.lock");
        backdated_file(&lock, STALE_LOCK_AGE * 2);
        fs::write(dir.path().join("attempts.json.lock.break"), "").unwrap();

        let store = FileAttemptStore::new(&path).with_lock_timeout(Duration::from_millis(20));
        let result = store.update(&Identity::new("a@b.c"), &mut |c| c);

        assert!(matches!(result, Err(StoreError::LockTimeout { .. })));
        assert!(lock.exists());
    }

    #[test]
    fn test_fresh_lock_is_not_broken_after_a_stale_check() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("attempts.json");
        let lock = dir.path().join("attempts.json.lock");
        // The lock was replaced by a live holder since it looked stale.
        fs::write(&lock, "").unwrap();

        let store = FileAttemptStore::new(&path);
        assert!(!store.break_stale_lock());
        assert!(lock.exists());
    }

    #[test]
    fn test_abandoned_breaker_is_cleared() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("attempts.json");
        backdated_file(&dir.path().join("attempts.json.lock"), STALE_LOCK_AGE * 2);
        backdated_file(&dir.path().join("attempts.json.lock.break"), STALE_LOCK_AGE * 2);

        let store = FileAttemptStore::new(&path).with_lock_timeout(Duration::from_millis(200));
        let identity = Identity::new("ana@example.com");
        bump(&store, &identity);

        assert_eq!(store.load(&identity).unwrap().unwrap().fail_count, 1);
    }
}
