use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use tokio::{fs, time::Instant};

use super::{check_key_matches, validate_key, ReminderStore, StorageKind, StoreError};
use crate::reminder::Reminder;

const LOCK_WAIT: Duration = Duration::from_secs(5);
const LOCK_RETRY: Duration = Duration::from_millis(5);
// A lock older than this was left behind by a crashed writer.
const LOCK_STALE_AFTER: Duration = Duration::from_secs(30);

/// One JSON file per reminder, named `<id>.json`. Writes go through a temp
/// file and a rename so readers never see a partial record.
///
/// Every write holds `.<id>.lock`, created with `create_new`, so handles in
/// other processes sharing the directory serialize on the same record.
pub struct FilesystemStore {
    dir: PathBuf,
}

impl FilesystemStore {
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    async fn lock(&self, key: &str) -> Result<KeyLock, StoreError> {
        let path = self.dir.join(format!(".{}.lock", key));
        let deadline = Instant::now() + LOCK_WAIT;

        loop {
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(_) => return Ok(KeyLock { path }),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if is_stale(&path).await {
                        tracing::warn!("Removing stale lock {}", path.display());
                        match fs::remove_file(&path).await {
                            Ok(()) => continue,
                            Err(e) if e.kind() == ErrorKind::NotFound => continue,
                            Err(e) => return Err(e.into()),
                        }
                    }
                    if Instant::now() >= deadline {
                        return Err(StoreError::Locked(key.to_string()));
                    }
                    tokio::time::sleep(LOCK_RETRY).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn read(&self, key: &str) -> Result<Option<Reminder>, StoreError> {
        match fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, reminder: &Reminder) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(reminder)?;
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, self.path_for(key)).await?;
        Ok(())
    }
}

/// Removes the lock file when dropped.
struct KeyLock {
    path: PathBuf,
}

impl Drop for KeyLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!("Failed to remove lock {}: {}", self.path.display(), e);
            }
        }
    }
}

async fn is_stale(path: &Path) -> bool {
    let modified = match fs::metadata(path).await.and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(_) => return false,
    };
    SystemTime::now()
        .duration_since(modified)
        .map(|age| age > LOCK_STALE_AFTER)
        .unwrap_or(false)
}

#[async_trait::async_trait]
impl ReminderStore for FilesystemStore {
    fn kind(&self) -> StorageKind {
        StorageKind::Filesystem
    }

    async fn set(&self, key: &str, reminder: &Reminder) -> Result<(), StoreError> {
        check_key_matches(key, reminder)?;
        let _lock = self.lock(key).await?;
        self.write(key, reminder).await
    }

    async fn get(&self, key: &str) -> Result<Option<Reminder>, StoreError> {
        validate_key(key)?;
        self.read(key).await
    }

    async fn list(&self) -> Result<Vec<Reminder>, StoreError> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(key) = name.strip_suffix(".json") {
                if validate_key(key).is_ok() {
                    keys.push(key.to_string());
                }
            }
        }
        // Ids lead with the creation millis, so name order is creation order.
        keys.sort();

        let mut reminders = Vec::with_capacity(keys.len());
        for key in keys {
            match self.read(&key).await {
                Ok(Some(reminder)) => reminders.push(reminder),
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping unreadable reminder file {}: {}", key, e),
            }
        }
        Ok(reminders)
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &Reminder,
        new: &Reminder,
    ) -> Result<bool, StoreError> {
        check_key_matches(key, new)?;
        let _lock = self.lock(key).await?;
        match self.read(key).await? {
            Some(current) if current == *expected => {
                self.write(key, new).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
