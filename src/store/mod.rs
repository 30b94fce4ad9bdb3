mod filesystem_store;
mod memory_store;
mod postgres_store;

use std::{fmt, path::Path, str::FromStr, sync::Arc};

use anyhow::Context;
use thiserror::Error;

use crate::{db, reminder::Reminder, state::Config};

pub use filesystem_store::FilesystemStore;
pub use memory_store::MemoryStore;
pub use postgres_store::PostgresStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Timed out waiting for the lock on {0}")]
    Locked(String),

    #[error("Key {key} does not match reminder id {id}")]
    KeyMismatch { key: String, id: String },
}

/// Key-value persistence for reminders. The key is always the reminder id.
#[async_trait::async_trait]
pub trait ReminderStore: Send + Sync {
    fn kind(&self) -> StorageKind;

    async fn set(&self, key: &str, reminder: &Reminder) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<Reminder>, StoreError>;

    /// Every stored reminder, in insertion order where the backend keeps one.
    async fn list(&self) -> Result<Vec<Reminder>, StoreError>;

    /// Replaces the value under `key` with `new` only if the stored value still
    /// equals `expected`. Returns whether the swap happened.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &Reminder,
        new: &Reminder,
    ) -> Result<bool, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Filesystem,
    Memory,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Postgres => write!(f, "postgres"),
            StorageKind::Filesystem => write!(f, "filesystem"),
            StorageKind::Memory => write!(f, "memory"),
        }
    }
}

/// Storage requested through `STORAGE_BACKEND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Postgres when `DATABASE_URL` is set and reachable at startup,
    /// the filesystem otherwise.
    Auto,
    Postgres,
    Filesystem,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(StorageBackend::Auto),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "filesystem" | "fs" => Ok(StorageBackend::Filesystem),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key.len() <= 128
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

pub(crate) fn check_key_matches(key: &str, reminder: &Reminder) -> Result<(), StoreError> {
    validate_key(key)?;
    if key != reminder.id {
        return Err(StoreError::KeyMismatch {
            key: key.to_string(),
            id: reminder.id.clone(),
        });
    }
    Ok(())
}

/// Resolves the configured backend once, at startup.
pub async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn ReminderStore>> {
    let store: Arc<dyn ReminderStore> = match config.storage_backend {
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("STORAGE_BACKEND=postgres requires DATABASE_URL")?;
            Arc::new(open_postgres(url).await?)
        }
        StorageBackend::Filesystem => Arc::new(open_filesystem(&config.data_dir).await?),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Auto => match config.database_url.as_deref() {
            Some(url) => match open_postgres(url).await {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    tracing::warn!(
                        "Postgres unavailable ({:#}), using filesystem store at {}",
                        e,
                        config.data_dir.display()
                    );
                    Arc::new(open_filesystem(&config.data_dir).await?)
                }
            },
            None => Arc::new(open_filesystem(&config.data_dir).await?),
        },
    };

    tracing::info!("Using {} reminder store", store.kind());
    Ok(store)
}

async fn open_postgres(url: &str) -> anyhow::Result<PostgresStore> {
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(url)
        .await
        .context("failed to connect to Postgres")?;

    tracing::info!("Running migrations...");
    db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    Ok(PostgresStore::new(pool))
}

async fn open_filesystem(dir: &Path) -> anyhow::Result<FilesystemStore> {
    FilesystemStore::open(dir)
        .await
        .with_context(|| format!("failed to open data directory {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_from_str() {
        assert_eq!("auto".parse::<StorageBackend>(), Ok(StorageBackend::Auto));
        assert_eq!(" Postgres ".parse::<StorageBackend>(), Ok(StorageBackend::Postgres));
        assert_eq!("fs".parse::<StorageBackend>(), Ok(StorageBackend::Filesystem));
        assert_eq!("memory".parse::<StorageBackend>(), Ok(StorageBackend::Memory));
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("reminder_1700000000000_abc123def").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a/b").is_err());
    }

    #[tokio::test]
    async fn test_connect_store_auto_without_database_uses_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            storage_backend: StorageBackend::Auto,
            database_url: None,
            data_dir: dir.path().join("reminders"),
            ..Config::default()
        };

        let store = connect_store(&config).await.unwrap();
        assert_eq!(store.kind(), StorageKind::Filesystem);
        assert!(dir.path().join("reminders").is_dir());
    }

    #[tokio::test]
    async fn test_connect_store_postgres_requires_url() {
        let config = Config {
            storage_backend: StorageBackend::Postgres,
            database_url: None,
            ..Config::default()
        };

        assert!(connect_store(&config).await.is_err());
    }
}
