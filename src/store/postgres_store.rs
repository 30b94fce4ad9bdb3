use sqlx::types::Json;

use super::{check_key_matches, validate_key, ReminderStore, StorageKind, StoreError};
use crate::{db::DbPool, reminder::Reminder};

/// Reminders kept as JSONB values in a single `reminders(key, value)` table.
#[derive(Clone)]
pub struct PostgresStore {
    pool: DbPool,
}

impl PostgresStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ReminderStore for PostgresStore {
    fn kind(&self) -> StorageKind {
        StorageKind::Postgres
    }

    async fn set(&self, key: &str, reminder: &Reminder) -> Result<(), StoreError> {
        check_key_matches(key, reminder)?;
        sqlx::query(
            "INSERT INTO reminders (key, value)
             VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
        )
        .bind(key)
        .bind(Json(reminder))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Reminder>, StoreError> {
        validate_key(key)?;
        let value = sqlx::query_scalar::<_, Json<Reminder>>(
            "SELECT value FROM reminders WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value.map(|Json(reminder)| reminder))
    }

    async fn list(&self) -> Result<Vec<Reminder>, StoreError> {
        let values = sqlx::query_scalar::<_, Json<Reminder>>(
            "SELECT value FROM reminders ORDER BY created_at, key",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(values.into_iter().map(|Json(reminder)| reminder).collect())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &Reminder,
        new: &Reminder,
    ) -> Result<bool, StoreError> {
        check_key_matches(key, new)?;
        let result = sqlx::query(
            "UPDATE reminders SET value = $3, updated_at = NOW()
             WHERE key = $1 AND value = $2",
        )
        .bind(key)
        .bind(Json(expected))
        .bind(Json(new))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
