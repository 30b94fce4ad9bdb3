use tokio::sync::Mutex;

use super::{check_key_matches, ReminderStore, StorageKind, StoreError};
use crate::reminder::Reminder;

/// Process-local store. Used for tests and throwaway demo runs.
#[derive(Default)]
pub struct MemoryStore {
    reminders: Mutex<Vec<Reminder>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ReminderStore for MemoryStore {
    fn kind(&self) -> StorageKind {
        StorageKind::Memory
    }

    async fn set(&self, key: &str, reminder: &Reminder) -> Result<(), StoreError> {
        check_key_matches(key, reminder)?;
        let mut reminders = self.reminders.lock().await;
        match reminders.iter_mut().find(|r| r.id == key) {
            Some(existing) => *existing = reminder.clone(),
            None => reminders.push(reminder.clone()),
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Reminder>, StoreError> {
        let reminders = self.reminders.lock().await;
        Ok(reminders.iter().find(|r| r.id == key).cloned())
    }

    async fn list(&self) -> Result<Vec<Reminder>, StoreError> {
        Ok(self.reminders.lock().await.clone())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &Reminder,
        new: &Reminder,
    ) -> Result<bool, StoreError> {
        check_key_matches(key, new)?;
        let mut reminders = self.reminders.lock().await;
        match reminders.iter_mut().find(|r| r.id == key) {
            Some(existing) if existing == expected => {
                *existing = new.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
