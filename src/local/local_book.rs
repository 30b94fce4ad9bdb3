use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{local_storage::LocalStorage, notifier::Notifier};
use crate::{
    error::{AppError, Result},
    reminder::{reminder_models::generate_id, validate_request, CreateReminderRequest},
};

pub const REMINDERS_KEY: &str = "reminders";
pub const LAST_EMAIL_KEY: &str = "lastEmail";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalReminder {
    pub id: String,
    pub email: String,
    pub text: String,
    pub scheduled_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub notified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalReminderView {
    pub reminder: LocalReminder,
    pub past_due: bool,
}

/// Offline reminder list. Nothing here reaches the backend or sends email.
#[derive(Debug, Clone)]
pub struct LocalBook {
    storage: LocalStorage,
}

impl LocalBook {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    pub fn create(&self, payload: &CreateReminderRequest, now: DateTime<Utc>) -> Result<LocalReminder> {
        let valid = validate_request(payload, now)?;
        let reminder = LocalReminder {
            id: generate_id(now),
            email: valid.email,
            text: valid.text,
            scheduled_time: valid.scheduled_time,
            created_at: now,
            notified: false,
        };

        let mut reminders = self.load()?;
        reminders.push(reminder.clone());
        self.save(&reminders)?;
        self.storage.set_item(LAST_EMAIL_KEY, &reminder.email)?;

        Ok(reminder)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let mut reminders = self.load()?;
        let before = reminders.len();
        reminders.retain(|r| r.id != id);
        if reminders.len() == before {
            return Err(AppError::NotFound(format!("Reminder {} not found", id)));
        }
        self.save(&reminders)
    }

    /// Sorted by scheduled time, earliest first.
    pub fn display(&self, now: DateTime<Utc>) -> Result<Vec<LocalReminderView>> {
        let mut reminders = self.load()?;
        reminders.sort_by_key(|r| r.scheduled_time);

        Ok(reminders
            .into_iter()
            .map(|reminder| LocalReminderView {
                past_due: reminder.scheduled_time <= now,
                reminder,
            })
            .collect())
    }

    /// Notifies each due, not yet notified reminder once. Returns how many fired.
    pub fn check(&self, now: DateTime<Utc>, notifier: &dyn Notifier) -> Result<usize> {
        let mut reminders = self.load()?;
        let mut fired = 0;

        for reminder in reminders.iter_mut() {
            if !reminder.notified && reminder.scheduled_time <= now {
                notifier.notify(reminder);
                reminder.notified = true;
                fired += 1;
            }
        }

        if fired > 0 {
            self.save(&reminders)?;
        }
        Ok(fired)
    }

    pub fn last_email(&self) -> Result<Option<String>> {
        Ok(self.storage.get_item(LAST_EMAIL_KEY)?)
    }

    fn load(&self) -> Result<Vec<LocalReminder>> {
        match self.storage.get_item(REMINDERS_KEY)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                tracing::error!("Corrupt local reminder list: {}", e);
                AppError::Store(e.into())
            }),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, reminders: &[LocalReminder]) -> Result<()> {
        let raw = serde_json::to_string(reminders).map_err(|e| AppError::Store(e.into()))?;
        self.storage.set_item(REMINDERS_KEY, &raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingNotifier {
        seen: Mutex<Vec<String>>,
    }

    impl Notifier for CollectingNotifier {
        fn notify(&self, reminder: &LocalReminder) {
            self.seen.lock().unwrap().push(reminder.text.clone());
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 3, 10, 8, 0, 0).unwrap()
    }

    fn request(text: &str, at: DateTime<Utc>) -> CreateReminderRequest {
        CreateReminderRequest {
            email: Some("me@example.com".into()),
            reminder_text: Some(text.into()),
            reminder_date: Some(at.format("%Y-%m-%d").to_string()),
            reminder_time: Some(at.format("%H:%M").to_string()),
            timezone_offset: None,
        }
    }

    fn book(dir: &tempfile::TempDir) -> LocalBook {
        LocalBook::new(LocalStorage::new(dir.path().join("local-storage.json")))
    }

    #[test]
    fn test_create_and_display_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let book = book(&dir);

        let late = book.create(&request("late", now() + Duration::hours(5)), now()).unwrap();
        let early = book.create(&request("early", now() + Duration::hours(1)), now()).unwrap();
        assert!(!late.notified);
        assert_eq!(book.last_email().unwrap().as_deref(), Some("me@example.com"));

        let view = book.display(now() + Duration::hours(2)).unwrap();
        let texts: Vec<&str> = view.iter().map(|v| v.reminder.text.as_str()).collect();
        assert_eq!(texts, vec!["early", "late"]);
        assert!(view[0].past_due);
        assert!(!view[1].past_due);
        assert_eq!(view[0].reminder.id, early.id);
    }

    #[test]
    fn test_create_validates_like_backend() {
        let dir = tempfile::tempdir().unwrap();
        let book = book(&dir);

        let err = book.create(&request("past", now() - Duration::hours(1)), now()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(book.display(now()).unwrap().is_empty());
        assert_eq!(book.last_email().unwrap(), None);
    }

    #[test]
    fn test_check_notifies_once() {
        let dir = tempfile::tempdir().unwrap();
        let book = book(&dir);
        let notifier = CollectingNotifier::default();

        book.create(&request("soon", now() + Duration::minutes(1)), now()).unwrap();
        book.create(&request("later", now() + Duration::hours(1)), now()).unwrap();

        assert_eq!(book.check(now(), &notifier).unwrap(), 0);
        assert_eq!(book.check(now() + Duration::minutes(2), &notifier).unwrap(), 1);
        assert_eq!(book.check(now() + Duration::minutes(3), &notifier).unwrap(), 0);
        assert_eq!(book.check(now() + Duration::hours(2), &notifier).unwrap(), 1);

        assert_eq!(*notifier.seen.lock().unwrap(), vec!["soon", "later"]);
        assert!(book.display(now()).unwrap().iter().all(|v| v.reminder.notified));
    }

    #[test]
    fn test_delete_removes_only_target() {
        let dir = tempfile::tempdir().unwrap();
        let book = book(&dir);

        let keep = book.create(&request("keep", now() + Duration::hours(1)), now()).unwrap();
        let gone = book.create(&request("drop", now() + Duration::hours(2)), now()).unwrap();

        book.delete(&gone.id).unwrap();
        let remaining: Vec<String> = book
            .display(now())
            .unwrap()
            .into_iter()
            .map(|v| v.reminder.id)
            .collect();
        assert_eq!(remaining, vec![keep.id]);

        assert!(matches!(book.delete(&gone.id), Err(AppError::NotFound(_))));
    }
}
