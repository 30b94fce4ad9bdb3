use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::reminder::reminder_dto::{CreateReminderRequest, ReminderDraft, ValidatedReminder};
use crate::reminder::reminder_models::Reminder;
use crate::store::{ReminderStore, StoreError};

// UTC-14:00 to UTC+14:00
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Service layer for reminder creation and lookup.
#[derive(Clone)]
pub struct ReminderService {
    store: Arc<dyn ReminderStore>,
}

impl ReminderService {
    pub fn new(store: Arc<dyn ReminderStore>) -> Self {
        Self { store }
    }

    pub async fn create_reminder(&self, payload: &CreateReminderRequest) -> Result<Reminder> {
        self.create_reminder_at(payload, Utc::now()).await
    }

    pub async fn create_reminder_at(
        &self,
        payload: &CreateReminderRequest,
        now: DateTime<Utc>,
    ) -> Result<Reminder> {
        let valid = validate_request(payload, now)?;
        let reminder = Reminder::new(valid.email, valid.text, valid.scheduled_time, now);

        self.store.set(&reminder.id, &reminder).await?;

        tracing::info!(
            reminder_id = %reminder.id,
            scheduled_time = %reminder.scheduled_time,
            "Reminder created"
        );
        Ok(reminder)
    }

    /// Ids that could never have been issued are reported as not found.
    pub async fn get_reminder(&self, id: &str) -> Result<Reminder> {
        match self.store.get(id).await {
            Ok(Some(reminder)) => Ok(reminder),
            Ok(None) | Err(StoreError::InvalidKey(_)) => {
                Err(AppError::NotFound("Reminder not found".into()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Checks a creation request against `now` and resolves its absolute send time.
pub fn validate_request(
    payload: &CreateReminderRequest,
    now: DateTime<Utc>,
) -> Result<ValidatedReminder> {
    let draft = ReminderDraft {
        email: required(&payload.email)?,
        reminder_text: required(&payload.reminder_text)?,
        reminder_date: required(&payload.reminder_date)?,
        reminder_time: required(&payload.reminder_time)?,
        timezone_offset: payload.timezone_offset.unwrap_or(0),
    };

    draft.validate()?;
    if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&draft.timezone_offset) {
        return Err(AppError::Validation("Invalid timezone offset".into()));
    }
    if !has_dotted_domain(&draft.email) {
        return Err(AppError::Validation("Invalid email address".into()));
    }

    let scheduled_time = combine_date_time(
        &draft.reminder_date,
        &draft.reminder_time,
        draft.timezone_offset,
    )?;
    if scheduled_time <= now {
        return Err(AppError::Validation(
            "Reminder time must be in the future".into(),
        ));
    }

    Ok(ValidatedReminder {
        email: draft.email,
        text: draft.reminder_text,
        scheduled_time,
    })
}

fn required(field: &Option<String>) -> Result<String> {
    match field.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(AppError::Validation("Missing required fields".into())),
    }
}

/// `local@domain.tld`: the domain needs at least one inner dot.
fn has_dotted_domain(email: &str) -> bool {
    match email.rsplit_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain
                    .split('.')
                    .filter(|label| !label.is_empty())
                    .count()
                    >= 2
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Combines a local date and time into a UTC instant. `offset_minutes`
/// follows the browser convention of UTC minus local time.
pub fn combine_date_time(date: &str, time: &str, offset_minutes: i32) -> Result<DateTime<Utc>> {
    let invalid = || AppError::Validation("Invalid date or time".into());

    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| invalid())?;
    let time = NaiveTime::parse_from_str(time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
        .map_err(|_| invalid())?;

    let local = NaiveDateTime::new(date, time);
    let utc = local
        .checked_add_signed(Duration::minutes(offset_minutes.into()))
        .ok_or_else(invalid)?;

    Ok(Utc.from_utc_datetime(&utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FilesystemStore, MemoryStore};

    fn request(email: &str, text: &str, date: &str, time: &str) -> CreateReminderRequest {
        CreateReminderRequest {
            email: Some(email.into()),
            reminder_text: Some(text.into()),
            reminder_date: Some(date.into()),
            reminder_time: Some(time.into()),
            timezone_offset: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap()
    }

    fn validation_message(err: AppError) -> String {
        match err {
            AppError::Validation(msg) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_request_resolves_scheduled_time() {
        let valid = validate_request(
            &request(" someone@example.com ", "Call mom", "2030-06-02", "09:30"),
            now(),
        )
        .unwrap();

        assert_eq!(valid.email, "someone@example.com");
        assert_eq!(valid.text, "Call mom");
        assert_eq!(
            valid.scheduled_time,
            Utc.with_ymd_and_hms(2030, 6, 2, 9, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_seconds_and_timezone_offset() {
        let mut req = request("a@b.co", "x", "2030-06-01", "13:00:15");
        req.timezone_offset = Some(-120);

        let valid = validate_request(&req, Utc.with_ymd_and_hms(2030, 6, 1, 10, 0, 0).unwrap())
            .unwrap();
        assert_eq!(
            valid.scheduled_time,
            Utc.with_ymd_and_hms(2030, 6, 1, 11, 0, 15).unwrap()
        );
    }

    #[test]
    fn test_missing_fields_rejected() {
        let full = request("a@b.co", "text", "2030-06-02", "09:30");
        let variants = [
            CreateReminderRequest { email: None, ..full.clone() },
            CreateReminderRequest { reminder_text: None, ..full.clone() },
            CreateReminderRequest { reminder_date: None, ..full.clone() },
            CreateReminderRequest { reminder_time: None, ..full.clone() },
            CreateReminderRequest { reminder_text: Some("   ".into()), ..full.clone() },
        ];

        for req in variants {
            let err = validate_request(&req, now()).unwrap_err();
            assert_eq!(validation_message(err), "Missing required fields");
        }
    }

    #[test]
    fn test_malformed_emails_rejected() {
        for email in [
            "plainaddress",
            "no-domain@",
            "@example.com",
            "user@localhost",
            "user@example.",
            "user@.com",
            "two@@example.com",
        ] {
            let err = validate_request(&request(email, "t", "2030-06-02", "09:30"), now())
                .unwrap_err();
            assert_eq!(validation_message(err), "Invalid email address", "{}", email);
        }
    }

    #[test]
    fn test_past_and_present_times_rejected() {
        for (date, time) in [
            ("2030-06-01", "12:00"),
            ("2030-06-01", "11:59"),
            ("2029-12-31", "23:59"),
        ] {
            let err = validate_request(&request("a@b.co", "t", date, time), now()).unwrap_err();
            assert_eq!(
                validation_message(err),
                "Reminder time must be in the future"
            );
        }
    }

    #[test]
    fn test_unparseable_date_rejected() {
        for (date, time) in [("2030-13-01", "10:00"), ("tomorrow", "10:00"), ("2030-06-02", "25:00")] {
            let err = validate_request(&request("a@b.co", "t", date, time), now()).unwrap_err();
            assert_eq!(validation_message(err), "Invalid date or time");
        }
    }

    #[test]
    fn test_overlong_text_rejected() {
        let text = "x".repeat(5001);
        let err = validate_request(&request("a@b.co", &text, "2030-06-02", "09:30"), now())
            .unwrap_err();
        assert_eq!(validation_message(err), "Reminder text is too long");
    }

    #[tokio::test]
    async fn test_create_persists_unsent_record_under_its_id() {
        let store = Arc::new(MemoryStore::new());
        let service = ReminderService::new(store.clone());

        let reminder = service
            .create_reminder_at(&request("a@b.co", "Pay rent", "2030-06-02", "09:30"), now())
            .await
            .unwrap();

        assert!(!reminder.sent);
        assert_eq!(reminder.created_at, now());
        let stored = store.get(&reminder.id).await.unwrap().unwrap();
        assert_eq!(stored, reminder);
        assert_eq!(service.get_reminder(&reminder.id).await.unwrap(), reminder);
    }

    #[tokio::test]
    async fn test_rejected_create_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let service = ReminderService::new(store.clone());

        let result = service
            .create_reminder_at(&request("a@b.co", "late", "2020-01-01", "00:00"), now())
            .await;

        assert!(result.is_err());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_unknown_reminder() {
        let service = ReminderService::new(Arc::new(MemoryStore::new()));
        let err = service.get_reminder("reminder_1_missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_malformed_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FilesystemStore::open(dir.path()).await.unwrap());
        let service = ReminderService::new(store);

        for id in ["a.b", "../etc/passwd", "reminder 1"] {
            let err = service.get_reminder(id).await.unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)), "{}", id);
        }
    }
}
