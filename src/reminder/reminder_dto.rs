use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::reminder_models::Reminder;

/// Body posted by the reminder form. Every field is optional at the wire
/// level so that absent fields surface as a validation error, not a
/// deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReminderRequest {
    pub email: Option<String>,
    pub reminder_text: Option<String>,
    /// `YYYY-MM-DD`
    pub reminder_date: Option<String>,
    /// `HH:MM` or `HH:MM:SS`
    pub reminder_time: Option<String>,
    /// Minutes between UTC and the sender's local time, as reported by
    /// `Date.prototype.getTimezoneOffset`. Absent means UTC.
    pub timezone_offset: Option<i32>,
}

/// Trimmed form fields once presence has been checked.
#[derive(Debug, Validate)]
pub struct ReminderDraft {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 5000))]
    pub reminder_text: String,
    pub reminder_date: String,
    pub reminder_time: String,
    pub timezone_offset: i32,
}

/// Result of validating a creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedReminder {
    pub email: String,
    pub text: String,
    pub scheduled_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReminderResponse {
    pub success: bool,
    pub message: String,
    pub reminder_id: String,
    pub reminder: Reminder,
}

impl From<Reminder> for CreateReminderResponse {
    fn from(reminder: Reminder) -> Self {
        Self {
            success: true,
            message: "Reminder created successfully".to_string(),
            reminder_id: reminder.id.clone(),
            reminder,
        }
    }
}
