use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

const ID_PREFIX: &str = "reminder";
const ID_SUFFIX_LEN: usize = 9;

/// A stored reminder. Its JSON form is also the value kept in the store,
/// always under the key `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub email: String,
    pub text: String,
    pub scheduled_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    /// Lease held by a sweep that is currently sending this reminder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_until: Option<DateTime<Utc>>,
}

impl Reminder {
    pub fn new(
        email: String,
        text: String,
        scheduled_time: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: generate_id(created_at),
            email,
            text,
            scheduled_time,
            created_at,
            sent: false,
            sent_at: None,
            claimed_until: None,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_time <= now
    }

    pub fn is_claimed(&self, now: DateTime<Utc>) -> bool {
        matches!(self.claimed_until, Some(until) if until > now)
    }

    /// Due, unsent and not held by another sweep.
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        !self.sent && self.is_due(now) && !self.is_claimed(now)
    }

    pub fn claimed(&self, now: DateTime<Utc>, lease: Duration) -> Self {
        Self {
            claimed_until: Some(now + lease),
            ..self.clone()
        }
    }

    pub fn released(&self) -> Self {
        Self {
            claimed_until: None,
            ..self.clone()
        }
    }

    pub fn marked_sent(&self, sent_at: DateTime<Utc>) -> Self {
        Self {
            sent: true,
            sent_at: Some(sent_at),
            claimed_until: None,
            ..self.clone()
        }
    }
}

/// `reminder_<unix millis>_<random suffix>`
pub fn generate_id(at: DateTime<Utc>) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}",
        ID_PREFIX,
        at.timestamp_millis(),
        &random[..ID_SUFFIX_LEN]
    )
}
