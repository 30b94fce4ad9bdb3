use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use crate::email::{reminder_email, EmailError, EmailProvider};
use crate::error::Result;
use crate::reminder::Reminder;
use crate::store::ReminderStore;

#[derive(Debug, Clone)]
pub struct SweepSettings {
    pub from: String,
    pub send_timeout: StdDuration,
    /// How long a claimed reminder stays reserved for the sweep sending it.
    pub lease: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub checked: usize,
    pub sent: usize,
    pub failed: usize,
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Skipped,
    Sent,
    Failed,
}

/// Scans every stored reminder and emails the eligible ones.
#[derive(Clone)]
pub struct ReminderSweeper {
    store: Arc<dyn ReminderStore>,
    mailer: Arc<dyn EmailProvider>,
    settings: SweepSettings,
}

impl ReminderSweeper {
    pub fn new(
        store: Arc<dyn ReminderStore>,
        mailer: Arc<dyn EmailProvider>,
        settings: SweepSettings,
    ) -> Self {
        Self {
            store,
            mailer,
            settings,
        }
    }

    pub async fn sweep(&self) -> Result<SweepReport> {
        self.sweep_at(Utc::now()).await
    }

    /// `now` decides which reminders are due. Claim deadlines and `sentAt`
    /// use the clock at the moment each record is written.
    ///
    /// Only a listing failure aborts the sweep; per-reminder failures are
    /// logged and counted.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let reminders = self.store.list().await?;
        let mut report = SweepReport::default();

        for reminder in reminders {
            report.checked += 1;
            match self.process(reminder, now).await {
                Outcome::Sent => report.sent += 1,
                Outcome::Failed => report.failed += 1,
                Outcome::Skipped => {}
            }
        }

        tracing::info!(
            checked = report.checked,
            sent = report.sent,
            failed = report.failed,
            "Reminder sweep finished"
        );
        Ok(report)
    }

    async fn process(&self, reminder: Reminder, now: DateTime<Utc>) -> Outcome {
        if !reminder.is_eligible(now) {
            return Outcome::Skipped;
        }

        let claimed = reminder.claimed(Utc::now(), self.settings.lease);
        match self
            .store
            .compare_and_swap(&reminder.id, &reminder, &claimed)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(reminder_id = %reminder.id, "Reminder claimed elsewhere, skipping");
                return Outcome::Skipped;
            }
            Err(e) => {
                tracing::error!(reminder_id = %reminder.id, "Failed to claim reminder: {}", e);
                return Outcome::Failed;
            }
        }

        if let Err(e) = self.send(&claimed).await {
            tracing::error!(reminder_id = %claimed.id, "Failed to send reminder: {}", e);
            self.release(&claimed).await;
            return Outcome::Failed;
        }

        let sent = claimed.marked_sent(Utc::now());
        match self.store.compare_and_swap(&claimed.id, &claimed, &sent).await {
            Ok(true) => {
                tracing::info!(reminder_id = %sent.id, "Sent reminder");
            }
            // The email went out; the claim keeps other sweeps away until the
            // lease runs out.
            Ok(false) => {
                tracing::warn!(reminder_id = %sent.id, "Reminder changed while sending, sent flag not written");
            }
            Err(e) => {
                tracing::error!(reminder_id = %sent.id, "Sent reminder but failed to mark it: {}", e);
            }
        }
        Outcome::Sent
    }

    async fn send(&self, reminder: &Reminder) -> std::result::Result<(), EmailError> {
        let email = reminder_email(reminder, &self.settings.from);
        match tokio::time::timeout(self.settings.send_timeout, self.mailer.send(&email)).await {
            Ok(result) => result,
            Err(_) => Err(EmailError::Timeout(self.settings.send_timeout)),
        }
    }

    async fn release(&self, claimed: &Reminder) {
        let released = claimed.released();
        if let Err(e) = self
            .store
            .compare_and_swap(&claimed.id, claimed, &released)
            .await
        {
            tracing::warn!(reminder_id = %claimed.id, "Failed to release claim: {}", e);
        }
    }
}
