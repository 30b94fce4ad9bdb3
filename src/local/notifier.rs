use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tracing::{error, info};

use super::local_book::{LocalBook, LocalReminder};
use crate::error::{AppError, Result};

/// Destination for local reminder notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, reminder: &LocalReminder);
}

/// Rings the terminal bell and prints the reminder.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, reminder: &LocalReminder) {
        println!(
            "\x07⏰ Reminder for {}: {}",
            reminder.email, reminder.text
        );
        info!(reminder_id = %reminder.id, "Local reminder fired");
    }
}

/// Runs one check on the blocking pool, since the book reads and writes
/// its file synchronously.
pub async fn check_now(book: &LocalBook, notifier: Arc<dyn Notifier>) -> Result<usize> {
    let book = book.clone();
    tokio::task::spawn_blocking(move || book.check(Utc::now(), notifier.as_ref()))
        .await
        .map_err(|e| AppError::Internal(format!("local check aborted: {}", e)))?
}

/// Checks the book every `interval` until Ctrl-C.
pub async fn watch(book: LocalBook, interval: Duration, notifier: Arc<dyn Notifier>) {
    let mut ticker = tokio::time::interval(interval);
    info!("Watching local reminders every {:?}", interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = check_now(&book, notifier.clone()).await {
                    error!("Error checking local reminders: {:?}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopped watching local reminders");
                break;
            }
        }
    }
}
