use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use super::sweep_service::ReminderSweeper;

/// Runs the sweep on `schedule` (six-field cron, seconds first) for the
/// lifetime of the returned scheduler.
pub async fn start_sweep_scheduler(
    sweeper: ReminderSweeper,
    schedule: &str,
) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_uuid, _l| {
        let sweeper = sweeper.clone();

        Box::pin(async move {
            if let Err(e) = sweeper.sweep().await {
                error!("Error checking reminders: {:?}", e);
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!("Reminder sweep scheduled with '{}'", schedule);
    Ok(scheduler)
}
