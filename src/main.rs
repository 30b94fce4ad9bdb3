mod cli;
mod db;
mod email;
mod error;
mod local;
mod reminder;
mod routes;
mod state;
mod store;
mod sweep;

use std::{sync::Arc, time::Duration};

use ansi_term::Style;
use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use cli::{Cli, Commands, LocalCommands};
use local::{ConsoleNotifier, LocalBook, LocalStorage};
use reminder::CreateReminderRequest;
use routes::create_router;
use state::{AppState, Config};
use store::connect_store;
use sweep::{start_sweep_scheduler, ReminderSweeper, SweepResponse};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,reminder_mailer=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Arc::new(Config::from_env()?);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Sweep => sweep_once(config).await,
        Commands::Local { command } => run_local(&config, command).await,
    }
}

async fn serve(config: Arc<Config>) -> anyhow::Result<()> {
    let store = connect_store(&config).await?;
    let mailer = config.email_provider()?;
    if mailer.is_none() {
        tracing::warn!("RESEND_API_KEY is not set; reminders will be stored but not sent");
    }

    let state = AppState::new(config.clone(), store, mailer);

    // Start the sweep scheduler; keep the handle alive for the server's lifetime.
    let _scheduler = match state.sweeper.clone() {
        Some(sweeper) => Some(start_sweep_scheduler(sweeper, &config.sweep_schedule).await?),
        None => None,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn sweep_once(config: Arc<Config>) -> anyhow::Result<()> {
    let store = connect_store(&config).await?;
    let mailer = config
        .email_provider()?
        .context("RESEND_API_KEY must be set to send reminders")?;

    let sweeper = ReminderSweeper::new(store, mailer, config.sweep_settings());
    let report = sweeper.sweep().await?;

    println!("{}", serde_json::to_string_pretty(&SweepResponse::from(report))?);
    Ok(())
}

async fn run_local(config: &Config, command: LocalCommands) -> anyhow::Result<()> {
    let book = LocalBook::new(LocalStorage::new(&config.local_storage_path));

    match command {
        LocalCommands::Add {
            email,
            text,
            date,
            time,
            offset,
        } => {
            let email = match email {
                Some(email) => Some(email),
                None => book.last_email()?,
            };
            let request = CreateReminderRequest {
                email,
                reminder_text: Some(text),
                reminder_date: Some(date),
                reminder_time: Some(time),
                timezone_offset: offset,
            };
            let reminder = book.create(&request, Utc::now())?;
            println!(
                "✓ Reminder {} set for {} ({})",
                reminder.id,
                reminder.scheduled_time.format("%Y-%m-%d %H:%M UTC"),
                reminder.email
            );
        }
        LocalCommands::List => {
            let reminders = book.display(Utc::now())?;
            if reminders.is_empty() {
                println!("No reminders.");
            }
            for view in reminders {
                let line = format!(
                    "{}  {}  {}  {}",
                    view.reminder.scheduled_time.format("%Y-%m-%d %H:%M"),
                    view.reminder.id,
                    view.reminder.email,
                    view.reminder.text
                );
                if view.past_due {
                    println!("{}", Style::new().dimmed().paint(line));
                } else {
                    println!("{}", line);
                }
            }
        }
        LocalCommands::Delete { id } => {
            book.delete(&id)?;
            println!("Deleted {}", id);
        }
        LocalCommands::Watch { interval } => {
            local::watch(book, Duration::from_secs(interval.max(1)), Arc::new(ConsoleNotifier)).await;
        }
        LocalCommands::LastEmail => match book.last_email()? {
            Some(email) => println!("{}", email),
            None => println!("No email used yet."),
        },
    }

    Ok(())
}
