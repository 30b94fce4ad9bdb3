use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;

use crate::{
    email::{resend::DEFAULT_BASE_URL, EmailProvider, ResendClient},
    reminder::ReminderService,
    store::{ReminderStore, StorageBackend},
    sweep::{ReminderSweeper, SweepSettings},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ReminderStore>,
    pub reminder_service: ReminderService,
    /// `None` when no email provider is configured.
    pub sweeper: Option<ReminderSweeper>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn ReminderStore>,
        mailer: Option<Arc<dyn EmailProvider>>,
    ) -> Self {
        let sweeper = mailer.map(|mailer| {
            ReminderSweeper::new(store.clone(), mailer, config.sweep_settings())
        });

        Self {
            reminder_service: ReminderService::new(store.clone()),
            config,
            store,
            sweeper,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub data_dir: PathBuf,
    pub resend_api_key: Option<String>,
    pub resend_base_url: String,
    pub email_from: String,
    pub email_send_timeout_secs: u64,
    pub sweep_schedule: String,
    pub sweep_lease_secs: i64,
    pub local_storage_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            storage_backend: StorageBackend::Auto,
            database_url: None,
            data_dir: PathBuf::from("./data/reminders"),
            resend_api_key: None,
            resend_base_url: DEFAULT_BASE_URL.to_string(),
            email_from: "Reminders <onboarding@resend.dev>".to_string(),
            email_send_timeout_secs: 10,
            sweep_schedule: "0 * * * * *".to_string(),
            sweep_lease_secs: 300,
            local_storage_path: PathBuf::from("./data/local-storage.json"),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            host: env_or("HOST", defaults.host),
            port: parse_env("PORT", defaults.port)?,
            storage_backend: match non_empty_env("STORAGE_BACKEND") {
                Some(value) => value
                    .parse()
                    .map_err(|e: String| anyhow::anyhow!(e))
                    .context("invalid STORAGE_BACKEND")?,
                None => defaults.storage_backend,
            },
            database_url: non_empty_env("DATABASE_URL"),
            data_dir: non_empty_env("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            resend_api_key: non_empty_env("RESEND_API_KEY"),
            resend_base_url: env_or("RESEND_BASE_URL", defaults.resend_base_url),
            email_from: env_or("EMAIL_FROM", defaults.email_from),
            email_send_timeout_secs: parse_env(
                "EMAIL_SEND_TIMEOUT_SECS",
                defaults.email_send_timeout_secs,
            )?,
            sweep_schedule: env_or("SWEEP_SCHEDULE", defaults.sweep_schedule),
            sweep_lease_secs: parse_env("SWEEP_LEASE_SECS", defaults.sweep_lease_secs)?,
            local_storage_path: non_empty_env("LOCAL_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.local_storage_path),
        })
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.email_send_timeout_secs)
    }

    pub fn sweep_settings(&self) -> SweepSettings {
        SweepSettings {
            from: self.email_from.clone(),
            send_timeout: self.send_timeout(),
            lease: chrono::Duration::seconds(self.sweep_lease_secs),
        }
    }

    /// The Resend client, or `None` when `RESEND_API_KEY` is unset.
    pub fn email_provider(&self) -> anyhow::Result<Option<Arc<dyn EmailProvider>>> {
        let Some(api_key) = self.resend_api_key.as_deref() else {
            return Ok(None);
        };
        let client = ResendClient::new(api_key, self.resend_base_url.as_str(), self.send_timeout())
            .context("failed to build email client")?;
        Ok(Some(Arc::new(client)))
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: String) -> String {
    non_empty_env(key).unwrap_or(default)
}

fn parse_env<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty_env(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} must be a number: {}", key, e)),
        None => Ok(default),
    }
}
