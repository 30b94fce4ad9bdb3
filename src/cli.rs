use clap::{Parser, Subcommand};

/// Email reminder service: HTTP API, scheduled delivery sweep and an
/// offline local reminder list.
#[derive(Parser)]
#[command(
    name = "reminder-mailer",
    version = env!("CARGO_PKG_VERSION"),
    about = "Schedule reminder emails and deliver them when they come due",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API and the scheduled sweep (default)
    Serve,

    /// Run one sweep now and print the report as JSON
    Sweep,

    /// Manage the offline reminder list (no email is sent)
    Local {
        #[command(subcommand)]
        command: LocalCommands,
    },
}

#[derive(Subcommand)]
pub enum LocalCommands {
    /// Add a reminder
    Add {
        /// Recipient (defaults to the last email used)
        #[arg(long)]
        email: Option<String>,

        /// Reminder text
        #[arg(long)]
        text: String,

        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Time (HH:MM), UTC unless --offset is given
        #[arg(long)]
        time: String,

        /// Minutes between UTC and local time (UTC minus local)
        #[arg(long, allow_hyphen_values = true)]
        offset: Option<i32>,
    },

    /// List reminders, earliest first
    List,

    /// Delete a reminder by ID
    Delete {
        /// Reminder ID
        id: String,
    },

    /// Check for due reminders periodically until interrupted
    Watch {
        /// Seconds between checks
        #[arg(long, default_value_t = 60)]
        interval: u64,
    },

    /// Print the last email address used
    LastEmail,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_local_add() {
        let cli = Cli::parse_from([
            "reminder-mailer",
            "local",
            "add",
            "--text",
            "Stand-up",
            "--date",
            "2030-01-01",
            "--time",
            "09:00",
            "--offset",
            "-60",
        ]);

        match cli.command {
            Some(Commands::Local {
                command:
                    LocalCommands::Add {
                        email,
                        text,
                        offset,
                        ..
                    },
            }) => {
                assert_eq!(email, None);
                assert_eq!(text, "Stand-up");
                assert_eq!(offset, Some(-60));
            }
            _ => panic!("expected local add"),
        }
    }

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::parse_from(["reminder-mailer"]);
        assert!(cli.command.is_none());
    }
}
