pub mod entry;
pub mod lock;
pub mod onboard;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "MoodLog", about = "Mood journal with calendar and streak reports")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Onboard,
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    Status,
    Doctor,
    Entry {
        #[command(subcommand)]
        command: EntryCommands,
    },
    Mood {
        #[command(subcommand)]
        command: MoodCommands,
    },
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Print the mood calendar for a month (YYYY-MM, defaults to the current month).
    Calendar {
        #[arg(long)]
        month: Option<String>,
    },
    Report {
        #[arg(long, value_enum, default_value_t = PeriodArg::Weekly)]
        period: PeriodArg,
        /// Day for daily reports (defaults to today). Weekly and monthly
        /// reports always cover the current week or month.
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value_t = false)]
        save: bool,
    },
    /// Run the HTTP API and the daily report scheduler.
    Serve,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    Set { key: String, value: String },
    Get { key: String },
}

#[derive(Debug, Subcommand)]
pub enum EntryCommands {
    Add {
        #[arg(long)]
        date: Option<String>,
        /// Mood id with optional intensity, e.g. `happy:3`.
        #[arg(long = "mood")]
        moods: Vec<String>,
        /// Prompt answer as `prompt_id=text`.
        #[arg(long = "response")]
        responses: Vec<String>,
        /// Skipped prompt as `prompt_id=phrase`.
        #[arg(long = "skip")]
        skips: Vec<String>,
        #[arg(long, short, default_value_t = false)]
        interactive: bool,
    },
    Show {
        date: String,
    },
    List {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    Delete {
        date: String,
    },
    Import {
        path: PathBuf,
    },
    Export {
        path: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum MoodCommands {
    List,
    Add {
        word: String,
        color: String,
    },
    Edit {
        id: String,
        #[arg(long)]
        word: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommands {
    Show,
    Set { key: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PeriodArg {
    Daily,
    Weekly,
    Monthly,
}

impl PeriodArg {
    pub fn label(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands, EntryCommands, PeriodArg};
    use clap::Parser;

    #[test]
    fn entry_add_collects_repeated_flags() {
        let cli = Cli::try_parse_from([
            "MoodLog",
            "entry",
            "add",
            "--mood",
            "happy:3",
            "--mood",
            "calm",
            "--skip",
            "grateful=Can't think of anything",
        ])
        .expect("parses");

        match cli.command {
            Commands::Entry {
                command: EntryCommands::Add { moods, skips, .. },
            } => {
                assert_eq!(moods, vec!["happy:3", "calm"]);
                assert_eq!(skips.len(), 1);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn report_period_defaults_to_weekly() {
        let cli = Cli::try_parse_from(["MoodLog", "report"]).expect("parses");
        match cli.command {
            Commands::Report { period, save, .. } => {
                assert_eq!(period, PeriodArg::Weekly);
                assert!(!save);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(Cli::try_parse_from(["MoodLog", "report", "--period", "yearly"]).is_err());
    }
}
