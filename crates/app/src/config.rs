use std::path::PathBuf;

use api_types::Amount;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::{FilterError, FilterLabel, FilterState, ZonedClock, filter::parse_date};
use serde::Deserialize;

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/expense_tracker.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timezone: String,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            username: String::new(),
            password: String::new(),
            timezone: "UTC".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Clock answering "today" in the configured timezone.
    pub fn clock(&self) -> Result<ZonedClock> {
        let tz = self
            .timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| AppError::Timezone(self.timezone.clone()))?;
        Ok(ZonedClock::new(tz))
    }

    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

#[derive(Debug, Parser)]
#[command(name = "expense_tracker", version)]
pub struct Cli {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Override base URL (e.g. http://127.0.0.1:8000/api).
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// Override username (password is never read from CLI).
    #[arg(long, global = true)]
    pub username: Option<String>,
    /// Override timezone (IANA name).
    #[arg(long, global = true)]
    pub timezone: Option<String>,
    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch every dashboard section once and print it.
    Dashboard {
        #[command(flatten)]
        range: RangeArgs,
        /// Only list expenses and incomes of this category.
        #[arg(long)]
        category: Option<String>,
    },
    /// Follow range commands from stdin, refetching in the background.
    Watch {
        #[command(flatten)]
        range: RangeArgs,
        /// Only list expenses and incomes of this category.
        #[arg(long)]
        category: Option<String>,
    },
    /// Write the transactions of a range to a CSV file.
    Export {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long, short, default_value = "transactions.csv")]
        output: PathBuf,
        /// Download the server-rendered file instead of building it locally.
        #[arg(long)]
        remote: bool,
    },
    #[command(subcommand)]
    Expense(EntryCommand),
    #[command(subcommand)]
    Income(EntryCommand),
}

impl Command {
    /// Category filter for the expense and income lists.
    pub fn category(&self) -> Option<&str> {
        match self {
            Self::Dashboard { category, .. } | Self::Watch { category, .. } => category.as_deref(),
            _ => None,
        }
    }
}

/// Initial range selection.
#[derive(Debug, Clone, Default, Args)]
pub struct RangeArgs {
    /// Preset: all, last-month, last-3-months.
    #[arg(long)]
    pub range: Option<FilterLabel>,
    /// Custom range start (YYYY-MM-DD), requires --to.
    #[arg(long)]
    pub from: Option<String>,
    /// Custom range end (YYYY-MM-DD), requires --from.
    #[arg(long)]
    pub to: Option<String>,
}

impl RangeArgs {
    /// Commits the requested selection; explicit bounds win over a preset.
    pub fn apply(&self, filter: &FilterState) -> std::result::Result<(), FilterError> {
        if self.from.is_some() || self.to.is_some() {
            let from = self.from.as_deref().map(parse_date).transpose()?;
            let to = self.to.as_deref().map(parse_date).transpose()?;
            return filter.set_custom_range(from, to);
        }
        if let Some(label) = self.range {
            filter.set_label(label);
        }
        Ok(())
    }
}

#[derive(Debug, Subcommand)]
pub enum EntryCommand {
    Add {
        /// Expense title or income source.
        #[arg(long, visible_alias = "source")]
        title: String,
        #[arg(long, allow_hyphen_values = true)]
        amount: Amount,
        #[arg(long)]
        category: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// Defaults to today in the configured timezone.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Delete {
        id: i64,
    },
}

pub fn load(cli: &Cli) -> Result<AppConfig> {
    let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("EXPENSE_TRACKER"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = &cli.base_url {
        settings.base_url = base_url.clone();
    }
    if let Some(username) = &cli.username {
        settings.username = username.clone();
    }
    if let Some(timezone) = &cli.timezone {
        settings.timezone = timezone.clone();
    }
    if let Some(log_level) = &cli.log_level {
        settings.log_level = log_level.clone();
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("expense_tracker").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn range_presets_parse_from_kebab_case() {
        let cli = parse(&["dashboard", "--range", "last-3-months"]);
        assert_eq!(cli.command.category(), None);
        let Command::Dashboard { range, .. } = cli.command else {
            panic!("expected dashboard");
        };
        assert_eq!(range.range, Some(FilterLabel::Last3Months));
    }

    #[test]
    fn listing_category_is_read_from_the_view_commands() {
        let cli = parse(&["watch", "--range", "last-month", "--category", "Food"]);
        assert_eq!(cli.command.category(), Some("Food"));

        let cli = parse(&["export", "--output", "out.csv"]);
        assert_eq!(cli.command.category(), None);
    }

    #[test]
    fn explicit_bounds_select_a_custom_range() {
        let filter = FilterState::new();
        let args = RangeArgs {
            range: Some(FilterLabel::LastMonth),
            from: Some("2025-01-01".to_string()),
            to: Some("2025-01-31".to_string()),
        };
        args.apply(&filter).unwrap();

        let selection = filter.selection();
        assert_eq!(selection.label, FilterLabel::CustomRange);
        assert_eq!(selection.from, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(selection.to, NaiveDate::from_ymd_opt(2025, 1, 31));
    }

    #[test]
    fn a_single_bound_is_rejected() {
        let filter = FilterState::new();
        let args = RangeArgs {
            from: Some("2025-01-01".to_string()),
            ..RangeArgs::default()
        };
        assert_eq!(args.apply(&filter), Err(FilterError::IncompleteRange));
        assert_eq!(filter.selection().label, FilterLabel::All);
    }

    #[test]
    fn entry_amounts_parse_as_decimals() {
        let cli = parse(&[
            "expense", "add", "--title", "Coffee", "--amount", "3,20", "--category", "Food",
        ]);
        let Command::Expense(EntryCommand::Add { amount, date, .. }) = cli.command else {
            panic!("expected expense add");
        };
        assert_eq!(amount, Amount::new(320));
        assert_eq!(date, None);
    }

    #[test]
    fn missing_file_falls_back_to_defaults_and_flags() {
        let cli = parse(&[
            "--config",
            "does/not/exist.toml",
            "--timezone",
            "Europe/Rome",
            "dashboard",
        ]);
        let settings = load(&cli).unwrap();
        assert_eq!(settings.timezone, "Europe/Rome");
        assert!(settings.clock().is_ok());
        assert!(!settings.has_credentials());
    }

    #[test]
    fn unknown_timezones_are_reported() {
        let settings = AppConfig {
            timezone: "Mars/Olympus".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(settings.clock(), Err(AppError::Timezone(_))));
    }
}
