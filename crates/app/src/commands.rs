use std::{io, path::Path, sync::Arc, time::Duration};

use api_types::{
    Amount,
    transaction::{ExpenseNew, IncomeNew, TransactionRow},
};
use chrono::NaiveDate;
use client::ApiClient;
use engine::{
    Clock, DispatchReport, FetchOrchestrator, FilterError, FilterLabel, FilterState, ResolvedRange,
    Trigger,
};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    config::{AppConfig, EntryCommand, RangeArgs},
    dashboard::Dashboard,
    error::Result,
};

const SETTLE_POLL: Duration = Duration::from_millis(25);
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

const WATCH_HELP: &str = "\
commands:
  all | last-month | last-3-months   select a preset
  custom                             open a custom range
  range YYYY-MM-DD YYYY-MM-DD        commit a custom range
  cancel                             close an open custom range
  refresh                            refetch every section
  show                               print the dashboard again
  quit";

/// Everything a command needs: an authenticated client and the wired stores.
pub struct Session {
    pub client: ApiClient,
    pub clock: Arc<dyn Clock>,
    pub filter: FilterState,
    pub dashboard: Dashboard,
    pub orchestrator: Arc<FetchOrchestrator>,
    logged_in: bool,
}

impl Session {
    /// `category` narrows the expense and income lists of the dashboard.
    pub async fn connect(config: &AppConfig, category: Option<&str>) -> Result<Self> {
        let client = ApiClient::new(&config.base_url)?;
        let logged_in = if config.has_credentials() {
            client.login(&config.username, &config.password).await?;
            true
        } else {
            tracing::warn!("no credentials configured, requests are sent anonymously");
            false
        };

        let clock: Arc<dyn Clock> = Arc::new(config.clock()?);
        let filter = FilterState::new();
        let dashboard = Dashboard::new(&client, category.map(str::to_string));
        let mut orchestrator = FetchOrchestrator::new(filter.clone(), Arc::clone(&clock));
        dashboard.register(&mut orchestrator);

        Ok(Self {
            client,
            clock,
            filter,
            dashboard,
            orchestrator: Arc::new(orchestrator),
            logged_in,
        })
    }

    pub async fn close(self) {
        if !self.logged_in {
            return;
        }
        if let Err(err) = self.client.logout().await {
            tracing::warn!("logout failed: {err}");
        }
    }

    async fn print_dashboard(&self) -> Result<()> {
        let range = self.orchestrator.current_range();
        let label = self.filter.selection().label;
        let mut out = String::new();
        self.dashboard.render(&mut out, label, &range).await?;
        println!("{out}");
        Ok(())
    }
}

fn log_failures(report: &DispatchReport) {
    for (store, err) in report.failures() {
        tracing::warn!(store, range = %report.range, "fetch failed: {err}");
    }
}

pub async fn dashboard(session: &Session, range: &RangeArgs) -> Result<()> {
    range.apply(&session.filter)?;
    let report = session.orchestrator.dispatch(Trigger::SelectionChanged).await;
    log_failures(&report);
    session.print_dashboard().await?;
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum WatchCommand {
    Preset(FilterLabel),
    Custom { from: String, to: String },
    Cancel,
    Refresh,
    Show,
    Help,
    Quit,
}

fn parse_watch_command(line: &str) -> std::result::Result<Option<WatchCommand>, FilterError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let command = match head.to_ascii_lowercase().as_str() {
        "range" => match (words.next(), words.next()) {
            (Some(from), Some(to)) => WatchCommand::Custom {
                from: from.to_string(),
                to: to.to_string(),
            },
            _ => return Err(FilterError::IncompleteRange),
        },
        "cancel" => WatchCommand::Cancel,
        "refresh" => WatchCommand::Refresh,
        "show" => WatchCommand::Show,
        "help" | "?" => WatchCommand::Help,
        "quit" | "exit" | "q" => WatchCommand::Quit,
        _ => WatchCommand::Preset(line.trim().parse()?),
    };
    Ok(Some(command))
}

/// Waits until the background dispatch for the live range has settled.
async fn settle(orchestrator: &FetchOrchestrator) {
    let range = orchestrator.current_range();
    let wait = async {
        while !orchestrator.settled_for(&range).await {
            tokio::time::sleep(SETTLE_POLL).await;
        }
    };
    if tokio::time::timeout(SETTLE_TIMEOUT, wait).await.is_err() {
        tracing::warn!(%range, "sections still loading, showing what is there");
    }
}

pub async fn watch(session: &Session, range: &RangeArgs) -> Result<()> {
    range.apply(&session.filter)?;
    let background = session.orchestrator.spawn();
    log_failures(&session.orchestrator.dispatch(Trigger::SelectionChanged).await);
    session.print_dashboard().await?;
    println!("{WATCH_HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_watch_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };
        match command {
            WatchCommand::Preset(label) => session.filter.set_label(label),
            WatchCommand::Custom { from, to } => {
                if let Err(err) = session.filter.select_custom_range(&from, &to) {
                    eprintln!("{err}");
                    continue;
                }
            }
            WatchCommand::Cancel => {
                if !session.filter.dismiss_custom_range() {
                    continue;
                }
            }
            WatchCommand::Refresh => {
                log_failures(&session.orchestrator.dispatch(Trigger::Refresh).await);
            }
            WatchCommand::Show => {}
            WatchCommand::Help => {
                println!("{WATCH_HELP}");
                continue;
            }
            WatchCommand::Quit => break,
        }
        settle(&session.orchestrator).await;
        session.print_dashboard().await?;
    }

    background.abort();
    Ok(())
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    date: NaiveDate,
    kind: &'static str,
    title: &'a str,
    category: &'a str,
    amount: Amount,
    notes: &'a str,
}

/// Writes the rows inside `range`, returning how many were written.
fn write_csv<W: io::Write>(
    writer: W,
    rows: &[TransactionRow],
    range: &ResolvedRange,
) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(writer);
    let mut written = 0;
    for row in rows.iter().filter(|row| range.contains(row.date)) {
        writer.serialize(ExportRow {
            date: row.date,
            kind: if row.is_expense() { "expense" } else { "income" },
            title: &row.title,
            category: &row.category,
            amount: row.amount,
            notes: &row.notes,
        })?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

pub async fn export(
    session: &Session,
    range: &RangeArgs,
    output: &Path,
    remote: bool,
) -> Result<()> {
    range.apply(&session.filter)?;
    let resolved = session.orchestrator.current_range();

    if remote {
        let body = session.client.export_csv(&resolved).await?;
        tokio::fs::write(output, body).await?;
        tracing::info!(path = %output.display(), range = %resolved, "server export saved");
        return Ok(());
    }

    let rows = session.client.transactions(&resolved).await?;
    let written = write_csv(std::fs::File::create(output)?, &rows, &resolved)?;
    tracing::info!(path = %output.display(), range = %resolved, rows = written, "export written");
    println!("{written} transactions written to {}", output.display());
    Ok(())
}

#[derive(Clone, Copy, Debug)]
pub enum EntryKind {
    Expense,
    Income,
}

/// Runs a mutation, then refreshes every section so totals reflect it.
pub async fn entry(session: &Session, kind: EntryKind, command: &EntryCommand) -> Result<()> {
    match command {
        EntryCommand::Add {
            title,
            amount,
            category,
            notes,
            date,
        } => {
            let date = date.unwrap_or_else(|| session.clock.today());
            let id = match kind {
                EntryKind::Expense => {
                    let expense = ExpenseNew {
                        title: title.clone(),
                        amount: *amount,
                        category: category.clone(),
                        notes: notes.clone(),
                        date,
                    };
                    session.client.create_expense(&expense).await?.id
                }
                EntryKind::Income => {
                    let income = IncomeNew {
                        source: title.clone(),
                        amount: *amount,
                        category: category.clone(),
                        notes: notes.clone(),
                        date,
                    };
                    session.client.create_income(&income).await?.id
                }
            };
            tracing::info!(?kind, id, "entry created");
        }
        EntryCommand::Delete { id } => {
            let detail = match kind {
                EntryKind::Expense => session.client.delete_expense(*id).await?,
                EntryKind::Income => session.client.delete_income(*id).await?,
            };
            tracing::info!(?kind, id, "{}", detail.detail);
        }
    }

    log_failures(&session.orchestrator.dispatch(Trigger::Refresh).await);
    session.print_dashboard().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(title: &str, day: NaiveDate, minor: i64) -> TransactionRow {
        TransactionRow {
            title: title.to_string(),
            date: day,
            amount: Amount::new(minor),
            category: "Misc".to_string(),
            notes: String::new(),
            icon: None,
        }
    }

    #[test]
    fn watch_commands_parse() {
        assert_eq!(parse_watch_command("   "), Ok(None));
        assert_eq!(
            parse_watch_command("last-month"),
            Ok(Some(WatchCommand::Preset(FilterLabel::LastMonth)))
        );
        assert_eq!(
            parse_watch_command("Last 3 Months"),
            Ok(Some(WatchCommand::Preset(FilterLabel::Last3Months)))
        );
        assert_eq!(
            parse_watch_command("range 2025-01-01 2025-01-31"),
            Ok(Some(WatchCommand::Custom {
                from: "2025-01-01".to_string(),
                to: "2025-01-31".to_string()
            }))
        );
        assert_eq!(parse_watch_command("q"), Ok(Some(WatchCommand::Quit)));
    }

    #[test]
    fn watch_rejects_half_ranges_and_unknown_words() {
        assert_eq!(
            parse_watch_command("range 2025-01-01"),
            Err(FilterError::IncompleteRange)
        );
        assert_eq!(
            parse_watch_command("yesterday"),
            Err(FilterError::UnknownLabel("yesterday".to_string()))
        );
    }

    #[test]
    fn csv_export_keeps_rows_inside_the_range() {
        let rows = vec![
            row("Salary", date(2025, 3, 1), 250_000),
            row("Rent", date(2025, 2, 20), -90_000),
            row("Old", date(2024, 12, 31), -100),
        ];
        let range = ResolvedRange::between(date(2025, 2, 15), date(2025, 3, 15));

        let mut buf = Vec::new();
        let written = write_csv(&mut buf, &rows, &range).unwrap();
        assert_eq!(written, 2);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,kind,title,category,amount,notes");
        assert_eq!(lines[1], "2025-03-01,income,Salary,Misc,2500.00,");
        assert_eq!(lines[2], "2025-02-20,expense,Rent,Misc,-900.00,");
        assert_eq!(lines.len(), 3);
    }
}
