//! Log command for listing logged time entries.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{Local, TimeZone};
use clap::Args;
use ts_core::{Clock, IdProvider, Persistence, Store, TimeEntry, format_duration};

#[derive(Debug, Args)]
pub struct LogArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,

    /// Show at most this many entries.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Delete every logged entry instead of listing them.
    #[arg(long, conflicts_with_all = ["json", "limit"])]
    pub clear: bool,
}

pub fn run<W, P, I, C>(writer: &mut W, store: &mut Store<P, I, C>, args: &LogArgs) -> Result<()>
where
    W: Write,
    P: Persistence,
    I: IdProvider,
    C: Clock,
{
    if args.clear {
        let removed = store.clear_entries()?;
        writeln!(writer, "Cleared {removed} {}.", if removed == 1 { "entry" } else { "entries" })?;
        return Ok(());
    }

    let entries = store.entries();
    let shown = &entries[..args.limit.unwrap_or(entries.len()).min(entries.len())];
    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(shown)?)?;
    } else {
        write!(writer, "{}", format_entries(shown, entries, &Local))?;
    }
    Ok(())
}

/// Truncates by characters, not bytes, to stay on UTF-8 boundaries.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        format!("{}...", text.chars().take(width - 3).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Formats entries as a table, newest first, with a footer over `all`.
pub fn format_entries<Tz>(shown: &[TimeEntry], all: &[TimeEntry], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut output = String::new();

    if all.is_empty() {
        writeln!(output, "No time logged yet.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<20}  {:>10}  {:<24}  Logged At",
        "Category", "Duration", "Description"
    )
    .unwrap();
    for entry in shown {
        let description = entry.description.as_deref().unwrap_or("-");
        writeln!(
            output,
            "{:<20}  {:>10}  {:<24}  {}",
            truncate(&entry.category_name, 20),
            format_duration(entry.duration_seconds),
            truncate(description, 24),
            entry
                .logged_at
                .with_timezone(tz)
                .format("%Y-%m-%d %H:%M:%S")
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    if shown.len() < all.len() {
        writeln!(output, "Showing {} of {} entries.", shown.len(), all.len()).unwrap();
    }
    let total = all
        .iter()
        .fold(0, |sum: u64, entry| sum.saturating_add(entry.duration_seconds));
    writeln!(
        output,
        "Total: {} across {} {}",
        format_duration(total),
        all.len(),
        if all.len() == 1 { "entry" } else { "entries" }
    )
    .unwrap();

    output
}
