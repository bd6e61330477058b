//! Suggest command implementation.
//!
//! Asks Claude which category an interval belongs to without running the
//! stopwatch. The suggestion is advisory: nothing is logged.

use std::io::Write;

use anyhow::{Result, bail};
use clap::Args;
use serde::Serialize;
use ts_core::{Category, Categorizer, SuggestionOutcome, match_category, request_suggestion};

#[derive(Debug, Args)]
pub struct SuggestArgs {
    /// Interval length in seconds, or as `MM:SS` / `HH:MM:SS`.
    #[arg(short, long, value_parser = parse_duration)]
    pub duration: u64,

    /// What the time was spent on.
    #[arg(short = 'm', long)]
    pub description: Option<String>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Result of the suggest command for JSON output.
#[derive(Serialize)]
struct SuggestOutput<'a> {
    category: &'a str,
    confidence: f32,
    existing_category_id: Option<&'a str>,
}

/// Parses plain seconds or a clock-style `[HH:]MM:SS` duration.
pub fn parse_duration(value: &str) -> Result<u64, String> {
    let value = value.trim();
    let invalid = || format!("invalid duration '{value}': expected seconds, MM:SS or HH:MM:SS");

    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() > 3 {
        return Err(invalid());
    }
    let mut seconds: u64 = 0;
    for (index, part) in parts.iter().enumerate() {
        let number: u64 = part.parse().map_err(|_| invalid())?;
        if index > 0 && number >= 60 {
            return Err(invalid());
        }
        seconds = seconds
            .checked_mul(60)
            .and_then(|total| total.checked_add(number))
            .ok_or_else(invalid)?;
    }
    Ok(seconds)
}

/// Run the suggest command.
pub async fn run<W, K>(
    writer: &mut W,
    categorizer: &K,
    categories: &[Category],
    args: &SuggestArgs,
) -> Result<()>
where
    W: Write,
    K: Categorizer + Sync,
{
    let outcome =
        request_suggestion(categorizer, args.duration, args.description.as_deref()).await?;
    let suggestion = match outcome {
        SuggestionOutcome::Ready(suggestion) => suggestion,
        SuggestionOutcome::Failed { message } => bail!("{message}"),
    };
    let existing = match_category(categories, &suggestion.category);

    if args.json {
        let output = SuggestOutput {
            category: &suggestion.category,
            confidence: suggestion.confidence.value(),
            existing_category_id: existing.map(|category| category.id.as_str()),
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
        return Ok(());
    }

    writeln!(
        writer,
        "Suggested category: {} ({} confidence)",
        suggestion.category, suggestion.confidence
    )?;
    match existing {
        Some(category) => writeln!(writer, "Matches existing category {} ({}).", category.name, category.id)?,
        None => writeln!(
            writer,
            "No category named \"{}\" exists. Add it with 'trackstar categories add \"{}\"'.",
            suggestion.category, suggestion.category
        )?,
    }
    Ok(())
}
