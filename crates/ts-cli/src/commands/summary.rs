//! Summary command for logged time per category.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use ts_core::{CategoryTotal, Clock, IdProvider, Persistence, Store, format_duration};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryJson<'a> {
    total_seconds: u64,
    categories: &'a [CategoryTotal],
}

pub fn run<W, P, I, C>(writer: &mut W, store: &Store<P, I, C>, json: bool) -> Result<()>
where
    W: Write,
    P: Persistence,
    I: IdProvider,
    C: Clock,
{
    let totals = store.totals_by_category();
    if json {
        let summary = SummaryJson {
            total_seconds: store.total_seconds(),
            categories: &totals,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&summary)?)?;
    } else {
        write!(writer, "{}", format_summary(&totals))?;
    }
    Ok(())
}

/// Formats per-category totals followed by the overall total.
pub fn format_summary(totals: &[CategoryTotal]) -> String {
    let mut output = String::new();

    if totals.is_empty() {
        writeln!(output, "No time logged yet.").unwrap();
        return output;
    }

    writeln!(output, "{:<20}  {:>7}  {:>10}", "Category", "Entries", "Time").unwrap();
    for total in totals {
        writeln!(
            output,
            "{:<20}  {:>7}  {:>10}",
            total.category_name,
            total.entries,
            format_duration(total.seconds)
        )
        .unwrap();
    }

    let entries: usize = totals.iter().map(|total| total.entries).sum();
    let seconds = totals
        .iter()
        .fold(0, |sum: u64, total| sum.saturating_add(total.seconds));
    writeln!(output).unwrap();
    writeln!(
        output,
        "{:<20}  {:>7}  {:>10}",
        "Total",
        entries,
        format_duration(seconds)
    )
    .unwrap();

    output
}
