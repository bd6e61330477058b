//! Categories command for listing and editing categories.

use std::io::Write;

use anyhow::Result;
use ts_core::{Category, Clock, IdProvider, Persistence, Store};

use super::util::resolve_category;
use crate::CategoriesAction;

pub fn run<W, P, I, C>(writer: &mut W, store: &mut Store<P, I, C>, action: &CategoriesAction) -> Result<()>
where
    W: Write,
    P: Persistence,
    I: IdProvider,
    C: Clock,
{
    match action {
        CategoriesAction::List { json } => list(writer, store.categories(), *json),
        CategoriesAction::Add { name } => {
            let category = store.add_category(name)?;
            writeln!(writer, "Added category {} ({})", category.name, category.id)?;
            Ok(())
        }
        CategoriesAction::Delete { category } => {
            let id = resolve_category(store.categories(), category)?.id.clone();
            let removed = store.delete_category(&id)?;
            writeln!(writer, "Deleted category {}", removed.name)?;
            Ok(())
        }
        CategoriesAction::Rename { category, name } => {
            let target = resolve_category(store.categories(), category)?.clone();
            let renamed = store.rename_category(&target.id, name)?;
            writeln!(writer, "Renamed {} to {}", target.name, renamed.name)?;
            Ok(())
        }
    }
}

/// Writes the category list.
pub fn list<W: Write>(writer: &mut W, categories: &[Category], json: bool) -> Result<()> {
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(categories)?)?;
        return Ok(());
    }

    if categories.is_empty() {
        writeln!(writer, "No categories yet. Add one with 'trackstar categories add <name>'.")?;
        return Ok(());
    }

    let id_width = categories
        .iter()
        .map(|category| category.id.as_str().len())
        .max()
        .unwrap_or(2)
        .max(2);
    writeln!(writer, "{:<id_width$}  Name", "ID")?;
    for category in categories {
        writeln!(writer, "{:<id_width$}  {}", category.id.as_str(), category.name)?;
    }
    Ok(())
}
