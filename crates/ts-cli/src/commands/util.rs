//! Shared utilities for CLI commands.

use anyhow::{Context, Result};
use ts_core::{Category, Clock, IdProvider, Persistence, Store, match_category};
use ts_db::LocalStorage;
use ts_llm::{ClaudeCategorizer, Client};

use crate::Config;

/// Store backed by the on-disk database.
pub type AppStore = Store<LocalStorage>;

/// Opens the configured storage, creating its directory if needed.
pub fn open_store(config: &Config) -> Result<AppStore> {
    if let Some(parent) = config.storage_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create storage directory")?;
    }
    let storage = LocalStorage::open(&config.storage_path)
        .with_context(|| format!("failed to open {}", config.storage_path.display()))?;
    Store::open(storage).context("failed to load stored data")
}

/// Finds a category by exact ID, then by case-insensitive name.
pub fn resolve_category<'a>(categories: &'a [Category], needle: &str) -> Result<&'a Category> {
    let needle = needle.trim();
    categories
        .iter()
        .find(|category| category.id.as_str() == needle)
        .or_else(|| match_category(categories, needle))
        .with_context(|| format!("category not found: {needle}"))
}

/// Builds the Claude categorizer, offering it the store's category names.
pub fn build_categorizer<P, I, C>(config: &Config, store: &Store<P, I, C>) -> Result<ClaudeCategorizer>
where
    P: Persistence,
    I: IdProvider,
    C: Clock,
{
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!("missing Claude API key (set TRACKSTAR_API_KEY or config.toml)")
    })?;
    let client = Client::with_timeout(api_key, config.request_timeout())
        .context("failed to create LLM client")?
        .with_api_url(config.api_url.clone());
    let names = store
        .categories()
        .iter()
        .map(|category| category.name.clone())
        .collect();
    Ok(ClaudeCategorizer::new(client, config.model.clone()).with_known_categories(names))
}
