//! Category list and time log, mirrored to a key/value persistence hook.
//!
//! The store loads both collections once at open and rewrites the affected
//! collection in full after every mutation. A failed write rolls the
//! in-memory change back, so memory and storage never disagree.
//!
//! # Persisted layout
//!
//! Two independent keys, each holding a JSON array:
//! - [`CATEGORIES_KEY`]: `[{"id": "...", "name": "..."}]`
//! - [`ENTRIES_KEY`]: `[{"id", "categoryId", "categoryName", "durationSeconds",
//!   "description"?, "loggedAt"}]`, newest first

use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::providers::{Clock, IdProvider, SystemClock, UuidIds};
use crate::types::{Category, CategoryId, EntryId, TimeEntry, ValidationError, validate_name};

/// Storage key for the category list.
pub const CATEGORIES_KEY: &str = "trackstar-categories";

/// Storage key for the time log.
pub const ENTRIES_KEY: &str = "trackstar-timeEntries";

/// Categories created the first time a store is opened.
pub const DEFAULT_CATEGORIES: [&str; 5] = [
    "Python Development",
    "Crypto Trading",
    "Codeforces Problems",
    "Binge Watching",
    "Client Meeting",
];

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The persistence hook failed.
    #[error("storage failure: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// A stored collection could not be decoded.
    #[error("corrupt data under {key}: {source}")]
    Corrupt {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// A collection could not be encoded.
    #[error("failed to encode {key}: {source}")]
    Encode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// No category has the given ID.
    #[error("category not found: {0}")]
    CategoryNotFound(String),
    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Key/value persistence hook.
pub trait Persistence {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the value stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Replaces the value stored under `key`.
    fn save(&mut self, key: &str, value: &str) -> Result<(), Self::Error>;
}

/// In-memory persistence, for tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw stored value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }
}

impl Persistence for MemoryStorage {
    type Error = Infallible;

    fn load(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.items.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Input for a new time log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub category_id: CategoryId,
    pub category_name: String,
    pub duration_seconds: u64,
    pub description: Option<String>,
}

/// Logged time summed under one category name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category_name: String,
    pub entries: usize,
    pub seconds: u64,
}

/// Categories and time entries backed by a [`Persistence`] hook.
#[derive(Debug)]
pub struct Store<P, I = UuidIds, C = SystemClock> {
    storage: P,
    ids: I,
    clock: C,
    categories: Vec<Category>,
    entries: Vec<TimeEntry>,
}

impl<P: Persistence> Store<P> {
    /// Opens a store with random IDs and the system clock.
    pub fn open(storage: P) -> Result<Self, StoreError> {
        Self::open_with(storage, UuidIds, SystemClock)
    }
}

impl<P: Persistence, I: IdProvider, C: Clock> Store<P, I, C> {
    /// Opens a store with explicit ID and clock providers.
    ///
    /// Seeds [`DEFAULT_CATEGORIES`] when no category list was ever stored.
    pub fn open_with(storage: P, ids: I, clock: C) -> Result<Self, StoreError> {
        let stored_categories: Option<Vec<Category>> = load_collection(&storage, CATEGORIES_KEY)?;
        let entries: Vec<TimeEntry> =
            load_collection(&storage, ENTRIES_KEY)?.unwrap_or_default();

        let mut store = Self {
            storage,
            ids,
            clock,
            categories: Vec::new(),
            entries,
        };

        if let Some(categories) = stored_categories {
            store.categories = categories;
        } else {
            for name in DEFAULT_CATEGORIES {
                let id = CategoryId::new(store.ids.next_id())?;
                store.categories.push(Category::new(id, name)?);
            }
            store.persist_categories()?;
            tracing::debug!(count = store.categories.len(), "seeded default categories");
        }

        tracing::debug!(
            categories = store.categories.len(),
            entries = store.entries.len(),
            "store opened"
        );
        Ok(store)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Time log, newest first.
    pub fn entries(&self) -> &[TimeEntry] {
        &self.entries
    }

    pub fn category(&self, id: &CategoryId) -> Option<&Category> {
        self.categories.iter().find(|category| &category.id == id)
    }

    pub const fn storage(&self) -> &P {
        &self.storage
    }

    /// Adds a category with a trimmed, non-empty name.
    pub fn add_category(&mut self, name: &str) -> Result<Category, StoreError> {
        let name = validate_name(name)?;
        let id = CategoryId::new(self.ids.next_id())?;
        let category = Category { id, name };

        self.categories.push(category.clone());
        if let Err(err) = self.persist_categories() {
            self.categories.pop();
            return Err(err);
        }
        tracing::debug!(id = %category.id, name = %category.name, "category added");
        Ok(category)
    }

    /// Removes a category. Logged entries keep their name snapshot.
    pub fn delete_category(&mut self, id: &CategoryId) -> Result<Category, StoreError> {
        let index = self.category_index(id)?;
        let removed = self.categories.remove(index);
        if let Err(err) = self.persist_categories() {
            self.categories.insert(index, removed);
            return Err(err);
        }
        tracing::debug!(id = %removed.id, "category deleted");
        Ok(removed)
    }

    /// Renames a category. Logged entries keep their name snapshot.
    pub fn rename_category(&mut self, id: &CategoryId, name: &str) -> Result<Category, StoreError> {
        let name = validate_name(name)?;
        let index = self.category_index(id)?;
        let previous = std::mem::replace(&mut self.categories[index].name, name);
        if let Err(err) = self.persist_categories() {
            self.categories[index].name = previous;
            return Err(err);
        }
        tracing::debug!(id = %id, from = %previous, to = %self.categories[index].name, "category renamed");
        Ok(self.categories[index].clone())
    }

    /// Prepends a new immutable entry to the log.
    ///
    /// Blank descriptions are stored as absent.
    pub fn append_entry(&mut self, new: NewEntry) -> Result<TimeEntry, StoreError> {
        let entry = TimeEntry {
            id: EntryId::new(self.ids.next_id())?,
            category_id: new.category_id,
            category_name: new.category_name,
            duration_seconds: new.duration_seconds,
            description: new
                .description
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
            logged_at: self.clock.now(),
        };

        self.entries.insert(0, entry.clone());
        if let Err(err) = self.persist_entries() {
            self.entries.remove(0);
            return Err(err);
        }
        tracing::debug!(
            id = %entry.id,
            category = %entry.category_name,
            seconds = entry.duration_seconds,
            "time entry logged"
        );
        Ok(entry)
    }

    /// Empties the time log. Returns the number of entries removed.
    pub fn clear_entries(&mut self) -> Result<usize, StoreError> {
        let removed = std::mem::take(&mut self.entries);
        if let Err(err) = self.persist_entries() {
            self.entries = removed;
            return Err(err);
        }
        Ok(removed.len())
    }

    /// Total logged seconds across all entries.
    pub fn total_seconds(&self) -> u64 {
        self.entries
            .iter()
            .fold(0, |total: u64, entry| total.saturating_add(entry.duration_seconds))
    }

    /// Logged time grouped by category name snapshot, largest first.
    pub fn totals_by_category(&self) -> Vec<CategoryTotal> {
        let mut totals: BTreeMap<&str, (usize, u64)> = BTreeMap::new();
        for entry in &self.entries {
            let slot = totals.entry(entry.category_name.as_str()).or_default();
            slot.0 += 1;
            slot.1 = slot.1.saturating_add(entry.duration_seconds);
        }
        let mut totals: Vec<CategoryTotal> = totals
            .into_iter()
            .map(|(name, (entries, seconds))| CategoryTotal {
                category_name: name.to_string(),
                entries,
                seconds,
            })
            .collect();
        // Stable sort keeps names alphabetical within equal totals.
        totals.sort_by_key(|total| std::cmp::Reverse(total.seconds));
        totals
    }

    fn category_index(&self, id: &CategoryId) -> Result<usize, StoreError> {
        self.categories
            .iter()
            .position(|category| &category.id == id)
            .ok_or_else(|| StoreError::CategoryNotFound(id.to_string()))
    }

    fn persist_categories(&mut self) -> Result<(), StoreError> {
        save_collection(&mut self.storage, CATEGORIES_KEY, &self.categories)
    }

    fn persist_entries(&mut self) -> Result<(), StoreError> {
        save_collection(&mut self.storage, ENTRIES_KEY, &self.entries)
    }
}

fn load_collection<P: Persistence, T: DeserializeOwned>(
    storage: &P,
    key: &'static str,
) -> Result<Option<Vec<T>>, StoreError> {
    let Some(raw) = storage
        .load(key)
        .map_err(|err| StoreError::Storage(Box::new(err)))?
    else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StoreError::Corrupt { key, source })
}

fn save_collection<P: Persistence, T: Serialize>(
    storage: &mut P,
    key: &'static str,
    items: &[T],
) -> Result<(), StoreError> {
    let json = serde_json::to_string(items).map_err(|source| StoreError::Encode { key, source })?;
    storage
        .save(key, &json)
        .map_err(|err| StoreError::Storage(Box::new(err)))
}
