//! Tracking session: the stopwatch plus the state around it.
//!
//! A session owns the stopwatch, the selected category, the free-text
//! description and the current suggestion state. Logging turns the elapsed
//! time into a store entry and then clears all of that in one step.

use thiserror::Error;

use crate::providers::{Clock, IdProvider};
use crate::stopwatch::Stopwatch;
use crate::store::{NewEntry, Persistence, Store, StoreError};
use crate::suggest::{
    CategorySuggestion, Categorizer, SuggestError, SuggestionOutcome, match_category,
    request_suggestion,
};
use crate::tick::{IntervalTickSource, TickSource};
use crate::types::{Category, CategoryId, TimeEntry};

/// Name recorded when the selected category vanished before logging.
pub const UNKNOWN_CATEGORY: &str = "Unknown Category";

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Logging needs a category.
    #[error("no category selected")]
    NoCategorySelected,
    /// Logging and suggestions need a non-zero elapsed time.
    #[error("timer is empty")]
    EmptyTimer,
    /// The suggested label matches no existing category.
    #[error("suggested category \"{0}\" doesn't exist; create it or choose another")]
    CategoryNotFound(String),
    /// There is no ready suggestion to apply.
    #[error("no suggestion to use")]
    NoSuggestion,
    /// The store rejected the change.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Whether this is an input problem the user can correct.
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::NoCategorySelected | Self::EmptyTimer)
    }
}

impl From<SuggestError> for SessionError {
    fn from(err: SuggestError) -> Self {
        match err {
            SuggestError::EmptyDuration => Self::EmptyTimer,
        }
    }
}

/// Where the current suggestion request stands.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SuggestionState {
    #[default]
    Idle,
    Pending,
    Ready(CategorySuggestion),
    Failed(String),
}

/// Stopwatch, category selection, description and suggestion state.
#[derive(Debug)]
pub struct Session<S: TickSource = IntervalTickSource> {
    stopwatch: Stopwatch<S>,
    selected: Option<CategoryId>,
    description: String,
    suggestion: SuggestionState,
}

impl Default for Session<IntervalTickSource> {
    fn default() -> Self {
        Self::new(IntervalTickSource)
    }
}

impl<S: TickSource> Session<S> {
    pub const fn new(source: S) -> Self {
        Self {
            stopwatch: Stopwatch::new(source),
            selected: None,
            description: String::new(),
            suggestion: SuggestionState::Idle,
        }
    }

    pub const fn stopwatch(&self) -> &Stopwatch<S> {
        &self.stopwatch
    }

    pub const fn elapsed(&self) -> u64 {
        self.stopwatch.elapsed()
    }

    pub fn formatted_time(&self) -> String {
        self.stopwatch.formatted_time()
    }

    pub const fn is_running(&self) -> bool {
        self.stopwatch.is_running()
    }

    pub fn start(&mut self) {
        self.stopwatch.start();
    }

    pub fn pause(&mut self) {
        self.stopwatch.pause();
    }

    /// Overwrites the elapsed time, e.g. when resuming a restored session.
    pub const fn set_elapsed(&mut self, seconds: u64) {
        self.stopwatch.set_elapsed(seconds);
    }

    /// Waits for and applies the next stopwatch tick.
    pub async fn next_tick(&mut self) {
        self.stopwatch.next_tick().await;
    }

    /// Resets the stopwatch and clears description and suggestion state.
    pub fn reset(&mut self) {
        self.stopwatch.reset();
        self.description.clear();
        self.suggestion = SuggestionState::Idle;
    }

    pub const fn selected(&self) -> Option<&CategoryId> {
        self.selected.as_ref()
    }

    pub fn select_category(&mut self, id: Option<CategoryId>) {
        self.selected = id;
    }

    /// Selects the first category when nothing is selected yet.
    pub fn ensure_selection(&mut self, categories: &[Category]) {
        if self.selected.is_none() {
            self.selected = categories.first().map(|category| category.id.clone());
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, text: impl Into<String>) {
        self.description = text.into();
    }

    pub const fn suggestion(&self) -> &SuggestionState {
        &self.suggestion
    }

    /// Busy flag for front ends that want to block double submission.
    pub const fn is_suggesting(&self) -> bool {
        matches!(self.suggestion, SuggestionState::Pending)
    }

    /// Requests a category suggestion for the current elapsed time.
    ///
    /// Refuses with [`SessionError::EmptyTimer`] at zero, without calling
    /// out. Any previous suggestion or error is discarded first. Categorizer
    /// failures end up as [`SuggestionState::Failed`], not as an `Err`.
    pub async fn suggest<C: Categorizer>(
        &mut self,
        categorizer: &C,
    ) -> Result<&SuggestionState, SessionError> {
        let elapsed = self.stopwatch.elapsed();
        if elapsed == 0 {
            return Err(SessionError::EmptyTimer);
        }

        self.suggestion = SuggestionState::Pending;
        let description = Some(self.description.as_str());
        let outcome = match request_suggestion(categorizer, elapsed, description).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.suggestion = SuggestionState::Idle;
                return Err(err.into());
            }
        };
        self.suggestion = match outcome {
            SuggestionOutcome::Ready(suggestion) => SuggestionState::Ready(suggestion),
            SuggestionOutcome::Failed { message } => SuggestionState::Failed(message),
        };
        Ok(&self.suggestion)
    }

    /// Selects the existing category named by the ready suggestion.
    pub fn use_suggestion<'a>(
        &mut self,
        categories: &'a [Category],
    ) -> Result<&'a Category, SessionError> {
        let SuggestionState::Ready(suggestion) = &self.suggestion else {
            return Err(SessionError::NoSuggestion);
        };
        let category = match_category(categories, &suggestion.category)
            .ok_or_else(|| SessionError::CategoryNotFound(suggestion.category.clone()))?;
        self.selected = Some(category.id.clone());
        Ok(category)
    }

    /// Logs the elapsed time under the selected category.
    ///
    /// Validation failures and store failures leave the session untouched.
    /// On success the stopwatch, description and suggestion state are all
    /// cleared.
    pub fn log_time<P, I, C>(
        &mut self,
        store: &mut Store<P, I, C>,
    ) -> Result<TimeEntry, SessionError>
    where
        P: Persistence,
        I: IdProvider,
        C: Clock,
    {
        let Some(category_id) = self.selected.clone() else {
            return Err(SessionError::NoCategorySelected);
        };
        let elapsed = self.stopwatch.elapsed();
        if elapsed == 0 {
            return Err(SessionError::EmptyTimer);
        }

        let category_name = store
            .category(&category_id)
            .map_or_else(|| UNKNOWN_CATEGORY.to_string(), |category| category.name.clone());
        let entry = store.append_entry(NewEntry {
            category_id,
            category_name,
            duration_seconds: elapsed,
            description: Some(self.description.clone()),
        })?;

        self.reset();
        Ok(entry)
    }
}
