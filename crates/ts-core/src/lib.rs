//! Core domain logic for the TrackStar time tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Stopwatch: whole-second timing driven by an injectable tick source
//! - Suggestions: the categorization request/response contract
//! - Store: categories and the time log behind a persistence hook
//! - Session: the logging operation tying the three together

pub mod format;
pub mod providers;
pub mod session;
pub mod stopwatch;
pub mod store;
pub mod suggest;
pub mod tick;
pub mod types;

pub use format::{format_clock, format_duration};
pub use providers::{Clock, FixedClock, IdProvider, SequentialIds, SystemClock, UuidIds};
pub use session::{Session, SessionError, SuggestionState, UNKNOWN_CATEGORY};
pub use stopwatch::{Stopwatch, TimerState};
pub use store::{
    CATEGORIES_KEY, CategoryTotal, DEFAULT_CATEGORIES, ENTRIES_KEY, MemoryStorage, NewEntry,
    Persistence, Store, StoreError,
};
pub use suggest::{
    CategorizeRequest, CategorySuggestion, Categorizer, SuggestError, SuggestionOutcome,
    match_category, request_suggestion,
};
pub use tick::{IntervalTickSource, ManualTickSource, TICK_PERIOD, TickSource, Ticker};
pub use types::{Category, CategoryId, Confidence, EntryId, TimeEntry, ValidationError};
