//! Category suggestion contract.
//!
//! A [`Categorizer`] turns an interval's duration and description into a
//! suggested category label with a confidence. The transport behind it
//! (hosted model, fixture, ...) is opaque; this module fixes the request and
//! response shapes and guarantees callers always get a value back.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Category, Confidence, ValidationError};

/// Input to a categorization call.
///
/// Wire shape: `{"durationSeconds": n, "description"?: "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizeRequest {
    pub duration_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CategorizeRequest {
    /// Builds a request. Blank descriptions are dropped.
    pub fn new(duration_seconds: u64, description: Option<&str>) -> Self {
        Self {
            duration_seconds,
            description: description
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string),
        }
    }
}

/// A suggested category label and how sure the model is about it.
///
/// Wire shape: `{"category": "...", "confidence": x}` with `x` in \[0, 1\].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySuggestion {
    pub category: String,
    pub confidence: Confidence,
}

impl CategorySuggestion {
    /// Validates a raw label and confidence.
    pub fn new(category: &str, confidence: f32) -> Result<Self, ValidationError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(ValidationError::Empty {
                field: "suggested category",
            });
        }
        Ok(Self {
            category: category.to_string(),
            confidence: Confidence::new(confidence)?,
        })
    }
}

/// Something that can suggest a category for an interval.
///
/// Calls are single-shot: implementations do not retry.
pub trait Categorizer {
    type Error: fmt::Display;

    fn categorize(
        &self,
        request: &CategorizeRequest,
    ) -> impl Future<Output = Result<CategorySuggestion, Self::Error>> + Send;
}

/// Result of a suggestion request that was actually issued.
#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionOutcome {
    Ready(CategorySuggestion),
    Failed { message: String },
}

/// Suggestion requests refused before any call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SuggestError {
    #[error("nothing to categorize: elapsed time is zero")]
    EmptyDuration,
}

/// Asks `categorizer` for a suggestion.
///
/// Refuses zero durations without calling out. Any categorizer error is
/// folded into [`SuggestionOutcome::Failed`] with a readable message.
pub async fn request_suggestion<C: Categorizer>(
    categorizer: &C,
    duration_seconds: u64,
    description: Option<&str>,
) -> Result<SuggestionOutcome, SuggestError> {
    if duration_seconds == 0 {
        return Err(SuggestError::EmptyDuration);
    }

    let request = CategorizeRequest::new(duration_seconds, description);
    tracing::debug!(?request, "requesting category suggestion");

    match categorizer.categorize(&request).await {
        Ok(suggestion) => {
            tracing::debug!(
                category = %suggestion.category,
                confidence = %suggestion.confidence,
                "category suggested"
            );
            Ok(SuggestionOutcome::Ready(suggestion))
        }
        Err(err) => {
            tracing::warn!(error = %err, "category suggestion failed");
            Ok(SuggestionOutcome::Failed {
                message: format!("failed to get a category suggestion: {err}"),
            })
        }
    }
}

/// Finds the category whose name equals `label`, ignoring case.
///
/// `None` means the suggested category does not exist yet; that is advisory,
/// not an error.
pub fn match_category<'a>(categories: &'a [Category], label: &str) -> Option<&'a Category> {
    let wanted = label.trim().to_lowercase();
    categories
        .iter()
        .find(|category| category.name.to_lowercase() == wanted)
}
