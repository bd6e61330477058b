//! Core type definitions with validation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The confidence value was out of range.
    #[error("confidence must be between 0.0 and 1.0, got {value}")]
    ConfidenceOutOfRange { value: f32 },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated category identifier.
    ///
    /// Category IDs are opaque, non-empty strings (UUIDs in practice).
    CategoryId, "category ID"
);

define_string_id!(
    /// A validated time entry identifier.
    EntryId, "entry ID"
);

/// A user-defined label under which time can be logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    /// Creates a category, trimming the name.
    ///
    /// Returns an error if the name is blank.
    pub fn new(id: CategoryId, name: &str) -> Result<Self, ValidationError> {
        let name = validate_name(name)?;
        Ok(Self { id, name })
    }
}

/// Trims a category name, rejecting blank input.
pub(crate) fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty {
            field: "category name",
        });
    }
    Ok(trimmed.to_string())
}

/// Immutable record of a completed, logged interval.
///
/// `category_name` is a snapshot taken when the entry was logged; later
/// renames or deletions of the category never touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: EntryId,
    pub category_id: CategoryId,
    pub category_name: String,
    pub duration_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub logged_at: DateTime<Utc>,
}

/// A confidence score in the range \[0.0, 1.0\].
///
/// Deserialization is strict: values outside the range are rejected.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct Confidence(f32);

impl Confidence {
    /// The maximum confidence value (1.0).
    pub const MAX: Self = Self(1.0);

    /// The minimum confidence value (0.0).
    pub const MIN: Self = Self(0.0);

    /// Creates a new confidence value after validation.
    ///
    /// Returns an error if the value is outside \[0.0, 1.0\] or is NaN.
    pub fn new(value: f32) -> Result<Self, ValidationError> {
        if value.is_nan() || !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::ConfidenceOutOfRange { value });
        }
        Ok(Self(value))
    }

    /// Returns the inner f32 value.
    #[must_use]
    pub const fn value(self) -> f32 {
        self.0
    }

    /// Returns the confidence as a whole percentage (0..=100).
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "value is within [0, 1] so the rounded percentage fits in u8"
    )]
    pub fn as_percent(self) -> u8 {
        (self.0 * 100.0).round() as u8
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percent())
    }
}

impl TryFrom<f32> for Confidence {
    type Error = ValidationError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Confidence> for f32 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_id_rejects_empty() {
        assert!(CategoryId::new("").is_err());
        assert!(CategoryId::new("cat-1").is_ok());
    }

    #[test]
    fn entry_id_serde_rejects_empty() {
        let result: Result<EntryId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn category_new_trims_name() {
        let category = Category::new(CategoryId::new("c1").unwrap(), "  Reading  ").unwrap();
        assert_eq!(category.name, "Reading");
    }

    #[test]
    fn category_new_rejects_blank_name() {
        let err = Category::new(CategoryId::new("c1").unwrap(), "   ").unwrap_err();
        assert_eq!(
            err,
            ValidationError::Empty {
                field: "category name"
            }
        );
    }

    #[test]
    fn time_entry_uses_camel_case_layout() {
        let entry = TimeEntry {
            id: EntryId::new("e1").unwrap(),
            category_id: CategoryId::new("c1").unwrap(),
            category_name: "Python Development".to_string(),
            duration_seconds: 125,
            description: None,
            logged_at: "2025-03-01T10:00:00Z".parse().unwrap(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"id":"e1","categoryId":"c1","categoryName":"Python Development","durationSeconds":125,"loggedAt":"2025-03-01T10:00:00Z"}"#
        );
    }

    #[test]
    fn time_entry_reads_optional_description() {
        let json = r#"{"id":"e1","categoryId":"c1","categoryName":"Reading","durationSeconds":60,"description":"docs","loggedAt":"2025-03-01T10:00:00.000Z"}"#;
        let entry: TimeEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.description.as_deref(), Some("docs"));
        assert_eq!(entry.duration_seconds, 60);
    }

    #[test]
    fn confidence_validates_range() {
        assert!(Confidence::new(0.0).is_ok());
        assert!(Confidence::new(0.5).is_ok());
        assert!(Confidence::new(1.0).is_ok());
        assert!(Confidence::new(-0.1).is_err());
        assert!(Confidence::new(1.1).is_err());
        assert!(Confidence::new(f32::NAN).is_err());
    }

    #[test]
    fn confidence_serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<Confidence>("1.5").is_err());
        assert!(serde_json::from_str::<Confidence>("-0.5").is_err());
        let parsed: Confidence = serde_json::from_str("0.85").unwrap();
        assert!((parsed.value() - 0.85).abs() < f32::EPSILON);
    }

    #[test]
    fn confidence_displays_as_percent() {
        assert_eq!(Confidence::new(0.876).unwrap().to_string(), "88%");
        assert_eq!(Confidence::MIN.to_string(), "0%");
        assert_eq!(Confidence::MAX.to_string(), "100%");
    }
}
