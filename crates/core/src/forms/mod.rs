//! Form schemas with client-side validation.
//!
//! Every form validates locally before anything is sent to the backend.
//! Each field reports at most one error (the first rule it fails), and
//! errors keep the order in which fields appear on the form.

mod admin;
mod login;
mod panel;
mod user;

use core::fmt;

pub use admin::AdminForm;
pub use login::LoginForm;
pub use panel::PanelForm;
pub use user::{MAX_TOTAL_GB, MIN_TOTAL_GB, UserForm};

/// A validation failure on a single form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name as it appears in the wire payload.
    pub field: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Ordered list of field errors.
#[derive(Debug, Clone, PartialEq, Eq, Default, thiserror::Error)]
#[error("{}", format_field_errors(.0))]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Create an empty error list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Record an error for `field`.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Whether no errors were recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first error, which is what a form shows inline.
    #[must_use]
    pub fn first(&self) -> Option<&FieldError> {
        self.0.first()
    }

    /// The error recorded for `field`, if any.
    #[must_use]
    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// All recorded errors.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// `Ok(())` when empty, `Err(self)` otherwise.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one error was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Length bounds of a text field, measured in characters.
pub(crate) struct TextRule {
    pub field: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub min: usize,
    pub max: usize,
}

impl TextRule {
    /// Check `value` and record the first failed rule.
    pub(crate) fn check(&self, value: &str, errors: &mut ValidationErrors) -> bool {
        let len = value.chars().count();
        let message = if self.required && len == 0 {
            format!("{} is required", self.label)
        } else if len < self.min {
            format!("{} must be at least {} characters", self.label, self.min)
        } else if len > self.max {
            format!("{} must be less than {} characters", self.label, self.max)
        } else {
            return true;
        };
        errors.add(self.field, message);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_rule_order() {
        let rule = TextRule {
            field: "username",
            label: "Username",
            required: true,
            min: 3,
            max: 50,
        };

        let mut errors = ValidationErrors::new();
        assert!(!rule.check("", &mut errors));
        assert_eq!(errors.for_field("username"), Some("Username is required"));

        let mut errors = ValidationErrors::new();
        assert!(!rule.check("ab", &mut errors));
        assert_eq!(
            errors.for_field("username"),
            Some("Username must be at least 3 characters")
        );

        let mut errors = ValidationErrors::new();
        assert!(!rule.check(&"x".repeat(51), &mut errors));
        assert_eq!(
            errors.for_field("username"),
            Some("Username must be less than 50 characters")
        );

        let mut errors = ValidationErrors::new();
        assert!(rule.check("abc", &mut errors));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_text_rule_counts_characters() {
        let rule = TextRule {
            field: "name",
            label: "Panel name",
            required: true,
            min: 3,
            max: 3,
        };
        let mut errors = ValidationErrors::new();
        assert!(rule.check("äöü", &mut errors));
    }

    #[test]
    fn test_validation_errors_display() {
        let mut errors = ValidationErrors::new();
        errors.add("username", "Username is required");
        errors.add("panel", "Panel selection is required");
        assert_eq!(
            errors.to_string(),
            "Username is required; Panel selection is required"
        );
        assert_eq!(errors.first().map(|e| e.field), Some("username"));
    }
}
