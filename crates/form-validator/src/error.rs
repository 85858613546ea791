//! Validation error records and failure types

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Outcome of checking a single field: `Ok(())` when every rule passed
pub type FieldResult = Result<(), FieldError>;

/// Outcome of a single predicate invocation
pub type RuleResult = Result<bool, RuleError>;

/// Error record produced for a field that failed one or more rules.
///
/// A field produces at most one record per validation pass; every failing
/// rule after the first appends its message to `messages`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldError {
    /// Name of the field that failed
    pub field: String,
    /// Label used when the messages were rendered
    pub label: String,
    /// First rule that failed
    pub rule: String,
    /// Message of the first failing rule
    pub message: String,
    /// Messages of all failing rules, in rule order
    pub messages: Vec<String>,
}

impl FieldError {
    /// Create a record for the first failing rule of a field
    pub fn new(
        field: impl Into<String>,
        label: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        Self {
            field: field.into(),
            label: label.into(),
            rule: rule.into(),
            messages: vec![message.clone()],
            message,
        }
    }

    /// Append the message of a subsequent failing rule
    pub fn push_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Reasons a predicate could not produce an answer.
///
/// The rule engine never propagates these: each one counts as a failure of
/// the rule that raised it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RuleError {
    #[error("rule '{rule}' expects {expected}")]
    InvalidParameter { rule: String, expected: String },

    #[error("rule '{rule}' cannot be applied to a {found} value")]
    UnsupportedValue { rule: String, found: String },

    #[error("unknown type '{0}'")]
    UnknownType(String),

    #[error("unknown rule '{0}'")]
    UnknownRule(String),

    #[error("field '{0}' is not registered")]
    UnknownField(String),

    #[error("rule '{rule}' failed: {message}")]
    Failed { rule: String, message: String },
}

impl RuleError {
    pub fn invalid_parameter(rule: &str, expected: &str) -> Self {
        RuleError::InvalidParameter {
            rule: rule.to_string(),
            expected: expected.to_string(),
        }
    }

    pub fn unsupported_value(rule: &str, found: &str) -> Self {
        RuleError::UnsupportedValue {
            rule: rule.to_string(),
            found: found.to_string(),
        }
    }
}

/// Failures of the validator itself, as opposed to invalid field values
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("form '{0}' was not found in the document")]
    FormNotFound(String),

    #[error("a widget of field '{field}' is no longer attached to the document")]
    Detached { field: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_creation() {
        let error = FieldError::new("email", "E-mail", "type", "Invalid e-mail");
        assert_eq!(error.field, "email");
        assert_eq!(error.rule, "type");
        assert_eq!(error.message, "Invalid e-mail");
        assert_eq!(error.messages, vec!["Invalid e-mail".to_string()]);
    }

    #[test]
    fn test_field_error_keeps_first_rule() {
        let mut error = FieldError::new("name", "Name", "min-length", "Too short");
        error.push_message("Only letters");

        assert_eq!(error.rule, "min-length");
        assert_eq!(error.message, "Too short");
        assert_eq!(error.messages.len(), 2);
        assert_eq!(error.to_string(), "name: Too short");
    }

    #[test]
    fn test_rule_error_display() {
        let error = RuleError::invalid_parameter("min-length", "an integer");
        assert_eq!(error.to_string(), "rule 'min-length' expects an integer");
        assert_eq!(RuleError::UnknownType("zip".into()).to_string(), "unknown type 'zip'");
    }
}
