//! Error message templates and placeholder substitution

use crate::field::Field;
use crate::rules::RuleParam;
use serde::Deserialize;
use std::collections::HashMap;

/// Template used when neither the field, the instance nor the defaults
/// define a message for a rule
pub const FALLBACK_MESSAGE: &str = "An error occurred with the field \"%label\"";

/// How many occurrences of each placeholder get substituted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderMode {
    /// Only the first `%label` and the first `%param`
    #[default]
    First,
    All,
}

/// Default template of a built-in rule
pub fn default_message(rule: &str) -> Option<&'static str> {
    let message = match rule {
        "required" => "The field \"%label\" is required",
        "type" => "The value of the field \"%label\" is invalid",
        "match" => "The field \"%label\" must match the field \"%param\"",
        "min-length" => "The field \"%label\" must be at least %param characters long",
        "max-length" => "The field \"%label\" must not exceed %param characters",
        "length" => "The field \"%label\" must be exactly %param characters long",
        "min-range" => "The field \"%label\" must be greater than or equal to %param",
        "max-range" => "The field \"%label\" must not be greater than %param",
        "regex" => "The value of the field \"%label\" is invalid",
        "file-ext" => "The extension of the file selected in \"%label\" is invalid",
        "file-mime" => "The MIME type of the file selected in \"%label\" is invalid",
        "file-min-size" => "The file selected in \"%label\" must be at least %param MB",
        "file-max-size" => "The file selected in \"%label\" must be at most %param MB",
        "validate" => "The field \"%label\" is invalid",
        _ => return None,
    };
    Some(message)
}

/// Substitute `%label` and `%param` in a template
pub fn render(template: &str, label: &str, param: &str, mode: PlaceholderMode) -> String {
    match mode {
        PlaceholderMode::First => template
            .replacen("%label", label, 1)
            .replacen("%param", param, 1),
        PlaceholderMode::All => template.replace("%label", label).replace("%param", param),
    }
}

/// Resolve the message for a failed rule: field override, then instance
/// override, then default template
pub fn resolve(
    field: &Field,
    rule: &str,
    param: &RuleParam,
    custom: &HashMap<String, String>,
    mode: PlaceholderMode,
) -> String {
    let template = field
        .messages
        .get(rule)
        .or_else(|| custom.get(rule))
        .map(String::as_str)
        .or_else(|| default_message(rule))
        .unwrap_or(FALLBACK_MESSAGE);
    let label = if field.label.is_empty() {
        &field.name
    } else {
        &field.label
    };
    render(template, label, &param.to_string(), mode)
}
