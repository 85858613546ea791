//! Built-in rule predicates
//!
//! Each predicate answers for a single item. Parameters that cannot be
//! interpreted produce a [`RuleError`], which the engine counts as a failure.

use super::{RuleInput, RuleParam};
use crate::error::{RuleError, RuleResult};
use crate::field::FieldKind;
use crate::value::{extension_of, FieldValue, Item};
use once_cell::sync::Lazy;
use regex::Regex;

/// Signature of a built-in rule predicate
pub type BuiltinRule = fn(&RuleInput<'_>) -> RuleResult;

static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(Infinity|([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?)")
        .expect("float prefix pattern is valid")
});

static INT_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9]+").expect("integer prefix pattern is valid"));

/// Parse the longest numeric prefix of `text`, ignoring leading whitespace
/// (`"12.5kg"` parses as 12.5)
pub fn parse_float_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let found = FLOAT_PREFIX.find(text)?.as_str();
    let (sign, digits) = match found.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, found.strip_prefix('+').unwrap_or(found)),
    };
    if digits == "Infinity" {
        return Some(sign * f64::INFINITY);
    }
    digits.parse::<f64>().ok().map(|number| sign * number)
}

/// Parse the longest base-10 integer prefix of `text`, ignoring leading
/// whitespace (`"8 chars"` parses as 8)
pub fn parse_int_prefix(text: &str) -> Option<i64> {
    INT_PREFIX
        .find(text.trim_start())
        .and_then(|found| found.as_str().parse::<i64>().ok())
}

fn number_param(input: &RuleInput<'_>) -> Result<f64, RuleError> {
    match input.param {
        RuleParam::Number(number) => Ok(*number),
        RuleParam::Text(text) => parse_float_prefix(text)
            .ok_or_else(|| RuleError::invalid_parameter(input.rule, "a number")),
        _ => Err(RuleError::invalid_parameter(input.rule, "a number")),
    }
}

/// Integer length parameter; may be negative, which every length satisfies
/// for `min-length` and none for `max-length` or `length`
fn length_param(input: &RuleInput<'_>) -> Result<i64, RuleError> {
    let length = match input.param {
        RuleParam::Number(number) if number.is_finite() => Some(number.trunc() as i64),
        RuleParam::Text(text) => parse_int_prefix(text),
        _ => None,
    };
    length.ok_or_else(|| RuleError::invalid_parameter(input.rule, "an integer"))
}

fn char_count(input: &RuleInput<'_>) -> Result<i64, RuleError> {
    Ok(text_value(input)?.chars().count() as i64)
}

fn text_value<'a>(input: &'a RuleInput<'_>) -> Result<&'a str, RuleError> {
    input
        .value
        .as_text()
        .ok_or_else(|| RuleError::unsupported_value(input.rule, input.value.kind()))
}

fn allowed_list(input: &RuleInput<'_>) -> Result<Vec<String>, RuleError> {
    match input.param {
        RuleParam::Text(text) => Ok(vec![text.to_lowercase()]),
        RuleParam::List(items) => Ok(items.iter().map(|item| item.to_lowercase()).collect()),
        _ => Err(RuleError::invalid_parameter(input.rule, "a string or a list of strings")),
    }
}

fn required(input: &RuleInput<'_>) -> RuleResult {
    if input.param.is_true() {
        Ok(!input.field.value.is_empty())
    } else {
        Ok(true)
    }
}

fn type_rule(input: &RuleInput<'_>) -> RuleResult {
    let name = input
        .param
        .as_text()
        .ok_or_else(|| RuleError::invalid_parameter(input.rule, "a type name"))?;
    input.check_type(name)
}

fn match_rule(input: &RuleInput<'_>) -> RuleResult {
    let other = input
        .param
        .as_text()
        .ok_or_else(|| RuleError::invalid_parameter(input.rule, "a field name"))?;
    let other_value = input.sibling_value(other)?;
    if other_value.is_empty() {
        return Ok(false);
    }
    Ok(other_value == FieldValue::One(input.value.clone()))
}

fn min_length(input: &RuleInput<'_>) -> RuleResult {
    let min = length_param(input)?;
    Ok(char_count(input)? >= min)
}

fn max_length(input: &RuleInput<'_>) -> RuleResult {
    let max = length_param(input)?;
    Ok(char_count(input)? <= max)
}

fn length(input: &RuleInput<'_>) -> RuleResult {
    let exact = length_param(input)?;
    Ok(char_count(input)? == exact)
}

fn min_range(input: &RuleInput<'_>) -> RuleResult {
    let min = number_param(input)?;
    Ok(parse_float_prefix(text_value(input)?).map_or(false, |value| value >= min))
}

fn max_range(input: &RuleInput<'_>) -> RuleResult {
    let max = number_param(input)?;
    Ok(parse_float_prefix(text_value(input)?).map_or(false, |value| value <= max))
}

fn regex_rule(input: &RuleInput<'_>) -> RuleResult {
    let text = text_value(input)?;
    match input.param {
        RuleParam::Pattern(regex) => Ok(regex.is_match(text)),
        RuleParam::HostPattern(pattern) => Ok(pattern.is_match(text)),
        RuleParam::Text(pattern) => Regex::new(pattern)
            .map(|regex| regex.is_match(text))
            .map_err(|_| RuleError::invalid_parameter(input.rule, "a valid regular expression")),
        _ => Err(RuleError::invalid_parameter(input.rule, "a regular expression")),
    }
}

fn file_ext(input: &RuleInput<'_>) -> RuleResult {
    if input.field.kind != FieldKind::File {
        return Ok(false);
    }
    let name = match input.value {
        Item::File(file) => file.name.as_str(),
        Item::Text(path) => path.as_str(),
    };
    let extension = extension_of(name);
    Ok(allowed_list(input)?.contains(&extension))
}

// Path strings carry no MIME type or size; the file rules below let them pass.

fn file_mime(input: &RuleInput<'_>) -> RuleResult {
    if input.field.kind != FieldKind::File {
        return Ok(false);
    }
    match input.value {
        Item::File(file) => Ok(allowed_list(input)?.contains(&file.mime.to_lowercase())),
        Item::Text(_) => Ok(true),
    }
}

fn file_min_size(input: &RuleInput<'_>) -> RuleResult {
    if input.field.kind != FieldKind::File {
        return Ok(false);
    }
    match input.value {
        Item::File(file) => Ok(file.size_mb() >= number_param(input)?),
        Item::Text(_) => Ok(true),
    }
}

fn file_max_size(input: &RuleInput<'_>) -> RuleResult {
    if input.field.kind != FieldKind::File {
        return Ok(false);
    }
    match input.value {
        Item::File(file) => Ok(file.size_mb() <= number_param(input)?),
        Item::Text(_) => Ok(true),
    }
}

fn validate(input: &RuleInput<'_>) -> RuleResult {
    match input.param {
        RuleParam::Callback(callback) => Ok(callback(input.value, input.field)),
        _ => Err(RuleError::invalid_parameter(input.rule, "a callback")),
    }
}

/// Look up a built-in rule predicate by name
pub fn default_rule(name: &str) -> Option<BuiltinRule> {
    let predicate: BuiltinRule = match name {
        "required" => required,
        "type" => type_rule,
        "match" => match_rule,
        "min-length" => min_length,
        "max-length" => max_length,
        "length" => length,
        "min-range" => min_range,
        "max-range" => max_range,
        "regex" => regex_rule,
        "file-ext" => file_ext,
        "file-mime" => file_mime,
        "file-min-size" => file_min_size,
        "file-max-size" => file_max_size,
        "validate" => validate,
        _ => return None,
    };
    Some(predicate)
}
