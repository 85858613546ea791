//! Rule parameters, ordered rule sets and predicate tables

pub mod builtin;
pub mod types;

use crate::error::{RuleError, RuleResult};
use crate::field::{Field, FieldRegistry};
use crate::value::{FieldValue, Item};
use regex::Regex;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

pub use builtin::{default_rule, parse_float_prefix, parse_int_prefix, BuiltinRule};
pub use types::{default_type, BuiltinType};

/// Callback parameter of the `validate` rule
pub type ValidateFn = Rc<dyn Fn(&Item, &Field) -> bool>;

/// Predicate registered with [`FormValidator::extend_rule`](crate::FormValidator::extend_rule)
pub type CustomRule = Rc<dyn Fn(&RuleInput<'_>) -> RuleResult>;

/// Predicate registered with [`FormValidator::extend_type`](crate::FormValidator::extend_type)
pub type CustomType = Rc<dyn Fn(&Item, &Field) -> bool>;

/// A regular expression compiled and run by the host, such as a JavaScript
/// `RegExp`, for syntax the `regex` crate does not support
#[derive(Clone)]
pub struct HostPattern {
    source: String,
    flags: String,
    test: Rc<dyn Fn(&str) -> bool>,
}

impl HostPattern {
    pub fn new<F>(source: impl Into<String>, flags: impl Into<String>, test: F) -> Self
    where
        F: Fn(&str) -> bool + 'static,
    {
        Self {
            source: source.into(),
            flags: flags.into(),
            test: Rc::new(test),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn is_match(&self, text: &str) -> bool {
        (self.test)(text)
    }
}

impl fmt::Debug for HostPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

/// Parameter attached to a rule
#[derive(Clone)]
pub enum RuleParam {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
    Pattern(Regex),
    HostPattern(HostPattern),
    Callback(ValidateFn),
}

impl RuleParam {
    /// Wrap a closure as a `validate` rule parameter
    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(&Item, &Field) -> bool + 'static,
    {
        RuleParam::Callback(Rc::new(callback))
    }

    /// Build the parameter of `rule` from a JSON value; `regex` strings are compiled
    pub fn from_json(rule: &str, value: serde_json::Value) -> Result<Self, serde_json::Error> {
        param_from_value(rule, value)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RuleParam::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, RuleParam::Bool(true))
    }
}

/// Print a number the way JavaScript does: integral values carry no fraction
fn format_number(number: f64) -> String {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < 1e21 {
        format!("{:.0}", number)
    } else if number.is_nan() {
        "NaN".to_string()
    } else if number.is_infinite() {
        if number > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        number.to_string()
    }
}

impl fmt::Display for RuleParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleParam::Bool(flag) => write!(f, "{}", flag),
            RuleParam::Number(number) => f.write_str(&format_number(*number)),
            RuleParam::Text(text) => f.write_str(text),
            RuleParam::List(items) => f.write_str(&items.join(",")),
            RuleParam::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
            RuleParam::HostPattern(pattern) => write!(f, "/{}/{}", pattern.source, pattern.flags),
            RuleParam::Callback(_) => f.write_str("[callback]"),
        }
    }
}

impl fmt::Debug for RuleParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleParam::Bool(flag) => f.debug_tuple("Bool").field(flag).finish(),
            RuleParam::Number(number) => f.debug_tuple("Number").field(number).finish(),
            RuleParam::Text(text) => f.debug_tuple("Text").field(text).finish(),
            RuleParam::List(items) => f.debug_tuple("List").field(items).finish(),
            RuleParam::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            RuleParam::HostPattern(pattern) => f.debug_tuple("HostPattern").field(pattern).finish(),
            RuleParam::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl From<bool> for RuleParam {
    fn from(flag: bool) -> Self {
        RuleParam::Bool(flag)
    }
}

impl From<f64> for RuleParam {
    fn from(number: f64) -> Self {
        RuleParam::Number(number)
    }
}

impl From<i32> for RuleParam {
    fn from(number: i32) -> Self {
        RuleParam::Number(number as f64)
    }
}

impl From<usize> for RuleParam {
    fn from(number: usize) -> Self {
        RuleParam::Number(number as f64)
    }
}

impl From<&str> for RuleParam {
    fn from(text: &str) -> Self {
        RuleParam::Text(text.to_string())
    }
}

impl From<String> for RuleParam {
    fn from(text: String) -> Self {
        RuleParam::Text(text)
    }
}

impl From<Vec<&str>> for RuleParam {
    fn from(items: Vec<&str>) -> Self {
        RuleParam::List(items.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for RuleParam {
    fn from(items: Vec<String>) -> Self {
        RuleParam::List(items)
    }
}

impl From<HostPattern> for RuleParam {
    fn from(pattern: HostPattern) -> Self {
        RuleParam::HostPattern(pattern)
    }
}

impl From<Regex> for RuleParam {
    fn from(regex: Regex) -> Self {
        RuleParam::Pattern(regex)
    }
}

/// Rules of a field, kept in declaration order
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<(String, RuleParam)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule; redeclaring a name replaces its parameter in place
    pub fn rule(mut self, name: impl Into<String>, param: impl Into<RuleParam>) -> Self {
        self.insert(name, param);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, param: impl Into<RuleParam>) {
        let name = name.into();
        let param = param.into();
        match self.rules.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = param,
            None => self.rules.push((name, param)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&RuleParam> {
        self.rules
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, param)| param)
    }

    /// Whether `required: true` is declared
    pub fn is_required(&self) -> bool {
        self.get("required").map_or(false, RuleParam::is_true)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleParam)> {
        self.rules.iter().map(|(name, param)| (name.as_str(), param))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn param_from_value<E: de::Error>(rule: &str, value: serde_json::Value) -> Result<RuleParam, E> {
    use serde_json::Value;

    match value {
        Value::Bool(flag) => Ok(RuleParam::Bool(flag)),
        Value::Number(number) => number
            .as_f64()
            .map(RuleParam::Number)
            .ok_or_else(|| E::custom(format!("rule '{}': number out of range", rule))),
        Value::String(text) if rule == "regex" => Regex::new(&text)
            .map(RuleParam::Pattern)
            .map_err(|e| E::custom(format!("rule 'regex': {}", e))),
        Value::String(text) => Ok(RuleParam::Text(text)),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(text) => Ok(text),
                other => Err(E::custom(format!(
                    "rule '{}': list entries must be strings, found {}",
                    rule, other
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(RuleParam::List),
        other => Err(E::custom(format!(
            "rule '{}': unsupported parameter {}",
            rule, other
        ))),
    }
}

struct RuleSetVisitor;

impl<'de> Visitor<'de> for RuleSetVisitor {
    type Value = RuleSet;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of rule names to parameters")
    }

    fn visit_map<A>(self, mut map: A) -> Result<RuleSet, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut rules = RuleSet::new();
        while let Some((name, value)) = map.next_entry::<String, serde_json::Value>()? {
            let param = param_from_value::<A::Error>(&name, value)?;
            rules.insert(name, param);
        }
        Ok(rules)
    }
}

impl<'de> Deserialize<'de> for RuleSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RuleSetVisitor)
    }
}

/// Everything a predicate sees when it is invoked for one item
pub struct RuleInput<'a> {
    /// Name the rule was declared under
    pub rule: &'a str,
    /// Item being checked; each element of a multi-valued field in turn
    pub value: &'a Item,
    pub param: &'a RuleParam,
    pub field: &'a Field,
    pub(crate) scope: &'a RuleScope<'a>,
}

impl<'a> RuleInput<'a> {
    /// Re-read the current value of another registered field
    pub fn sibling_value(&self, name: &str) -> Result<FieldValue, RuleError> {
        let sibling = self
            .scope
            .fields
            .get(name)
            .ok_or_else(|| RuleError::UnknownField(name.to_string()))?;
        Ok(crate::extract::extract(sibling).unwrap_or_default())
    }

    /// Run the type predicate registered under `name`, instance types first
    pub fn check_type(&self, name: &str) -> RuleResult {
        if let Some(custom) = self.scope.types.get(name) {
            return Ok(custom(self.value, self.field));
        }
        match default_type(name) {
            Some(predicate) => Ok(predicate(self.value, self.field)),
            None => Err(RuleError::UnknownType(name.to_string())),
        }
    }
}

/// Instance state predicates may consult
pub(crate) struct RuleScope<'a> {
    pub fields: &'a FieldRegistry,
    pub types: &'a HashMap<String, CustomType>,
}
