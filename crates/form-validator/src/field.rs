//! Registered fields and their options

use crate::error::FieldError;
use crate::host::ControlRef;
use crate::rules::{RuleParam, RuleSet};
use crate::value::FieldValue;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Callback invoked after a field was re-checked because one of its widgets changed
pub type ChangeFn = Rc<dyn Fn(&Field, Option<&FieldError>, &ChangeEvent)>;

/// A change notification for one widget of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub field: String,
    /// Index of the widget that fired, in document order
    pub control: usize,
}

impl ChangeEvent {
    pub fn new(field: impl Into<String>, control: usize) -> Self {
        Self {
            field: field.into(),
            control,
        }
    }
}

/// Type tag of a field, derived from its first widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    File,
    Radio,
    Checkbox,
    Select,
    /// Any text-like widget, keeping its raw tag (`text`, `email`, `textarea`, ...)
    Other(String),
}

impl FieldKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_lowercase().as_str() {
            "file" => FieldKind::File,
            "radio" => FieldKind::Radio,
            "checkbox" => FieldKind::Checkbox,
            "select" => FieldKind::Select,
            other => FieldKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::File => "file",
            FieldKind::Radio => "radio",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Select => "select",
            FieldKind::Other(tag) => tag,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options a field is registered with
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct FieldOptions {
    /// Label used in messages; the field name when absent
    pub label: Option<String>,
    pub rules: RuleSet,
    /// Message overrides keyed by rule name
    pub messages: HashMap<String, String>,
    #[serde(skip)]
    pub on_change: Option<ChangeFn>,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn rule(mut self, name: impl Into<String>, param: impl Into<RuleParam>) -> Self {
        self.rules.insert(name, param);
        self
    }

    pub fn rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Override the message of one rule for this field only
    pub fn message(mut self, rule: impl Into<String>, message: impl Into<String>) -> Self {
        self.messages.insert(rule.into(), message.into());
        self
    }

    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Field, Option<&FieldError>, &ChangeEvent) + 'static,
    {
        self.on_change = Some(Rc::new(callback));
        self
    }
}

impl fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOptions")
            .field("label", &self.label)
            .field("rules", &self.rules)
            .field("messages", &self.messages)
            .field("has_on_change", &self.on_change.is_some())
            .finish()
    }
}

/// A registered field
#[derive(Clone)]
pub struct Field {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub rules: RuleSet,
    pub messages: HashMap<String, String>,
    /// Value read by the last extraction pass
    pub value: FieldValue,
    pub(crate) controls: Vec<ControlRef>,
    pub(crate) on_change: Option<ChangeFn>,
}

impl Field {
    pub(crate) fn new(name: &str, controls: Vec<ControlRef>, options: FieldOptions) -> Self {
        let kind = controls
            .first()
            .map(|control| FieldKind::from_tag(&control.type_tag()))
            .unwrap_or_else(|| FieldKind::Other("text".to_string()));
        let mut field = Self::unbound(name, kind);
        field.apply(options);
        field.controls = controls;
        field
    }

    /// A field with no widgets, holding only the value it is given
    pub fn unbound(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_string(),
            kind,
            rules: RuleSet::new(),
            messages: HashMap::new(),
            value: FieldValue::Null,
            controls: Vec::new(),
            on_change: None,
        }
    }

    pub(crate) fn apply(&mut self, options: FieldOptions) {
        self.label = options
            .label
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| self.name.clone());
        self.rules = options.rules;
        self.messages = options.messages;
        self.on_change = options.on_change;
    }

    pub fn controls(&self) -> &[ControlRef] {
        &self.controls
    }

    /// A field is disabled once all of its widgets are
    pub fn is_disabled(&self) -> bool {
        !self.controls.is_empty() && self.controls.iter().all(|control| control.disabled())
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("rules", &self.rules)
            .field("value", &self.value)
            .field("controls", &self.controls.len())
            .finish()
    }
}

/// Registered fields in registration order
#[derive(Debug, Default)]
pub struct FieldRegistry {
    fields: Vec<Field>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a field, replacing one already registered under the same
    /// name without changing its position
    pub fn insert(&mut self, field: Field) {
        match self.position(&field.name) {
            Some(idx) => self.fields[idx] = field,
            None => self.fields.push(field),
        }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|field| field.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        self.fields.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
