//! Validation orchestrator

use crate::config::{FieldMap, ValidatorConfig};
use crate::engine::Engine;
use crate::error::{FieldError, FieldResult, RuleResult, ValidatorError};
use crate::extract::extract;
use crate::field::{ChangeEvent, ChangeFn, Field, FieldOptions, FieldRegistry};
use crate::host::{Document, FormHost};
use crate::messages::{default_message, PlaceholderMode};
use crate::rules::{CustomRule, CustomType, RuleInput};
use crate::value::{FieldValue, Item};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::ops::Index;
use std::rc::Rc;

/// Current values of all enabled fields, in registration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues {
    entries: Vec<(String, FieldValue)>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value of `name`, keeping its position when already present
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(key, _)| key == name).map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, FieldValue)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (name, value) in iter {
            values.insert(name, value);
        }
        values
    }
}

impl Index<&str> for FieldValues {
    type Output = FieldValue;

    fn index(&self, name: &str) -> &FieldValue {
        self.get(name)
            .unwrap_or_else(|| panic!("no value for field `{name}`"))
    }
}

impl Serialize for FieldValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

pub type AlwaysFn = Rc<dyn Fn(&FieldValues, &[FieldError])>;
pub type SuccessFn = Rc<dyn Fn(&FieldValues)>;
pub type FailFn = Rc<dyn Fn(&[FieldError])>;

/// Validates the fields of one form.
///
/// Mutators return `&mut Self` so registration reads as a chain:
///
/// ```ignore
/// validator
///     .set_field("email", FieldOptions::new().rule("required", true).rule("type", "email"))
///     .fail(|errors| render(errors))
///     .success(|values| send(values));
/// ```
pub struct FormValidator {
    form: Rc<dyn FormHost>,
    prevent_default: bool,
    placeholders: PlaceholderMode,
    fields: FieldRegistry,
    errors: Vec<FieldError>,
    custom_rules: HashMap<String, CustomRule>,
    custom_types: HashMap<String, CustomType>,
    custom_messages: HashMap<String, String>,
    on_change: Option<ChangeFn>,
    on_always: Option<AlwaysFn>,
    on_success: Option<SuccessFn>,
    on_fail: Option<FailFn>,
}

impl FormValidator {
    /// Create a validator for an already located form and register the
    /// configured fields
    pub fn new(form: Rc<dyn FormHost>, config: ValidatorConfig) -> Self {
        let mut validator = Self {
            form,
            prevent_default: config.prevent_default,
            placeholders: config.placeholders,
            fields: FieldRegistry::new(),
            errors: Vec::new(),
            custom_rules: HashMap::new(),
            custom_types: HashMap::new(),
            custom_messages: HashMap::new(),
            on_change: None,
            on_always: None,
            on_success: None,
            on_fail: None,
        };
        validator.set_fields(config.fields);
        validator
    }

    /// Locate the configured form in `document` and create a validator for it
    pub fn from_document(document: &dyn Document, config: ValidatorConfig) -> Result<Self, ValidatorError> {
        let form = document
            .form(&config.form)
            .ok_or_else(|| ValidatorError::FormNotFound(config.form.to_string()))?;
        Ok(Self::new(form, config))
    }

    pub fn form(&self) -> &Rc<dyn FormHost> {
        &self.form
    }

    pub fn prevents_default(&self) -> bool {
        self.prevent_default
    }

    /// Called after any field is re-checked on change, after the field's own callback
    pub fn change<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&Field, Option<&FieldError>, &ChangeEvent) + 'static,
    {
        self.on_change = Some(Rc::new(callback));
        self
    }

    /// Called on every validation pass with the values and the errors
    pub fn always<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&FieldValues, &[FieldError]) + 'static,
    {
        self.on_always = Some(Rc::new(callback));
        self
    }

    /// Called when a validation pass produced no errors
    pub fn success<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&FieldValues) + 'static,
    {
        self.on_success = Some(Rc::new(callback));
        self
    }

    /// Called when a validation pass produced errors
    pub fn fail<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&[FieldError]) + 'static,
    {
        self.on_fail = Some(Rc::new(callback));
        self
    }

    /// Register several fields; keys may hold comma-separated names
    pub fn set_fields(&mut self, fields: FieldMap) -> &mut Self {
        for (name, options) in fields.expand() {
            self.set_field(name, options.clone());
        }
        self
    }

    /// Register a field with the widgets found under `name`.
    ///
    /// Names without widgets in the form are skipped. Registering a name again
    /// replaces its options and keeps its position.
    pub fn set_field(&mut self, name: &str, options: FieldOptions) -> &mut Self {
        let controls = self.form.controls(name);
        if controls.is_empty() {
            tracing::warn!(field = name, "no widget found for field, skipping registration");
            return self;
        }
        let field = Field::new(name, controls, options);
        tracing::debug!(field = name, kind = %field.kind, rules = field.rules.len(), "field registered");
        self.fields.insert(field);
        self
    }

    /// Re-read the value of a field and run its rules.
    ///
    /// `None` when no field is registered under `name`.
    pub fn check_field(&mut self, name: &str) -> Option<FieldResult> {
        self.refresh(name)?;
        let field = self.fields.get(name)?;
        Some(self.engine().check(field))
    }

    pub fn is_valid(&mut self, name: &str) -> Option<bool> {
        self.check_field(name).map(|result| result.is_ok())
    }

    /// Re-read and return the current value of a field
    pub fn get_value(&mut self, name: &str) -> Option<FieldValue> {
        self.refresh(name).cloned()
    }

    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// First error of the last validation pass
    pub fn get_error(&self) -> Option<&FieldError> {
        self.errors.first()
    }

    pub fn get_errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Submit the form natively, without validating
    pub fn submit(&self) {
        self.form.submit();
    }

    /// Validate every enabled field and dispatch the lifecycle callbacks.
    ///
    /// A pass that cannot complete is logged and reported as invalid.
    pub fn validate(&mut self, callback: Option<&dyn Fn(&FieldValues, &[FieldError])>) -> bool {
        Self::settle(self.prepare_validation(), callback)
    }

    /// Run a validation pass without notifying anyone.
    ///
    /// The returned [`Validation`] owns the values, the errors and the
    /// callbacks, so a caller sharing the validator behind a `RefCell` can
    /// release its borrow before [`FormValidator::settle`] runs them.
    pub fn prepare_validation(&mut self) -> Result<Validation, ValidatorError> {
        self.errors.clear();
        for field in self.fields.iter_mut() {
            field.value = extract(field)?;
        }

        let errors: Vec<FieldError> = {
            let engine = self.engine();
            self.fields
                .iter()
                .filter(|field| !field.is_disabled())
                .filter_map(|field| engine.check(field).err())
                .collect()
        };
        self.errors = errors;

        let values: FieldValues = self
            .fields
            .iter()
            .filter(|field| !field.is_disabled())
            .map(|field| (field.name.clone(), field.value.clone()))
            .collect();

        tracing::debug!(fields = values.len(), errors = self.errors.len(), "validation pass complete");

        Ok(Validation {
            values,
            errors: self.errors.clone(),
            on_always: self.on_always.clone(),
            on_success: self.on_success.clone(),
            on_fail: self.on_fail.clone(),
        })
    }

    /// Notify the callbacks of a prepared pass; returns whether it succeeded
    pub fn settle(
        pass: Result<Validation, ValidatorError>,
        callback: Option<&dyn Fn(&FieldValues, &[FieldError])>,
    ) -> bool {
        match pass {
            Ok(validation) => validation.notify(callback),
            Err(error) => {
                tracing::error!(%error, "validation pass failed");
                false
            }
        }
    }

    /// Validate on submission; returns whether native submission must be blocked
    pub fn on_submit(&mut self) -> bool {
        let valid = self.validate(None);
        !valid || self.prevent_default
    }

    /// Re-check the field a change event belongs to and notify the change callbacks
    pub fn handle_change(&mut self, event: &ChangeEvent) {
        if let Some(notice) = self.prepare_change(event) {
            notice.notify();
        }
    }

    /// Re-check the field of a change event without notifying anyone.
    ///
    /// `None` when the event names an unregistered field.
    pub fn prepare_change(&mut self, event: &ChangeEvent) -> Option<ChangeNotice> {
        let Some(result) = self.check_field(&event.field) else {
            tracing::warn!(field = %event.field, "change event for an unregistered field");
            return None;
        };
        let field = self.fields.get(&event.field)?;
        Some(ChangeNotice {
            field: field.clone(),
            error: result.err(),
            event: event.clone(),
            on_field_change: field.on_change.clone(),
            on_change: self.on_change.clone(),
        })
    }

    /// Override the message of a known rule for this instance
    pub fn replace_message(&mut self, rule: &str, message: impl Into<String>) -> &mut Self {
        if default_message(rule).is_some() || self.custom_rules.contains_key(rule) {
            self.custom_messages.insert(rule.to_string(), message.into());
        } else {
            tracing::debug!(rule, "ignoring message for unknown rule");
        }
        self
    }

    /// Register a rule for this instance, shadowing a built-in rule of the same name
    pub fn extend_rule<F>(&mut self, name: &str, message: impl Into<String>, predicate: F) -> &mut Self
    where
        F: Fn(&RuleInput<'_>) -> RuleResult + 'static,
    {
        self.custom_rules.insert(name.to_string(), Rc::new(predicate));
        self.custom_messages.insert(name.to_string(), message.into());
        self
    }

    /// Register a predicate for the `type` rule
    pub fn extend_type<F>(&mut self, name: &str, predicate: F) -> &mut Self
    where
        F: Fn(&Item, &Field) -> bool + 'static,
    {
        self.custom_types.insert(name.to_string(), Rc::new(predicate));
        self
    }

    fn engine(&self) -> Engine<'_> {
        Engine {
            fields: &self.fields,
            rules: &self.custom_rules,
            types: &self.custom_types,
            messages: &self.custom_messages,
            placeholders: self.placeholders,
        }
    }

    /// Re-read one field; a detached widget reads as null
    fn refresh(&mut self, name: &str) -> Option<&FieldValue> {
        let field = self.fields.get_mut(name)?;
        field.value = extract(field).unwrap_or_else(|error| {
            tracing::warn!(%error, "reading field as null");
            FieldValue::Null
        });
        Some(&field.value)
    }
}

/// A finished validation pass whose callbacks have not run yet
pub struct Validation {
    pub values: FieldValues,
    pub errors: Vec<FieldError>,
    on_always: Option<AlwaysFn>,
    on_success: Option<SuccessFn>,
    on_fail: Option<FailFn>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Run `always`, then `success` or `fail`, then `callback`
    pub fn notify(&self, callback: Option<&dyn Fn(&FieldValues, &[FieldError])>) -> bool {
        if let Some(always) = &self.on_always {
            always(&self.values, &self.errors);
        }
        if self.is_valid() {
            if let Some(success) = &self.on_success {
                success(&self.values);
            }
        } else if let Some(fail) = &self.on_fail {
            fail(&self.errors);
        }
        if let Some(callback) = callback {
            callback(&self.values, &self.errors);
        }
        self.is_valid()
    }
}

impl fmt::Debug for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validation")
            .field("values", &self.values)
            .field("errors", &self.errors)
            .finish()
    }
}

/// A re-checked field whose change callbacks have not run yet
pub struct ChangeNotice {
    pub field: Field,
    pub error: Option<FieldError>,
    pub event: ChangeEvent,
    on_field_change: Option<ChangeFn>,
    on_change: Option<ChangeFn>,
}

impl ChangeNotice {
    /// Run the field's own callback, then the instance callback
    pub fn notify(&self) {
        if let Some(callback) = &self.on_field_change {
            callback(&self.field, self.error.as_ref(), &self.event);
        }
        if let Some(callback) = &self.on_change {
            callback(&self.field, self.error.as_ref(), &self.event);
        }
    }
}

impl fmt::Debug for FormValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormValidator")
            .field("prevent_default", &self.prevent_default)
            .field("placeholders", &self.placeholders)
            .field("fields", &self.fields)
            .field("errors", &self.errors)
            .field("custom_rules", &self.custom_rules.keys().collect::<Vec<_>>())
            .field("custom_types", &self.custom_types.keys().collect::<Vec<_>>())
            .field("custom_messages", &self.custom_messages)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormSelector;
    use crate::memory::{MemoryControl, MemoryDocument, MemoryForm};

    fn validator(form: MemoryForm) -> FormValidator {
        FormValidator::new(Rc::new(form), ValidatorConfig::new(FormSelector::Id("form".into())))
    }

    #[test]
    fn test_from_document_requires_form() {
        let document = MemoryDocument::new();
        let config = ValidatorConfig::for_form("#missing").unwrap();
        assert!(matches!(
            FormValidator::from_document(&document, config),
            Err(ValidatorError::FormNotFound(selector)) if selector == "#missing"
        ));
    }

    #[test]
    fn test_set_field_skips_missing_widgets() {
        let mut validator = validator(MemoryForm::new().with("email", MemoryControl::text("")));
        validator
            .set_field("email", FieldOptions::new())
            .set_field("phone", FieldOptions::new());

        assert!(validator.get_field("email").is_some());
        assert!(validator.get_field("phone").is_none());
        assert_eq!(validator.check_field("phone"), None);
        assert_eq!(validator.is_valid("phone"), None);
        assert_eq!(validator.get_value("phone"), None);
    }

    #[test]
    fn test_replace_message_only_for_known_rules() {
        let name = MemoryControl::text("");
        let mut validator = validator(MemoryForm::new().with("name", name));
        validator
            .set_field("name", FieldOptions::new().label("Name").rule("required", true))
            .replace_message("required", "%label, please")
            .replace_message("unheard-of", "never used");

        let error = validator.check_field("name").unwrap().unwrap_err();
        assert_eq!(error.message, "Name, please");
        assert!(!validator.custom_messages.contains_key("unheard-of"));
    }

    #[test]
    fn test_on_submit_honours_prevent_default() {
        let email = MemoryControl::text("a@b.com");
        let form = MemoryForm::new().with("email", email.clone());
        let config = ValidatorConfig::for_form("#form")
            .unwrap()
            .prevent_default(false)
            .field("email", FieldOptions::new().rule("type", "email"));
        let mut validator = FormValidator::new(Rc::new(form), config);

        assert!(!validator.on_submit());
        email.set_value("nope");
        assert!(validator.on_submit());
    }

    #[test]
    fn test_detached_widget_fails_the_pass() {
        let email = MemoryControl::text("a@b.com");
        let mut validator = validator(MemoryForm::new().with("email", email.clone()));
        validator.set_field("email", FieldOptions::new());
        assert!(validator.validate(None));

        email.detach();
        assert!(!validator.validate(None));
        assert_eq!(validator.get_value("email"), Some(FieldValue::Null));
    }

    #[test]
    fn test_values_keep_registration_order() {
        let form = MemoryForm::new()
            .with("zeta", MemoryControl::text("z"))
            .with("alpha", MemoryControl::text("a"));
        let mut validator = validator(form);
        validator
            .set_field("zeta", FieldOptions::new())
            .set_field("alpha", FieldOptions::new());

        let pass = validator.prepare_validation().unwrap();
        let names: Vec<&str> = pass.values.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["zeta", "alpha"]);
        assert_eq!(
            serde_json::to_string(&pass.values).unwrap(),
            r#"{"zeta":"z","alpha":"a"}"#
        );
    }

    #[test]
    fn test_callbacks_may_reenter_a_shared_validator() {
        use std::cell::RefCell;

        let email = MemoryControl::text("nope");
        let shared = Rc::new(RefCell::new(validator(MemoryForm::new().with("email", email))));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let (inner, sink) = (Rc::downgrade(&shared), seen.clone());
        shared
            .borrow_mut()
            .set_field("email", FieldOptions::new().rule("type", "email"))
            .fail(move |_| {
                let validator = inner.upgrade().unwrap();
                let mut validator = validator.borrow_mut();
                sink.borrow_mut().push(validator.get_errors().len());
                sink.borrow_mut().push(usize::from(validator.is_valid("email") == Some(false)));
            });

        let pass = shared.borrow_mut().prepare_validation();
        assert!(!FormValidator::settle(pass, None));
        assert_eq!(*seen.borrow(), [1, 1]);
    }

    #[test]
    fn test_change_notice_runs_after_release() {
        use std::cell::RefCell;

        let name = MemoryControl::text("");
        let shared = Rc::new(RefCell::new(validator(MemoryForm::new().with("name", name))));
        let seen = Rc::new(RefCell::new(None));

        let (inner, sink) = (Rc::downgrade(&shared), seen.clone());
        shared
            .borrow_mut()
            .set_field("name", FieldOptions::new().rule("required", true))
            .change(move |field, error, _| {
                let validator = inner.upgrade().unwrap();
                let value = validator.borrow_mut().get_value(&field.name);
                *sink.borrow_mut() = Some((error.is_some(), value));
            });

        let notice = shared.borrow_mut().prepare_change(&ChangeEvent::new("name", 0));
        notice.unwrap().notify();
        assert_eq!(*seen.borrow(), Some((true, Some(FieldValue::text("")))));
        assert!(shared.borrow_mut().prepare_change(&ChangeEvent::new("other", 0)).is_none());
    }
}
