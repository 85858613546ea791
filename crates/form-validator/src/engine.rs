//! Per-field rule evaluation

use crate::error::{FieldError, FieldResult, RuleError, RuleResult};
use crate::field::{Field, FieldRegistry};
use crate::messages::{self, PlaceholderMode};
use crate::rules::{default_rule, CustomRule, CustomType, RuleInput, RuleParam, RuleScope};
use crate::value::{FieldValue, Item};
use std::collections::HashMap;

/// Borrowed view of the instance tables needed to check a field
pub(crate) struct Engine<'a> {
    pub fields: &'a FieldRegistry,
    pub rules: &'a HashMap<String, CustomRule>,
    pub types: &'a HashMap<String, CustomType>,
    pub messages: &'a HashMap<String, String>,
    pub placeholders: PlaceholderMode,
}

impl<'a> Engine<'a> {
    /// Evaluate the rules of `field` against its current value, in
    /// declaration order.
    ///
    /// An empty value only goes through `required`. A multi-valued field fails
    /// a rule when any of its items fails it, and reports each failing rule
    /// once.
    pub fn check(&self, field: &Field) -> FieldResult {
        let scope = RuleScope {
            fields: self.fields,
            types: self.types,
        };
        let empty = field.value.is_empty();
        let mut error: Option<FieldError> = None;

        for (rule, param) in field.rules.iter() {
            if empty && rule != "required" {
                continue;
            }
            if self.passes(field, rule, param, &scope) {
                continue;
            }

            let message = messages::resolve(field, rule, param, self.messages, self.placeholders);
            tracing::debug!(field = %field.name, rule, %message, "rule failed");
            match error.as_mut() {
                Some(error) => error.push_message(message),
                None => error = Some(FieldError::new(&field.name, &field.label, rule, message)),
            }
        }

        match error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn passes(&self, field: &Field, rule: &str, param: &RuleParam, scope: &RuleScope<'_>) -> bool {
        let placeholder;
        let items: &[Item] = match &field.value {
            // `required` still runs on a null value; it sees an empty string
            FieldValue::Null => {
                placeholder = [Item::Text(String::new())];
                &placeholder
            }
            value => value.items(),
        };

        items.iter().fold(true, |passed, item| {
            let input = RuleInput {
                rule,
                value: item,
                param,
                field,
                scope,
            };
            match self.invoke(&input) {
                Ok(ok) => passed && ok,
                Err(error) => {
                    tracing::debug!(field = %field.name, rule, %error, "predicate could not answer");
                    false
                }
            }
        })
    }

    /// Instance rules shadow built-in ones; an unknown rule fails
    fn invoke(&self, input: &RuleInput<'_>) -> RuleResult {
        if let Some(custom) = self.rules.get(input.rule) {
            return custom(input);
        }
        match default_rule(input.rule) {
            Some(predicate) => predicate(input),
            None => Err(RuleError::UnknownRule(input.rule.to_string())),
        }
    }
}
