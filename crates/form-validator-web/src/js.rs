//! The `FormValidator` class exported to JavaScript
//!
//! ```javascript
//! const validator = new FormValidator({
//!     form: '#signup',
//!     fields: {
//!         email: { label: 'E-mail', rules: { required: true, type: 'email' } },
//!         'first_name, last_name': { rules: { type: 'letters' } },
//!     },
//! });
//! validator
//!     .fail(function (errors) { showErrors(errors, this.getError()); })
//!     .success(function () { this.submit(); });
//! ```
//!
//! Callbacks are called with `this` set to the `context` option, or to the
//! validator itself when no context is given.

use crate::binding::{BoundValidator, CurrentEvent};
use crate::dom::WebDocument;
use crate::error::{WebError, WebResult};
use form_validator::{
    ChangeEvent, Field, FieldError, FieldMap, FieldOptions, FieldValue, FieldValues, FormSelector, FormValidator,
    HostPattern, Item, PlaceholderMode, RuleError, RuleParam, RuleSet, ValidatorConfig,
};
use js_sys::{Array, Function, Object, Reflect, RegExp};
use serde::Serialize;
use std::cell::OnceCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlFormElement;

fn to_js<T: Serialize + ?Sized>(value: &T) -> WebResult<JsValue> {
    Ok(value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
}

/// Serialize for a callback argument; failures degrade to `undefined`
fn to_js_lossy<T: Serialize + ?Sized>(value: &T) -> JsValue {
    to_js(value).unwrap_or_else(|error| {
        tracing::warn!(%error, "could not convert value for JavaScript");
        JsValue::UNDEFINED
    })
}

/// What JavaScript sees of a field
#[derive(Serialize)]
struct FieldView<'a> {
    name: &'a str,
    label: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    value: &'a FieldValue,
}

fn field_to_js(field: &Field) -> JsValue {
    to_js_lossy(&FieldView {
        name: &field.name,
        label: &field.label,
        kind: field.kind.as_str(),
        value: &field.value,
    })
}

fn param_to_js(param: &RuleParam) -> JsValue {
    match param {
        RuleParam::Bool(flag) => JsValue::from_bool(*flag),
        RuleParam::Number(number) => JsValue::from_f64(*number),
        RuleParam::Text(text) => JsValue::from_str(text),
        RuleParam::List(items) => items.iter().map(|item| JsValue::from_str(item)).collect::<Array>().into(),
        RuleParam::Pattern(regex) => RegExp::new(regex.as_str(), "").into(),
        RuleParam::HostPattern(pattern) => RegExp::new(pattern.source(), pattern.flags()).into(),
        RuleParam::Callback(_) => JsValue::UNDEFINED,
    }
}

fn get(target: &JsValue, key: &str) -> WebResult<JsValue> {
    Ok(Reflect::get(target, &JsValue::from_str(key))?)
}

/// `[key, value]` pairs of a plain object, in property order
fn entries(object: &JsValue) -> WebResult<Vec<(String, JsValue)>> {
    if object.is_undefined() || object.is_null() {
        return Ok(Vec::new());
    }
    let object = object
        .dyn_ref::<Object>()
        .ok_or_else(|| WebError::Options("expected an object".to_string()))?;
    Object::entries(object)
        .iter()
        .map(|entry| {
            let pair: Array = entry.unchecked_into();
            let key = pair
                .get(0)
                .as_string()
                .ok_or_else(|| WebError::Options("object keys must be strings".to_string()))?;
            Ok((key, pair.get(1)))
        })
        .collect()
}

/// JavaScript callbacks sharing one `this` binding
#[derive(Clone)]
struct Callbacks {
    context: JsValue,
    instance: Rc<OnceCell<Weak<Shared>>>,
    current: CurrentEvent,
}

impl Callbacks {
    /// The `context` option, else a handle on the validator
    fn this(&self) -> JsValue {
        if !self.context.is_undefined() && !self.context.is_null() {
            return self.context.clone();
        }
        self.instance
            .get()
            .and_then(Weak::upgrade)
            .map_or(JsValue::UNDEFINED, |shared| JsFormValidator { shared }.into())
    }

    /// The DOM event being handled, else a plain `{field, control}` object
    fn event(&self, change: &ChangeEvent) -> JsValue {
        match self.current.borrow().as_ref() {
            Some(event) => event.clone().into(),
            None => {
                let object = Object::new();
                let _ = Reflect::set(&object, &"field".into(), &JsValue::from_str(&change.field));
                let _ = Reflect::set(&object, &"control".into(), &JsValue::from_f64(change.control as f64));
                object.into()
            }
        }
    }

    fn report(&self, hook: &str, result: Result<JsValue, JsValue>) -> Option<JsValue> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(hook, error = ?error, "callback threw");
                None
            }
        }
    }

    fn change(&self, function: Function) -> impl Fn(&Field, Option<&FieldError>, &ChangeEvent) + 'static {
        let callbacks = self.clone();
        move |field, error, change| {
            let error = error.map_or(JsValue::UNDEFINED, |error| to_js_lossy(error));
            let result = function.call3(&callbacks.this(), &field_to_js(field), &error, &callbacks.event(change));
            callbacks.report("change", result);
        }
    }

    /// Rule parameter for `validate`; passes only when the function returns `true`
    fn validate(&self, function: Function) -> RuleParam {
        let callbacks = self.clone();
        RuleParam::callback(move |item: &Item, field: &Field| {
            let result = function.call2(&callbacks.this(), &to_js_lossy(item), &field_to_js(field));
            callbacks
                .report("validate", result)
                .map_or(false, |value| value.as_bool() == Some(true))
        })
    }

    fn rules(&self, rules: &JsValue) -> WebResult<RuleSet> {
        let mut set = RuleSet::new();
        for (rule, value) in entries(rules)? {
            let param = if let Some(function) = value.dyn_ref::<Function>() {
                self.validate(function.clone())
            } else if let Ok(regexp) = value.clone().dyn_into::<RegExp>() {
                let (source, flags) = (String::from(regexp.source()), String::from(regexp.flags()));
                RuleParam::HostPattern(HostPattern::new(source, flags, move |text: &str| {
                    regexp.set_last_index(0);
                    regexp.test(text)
                }))
            } else {
                let json: serde_json::Value = serde_wasm_bindgen::from_value(value)?;
                RuleParam::from_json(&rule, json)?
            };
            set.insert(rule, param);
        }
        Ok(set)
    }

    fn field_options(&self, options: &JsValue) -> WebResult<FieldOptions> {
        let mut field = FieldOptions::new().rules(self.rules(&get(options, "rules")?)?);
        if let Some(label) = get(options, "label")?.as_string() {
            field = field.label(label);
        }
        let messages = get(options, "messages")?;
        if !messages.is_undefined() && !messages.is_null() {
            let messages: HashMap<String, String> = serde_wasm_bindgen::from_value(messages)?;
            field.messages = messages;
        }
        if let Ok(function) = get(options, "change")?.dyn_into::<Function>() {
            field = field.on_change(self.change(function));
        }
        Ok(field)
    }

    fn fields(&self, fields: &JsValue) -> WebResult<FieldMap> {
        entries(fields)?
            .into_iter()
            .map(|(names, options)| Ok((names, self.field_options(&options)?)))
            .collect()
    }
}

/// Selector naming an element passed as `form`
fn selector_of(form: &HtmlFormElement) -> FormSelector {
    match form.id() {
        id if !id.is_empty() => FormSelector::Id(id),
        _ => FormSelector::Name(form.name()),
    }
}

/// Read the scalar options; fields are registered after binding.
///
/// `form` is an `HTMLFormElement` or an id/name selector string.
fn base_config(options: &JsValue) -> WebResult<(ValidatorConfig, Option<HtmlFormElement>)> {
    let (selector, element) = match get(options, "form")?.dyn_into::<HtmlFormElement>() {
        Ok(element) => (selector_of(&element), Some(element)),
        Err(form) => {
            let form = form
                .as_string()
                .ok_or_else(|| WebError::Options("`form` must be a form element or an id or name selector".to_string()))?;
            (form.parse::<FormSelector>()?, None)
        }
    };
    let mut config = ValidatorConfig::new(selector);
    if let Some(prevent) = get(options, "preventDefault")?.as_bool() {
        config = config.prevent_default(prevent);
    }
    if let Some(mode) = get(options, "placeholders")?.as_string() {
        let mode = match mode.as_str() {
            "first" => PlaceholderMode::First,
            "all" => PlaceholderMode::All,
            other => return Err(WebError::Options(format!("unknown placeholder mode '{}'", other))),
        };
        config = config.placeholders(mode);
    }
    Ok((config, element))
}

/// State behind every JavaScript handle on one validator
struct Shared {
    bound: BoundValidator,
    callbacks: Callbacks,
}

/// Mutators return the validator so calls chain.
#[wasm_bindgen(js_name = FormValidator)]
#[derive(Clone)]
pub struct JsFormValidator {
    shared: Rc<Shared>,
}

impl JsFormValidator {
    fn bound(&self) -> &BoundValidator {
        &self.shared.bound
    }

    fn callbacks(&self) -> &Callbacks {
        &self.shared.callbacks
    }

    fn chain(&self, action: impl FnOnce(&mut FormValidator)) -> Result<JsFormValidator, JsValue> {
        self.bound().with(action)?;
        Ok(self.clone())
    }
}

#[wasm_bindgen(js_class = FormValidator)]
impl JsFormValidator {
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<JsFormValidator, JsValue> {
        let (config, element) = base_config(&options)?;
        let bound = match element {
            Some(element) => BoundValidator::attach(element, config)?,
            None => BoundValidator::bind(&WebDocument::current()?, config)?,
        };
        let callbacks = Callbacks {
            context: get(&options, "context")?,
            instance: Rc::new(OnceCell::new()),
            current: bound.current_event(),
        };
        let shared = Rc::new(Shared { bound, callbacks });
        let _ = shared.callbacks.instance.set(Rc::downgrade(&shared));

        let validator = Self { shared };
        let fields = validator.callbacks().fields(&get(&options, "fields")?)?;
        validator.bound().set_fields(fields)?;
        Ok(validator)
    }

    pub fn change(&self, callback: Function) -> Result<JsFormValidator, JsValue> {
        let handler = self.callbacks().change(callback);
        self.chain(|validator| {
            validator.change(handler);
        })
    }

    pub fn always(&self, callback: Function) -> Result<JsFormValidator, JsValue> {
        let callbacks = self.callbacks().clone();
        self.chain(|validator| {
            validator.always(move |values, errors| {
                let result = callback.call2(&callbacks.this(), &to_js_lossy(values), &to_js_lossy(errors));
                callbacks.report("always", result);
            });
        })
    }

    pub fn success(&self, callback: Function) -> Result<JsFormValidator, JsValue> {
        let callbacks = self.callbacks().clone();
        self.chain(|validator| {
            validator.success(move |values| {
                let result = callback.call1(&callbacks.this(), &to_js_lossy(values));
                callbacks.report("success", result);
            });
        })
    }

    pub fn fail(&self, callback: Function) -> Result<JsFormValidator, JsValue> {
        let callbacks = self.callbacks().clone();
        self.chain(|validator| {
            validator.fail(move |errors| {
                let result = callback.call1(&callbacks.this(), &to_js_lossy(errors));
                callbacks.report("fail", result);
            });
        })
    }

    #[wasm_bindgen(js_name = setField)]
    pub fn set_field(&self, name: &str, options: JsValue) -> Result<JsFormValidator, JsValue> {
        let options = self.callbacks().field_options(&options)?;
        self.bound().set_field(name, options)?;
        Ok(self.clone())
    }

    #[wasm_bindgen(js_name = setFields)]
    pub fn set_fields(&self, fields: JsValue) -> Result<JsFormValidator, JsValue> {
        let fields = self.callbacks().fields(&fields)?;
        self.bound().set_fields(fields)?;
        Ok(self.clone())
    }

    /// `true`, the field's error record, or `undefined` for an unknown field
    #[wasm_bindgen(js_name = checkField)]
    pub fn check_field(&self, name: &str) -> Result<JsValue, JsValue> {
        let result = self.bound().with(|validator| validator.check_field(name))?;
        Ok(match result {
            None => JsValue::UNDEFINED,
            Some(Ok(())) => JsValue::TRUE,
            Some(Err(error)) => to_js(&error)?,
        })
    }

    #[wasm_bindgen(js_name = isValid)]
    pub fn is_valid(&self, name: &str) -> Result<Option<bool>, JsValue> {
        Ok(self.bound().with(|validator| validator.is_valid(name))?)
    }

    #[wasm_bindgen(js_name = getValue)]
    pub fn get_value(&self, name: &str) -> Result<JsValue, JsValue> {
        match self.bound().with(|validator| validator.get_value(name))? {
            Some(value) => Ok(to_js(&value)?),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    #[wasm_bindgen(js_name = getField)]
    pub fn get_field(&self, name: &str) -> Result<JsValue, JsValue> {
        let field = self
            .bound()
            .with(|validator| validator.get_field(name).map(field_to_js))?;
        Ok(field.unwrap_or(JsValue::UNDEFINED))
    }

    /// First error of the last pass, or `false`
    #[wasm_bindgen(js_name = getError)]
    pub fn get_error(&self) -> Result<JsValue, JsValue> {
        let error = self.bound().with(|validator| validator.get_error().cloned())?;
        match error {
            Some(error) => Ok(to_js(&error)?),
            None => Ok(JsValue::FALSE),
        }
    }

    #[wasm_bindgen(js_name = getErrors)]
    pub fn get_errors(&self) -> Result<JsValue, JsValue> {
        let errors = self.bound().with(|validator| validator.get_errors().to_vec())?;
        Ok(to_js(&errors)?)
    }

    /// Validate every field; `callback(values, errors)` runs after the lifecycle callbacks
    pub fn validate(&self, callback: Option<Function>) -> Result<bool, JsValue> {
        let callbacks = self.callbacks().clone();
        let per_call = callback.map(|function| {
            move |values: &FieldValues, errors: &[FieldError]| {
                let result = function.call2(&callbacks.this(), &to_js_lossy(values), &to_js_lossy(errors));
                callbacks.report("validate", result);
            }
        });
        let callback = per_call
            .as_ref()
            .map(|callback| callback as &dyn Fn(&FieldValues, &[FieldError]));
        Ok(self.bound().validate(callback)?)
    }

    #[wasm_bindgen(js_name = replaceMessage)]
    pub fn replace_message(&self, rule: &str, message: &str) -> Result<JsFormValidator, JsValue> {
        self.chain(|validator| {
            validator.replace_message(rule, message);
        })
    }

    /// Register a rule; `predicate(value, param, field)` passes only when it returns `true`
    #[wasm_bindgen(js_name = extendRule)]
    pub fn extend_rule(&self, name: &str, message: &str, predicate: Function) -> Result<JsFormValidator, JsValue> {
        let callbacks = self.callbacks().clone();
        self.chain(|validator| {
            validator.extend_rule(name, message, move |input| {
                predicate
                    .call3(
                        &callbacks.this(),
                        &to_js_lossy(input.value),
                        &param_to_js(input.param),
                        &field_to_js(input.field),
                    )
                    .map(|result| result.as_bool() == Some(true))
                    .map_err(|error| RuleError::Failed {
                        rule: input.rule.to_string(),
                        message: format!("{:?}", error),
                    })
            });
        })
    }

    /// Register a type for the `type` rule; `predicate(value, field)` passes only when it returns `true`
    #[wasm_bindgen(js_name = extendType)]
    pub fn extend_type(&self, name: &str, predicate: Function) -> Result<JsFormValidator, JsValue> {
        let callbacks = self.callbacks().clone();
        self.chain(|validator| {
            validator.extend_type(name, move |item, field| {
                let result = predicate.call2(&callbacks.this(), &to_js_lossy(item), &field_to_js(field));
                callbacks
                    .report("type", result)
                    .map_or(false, |value| value.as_bool() == Some(true))
            });
        })
    }

    /// Submit the form natively, without validating
    pub fn submit(&self) -> Result<(), JsValue> {
        Ok(self.bound().submit()?)
    }
}
