//! Event wiring between a browser form and a [`FormValidator`]

use crate::dom::{WebDocument, WebForm};
use crate::error::{WebError, WebResult};
use form_validator::{ChangeEvent, FieldError, FieldMap, FieldOptions, FieldValues, FormValidator, ValidatorConfig, ValidatorError};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, EventTarget, HtmlFormElement};

/// DOM event currently being handled, if any
pub type CurrentEvent = Rc<RefCell<Option<Event>>>;

/// An event listener removed from its target when dropped
struct Listener {
    field: Option<(String, usize)>,
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(
        target: EventTarget,
        kind: &'static str,
        field: Option<(String, usize)>,
        handler: impl FnMut(Event) + 'static,
    ) -> WebResult<Self> {
        let closure = Closure::<dyn FnMut(Event)>::new(handler);
        target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            field,
            target,
            kind,
            closure,
        })
    }

    fn watches(&self, name: &str) -> bool {
        matches!(&self.field, Some((field, _)) if field == name)
    }

    /// Whether this listener already covers widget `idx` of field `name`
    fn covers(&self, name: &str, idx: usize, element: &Element) -> bool {
        matches!(&self.field, Some((field, control)) if field == name && *control == idx)
            && self.target.unchecked_ref::<Element>() == element
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

/// Handle `event` in two phases: `prepare` holds the validator, `settle`
/// runs after the borrow is released so callbacks may use the validator again
fn dispatch<T>(
    validator: &Weak<RefCell<FormValidator>>,
    current: &CurrentEvent,
    event: Event,
    prepare: impl FnOnce(&mut FormValidator) -> T,
    settle: impl FnOnce(T, &Event),
) {
    let Some(validator) = validator.upgrade() else {
        return;
    };
    let prepared = match validator.try_borrow_mut() {
        Ok(mut validator) => prepare(&mut validator),
        Err(_) => {
            tracing::warn!(kind = %event.type_(), "event ignored while the validator is busy");
            return;
        }
    };
    let previous = current.replace(Some(event.clone()));
    settle(prepared, &event);
    *current.borrow_mut() = previous;
}

/// A validator attached to a live form.
///
/// Submission is validated and blocked per [`FormValidator::on_submit`];
/// every widget of every registered field re-checks its field on `change`.
/// Callbacks run after the validator is released, so they may query or
/// reconfigure it. Listeners are removed when the binding is dropped.
pub struct BoundValidator {
    validator: Rc<RefCell<FormValidator>>,
    form: WebForm,
    current: CurrentEvent,
    listeners: RefCell<Vec<Listener>>,
}

impl BoundValidator {
    /// Resolve the configured form in `document`, register its fields and
    /// install the listeners
    pub fn bind(document: &WebDocument, config: ValidatorConfig) -> WebResult<Self> {
        let element = document
            .find_form(&config.form)
            .ok_or_else(|| ValidatorError::FormNotFound(config.form.to_string()))?;
        Self::attach(element, config)
    }

    /// Bind an already located form; `config.form` is not looked up
    pub fn attach(element: HtmlFormElement, config: ValidatorConfig) -> WebResult<Self> {
        let form = WebForm::new(element);
        let validator = FormValidator::new(Rc::new(form.clone()), config);

        let bound = Self {
            validator: Rc::new(RefCell::new(validator)),
            form,
            current: Rc::new(RefCell::new(None)),
            listeners: RefCell::new(Vec::new()),
        };
        bound.listen_submit()?;
        let names: Vec<String> = bound.with(|validator| validator.fields().map(|field| field.name.clone()).collect())?;
        for name in names {
            bound.listen_field(&name)?;
        }
        tracing::debug!(listeners = bound.listeners.borrow().len(), "form bound");
        Ok(bound)
    }

    pub fn form(&self) -> &WebForm {
        &self.form
    }

    /// Shared slot holding the DOM event being dispatched
    pub fn current_event(&self) -> CurrentEvent {
        self.current.clone()
    }

    /// Borrow the validator mutably for the duration of `action`
    pub fn with<R>(&self, action: impl FnOnce(&mut FormValidator) -> R) -> WebResult<R> {
        let mut validator = self.validator.try_borrow_mut().map_err(|_| WebError::Busy)?;
        Ok(action(&mut validator))
    }

    /// Run a validation pass; callbacks run once the validator is released
    pub fn validate(&self, callback: Option<&dyn Fn(&FieldValues, &[FieldError])>) -> WebResult<bool> {
        let pass = self.with(|validator| validator.prepare_validation())?;
        Ok(FormValidator::settle(pass, callback))
    }

    /// Submit the form natively, without validating
    pub fn submit(&self) -> WebResult<()> {
        Ok(self.form.element().submit()?)
    }

    /// Register a field and listen to the changes of its widgets
    pub fn set_field(&self, name: &str, options: FieldOptions) -> WebResult<()> {
        let registered = self.with(|validator| validator.set_field(name, options).get_field(name).is_some())?;
        if registered {
            self.listen_field(name)?;
        }
        Ok(())
    }

    pub fn set_fields(&self, fields: FieldMap) -> WebResult<()> {
        let entries: Vec<(String, FieldOptions)> = fields
            .expand()
            .map(|(name, options)| (name.to_string(), options.clone()))
            .collect();
        for (name, options) in entries {
            self.set_field(&name, options)?;
        }
        Ok(())
    }

    fn listen_submit(&self) -> WebResult<()> {
        let validator = Rc::downgrade(&self.validator);
        let current = self.current.clone();
        let target: EventTarget = self.form.element().clone().into();
        let listener = Listener::attach(target, "submit", None, move |event: Event| {
            dispatch(
                &validator,
                &current,
                event,
                |validator| (validator.prepare_validation(), validator.prevents_default()),
                |(pass, prevent), event| {
                    let valid = FormValidator::settle(pass, None);
                    if !valid || prevent {
                        event.prevent_default();
                    }
                },
            );
        })?;
        self.listeners.borrow_mut().push(listener);
        Ok(())
    }

    /// Listen to every widget of `name`.
    ///
    /// Listeners already covering a widget are kept; a handler may re-register
    /// the field it is running for.
    fn listen_field(&self, name: &str) -> WebResult<()> {
        let elements = self.form.elements_named(name);
        let mut listeners = self.listeners.borrow_mut();
        listeners.retain(|listener| {
            !listener.watches(name)
                || elements
                    .iter()
                    .enumerate()
                    .any(|(idx, element)| listener.covers(name, idx, element))
        });

        for (idx, element) in elements.into_iter().enumerate() {
            if listeners.iter().any(|listener| listener.covers(name, idx, &element)) {
                continue;
            }
            let validator = Rc::downgrade(&self.validator);
            let current = self.current.clone();
            let change = ChangeEvent::new(name, idx);
            let field = Some((name.to_string(), idx));
            let listener = Listener::attach(element.into(), "change", field, move |event: Event| {
                dispatch(
                    &validator,
                    &current,
                    event,
                    |validator| validator.prepare_change(&change),
                    |notice, _| {
                        if let Some(notice) = notice {
                            notice.notify();
                        }
                    },
                );
            })?;
            listeners.push(listener);
        }
        Ok(())
    }
}
