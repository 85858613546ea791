//! Host traits implemented over `web-sys`

use crate::error::{WebError, WebResult};
use form_validator::{Control, ControlRef, Document, FileInfo, FormHost, FormSelector};
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlFormElement, HtmlInputElement, HtmlOptionElement, HtmlSelectElement, HtmlTextAreaElement};

/// One form widget
#[derive(Debug, Clone)]
pub struct WebControl {
    element: Element,
}

impl WebControl {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    fn input(&self) -> Option<&HtmlInputElement> {
        self.element.dyn_ref::<HtmlInputElement>()
    }

    fn select(&self) -> Option<&HtmlSelectElement> {
        self.element.dyn_ref::<HtmlSelectElement>()
    }

    fn textarea(&self) -> Option<&HtmlTextAreaElement> {
        self.element.dyn_ref::<HtmlTextAreaElement>()
    }
}

impl Control for WebControl {
    fn tag_name(&self) -> String {
        self.element.tag_name().to_lowercase()
    }

    fn type_attr(&self) -> Option<String> {
        self.element.get_attribute("type")
    }

    fn value(&self) -> String {
        if let Some(input) = self.input() {
            input.value()
        } else if let Some(select) = self.select() {
            select.value()
        } else if let Some(textarea) = self.textarea() {
            textarea.value()
        } else {
            self.element.get_attribute("value").unwrap_or_default()
        }
    }

    fn checked(&self) -> bool {
        self.input().map_or(false, HtmlInputElement::checked)
    }

    fn disabled(&self) -> bool {
        if let Some(input) = self.input() {
            input.disabled()
        } else if let Some(select) = self.select() {
            select.disabled()
        } else if let Some(textarea) = self.textarea() {
            textarea.disabled()
        } else {
            self.element.has_attribute("disabled")
        }
    }

    fn multiple(&self) -> bool {
        if let Some(input) = self.input() {
            input.multiple()
        } else {
            self.select().map_or(false, HtmlSelectElement::multiple)
        }
    }

    fn selected_values(&self) -> Vec<String> {
        let Some(select) = self.select() else {
            return Vec::new();
        };
        let options = select.selected_options();
        (0..options.length())
            .filter_map(|idx| options.item(idx))
            .filter_map(|option| option.dyn_into::<HtmlOptionElement>().ok())
            .map(|option| option.value())
            .collect()
    }

    fn files(&self) -> Option<Vec<FileInfo>> {
        let list = self.input()?.files()?;
        let files = (0..list.length())
            .filter_map(|idx| list.get(idx))
            .map(|file| FileInfo::new(file.name(), file.type_(), file.size() as u64))
            .collect();
        Some(files)
    }

    fn is_connected(&self) -> bool {
        self.element.is_connected()
    }
}

/// A `<form>` element
#[derive(Debug, Clone)]
pub struct WebForm {
    form: HtmlFormElement,
}

impl WebForm {
    pub fn new(form: HtmlFormElement) -> Self {
        Self { form }
    }

    pub fn element(&self) -> &HtmlFormElement {
        &self.form
    }

    /// Form-associated elements whose `name` attribute is `name`, in document order
    pub fn elements_named(&self, name: &str) -> Vec<Element> {
        let elements = self.form.elements();
        (0..elements.length())
            .filter_map(|idx| elements.item(idx))
            .filter(|element| element.get_attribute("name").as_deref() == Some(name))
            .collect()
    }
}

impl FormHost for WebForm {
    fn controls(&self, name: &str) -> Vec<ControlRef> {
        self.elements_named(name)
            .into_iter()
            .map(|element| Rc::new(WebControl::new(element)) as ControlRef)
            .collect()
    }

    fn submit(&self) {
        if let Err(error) = self.form.submit() {
            tracing::error!(error = ?error, "native form submission failed");
        }
    }
}

/// The browser document
#[derive(Debug, Clone)]
pub struct WebDocument {
    document: web_sys::Document,
}

impl WebDocument {
    pub fn new(document: web_sys::Document) -> Self {
        Self { document }
    }

    /// Document of the current window
    pub fn current() -> WebResult<Self> {
        web_sys::window()
            .and_then(|window| window.document())
            .map(Self::new)
            .ok_or(WebError::NoDocument)
    }

    pub fn document(&self) -> &web_sys::Document {
        &self.document
    }

    /// Locate a form by `#id` or by its name in `document.forms`
    pub fn find_form(&self, selector: &FormSelector) -> Option<HtmlFormElement> {
        let element = match selector {
            FormSelector::Id(id) => self.document.get_element_by_id(id),
            FormSelector::Name(name) => self.document.forms().named_item(name),
        }?;
        element.dyn_into::<HtmlFormElement>().ok()
    }
}

impl Document for WebDocument {
    fn form(&self, selector: &FormSelector) -> Option<Rc<dyn FormHost>> {
        self.find_form(selector)
            .map(|form| Rc::new(WebForm::new(form)) as Rc<dyn FormHost>)
    }
}
