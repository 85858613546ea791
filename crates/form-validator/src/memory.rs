//! In-memory host document
//!
//! Widgets are cheap shared handles: cloning a [`MemoryControl`] gives another
//! handle onto the same widget state, so a test can keep one handle while the
//! form owns another.

use crate::config::FormSelector;
use crate::host::{Control, ControlRef, Document, FormHost};
use crate::value::FileInfo;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Default)]
struct ControlState {
    tag: String,
    kind: Option<String>,
    value: String,
    checked: bool,
    disabled: bool,
    multiple: bool,
    options: Vec<(String, bool)>,
    files: Option<Vec<FileInfo>>,
    connected: bool,
}

/// Widget backed by plain Rust state
#[derive(Debug, Clone)]
pub struct MemoryControl {
    state: Rc<RefCell<ControlState>>,
}

impl MemoryControl {
    fn build(tag: &str, kind: Option<&str>, value: &str) -> Self {
        Self {
            state: Rc::new(RefCell::new(ControlState {
                tag: tag.to_string(),
                kind: kind.map(str::to_string),
                value: value.to_string(),
                connected: true,
                ..ControlState::default()
            })),
        }
    }

    /// `<input type="text">`
    pub fn text(value: &str) -> Self {
        Self::build("input", Some("text"), value)
    }

    /// `<input type="...">` of any type
    pub fn input(kind: &str, value: &str) -> Self {
        Self::build("input", Some(kind), value)
    }

    pub fn textarea(value: &str) -> Self {
        Self::build("textarea", None, value)
    }

    /// Unchecked radio button
    pub fn radio(value: &str) -> Self {
        Self::build("input", Some("radio"), value)
    }

    /// Unchecked checkbox
    pub fn checkbox(value: &str) -> Self {
        Self::build("input", Some("checkbox"), value)
    }

    /// `<select>` with the given option values, none selected
    pub fn select(options: &[&str]) -> Self {
        let control = Self::build("select", None, "");
        control.state.borrow_mut().options =
            options.iter().map(|o| (o.to_string(), false)).collect();
        control
    }

    /// `<select multiple>`
    pub fn multi_select(options: &[&str]) -> Self {
        let control = Self::select(options);
        control.state.borrow_mut().multiple = true;
        control
    }

    /// `<input type="file">` with no file list support, only a path string
    pub fn file_path(path: &str) -> Self {
        Self::build("input", Some("file"), path)
    }

    /// `<input type="file">` exposing the given files
    pub fn files_input(files: Vec<FileInfo>) -> Self {
        let control = Self::build("input", Some("file"), "");
        {
            let mut state = control.state.borrow_mut();
            state.value = files.first().map(|f| f.name.clone()).unwrap_or_default();
            state.multiple = files.len() > 1;
            state.files = Some(files);
        }
        control
    }

    pub fn set_value(&self, value: &str) {
        self.state.borrow_mut().value = value.to_string();
    }

    pub fn set_checked(&self, checked: bool) {
        self.state.borrow_mut().checked = checked;
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.state.borrow_mut().disabled = disabled;
    }

    pub fn set_files(&self, files: Vec<FileInfo>) {
        let mut state = self.state.borrow_mut();
        state.value = files.first().map(|f| f.name.clone()).unwrap_or_default();
        state.files = Some(files);
    }

    /// Mark exactly the given option values as selected
    pub fn select_values(&self, values: &[&str]) {
        let mut state = self.state.borrow_mut();
        for (option, selected) in state.options.iter_mut() {
            *selected = values.contains(&option.as_str());
        }
    }

    /// Remove the widget from the document
    pub fn detach(&self) {
        self.state.borrow_mut().connected = false;
    }

    pub fn into_ref(self) -> ControlRef {
        Rc::new(self)
    }
}

impl Control for MemoryControl {
    fn tag_name(&self) -> String {
        self.state.borrow().tag.clone()
    }

    fn type_attr(&self) -> Option<String> {
        self.state.borrow().kind.clone()
    }

    fn value(&self) -> String {
        let state = self.state.borrow();
        if state.tag == "select" {
            return state
                .options
                .iter()
                .find(|(_, selected)| *selected)
                .map(|(value, _)| value.clone())
                .unwrap_or_default();
        }
        state.value.clone()
    }

    fn checked(&self) -> bool {
        self.state.borrow().checked
    }

    fn disabled(&self) -> bool {
        self.state.borrow().disabled
    }

    fn multiple(&self) -> bool {
        self.state.borrow().multiple
    }

    fn selected_values(&self) -> Vec<String> {
        self.state
            .borrow()
            .options
            .iter()
            .filter(|(_, selected)| *selected)
            .map(|(value, _)| value.clone())
            .collect()
    }

    fn files(&self) -> Option<Vec<FileInfo>> {
        self.state.borrow().files.clone()
    }

    fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }
}

/// Form holding named [`MemoryControl`]s in document order
#[derive(Debug, Default)]
pub struct MemoryForm {
    controls: Vec<(String, MemoryControl)>,
    submissions: Cell<usize>,
}

impl MemoryForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a widget under `name`; several widgets may share a name
    pub fn with(mut self, name: &str, control: MemoryControl) -> Self {
        self.controls.push((name.to_string(), control));
        self
    }

    /// How many times [`FormHost::submit`] was called
    pub fn submissions(&self) -> usize {
        self.submissions.get()
    }
}

impl FormHost for MemoryForm {
    fn controls(&self, name: &str) -> Vec<ControlRef> {
        self.controls
            .iter()
            .filter(|(control_name, _)| control_name == name)
            .map(|(_, control)| control.clone().into_ref())
            .collect()
    }

    fn submit(&self) {
        self.submissions.set(self.submissions.get() + 1);
    }
}

/// Document resolving forms by id or by name
#[derive(Default)]
pub struct MemoryDocument {
    forms: Vec<(Option<String>, Option<String>, Rc<MemoryForm>)>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_form(mut self, id: Option<&str>, name: Option<&str>, form: Rc<MemoryForm>) -> Self {
        self.forms
            .push((id.map(str::to_string), name.map(str::to_string), form));
        self
    }
}

impl Document for MemoryDocument {
    fn form(&self, selector: &FormSelector) -> Option<Rc<dyn FormHost>> {
        self.forms
            .iter()
            .find(|(id, name, _)| match selector {
                FormSelector::Id(wanted) => id.as_deref() == Some(wanted.as_str()),
                FormSelector::Name(wanted) => name.as_deref() == Some(wanted.as_str()),
            })
            .map(|(_, _, form)| form.clone() as Rc<dyn FormHost>)
    }
}
