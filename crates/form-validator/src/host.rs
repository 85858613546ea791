//! Host document abstraction
//!
//! The validator reads widget state through these traits and never touches a
//! concrete DOM. `form-validator-web` implements them over `web-sys`; the
//! [`memory`](crate::memory) module implements them in plain Rust.

use crate::config::FormSelector;
use crate::value::FileInfo;
use std::rc::Rc;

/// Shared handle to a widget
pub type ControlRef = Rc<dyn Control>;

/// A single input widget (`input`, `select`, `textarea`, ...)
pub trait Control {
    /// Lower-case tag name, e.g. `input` or `select`
    fn tag_name(&self) -> String;

    /// Value of the `type` attribute, if present
    fn type_attr(&self) -> Option<String>;

    fn value(&self) -> String;

    fn checked(&self) -> bool;

    fn disabled(&self) -> bool;

    /// Whether the widget accepts several values (`multiple` attribute)
    fn multiple(&self) -> bool;

    /// Values of the selected options of a `select`, in document order
    fn selected_values(&self) -> Vec<String>;

    /// Files attached to a file input.
    ///
    /// `None` when the widget does not expose a file list at all.
    fn files(&self) -> Option<Vec<FileInfo>>;

    /// Whether the widget is still part of the document
    fn is_connected(&self) -> bool {
        true
    }

    /// Type tag used to pick an extraction policy: the `type` attribute,
    /// else the tag name
    fn type_tag(&self) -> String {
        match self.type_attr() {
            Some(kind) if !kind.is_empty() => kind.to_lowercase(),
            _ => self.tag_name().to_lowercase(),
        }
    }
}

/// A form element
pub trait FormHost {
    /// Every widget registered under `name`, in document order
    fn controls(&self, name: &str) -> Vec<ControlRef>;

    /// Submit the form natively, bypassing validation
    fn submit(&self);
}

/// A document able to locate forms
pub trait Document {
    fn form(&self, selector: &FormSelector) -> Option<Rc<dyn FormHost>>;
}
