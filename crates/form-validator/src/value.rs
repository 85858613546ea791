//! Values read from form widgets

use serde::{Deserialize, Serialize};
use std::fmt;

/// Metadata of a file selected in a file input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    /// MIME type reported by the host, may be empty
    pub mime: String,
    /// Size in bytes
    pub size: u64,
}

impl FileInfo {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            size,
        }
    }

    /// Size in megabytes (1 MB = 1024 * 1024 bytes)
    pub fn size_mb(&self) -> f64 {
        self.size as f64 / 1024.0 / 1024.0
    }

    /// Lower-cased extension, or the whole lower-cased name when it has no dot
    pub fn extension(&self) -> String {
        extension_of(&self.name)
    }
}

pub(crate) fn extension_of(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) => name[idx + 1..].to_lowercase(),
        None => name.to_lowercase(),
    }
}

/// A single value: widget text or a selected file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Item {
    Text(String),
    File(FileInfo),
}

impl Item {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Item::Text(text) => Some(text),
            Item::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileInfo> {
        match self {
            Item::File(file) => Some(file),
            Item::Text(_) => None,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Item::File(_))
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Item::Text(_) => "text",
            Item::File(_) => "file",
        }
    }
}

impl From<&str> for Item {
    fn from(text: &str) -> Self {
        Item::Text(text.to_string())
    }
}

impl From<String> for Item {
    fn from(text: String) -> Self {
        Item::Text(text)
    }
}

impl From<FileInfo> for Item {
    fn from(file: FileInfo) -> Self {
        Item::File(file)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Text(text) => f.write_str(text),
            Item::File(file) => f.write_str(&file.name),
        }
    }
}

/// Current value of a field.
///
/// Multi-valued widgets (multiple files, checkbox groups, multi-selects)
/// produce `Many`; an empty selection is always `Null`, never an empty list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    One(Item),
    Many(Vec<Item>),
}

impl FieldValue {
    pub fn text(text: impl Into<String>) -> Self {
        FieldValue::One(Item::Text(text.into()))
    }

    /// Build a list value, collapsing an empty list to `Null`
    pub fn many(items: Vec<Item>) -> Self {
        if items.is_empty() {
            FieldValue::Null
        } else {
            FieldValue::Many(items)
        }
    }

    /// `Null` or an empty string
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::One(Item::Text(text)) => text.is_empty(),
            FieldValue::One(Item::File(_)) => false,
            FieldValue::Many(items) => items.is_empty(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::One(item) => item.as_text(),
            _ => None,
        }
    }

    /// Items the value is made of: none for `Null`, one for `One`
    pub fn items(&self) -> &[Item] {
        match self {
            FieldValue::Null => &[],
            FieldValue::One(item) => std::slice::from_ref(item),
            FieldValue::Many(items) => items,
        }
    }
}

/// Comma-joined items; empty for a null value
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, item) in self.items().iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", item)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        assert!(FieldValue::Null.is_empty());
        assert!(FieldValue::text("").is_empty());
        assert!(!FieldValue::text(" ").is_empty());
        assert!(!FieldValue::One(Item::File(FileInfo::new("a.png", "image/png", 1))).is_empty());
    }

    #[test]
    fn test_many_collapses_empty_list() {
        assert_eq!(FieldValue::many(vec![]), FieldValue::Null);
        assert_eq!(FieldValue::many(vec!["a".into()]).items().len(), 1);
    }

    #[test]
    fn test_file_extension_and_size() {
        let file = FileInfo::new("Report.Final.PDF", "application/pdf", 3 * 1024 * 1024);
        assert_eq!(file.extension(), "pdf");
        assert_eq!(file.size_mb(), 3.0);
        assert_eq!(extension_of("README"), "readme");
    }

    #[test]
    fn test_value_serializes_untagged() {
        let value = FieldValue::Many(vec!["red".into(), "blue".into()]);
        assert_eq!(serde_json::to_value(&value).unwrap(), serde_json::json!(["red", "blue"]));
        assert_eq!(serde_json::to_value(FieldValue::Null).unwrap(), serde_json::Value::Null);
    }
}
