//! Validator configuration

use crate::field::FieldOptions;
use crate::messages::PlaceholderMode;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': '{value}'. Expected: {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// How the form is located in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormSelector {
    /// `#id`
    Id(String),
    /// Name of the form in the document's form collection
    Name(String),
}

impl FromStr for FormSelector {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let selector = match s.strip_prefix('#') {
            Some(id) => FormSelector::Id(id.to_string()),
            None => FormSelector::Name(s.to_string()),
        };
        match &selector {
            FormSelector::Id(value) | FormSelector::Name(value) if value.is_empty() => {
                Err(ConfigError::InvalidValue {
                    field: "form".to_string(),
                    value: s.to_string(),
                    expected: "'#id' or a form name".to_string(),
                })
            }
            _ => Ok(selector),
        }
    }
}

impl fmt::Display for FormSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormSelector::Id(id) => write!(f, "#{}", id),
            FormSelector::Name(name) => f.write_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for FormSelector {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Field options keyed by field name, in declaration order.
///
/// A key may list several comma-separated names sharing the same options.
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    entries: Vec<(String, FieldOptions)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, names: impl Into<String>, options: FieldOptions) -> Self {
        self.entries.push((names.into(), options));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every individual field name with its options, comma lists expanded
    pub fn expand(&self) -> impl Iterator<Item = (&str, &FieldOptions)> {
        self.entries.iter().flat_map(|(names, options)| {
            names
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(move |name| (name, options))
        })
    }
}

impl<K: Into<String>> FromIterator<(K, FieldOptions)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, FieldOptions)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

struct FieldMapVisitor;

impl<'de> Visitor<'de> for FieldMapVisitor {
    type Value = FieldMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of field names to field options")
    }

    fn visit_map<A>(self, mut map: A) -> Result<FieldMap, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut fields = FieldMap::new();
        while let Some((names, options)) = map.next_entry::<String, FieldOptions>()? {
            fields.entries.push((names, options));
        }
        Ok(fields)
    }
}

impl<'de> Deserialize<'de> for FieldMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(FieldMapVisitor)
    }
}

fn default_prevent_default() -> bool {
    true
}

/// Construction options of a [`FormValidator`](crate::FormValidator)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorConfig {
    pub form: FormSelector,
    /// Block native submission even when validation succeeds
    #[serde(default = "default_prevent_default")]
    pub prevent_default: bool,
    #[serde(default)]
    pub placeholders: PlaceholderMode,
    #[serde(default)]
    pub fields: FieldMap,
}

impl ValidatorConfig {
    pub fn new(form: FormSelector) -> Self {
        Self {
            form,
            prevent_default: true,
            placeholders: PlaceholderMode::default(),
            fields: FieldMap::new(),
        }
    }

    /// Configuration for the form matched by `selector` (`#id` or a name)
    pub fn for_form(selector: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(selector.parse()?))
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn prevent_default(mut self, prevent: bool) -> Self {
        self.prevent_default = prevent;
        self
    }

    pub fn placeholders(mut self, mode: PlaceholderMode) -> Self {
        self.placeholders = mode;
        self
    }

    pub fn field(mut self, names: impl Into<String>, options: FieldOptions) -> Self {
        self.fields = self.fields.field(names, options);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_parsing() {
        assert_eq!("#signup".parse::<FormSelector>().unwrap(), FormSelector::Id("signup".into()));
        assert_eq!("signup".parse::<FormSelector>().unwrap(), FormSelector::Name("signup".into()));
        assert!("#".parse::<FormSelector>().is_err());
        assert!("".parse::<FormSelector>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = ValidatorConfig::for_form("#form").unwrap();
        assert!(config.prevent_default);
        assert_eq!(config.placeholders, PlaceholderMode::First);
        assert!(config.fields.is_empty());
    }

    #[test]
    fn test_from_json() {
        let config = ValidatorConfig::from_json(
            r##"{
                "form": "#form",
                "preventDefault": false,
                "fields": {
                    "email": {"rules": {"required": true, "type": "email"}, "messages": {"type": "Bad e-mail"}},
                    "first_name, last_name": {"rules": {"type": "letters"}}
                }
            }"##,
        )
        .unwrap();

        assert!(!config.prevent_default);
        let names: Vec<&str> = config.fields.expand().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["email", "first_name", "last_name"]);
    }

    #[test]
    fn test_from_yaml() {
        let config = ValidatorConfig::from_yaml(
            "form: signup\nplaceholders: all\nfields:\n  age:\n    label: Age\n    rules:\n      required: true\n      min-range: 18\n",
        )
        .unwrap();

        assert_eq!(config.form, FormSelector::Name("signup".into()));
        assert_eq!(config.placeholders, PlaceholderMode::All);
        let (name, options) = config.fields.expand().next().unwrap();
        assert_eq!(name, "age");
        assert_eq!(options.rules.len(), 2);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(ValidatorConfig::from_json(r#"{"form": ""}"#), Err(ConfigError::Json(_))));
        assert!(ValidatorConfig::from_yaml("form: [1, 2]").is_err());
    }
}
