//! # form-validator
//!
//! Declarative validation for HTML-style forms. Fields are declared with an
//! ordered set of rules; each validation pass reads the widgets, runs the
//! rules and reports one error record per failing field through lifecycle
//! callbacks.
//!
//! The crate never touches a real DOM. Widgets are read through the
//! [`host`] traits, implemented over `web-sys` by `form-validator-web` and in
//! plain Rust by [`memory`].

pub mod config;
mod engine;
pub mod error;
pub mod extract;
pub mod field;
pub mod host;
pub mod memory;
pub mod messages;
pub mod rules;
pub mod validator;
pub mod value;

// Re-exports for easy access
pub use config::{ConfigError, FieldMap, FormSelector, ValidatorConfig};
pub use error::{FieldError, FieldResult, RuleError, RuleResult, ValidatorError};
pub use field::{ChangeEvent, Field, FieldKind, FieldOptions};
pub use host::{Control, ControlRef, Document, FormHost};
pub use messages::PlaceholderMode;
pub use rules::{HostPattern, RuleInput, RuleParam, RuleSet};
pub use validator::{ChangeNotice, FieldValues, FormValidator, Validation};
pub use value::{FieldValue, FileInfo, Item};
