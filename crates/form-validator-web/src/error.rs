//! Errors raised by the browser binding

use form_validator::{ConfigError, ValidatorError};
use thiserror::Error;
use wasm_bindgen::JsValue;

pub type WebResult<T> = Result<T, WebError>;

#[derive(Error, Debug)]
pub enum WebError {
    #[error("JavaScript error: {0}")]
    Js(String),

    #[error("no browser document is available")]
    NoDocument,

    #[error("invalid options: {0}")]
    Options(String),

    /// A JavaScript callback tried to use the validator while it was running
    #[error("the validator is busy running a callback")]
    Busy,

    #[error(transparent)]
    Validator(#[from] ValidatorError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_wasm_bindgen::Error),

    #[error("rule parameter error: {0}")]
    Param(#[from] serde_json::Error),
}

impl From<JsValue> for WebError {
    fn from(value: JsValue) -> Self {
        WebError::Js(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
    }
}

impl From<WebError> for JsValue {
    fn from(error: WebError) -> Self {
        js_sys::Error::new(&error.to_string()).into()
    }
}
