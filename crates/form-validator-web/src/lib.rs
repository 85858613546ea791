//! # form-validator-web
//!
//! Runs `form-validator` against a live browser document: the host traits
//! over `web-sys`, `submit`/`change` listener wiring, and a `FormValidator`
//! class for JavaScript callers.

pub mod binding;
pub mod dom;
pub mod error;
pub mod js;

pub use binding::BoundValidator;
pub use dom::{WebControl, WebDocument, WebForm};
pub use error::{WebError, WebResult};
pub use js::JsFormValidator;

use wasm_bindgen::prelude::*;

/// Set panic hook for better error messages in the browser
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}
