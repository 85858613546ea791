//! Built-in predicates of the `type` rule

use crate::field::{Field, FieldKind};
use crate::value::Item;
use once_cell::sync::Lazy;
use regex::Regex;

/// Signature of a built-in type predicate
pub type BuiltinType = fn(&Item, &Field) -> bool;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#,
    )
    .expect("email pattern is valid")
});

static EMAIL_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*,\s*").expect("separator pattern is valid"));

static FLOAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9]*\.?[0-9]+$").expect("float pattern is valid"));

static INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9]+$").expect("integer pattern is valid"));

static IP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^((25[0-5]|2[0-4][0-9]|1[0-9]{2}|[0-9]{1,2})\.){3}(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[0-9]{1,2})$",
    )
    .expect("ip pattern is valid")
});

static LETTERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z]+$").expect("letters pattern is valid"));

static LETTERS_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z\-]+$").expect("letters-dash pattern is valid"));

static NUMBERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("numbers pattern is valid"));

static NUMBERS_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9\-]+$").expect("numbers-dash pattern is valid"));

// An empty string matches too; empty values never reach the type rule.
static URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^((http|https)://([0-9A-Za-z_]+:?[0-9A-Za-z_]*@)?(\S+)|)(:[0-9]+)?(/|/([0-9A-Za-z_#!:.?+=&%@\-/]))?$",
    )
    .expect("url pattern is valid")
});

fn matches(regex: &Regex, value: &Item) -> bool {
    value.as_text().map_or(false, |text| regex.is_match(text))
}

fn email(value: &Item, _field: &Field) -> bool {
    matches(&EMAIL, value)
}

fn emails(value: &Item, _field: &Field) -> bool {
    value.as_text().map_or(false, |text| {
        EMAIL_SEPARATOR
            .split(text)
            .all(|address| EMAIL.is_match(address))
    })
}

fn letters(value: &Item, _field: &Field) -> bool {
    matches(&LETTERS, value)
}

fn letters_dash(value: &Item, _field: &Field) -> bool {
    matches(&LETTERS_DASH, value)
}

fn numbers(value: &Item, _field: &Field) -> bool {
    matches(&NUMBERS, value)
}

fn numbers_dash(value: &Item, _field: &Field) -> bool {
    matches(&NUMBERS_DASH, value)
}

fn integer(value: &Item, _field: &Field) -> bool {
    matches(&INTEGER, value)
}

fn float(value: &Item, _field: &Field) -> bool {
    matches(&FLOAT, value)
}

fn url(value: &Item, _field: &Field) -> bool {
    matches(&URL, value)
}

fn ip(value: &Item, _field: &Field) -> bool {
    matches(&IP, value)
}

/// A file field holding either a file or a plain path string
fn file(_value: &Item, field: &Field) -> bool {
    field.kind == FieldKind::File
}

/// Look up a built-in type predicate by name
pub fn default_type(name: &str) -> Option<BuiltinType> {
    let predicate: BuiltinType = match name {
        "email" => email,
        "emails" => emails,
        "letters" => letters,
        "letters-dash" => letters_dash,
        "numbers" => numbers,
        "numbers-dash" => numbers_dash,
        "integer" => integer,
        "float" => float,
        "url" => url,
        "ip" => ip,
        "file" => file,
        _ => return None,
    };
    Some(predicate)
}
