//! Property interpolation for reporter templates.
//!
//! Templates use the `%(prop:<name>)s` placeholder syntax, with the optional
//! `:-alt`, `:~alt` and `:+repl` modifiers. `%%` renders a single `%`.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::build::Properties;

static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"%%|%\(prop:(?P<name>[^:)]+)(?::(?P<op>[-~+])(?P<arg>[^)]*))?\)s").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template(String);

impl Template {
    pub fn new<T: Into<String>>(source: T) -> Self {
        Self(source.into())
    }

    pub fn render(&self, properties: &Properties) -> String {
        render(&self.0, properties)
    }
}

impl From<&str> for Template {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Render `template` against `properties`.
pub fn render(template: &str, properties: &Properties) -> String {
    PLACEHOLDER_REGEX
        .replace_all(template, |caps: &Captures| {
            let name = match caps.name("name") {
                Some(n) => n.as_str(),
                None => return Cow::Borrowed("%"),
            };
            let value = properties.get(name);
            let arg = caps.name("arg").map(|a| a.as_str()).unwrap_or_default();

            match (caps.name("op").map(|o| o.as_str()), value) {
                (Some("-"), None) => Cow::Owned(arg.to_owned()),
                (Some("~"), v) if !v.map(is_truthy).unwrap_or(false) => Cow::Owned(arg.to_owned()),
                (Some("+"), Some(_)) => Cow::Owned(arg.to_owned()),
                (Some("+"), None) => Cow::Borrowed(""),
                (_, v) => v.map(value_to_string).unwrap_or_default(),
            }
        })
        .into_owned()
}

fn value_to_string(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
