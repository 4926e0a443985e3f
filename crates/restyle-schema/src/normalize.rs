//! Value normalization
//!
//! Runs before validation. Keys are left exactly as given; only values change.

use crate::colors::canonical_color;
use crate::kind::ValueKind;
use crate::table::SCHEMA;
use crate::{RawStyles, Styles};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static BARE_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+$").expect("static regex"));

/// Unit appended to bare integers on size properties
pub const DEFAULT_LENGTH_UNIT: &str = "px";

/// Rewrites raw interpreter values into their canonical string form
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleNormalizer;

impl StyleNormalizer {
    /// Normalize a raw property map
    ///
    /// - colour properties: conversational names become canonical codes
    /// - size properties: bare integers (`100`, `"10"`) get `px`
    /// - every other value is stringified untouched
    #[must_use]
    pub fn normalize(&self, raw: &RawStyles) -> Styles {
        raw.iter()
            .map(|(property, value)| (property.clone(), self.normalize_value(property, value)))
            .collect()
    }

    /// Normalize an already-stringified map
    #[must_use]
    pub fn normalize_strings(&self, styles: &Styles) -> Styles {
        styles
            .iter()
            .map(|(property, value)| {
                (
                    property.clone(),
                    self.normalize_value(property, &Value::String(value.clone())),
                )
            })
            .collect()
    }

    /// Normalize one value for `property`
    #[must_use]
    pub fn normalize_value(&self, property: &str, value: &Value) -> String {
        let text = stringify(value);
        let Some(spec) = SCHEMA.lookup(property) else {
            return text;
        };
        match spec.kind {
            ValueKind::Color => canonical_color(&text).unwrap_or(text),
            kind if kind.is_size() && BARE_INTEGER.is_match(&text) => {
                format!("{text}{DEFAULT_LENGTH_UNIT}")
            }
            _ => text,
        }
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
