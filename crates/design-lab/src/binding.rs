//! Variable binding resolution
//!
//! Turns one overlay field plus one record into the concrete value to
//! draw. Missing text bindings fall back to the raw placeholder token so
//! they stand out on a test print; missing images resolve to an empty
//! slot so nothing unprintable reaches the document.

use crate::options::Placeholders;
use crate::template::{Binding, CompositeBinding, EncodingMode, OverlayField, Symbology};
use crate::types::FieldId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Separator for pipe-separated code payloads
pub const PSV_SEPARATOR: &str = "|";

/// Field name → scalar value, supplied by the caller and never mutated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Textual form of a value; `null` counts as absent
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A binding whose key was absent from the record. Non-fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedBinding {
    pub field: FieldId,
    pub key: String,
}

impl std::fmt::Display for UnresolvedBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "field {} has no value for '{}'", self.field, self.key)
    }
}

/// The concrete thing to draw for a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedValue {
    Text(String),
    Code { symbology: Symbology, payload: String },
    /// Image reference; `None` leaves the slot empty
    Image(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub value: ResolvedValue,
    pub unresolved: Vec<UnresolvedBinding>,
}

/// Resolve a field against a record
pub fn resolve(field: &OverlayField, record: &Record, placeholders: Placeholders<'_>) -> Resolution {
    let mut unresolved = Vec::new();

    let value = match &field.binding {
        Binding::Text(text) => match placeholders.key(&text.binding_key) {
            Some(key) => match record.text(key) {
                Some(value) => ResolvedValue::Text(value),
                None => {
                    unresolved.push(UnresolvedBinding {
                        field: field.id,
                        key: key.to_string(),
                    });
                    ResolvedValue::Text(text.binding_key.clone())
                }
            },
            // Static text ignores the record entirely
            None => ResolvedValue::Text(text.binding_key.clone()),
        },
        Binding::Image(image) => {
            let key = bare_key(&image.binding_key, placeholders);
            let reference = record.text(key).filter(|r| !r.trim().is_empty());
            if reference.is_none() {
                unresolved.push(UnresolvedBinding {
                    field: field.id,
                    key: key.to_string(),
                });
            }
            ResolvedValue::Image(reference)
        }
        Binding::Composite(composite) => ResolvedValue::Code {
            symbology: composite.symbology,
            payload: encode_payload(field.id, composite, record, placeholders, &mut unresolved),
        },
    };

    for warning in &unresolved {
        log::warn!("Unresolved binding: {}", warning);
    }

    Resolution { value, unresolved }
}

/// Accept both `name` and `{{name}}` where a bare key is expected
fn bare_key<'a>(key: &'a str, placeholders: Placeholders<'_>) -> &'a str {
    placeholders.key(key).unwrap_or_else(|| key.trim())
}

fn encode_payload(
    field: FieldId,
    composite: &CompositeBinding,
    record: &Record,
    placeholders: Placeholders<'_>,
    unresolved: &mut Vec<UnresolvedBinding>,
) -> String {
    let segments: Vec<(&str, String)> = composite
        .fields
        .iter()
        .map(|name| {
            let key = bare_key(name, placeholders);
            let value = record.text(key).unwrap_or_else(|| {
                unresolved.push(UnresolvedBinding {
                    field,
                    key: key.to_string(),
                });
                String::new()
            });
            (key, value)
        })
        .collect();

    match composite.mode {
        EncodingMode::Psv => segments
            .into_iter()
            .map(|(_, value)| value)
            .collect::<Vec<_>>()
            .join(PSV_SEPARATOR),
        EncodingMode::Json => {
            // Built by hand to keep the configured key order
            let body = segments
                .iter()
                .map(|(key, value)| format!("{}:{}", Value::from(*key), Value::from(value.as_str())))
                .collect::<Vec<_>>()
                .join(",");
            format!("{{{}}}", body)
        }
    }
}
