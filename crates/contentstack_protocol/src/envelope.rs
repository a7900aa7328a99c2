//! Top-level response envelopes.

use crate::error::{ProtocolError, ProtocolResult};
use serde_json::Value;

/// A top-level key the delivery API wraps its payload in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Envelope {
    /// `stack`
    Stack,
    /// `entry`
    Entry,
    /// `entries`
    Entries,
    /// `asset`
    Asset,
    /// `assets`
    Assets,
    /// `content_type`
    ContentType,
    /// `content_types`
    ContentTypes,
    /// `items` (sync)
    Items,
}

impl Envelope {
    /// All envelopes, in dispatch order.
    pub const ALL: [Envelope; 8] = [
        Envelope::Stack,
        Envelope::Entry,
        Envelope::Entries,
        Envelope::Asset,
        Envelope::Assets,
        Envelope::ContentType,
        Envelope::ContentTypes,
        Envelope::Items,
    ];

    /// Returns the wire key.
    pub fn key(&self) -> &'static str {
        match self {
            Envelope::Stack => "stack",
            Envelope::Entry => "entry",
            Envelope::Entries => "entries",
            Envelope::Asset => "asset",
            Envelope::Assets => "assets",
            Envelope::ContentType => "content_type",
            Envelope::ContentTypes => "content_types",
            Envelope::Items => "items",
        }
    }

    /// Parses a wire key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.key() == key)
    }

    /// Returns true if the envelope wraps a list rather than a single record.
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            Envelope::Entries | Envelope::Assets | Envelope::ContentTypes | Envelope::Items
        )
    }

    /// Finds the first known envelope present in a response.
    pub fn detect(response: &Value) -> Option<Self> {
        let map = response.as_object()?;
        Self::ALL.into_iter().find(|e| map.contains_key(e.key()))
    }

    /// Takes the wrapped payload out of a response.
    ///
    /// Collections must be JSON arrays and single records must be JSON
    /// objects; anything else is reported instead of coerced.
    pub fn extract(&self, response: Value) -> ProtocolResult<Value> {
        let mut map = match response {
            Value::Object(map) => map,
            other => {
                return Err(ProtocolError::invalid_structure(format!(
                    "expected a JSON object response, got {}",
                    kind_of(&other)
                )))
            }
        };

        let inner = map
            .remove(self.key())
            .ok_or(ProtocolError::MissingEnvelope(self.key()))?;

        let shape_ok = if self.is_collection() {
            inner.is_array()
        } else {
            inner.is_object()
        };
        if !shape_ok {
            return Err(ProtocolError::invalid_structure(format!(
                "`{}` has unexpected type {}",
                self.key(),
                kind_of(&inner)
            )));
        }

        Ok(inner)
    }

    /// Takes a collection payload out of a response as a list of records.
    pub fn extract_list(&self, response: Value) -> ProtocolResult<Vec<Value>> {
        if !self.is_collection() {
            return Err(ProtocolError::invalid_structure(format!(
                "`{}` is not a collection envelope",
                self.key()
            )));
        }
        match self.extract(response)? {
            Value::Array(items) => Ok(items),
            other => Err(ProtocolError::invalid_structure(format!(
                "`{}` has unexpected type {}",
                self.key(),
                kind_of(&other)
            ))),
        }
    }
}

/// Reads the `count` field that accompanies list responses when
/// `include_count` was requested.
pub fn response_count(response: &Value) -> Option<u64> {
    response.get("count").and_then(Value::as_u64)
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
