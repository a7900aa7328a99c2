//! Live preview deep merge.
//!
//! A live preview response is built from two payloads: the published entry
//! (authoritative shell) and the draft the editor is looking at. The draft's
//! fields are laid over the published record, recursing into nested objects
//! so that fields the draft does not mention survive.
//!
//! Source records are checked strictly: every source record must be a JSON
//! object with a string `uid`, and all of them are checked before the first
//! destination record is touched. Destination records without a `uid` can
//! never match and are left alone.

use crate::error::{ProtocolError, ProtocolResult};
use serde_json::{Map, Value};

/// Returns the `uid` of a record, if it is an object with a string `uid`.
pub fn record_uid(record: &Value) -> Option<&str> {
    record.get("uid").and_then(Value::as_str)
}

/// Merges `source` records onto every `destination` record with the same
/// `uid`, in place, and returns the destination for convenience.
///
/// Object values recurse; any other value (string, number, bool, null, list)
/// overwrites. Keys only present in the destination are kept. Source records
/// that match nothing are ignored; no record is ever inserted.
pub fn deep_merge<'a>(
    destination: &'a mut [Value],
    source: &[Value],
) -> ProtocolResult<&'a mut [Value]> {
    let mut drafts = Vec::with_capacity(source.len());
    for (index, record) in source.iter().enumerate() {
        let map = record.as_object().ok_or_else(|| {
            ProtocolError::MergeInput(format!("source record {} is not an object", index))
        })?;
        let uid = record_uid(record).ok_or_else(|| {
            ProtocolError::MergeInput(format!("source record {} has no string uid", index))
        })?;
        drafts.push((uid, map));
    }

    for (uid, draft) in drafts {
        for published in destination.iter_mut() {
            if record_uid(published) != Some(uid) {
                continue;
            }
            if let Value::Object(target) = published {
                merge_object(target, draft);
            }
        }
    }

    Ok(destination)
}

fn merge_object(target: &mut Map<String, Value>, draft: &Map<String, Value>) {
    for (key, value) in draft {
        match value {
            Value::Object(nested) => {
                let slot = target
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                if let Value::Object(inner) = slot {
                    merge_object(inner, nested);
                }
            }
            other => {
                target.insert(key.clone(), other.clone());
            }
        }
    }
}
