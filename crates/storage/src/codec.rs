//! Record codec
//!
//! Every record is stored as one JSON document:
//!
//! ```json
//! { "data": { ... }, "acl": { ... }, "types": ["user"] }
//! ```
//!
//! Older stores wrapped the payload under a single `"object"` key and
//! carried no access-control payload. Such documents are detected on
//! decode and normalized: the payload is unwrapped and an open ACL is
//! synthesized. Decoding never rewrites the file; the next write of the
//! record persists it in the current format.

use arbor_core::{Acl, Error, Path, Record, Result};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeSet;

/// Key holding the payload in the current format
pub const DATA_KEY: &str = "data";
/// Reserved key holding the access-control payload
pub const ACL_KEY: &str = "acl";
/// Key holding the type tags
pub const TYPES_KEY: &str = "types";
/// Wrapper key of the legacy format
pub const LEGACY_WRAPPER_KEY: &str = "object";

/// Which on-disk format a document was decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// `{"data", "acl", "types"}`
    Current,
    /// `{"object"}` wrapper
    Legacy,
}

#[derive(Serialize)]
struct StoredRecord<'a> {
    data: &'a JsonValue,
    acl: &'a Acl,
    types: &'a BTreeSet<String>,
}

/// Encode a record in the current format
pub fn encode(record: &Record) -> Result<Vec<u8>> {
    let stored = StoredRecord {
        data: &record.data,
        acl: &record.acl,
        types: &record.types,
    };
    Ok(serde_json::to_vec(&stored)?)
}

/// Decode a stored document, normalizing the legacy format
///
/// `path` is only used for error messages.
pub fn decode(path: &Path, bytes: &[u8]) -> Result<(Record, RecordFormat)> {
    let document: JsonValue = serde_json::from_slice(bytes)
        .map_err(|e| Error::unavailable(format!("corrupt record at {}: {}", path, e)))?;

    let mut map = match document {
        JsonValue::Object(map) => map,
        other => {
            return Err(Error::unavailable(format!(
                "corrupt record at {}: expected a JSON object, found {}",
                path,
                json_kind(&other)
            )))
        }
    };

    let (data, format) = if let Some(data) = map.remove(DATA_KEY) {
        (data, RecordFormat::Current)
    } else if let Some(data) = map.remove(LEGACY_WRAPPER_KEY) {
        (data, RecordFormat::Legacy)
    } else {
        return Err(Error::unavailable(format!(
            "corrupt record at {}: neither \"{}\" nor \"{}\" present",
            path, DATA_KEY, LEGACY_WRAPPER_KEY
        )));
    };

    let acl = match map.remove(ACL_KEY) {
        Some(payload) => Acl::new(payload),
        None => Acl::open(),
    };

    let types = decode_types(path, &mut map)?;

    Ok((Record { data, acl, types }, format))
}

fn decode_types(path: &Path, map: &mut Map<String, JsonValue>) -> Result<BTreeSet<String>> {
    match map.remove(TYPES_KEY) {
        None | Some(JsonValue::Null) => Ok(BTreeSet::new()),
        Some(value) => serde_json::from_value(value).map_err(|e| {
            Error::unavailable(format!("corrupt record at {}: bad type tags: {}", path, e))
        }),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
