//! Records, access-control payloads and load results
//!
//! A record is the data-bearing leaf at a path: an arbitrary JSON payload,
//! an access-control payload the engine stores but never interprets, and a
//! set of free-form type tags.

use crate::name::Name;
use crate::path::Path;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use std::collections::BTreeSet;

/// Opaque access-control payload
///
/// Carried alongside every record and returned verbatim. Checking it against
/// the requesting identity is the calling layer's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Acl(JsonValue);

impl Acl {
    /// Wrap an arbitrary payload
    pub fn new(payload: JsonValue) -> Self {
        Acl(payload)
    }

    /// The default "open" payload, also synthesized for legacy records that carried none
    pub fn open() -> Self {
        Acl(json!({ "public": { "read": true, "write": true } }))
    }

    /// Borrow the raw payload
    pub fn payload(&self) -> &JsonValue {
        &self.0
    }

    /// Consume and return the raw payload
    pub fn into_payload(self) -> JsonValue {
        self.0
    }
}

impl Default for Acl {
    fn default() -> Self {
        Acl::open()
    }
}

/// Data stored at a path
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Structured payload
    pub data: JsonValue,
    /// Access-control payload
    pub acl: Acl,
    /// Free-form type tags
    pub types: BTreeSet<String>,
}

impl Default for Record {
    /// The synthesized empty record: `{}` with an open ACL and no types
    fn default() -> Self {
        Record {
            data: JsonValue::Object(Map::new()),
            acl: Acl::open(),
            types: BTreeSet::new(),
        }
    }
}

impl Record {
    /// Create a record with the default ACL and no types
    pub fn new(data: JsonValue) -> Self {
        Record {
            data,
            ..Record::default()
        }
    }

    /// Replace the access-control payload
    pub fn with_acl(mut self, acl: Acl) -> Self {
        self.acl = acl;
        self
    }

    /// Add a type tag
    pub fn with_type(mut self, tag: impl Into<String>) -> Self {
        self.types.insert(tag.into());
        self
    }

    /// True if the record carries `tag`
    pub fn has_type(&self, tag: &str) -> bool {
        self.types.contains(tag)
    }

    /// Resolve a dotted field path (`"address.city"`) inside the payload
    ///
    /// Numeric segments index into arrays. An empty field path resolves to
    /// the whole payload.
    pub fn field(&self, field: &str) -> Option<&JsonValue> {
        if field.is_empty() {
            return Some(&self.data);
        }
        field.split('.').try_fold(&self.data, |value, segment| match value {
            JsonValue::Object(map) => map.get(segment),
            JsonValue::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }
}

/// A record together with the path it was loaded from
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    /// Where the record lives
    pub path: Path,
    /// The record itself
    pub record: Record,
}

impl Object {
    /// Pair a path with a record
    pub fn new(path: Path, record: Record) -> Self {
        Object { path, record }
    }
}

/// Result of loading a path
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// The path holds a record
    Object(Record),
    /// The path is a container; direct child names in sorted order
    Container(Vec<Name>),
}

impl Entry {
    /// The record, if this entry is one
    pub fn into_record(self) -> Option<Record> {
        match self {
            Entry::Object(record) => Some(record),
            Entry::Container(_) => None,
        }
    }

    /// The child names, if this entry is a container
    pub fn into_children(self) -> Option<Vec<Name>> {
        match self {
            Entry::Object(_) => None,
            Entry::Container(children) => Some(children),
        }
    }

    /// True for containers
    pub fn is_container(&self) -> bool {
        matches!(self, Entry::Container(_))
    }
}
