//! Record filters

use arbor_core::Object;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

/// Caller-supplied predicate over a loaded object
pub type Predicate = Arc<dyn Fn(&Object) -> bool + Send + Sync>;

/// One condition a record must satisfy
///
/// Field names are dotted paths into the record payload (see
/// [`Record::field`](arbor_core::Record::field)).
#[derive(Clone)]
pub enum Filter {
    /// Field is present and equal to the value
    Equals(String, JsonValue),
    /// Field is absent or differs from the value
    NotEquals(String, JsonValue),
    /// Field is present (`null` counts as present)
    Exists(String),
    /// Record carries the type tag
    HasType(String),
    /// Arbitrary predicate
    Custom(Predicate),
}

impl Filter {
    /// Evaluate against a loaded object
    pub fn matches(&self, object: &Object) -> bool {
        let record = &object.record;
        match self {
            Filter::Equals(field, value) => record.field(field) == Some(value),
            Filter::NotEquals(field, value) => record.field(field) != Some(value),
            Filter::Exists(field) => record.field(field).is_some(),
            Filter::HasType(tag) => record.has_type(tag),
            Filter::Custom(predicate) => predicate(object),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Equals(field, value) => write!(f, "{} == {}", field, value),
            Filter::NotEquals(field, value) => write!(f, "{} != {}", field, value),
            Filter::Exists(field) => write!(f, "exists({})", field),
            Filter::HasType(tag) => write!(f, "type({})", tag),
            Filter::Custom(_) => f.write_str("custom(..)"),
        }
    }
}
