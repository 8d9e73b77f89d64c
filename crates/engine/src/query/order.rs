//! Result ordering
//!
//! Field ordering uses a total order over JSON values:
//! missing < null < bool < number < string < array < object.
//! Numbers compare numerically, arrays element-wise, objects by their
//! key-sorted entries.

use arbor_core::Object;
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Caller-supplied comparator
pub type Comparator = Arc<dyn Fn(&Object, &Object) -> Ordering + Send + Sync>;

/// Sort direction for field ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Smallest first
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

/// How matched objects are sorted
#[derive(Clone)]
pub enum SortOrder {
    /// Compare one payload field
    Field {
        /// Dotted field path
        field: String,
        /// Sort direction
        direction: Direction,
    },
    /// Arbitrary comparator
    Custom(Comparator),
}

impl SortOrder {
    /// Compare two objects
    pub fn compare(&self, a: &Object, b: &Object) -> Ordering {
        match self {
            SortOrder::Field { field, direction } => {
                let ordering = compare_fields(a.record.field(field), b.record.field(field));
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            }
            SortOrder::Custom(comparator) => comparator(a, b),
        }
    }
}

impl fmt::Debug for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Field { field, direction } => f
                .debug_struct("Field")
                .field("field", field)
                .field("direction", direction)
                .finish(),
            SortOrder::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

fn rank(value: &JsonValue) -> u8 {
    match value {
        JsonValue::Null => 0,
        JsonValue::Bool(_) => 1,
        JsonValue::Number(_) => 2,
        JsonValue::String(_) => 3,
        JsonValue::Array(_) => 4,
        JsonValue::Object(_) => 5,
    }
}

/// Missing fields sort before every present value
pub fn compare_fields(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_json(a, b),
    }
}

/// Total order over JSON values
pub fn compare_json(a: &JsonValue, b: &JsonValue) -> Ordering {
    match (a, b) {
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        (JsonValue::Number(x), JsonValue::Number(y)) => {
            // Integers compare exactly; anything else falls back to f64
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x.cmp(&y)
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x.cmp(&y)
            } else {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.total_cmp(&y)
            }
        }
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        (JsonValue::Array(x), JsonValue::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(x, y)| compare_json(x, y))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (JsonValue::Object(x), JsonValue::Object(y)) => {
            let mut xs: Vec<_> = x.iter().collect();
            let mut ys: Vec<_> = y.iter().collect();
            xs.sort_by(|l, r| l.0.cmp(r.0));
            ys.sort_by(|l, r| l.0.cmp(r.0));
            xs.iter()
                .zip(ys.iter())
                .map(|((xk, xv), (yk, yv))| xk.cmp(yk).then_with(|| compare_json(xv, yv)))
                .find(|o| o.is_ne())
                .unwrap_or_else(|| xs.len().cmp(&ys.len()))
        }
        _ => rank(a).cmp(&rank(b)),
    }
}
