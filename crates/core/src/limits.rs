//! Backend-declared size limits
//!
//! Each backend declares the maxima it can honor. The engine checks them
//! before any write, so a violation is reported as `RequestInvalid` and
//! nothing is touched on disk.

use crate::path::Path;
use crate::relation::Relation;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size limits declared by a backend
///
/// Missing fields deserialize to their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum length of a path's canonical string form, in bytes (default: 1024)
    pub max_path_length: usize,

    /// Maximum relation name length in bytes (default: 255)
    pub max_relation_name_length: usize,

    /// Maximum serialized record size in bytes (default: 16MB)
    pub max_serialized_record_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_path_length: 1024,
            max_relation_name_length: 255,
            max_serialized_record_length: 16 * 1024 * 1024, // 16MB
        }
    }
}

impl Limits {
    /// Create limits with small values for testing
    pub fn with_small_limits() -> Self {
        Limits {
            max_path_length: 32,
            max_relation_name_length: 8,
            max_serialized_record_length: 256,
        }
    }

    /// Validate a path's rendered length
    pub fn validate_path(&self, path: &Path) -> Result<(), LimitError> {
        let len = path.to_string().len();
        if len > self.max_path_length {
            return Err(LimitError::PathTooLong {
                actual: len,
                max: self.max_path_length,
            });
        }
        Ok(())
    }

    /// Validate both endpoints and the name of a relation
    pub fn validate_relation(&self, relation: &Relation) -> Result<(), LimitError> {
        self.validate_path(&relation.from)?;
        self.validate_path(&relation.to)?;
        let len = relation.name.as_str().len();
        if len > self.max_relation_name_length {
            return Err(LimitError::RelationNameTooLong {
                actual: len,
                max: self.max_relation_name_length,
            });
        }
        Ok(())
    }

    /// Validate the size of an encoded record
    pub fn validate_record_size(&self, encoded_len: usize) -> Result<(), LimitError> {
        if encoded_len > self.max_serialized_record_length {
            return Err(LimitError::RecordTooLarge {
                actual: encoded_len,
                max: self.max_serialized_record_length,
            });
        }
        Ok(())
    }
}

/// Limit validation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LimitError {
    /// Path exceeds maximum length
    #[error("path too long: {actual} bytes (max {max})")]
    PathTooLong {
        /// Actual length
        actual: usize,
        /// Maximum allowed
        max: usize,
    },

    /// Relation name exceeds maximum length
    #[error("relation name too long: {actual} bytes (max {max})")]
    RelationNameTooLong {
        /// Actual length
        actual: usize,
        /// Maximum allowed
        max: usize,
    },

    /// Serialized record exceeds maximum size
    #[error("record too large: {actual} bytes (max {max})")]
    RecordTooLarge {
        /// Actual size
        actual: usize,
        /// Maximum allowed
        max: usize,
    },
}
