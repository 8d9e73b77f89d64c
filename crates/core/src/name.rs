//! Path segment type
//!
//! A `Name` is a single segment of a [`Path`](crate::Path). Every segment
//! maps 1:1 onto a filesystem component in the file-backed engine, so the
//! character set is deliberately narrow.
//!
//! ## Validation
//!
//! Names must:
//! - Be 1-255 bytes
//! - Contain only alphanumeric, dash, underscore, dot, `@`, `+`, `~`
//! - Not start with a dot
//!
//! The leading-dot rule keeps `.` and `..` out of the namespace and reserves
//! dot-prefixed entries for engine bookkeeping (temp files, relation index
//! directories).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a single name, in bytes
pub const MAX_NAME_LENGTH: usize = 255;

/// A validated path segment
///
/// ## Examples
///
/// Valid names:
/// - "users"
/// - "alice@example.com"
/// - "report-2024.v2"
///
/// Invalid names:
/// - "" (empty)
/// - ".hidden"
/// - "has space"
/// - "a/b"
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name(String);

/// Error when validating a name
///
/// This is the `InvalidName` condition surfaced by path parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// Name is empty
    Empty,
    /// Name exceeds maximum length
    TooLong {
        /// Actual length in bytes
        length: usize,
        /// Maximum allowed length
        max: usize,
    },
    /// Name contains an invalid character
    InvalidChar {
        /// The invalid character
        char: char,
        /// Position of the invalid character
        position: usize,
    },
    /// Name starts with a dot
    InvalidStart,
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameError::Empty => write!(f, "invalid name: name cannot be empty"),
            NameError::TooLong { length, max } => {
                write!(f, "invalid name: {} bytes (max {})", length, max)
            }
            NameError::InvalidChar { char, position } => write!(
                f,
                "invalid name: character '{}' at position {} (only alphanumeric and -_.@+~ allowed)",
                char, position
            ),
            NameError::InvalidStart => write!(f, "invalid name: cannot start with '.'"),
        }
    }
}

impl std::error::Error for NameError {}

impl Name {
    /// Create a new Name, validating the input
    ///
    /// # Errors
    ///
    /// Returns `NameError` if the name is invalid.
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Name(name))
    }

    /// Validate a candidate name without allocating
    pub fn validate(name: &str) -> Result<(), NameError> {
        if name.is_empty() {
            return Err(NameError::Empty);
        }

        if name.len() > MAX_NAME_LENGTH {
            return Err(NameError::TooLong {
                length: name.len(),
                max: MAX_NAME_LENGTH,
            });
        }

        if name.starts_with('.') {
            return Err(NameError::InvalidStart);
        }

        for (pos, ch) in name.chars().enumerate() {
            if !Self::is_valid_char(ch) {
                return Err(NameError::InvalidChar {
                    char: ch,
                    position: pos,
                });
            }
        }

        Ok(())
    }

    #[inline]
    fn is_valid_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@' | '+' | '~')
    }

    /// Get the name as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for Name {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.0
    }
}

impl TryFrom<String> for Name {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Name::new(value)
    }
}

impl TryFrom<&str> for Name {
    type Error = NameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Name::new(value)
    }
}

impl std::str::FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Name::new(s)
    }
}
