//! Hierarchical addresses
//!
//! A `Path` is an ordered sequence of [`Name`] segments rooted at a single
//! root. Paths compare and sort by their segment sequence, so `/a/b` sorts
//! before `/a/c` and `/a` sorts before `/a/b`.
//!
//! ## Canonical form
//!
//! - Root renders as `/`
//! - Every other path renders as `/seg1/seg2/...`
//!
//! Parsing is lenient about separators (the leading `/` is optional, trailing
//! and repeated separators are dropped) but strict about segments: each one
//! must be a valid `Name`, and the error surfaces at parse time.

use crate::name::{Name, NameError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Path separator
pub const SEPARATOR: char = '/';

/// A hierarchical address
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Path {
    segments: Vec<Name>,
}

impl Path {
    /// The root path (zero segments)
    pub fn root() -> Self {
        Path {
            segments: Vec::new(),
        }
    }

    /// Parse a path from its string form
    ///
    /// # Errors
    ///
    /// Returns the `NameError` of the first invalid segment.
    pub fn parse(s: &str) -> Result<Self, NameError> {
        let segments = s
            .split(SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .map(Name::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Path { segments })
    }

    /// Build a path from already-validated names
    pub fn from_names(names: impl IntoIterator<Item = Name>) -> Self {
        Path {
            segments: names.into_iter().collect(),
        }
    }

    /// True only for the root path
    #[inline]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Compose a child path
    pub fn child(&self, name: Name) -> Path {
        let mut segments = self.segments.clone();
        segments.push(name);
        Path { segments }
    }

    /// Compose a descendant path from a relative string (`"b/c"`)
    pub fn join(&self, relative: &str) -> Result<Path, NameError> {
        let tail = Path::parse(relative)?;
        let mut segments = self.segments.clone();
        segments.extend(tail.segments);
        Ok(Path { segments })
    }

    /// Parent path, or `None` at the root
    pub fn parent(&self) -> Option<Path> {
        if self.is_root() {
            return None;
        }
        Some(Path {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Last segment, or `None` at the root
    pub fn name(&self) -> Option<&Name> {
        self.segments.last()
    }

    /// Segments from the root downwards
    pub fn segments(&self) -> &[Name] {
        &self.segments
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// True if `prefix` is this path or one of its ancestors
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Proper ancestors, nearest first, ending at the root
    pub fn ancestors(&self) -> impl Iterator<Item = Path> + '_ {
        (0..self.segments.len()).rev().map(move |len| Path {
            segments: self.segments[..len].to_vec(),
        })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "{}", SEPARATOR);
        }
        for segment in &self.segments {
            write!(f, "{}{}", SEPARATOR, segment)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl TryFrom<String> for Path {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Path::parse(&value)
    }
}

impl TryFrom<&str> for Path {
    type Error = NameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Path::parse(value)
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.to_string()
    }
}

impl From<Name> for Path {
    fn from(name: Name) -> Self {
        Path {
            segments: vec![name],
        }
    }
}
