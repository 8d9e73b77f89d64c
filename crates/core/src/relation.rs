//! Directed, named edges between paths

use crate::name::Name;
use crate::path::Path;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A labeled, directed edge `from -[name]-> to`
///
/// Relation names are validated like path segments because the file-backed
/// index stores one file per relation name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Relation {
    /// Source endpoint
    pub from: Path,
    /// Relation label
    pub name: Name,
    /// Target endpoint
    pub to: Path,
}

impl Relation {
    /// Create a relation
    pub fn new(from: Path, name: Name, to: Path) -> Self {
        Relation { from, name, to }
    }

    /// Parse all three parts from strings
    pub fn parse(from: &str, name: &str, to: &str) -> crate::Result<Self> {
        Ok(Relation {
            from: Path::parse(from)?,
            name: Name::new(name)?,
            to: Path::parse(to)?,
        })
    }

    /// True if `path` is either endpoint
    pub fn touches(&self, path: &Path) -> bool {
        &self.from == path || &self.to == path
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.from, self.name, self.to)
    }
}
