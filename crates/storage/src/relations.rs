//! File-backed relation index
//!
//! ## Layout
//!
//! For every object path the index keeps two directories under the
//! relations root, mirroring the path's segments:
//!
//! ```text
//! relations/
//!   a/
//!     .out/likes      ["/b", "/c"]     edges /a -[likes]-> ...
//!     .in/follows     ["/d"]           edges /d -[follows]-> /a
//!     b/
//!       .out/...                       index of /a/b
//! ```
//!
//! Each file holds the deduplicated set of far-side paths for one relation
//! name, as a JSON array in insertion order. Names cannot start with a dot,
//! so `.out` and `.in` never collide with a child segment.
//!
//! ## Consistency
//!
//! `add` and `remove` are two independent read-modify-write cycles: first
//! the outbound file at `from`, then the inbound file at `to`. Each single
//! file write is atomic; the pair is not. A crash or a racing writer
//! between the two leaves an edge visible from one endpoint only, and
//! nothing rolls the first write back. [`RelationConsistency::Locked`]
//! serializes in-process writers on the endpoints' locks; it does not make
//! the pair crash-atomic.

use crate::files;
use crate::locks::{PathGuards, PathLockTable};
use arbor_core::{Error, Name, Path, Relation, RelationIndex, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path as FsPath, PathBuf};
use tracing::debug;

/// Directory holding outbound sets
pub const OUTBOUND_DIR: &str = ".out";
/// Directory holding inbound sets
pub const INBOUND_DIR: &str = ".in";

/// How relation updates coordinate between writers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationConsistency {
    /// Two independent file updates, no coordination
    #[default]
    Eventual,
    /// Endpoint locks held across both file updates
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Outbound,
    Inbound,
}

impl Side {
    fn dir_name(self) -> &'static str {
        match self {
            Side::Outbound => OUTBOUND_DIR,
            Side::Inbound => INBOUND_DIR,
        }
    }
}

/// Relation index stored as per-object adjacency files
#[derive(Debug)]
pub struct FileRelationIndex {
    root: PathBuf,
    consistency: RelationConsistency,
    locks: PathLockTable,
}

impl FileRelationIndex {
    /// Index rooted at `root` (created lazily on first write)
    pub fn new(root: impl Into<PathBuf>, consistency: RelationConsistency) -> Self {
        FileRelationIndex {
            root: root.into(),
            consistency,
            locks: PathLockTable::new(),
        }
    }

    /// Relations root directory
    pub fn root(&self) -> &FsPath {
        &self.root
    }

    /// Configured consistency mode
    pub fn consistency(&self) -> RelationConsistency {
        self.consistency
    }

    /// Directory holding one side of `path`'s index
    fn side_dir(&self, path: &Path, side: Side) -> PathBuf {
        let mut dir = self.root.clone();
        for segment in path.segments() {
            dir.push(segment.as_str());
        }
        dir.push(side.dir_name());
        dir
    }

    /// Location of the outbound set file for (`path`, `name`)
    pub fn outbound_file(&self, path: &Path, name: &Name) -> PathBuf {
        self.side_dir(path, Side::Outbound).join(name.as_str())
    }

    /// Location of the inbound set file for (`path`, `name`)
    pub fn inbound_file(&self, path: &Path, name: &Name) -> PathBuf {
        self.side_dir(path, Side::Inbound).join(name.as_str())
    }

    fn set_file(&self, path: &Path, side: Side, name: &Name) -> PathBuf {
        self.side_dir(path, side).join(name.as_str())
    }

    fn guard(&self, paths: &[&Path]) -> Option<PathGuards> {
        match self.consistency {
            RelationConsistency::Eventual => None,
            RelationConsistency::Locked => Some(self.locks.lock_all(paths)),
        }
    }

    fn read_set(&self, file: &FsPath) -> Result<Vec<Path>> {
        match files::read_optional(file)? {
            None => Ok(Vec::new()),
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                Error::unavailable(format!("corrupt relation index {}: {}", file.display(), e))
            }),
        }
    }

    fn write_set(&self, file: &FsPath, set: &[Path]) -> Result<()> {
        if !set.is_empty() {
            let bytes = serde_json::to_vec(set)?;
            return files::write_atomic(file, &bytes);
        }
        files::remove_file_optional(file)?;
        if let Some(dir) = file.parent() {
            files::prune_empty_dirs(dir, &self.root);
        }
        Ok(())
    }

    /// Add `far` to one set file; true if it was not there yet
    fn insert(&self, path: &Path, side: Side, name: &Name, far: &Path) -> Result<bool> {
        let file = self.set_file(path, side, name);
        let mut set = self.read_set(&file)?;
        if set.contains(far) {
            return Ok(false);
        }
        set.push(far.clone());
        self.write_set(&file, &set)?;
        Ok(true)
    }

    /// Remove `far` from one set file; true if it was there
    fn delete(&self, path: &Path, side: Side, name: &Name, far: &Path) -> Result<bool> {
        let file = self.set_file(path, side, name);
        let mut set = self.read_set(&file)?;
        let before = set.len();
        set.retain(|p| p != far);
        if set.len() == before {
            return Ok(false);
        }
        self.write_set(&file, &set)?;
        Ok(true)
    }

    fn list(&self, path: &Path, side: Side, name: Option<&Name>) -> Result<Vec<Relation>> {
        let names = match name {
            Some(name) => vec![name.clone()],
            None => self.relation_names(path, side)?,
        };

        let mut relations = Vec::new();
        for name in names {
            for far in self.read_set(&self.set_file(path, side, &name))? {
                relations.push(match side {
                    Side::Outbound => Relation::new(path.clone(), name.clone(), far),
                    Side::Inbound => Relation::new(far, name.clone(), path.clone()),
                });
            }
        }
        Ok(relations)
    }

    /// Relation names with a set file on one side of `path`, sorted
    fn relation_names(&self, path: &Path, side: Side) -> Result<Vec<Name>> {
        let dir = self.side_dir(path, side);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(dir.display(), e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(dir.display(), e))?;
            let file_name = entry.file_name();
            // Temp files and anything foreign are not relation names
            if let Some(name) = file_name.to_str().and_then(|s| Name::new(s).ok()) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

impl RelationIndex for FileRelationIndex {
    fn add(&self, relation: &Relation) -> Result<()> {
        let _guard = self.guard(&[&relation.from, &relation.to]);
        let out = self.insert(&relation.from, Side::Outbound, &relation.name, &relation.to)?;
        let inb = self.insert(&relation.to, Side::Inbound, &relation.name, &relation.from)?;
        debug!(
            target: "arbor::relations",
            relation = %relation,
            outbound_added = out,
            inbound_added = inb,
            "relate"
        );
        Ok(())
    }

    fn remove(&self, relation: &Relation) -> Result<bool> {
        let _guard = self.guard(&[&relation.from, &relation.to]);
        let out = self.delete(&relation.from, Side::Outbound, &relation.name, &relation.to)?;
        let inb = self.delete(&relation.to, Side::Inbound, &relation.name, &relation.from)?;
        debug!(
            target: "arbor::relations",
            relation = %relation,
            outbound_removed = out,
            inbound_removed = inb,
            "unrelate"
        );
        Ok(out || inb)
    }

    fn list_outbound(&self, from: &Path, name: Option<&Name>) -> Result<Vec<Relation>> {
        self.list(from, Side::Outbound, name)
    }

    fn list_inbound(&self, to: &Path, name: Option<&Name>) -> Result<Vec<Relation>> {
        self.list(to, Side::Inbound, name)
    }

    fn clear(&self, path: &Path) -> Result<()> {
        let _guard = self.guard(&[path]);
        for side in [Side::Outbound, Side::Inbound] {
            let dir = self.side_dir(path, side);
            files::remove_dir_all_optional(&dir)?;
            if let Some(parent) = dir.parent() {
                files::prune_empty_dirs(parent, &self.root);
            }
        }
        debug!(target: "arbor::relations", path = %path, "cleared relation index");
        Ok(())
    }
}
