//! File-backed model
//!
//! ## Layout
//!
//! ```text
//! <model dir>/
//!   objects/        records root; one file per record, one directory per container
//!     users/
//!       alice       {"data": {...}, "acl": {...}, "types": [...]}
//!   relations/      relation index (see `relations`)
//! ```
//!
//! Path segments map 1:1 onto path components under `objects/`.
//!
//! ## Object/container exclusivity
//!
//! A path is either a file (record) or a directory (container). Writes that
//! would put a record on top of a non-empty directory, or below an existing
//! record, fail with `RequestInvalid`. Directories are not tracked
//! separately: they appear when the first record beneath them is written
//! and are pruned when the last one is removed.
//!
//! ## Concurrency
//!
//! Single-file writes are atomic (temp + rename). Nothing else is: `update`
//! is last-writer-wins, and relation updates follow the index's
//! consistency mode.

use crate::codec::{self, RecordFormat};
use crate::files;
use crate::relations::{FileRelationIndex, RelationConsistency};
use arbor_core::{
    Entry, Error, Limits, Listing, Model, Name, Path, Record, RequestContext, Relation,
    RelationIndex, Result,
};
use std::fs;
use std::io;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Records root, relative to the model directory
pub const OBJECTS_DIR: &str = "objects";
/// Relations root, relative to the model directory
pub const RELATIONS_DIR: &str = "relations";

/// Options for [`FileModel::open`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileModelOptions {
    /// Limits enforced before writes
    pub limits: Limits,
    /// Relation update coordination
    pub consistency: RelationConsistency,
}

/// What a path currently is on disk
enum Resolved {
    Root,
    Absent,
    File(PathBuf),
    Dir(PathBuf),
}

/// Model persisted as a directory tree
pub struct FileModel {
    root: PathBuf,
    objects: PathBuf,
    limits: Limits,
    relations: Arc<dyn RelationIndex>,
}

impl FileModel {
    /// Open (or lazily create) a model rooted at `root`
    ///
    /// Nothing is written until the first record or relation is stored.
    pub fn open(root: impl Into<PathBuf>, options: FileModelOptions) -> Self {
        let root = root.into();
        let relations = Arc::new(FileRelationIndex::new(
            root.join(RELATIONS_DIR),
            options.consistency,
        ));
        Self::with_relation_index(root, options.limits, relations)
    }

    /// Open a model that delegates relations to a caller-supplied index
    pub fn with_relation_index(
        root: impl Into<PathBuf>,
        limits: Limits,
        relations: Arc<dyn RelationIndex>,
    ) -> Self {
        let root = root.into();
        FileModel {
            objects: root.join(OBJECTS_DIR),
            root,
            limits,
            relations,
        }
    }

    /// Model directory
    pub fn root(&self) -> &FsPath {
        &self.root
    }

    /// Records root directory
    pub fn objects_dir(&self) -> &FsPath {
        &self.objects
    }

    /// Filesystem location of `path` (whether or not it exists)
    pub fn location(&self, path: &Path) -> PathBuf {
        let mut location = self.objects.clone();
        for segment in path.segments() {
            location.push(segment.as_str());
        }
        location
    }

    /// Walk `path` from the records root, stopping at the first missing component
    ///
    /// A file found above the last segment is a conflict: nothing can live
    /// below a record.
    fn resolve(&self, path: &Path) -> Result<Resolved> {
        if path.is_root() {
            return Ok(Resolved::Root);
        }

        let mut location = self.objects.clone();
        let last = path.depth() - 1;
        for (i, segment) in path.segments().iter().enumerate() {
            location.push(segment.as_str());
            let meta = match files::metadata_optional(&location)? {
                Some(meta) => meta,
                None => return Ok(Resolved::Absent),
            };
            if i == last {
                return Ok(if meta.is_dir() {
                    Resolved::Dir(location)
                } else {
                    Resolved::File(location)
                });
            }
            if !meta.is_dir() {
                let ancestor = Path::from_names(path.segments()[..=i].iter().cloned());
                return Err(Error::conflict(
                    path,
                    &format!("ancestor {} is a record", ancestor),
                ));
            }
        }
        Ok(Resolved::Absent)
    }

    /// Direct children of a directory that are valid names, sorted
    fn children(&self, path: &Path, dir: &FsPath) -> Result<Vec<Name>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            // Pruned between resolve and read
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(Error::not_found(path)),
            Err(e) => return Err(Error::io(dir.display(), e)),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(dir.display(), e))?;
            match entry.file_name().to_str().map(Name::new) {
                Some(Ok(name)) => names.push(name),
                _ => {
                    // Temp files are expected; anything else is foreign
                    let raw = entry.file_name();
                    if !raw.to_string_lossy().starts_with(files::TEMP_PREFIX) {
                        warn!(
                            target: "arbor::storage",
                            entry = %entry.path().display(),
                            "skipping entry that is not a valid name"
                        );
                    }
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn read_record(&self, path: &Path, file: &FsPath) -> Result<Record> {
        let bytes = files::read_optional(file)?.ok_or_else(|| Error::not_found(path))?;
        let (record, format) = codec::decode(path, &bytes)?;
        if format == RecordFormat::Legacy {
            warn!(
                target: "arbor::storage",
                path = %path,
                "legacy record format normalized on read"
            );
        }
        Ok(record)
    }

    /// Map a filesystem location under the records root back to a `Path`
    fn path_for(&self, location: &FsPath) -> Option<Path> {
        let relative = location.strip_prefix(&self.objects).ok()?;
        relative
            .components()
            .map(|c| c.as_os_str().to_str().and_then(|s| Name::new(s).ok()))
            .collect::<Option<Vec<_>>>()
            .map(Path::from_names)
    }

    fn walk(&self, dir: &FsPath) -> Result<Vec<Path>> {
        let mut paths = Vec::new();
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'));

        for entry in walker {
            // Pruned by a concurrent remove after the directory was read
            if let Err(e) = &entry {
                if e.io_error().map(|io| io.kind()) == Some(io::ErrorKind::NotFound) {
                    continue;
                }
            }
            let entry = entry.map_err(|e| {
                let location = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| dir.display().to_string());
                match e.into_io_error() {
                    Some(io) => Error::io(location, io),
                    None => Error::unavailable(format!("walk failed at {}", location)),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            match self.path_for(entry.path()) {
                Some(path) => paths.push(path),
                None => warn!(
                    target: "arbor::storage",
                    entry = %entry.path().display(),
                    "skipping file that does not map to a path"
                ),
            }
        }
        Ok(paths)
    }
}

impl Model for FileModel {
    fn limits(&self) -> Limits {
        self.limits
    }

    fn exists(&self, _ctx: &RequestContext, path: &Path) -> Result<bool> {
        Ok(!matches!(self.resolve(path)?, Resolved::Absent))
    }

    fn load(&self, _ctx: &RequestContext, path: &Path) -> Result<Entry> {
        match self.resolve(path)? {
            Resolved::Root => {
                if files::metadata_optional(&self.objects)?.is_none() {
                    return Ok(Entry::Container(Vec::new()));
                }
                Ok(Entry::Container(self.children(path, &self.objects)?))
            }
            Resolved::Absent => Err(Error::not_found(path)),
            Resolved::Dir(dir) => Ok(Entry::Container(self.children(path, &dir)?)),
            Resolved::File(file) => Ok(Entry::Object(self.read_record(path, &file)?)),
        }
    }

    fn store(&self, ctx: &RequestContext, path: &Path, record: &Record) -> Result<()> {
        if path.is_root() {
            return Err(Error::conflict(path, "the root is always a container"));
        }
        self.limits.validate_path(path)?;
        let bytes = codec::encode(record)?;
        self.limits.validate_record_size(bytes.len())?;

        let target = match self.resolve(path)? {
            Resolved::Dir(dir) => {
                if !files::dir_is_empty(&dir)? {
                    return Err(Error::conflict(path, "path is a container with children"));
                }
                // Leftover empty directory: replace it
                match fs::remove_dir(&dir) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(Error::io(dir.display(), e)),
                }
                dir
            }
            Resolved::File(file) => file,
            Resolved::Absent | Resolved::Root => self.location(path),
        };

        files::write_atomic(&target, &bytes)?;
        debug!(
            target: "arbor::storage",
            request_id = %ctx.id(),
            path = %path,
            bytes = bytes.len(),
            "stored record"
        );
        Ok(())
    }

    fn remove(&self, ctx: &RequestContext, path: &Path) -> Result<bool> {
        if path.is_root() {
            return Err(Error::conflict(path, "the root cannot be removed"));
        }
        let file = match self.resolve(path)? {
            Resolved::Absent | Resolved::Root => return Ok(false),
            Resolved::Dir(_) => return Err(Error::conflict(path, "path is a container")),
            Resolved::File(file) => file,
        };

        self.relations.clear(path)?;
        if !files::remove_file_optional(&file)? {
            return Ok(false);
        }
        if let Some(parent) = file.parent() {
            files::prune_empty_dirs(parent, &self.objects);
        }
        debug!(
            target: "arbor::storage",
            request_id = %ctx.id(),
            path = %path,
            "removed record"
        );
        Ok(true)
    }

    fn relate(&self, _ctx: &RequestContext, relation: &Relation) -> Result<()> {
        self.limits.validate_relation(relation)?;
        self.relations.add(relation)
    }

    fn unrelate(&self, _ctx: &RequestContext, relation: &Relation) -> Result<bool> {
        self.relations.remove(relation)
    }

    fn outbound_relations(&self, _ctx: &RequestContext, path: &Path) -> Result<Vec<Relation>> {
        self.relations.list_outbound(path, None)
    }

    fn inbound_relations(&self, _ctx: &RequestContext, path: &Path) -> Result<Vec<Relation>> {
        self.relations.list_inbound(path, None)
    }

    fn outbound_relations_named(
        &self,
        _ctx: &RequestContext,
        path: &Path,
        name: &Name,
    ) -> Result<Vec<Relation>> {
        self.relations.list_outbound(path, Some(name))
    }

    fn inbound_relations_named(
        &self,
        _ctx: &RequestContext,
        path: &Path,
        name: &Name,
    ) -> Result<Vec<Relation>> {
        self.relations.list_inbound(path, Some(name))
    }

    fn list_records(&self, _ctx: &RequestContext, prefix: &Path) -> Result<Listing> {
        let paths = match self.resolve(prefix)? {
            Resolved::Absent => Vec::new(),
            Resolved::File(_) => vec![prefix.clone()],
            Resolved::Dir(dir) => self.walk(&dir)?,
            Resolved::Root => {
                if files::metadata_optional(&self.objects)?.is_none() {
                    Vec::new()
                } else {
                    self.walk(&self.objects)?
                }
            }
        };
        Ok(Listing::Paths(paths))
    }
}
