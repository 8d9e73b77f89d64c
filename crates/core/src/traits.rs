//! Core traits for storage backends
//!
//! [`Model`] is the per-tenant storage contract every backend implements.
//! [`RelationIndex`] is the narrow adjacency interface a model delegates
//! relation bookkeeping to, so a transactional backend can swap in a truly
//! atomic index without touching the `Model` contract.
//!
//! Both traits are object safe; the engine hands out `Arc<dyn Model>`.

use crate::context::RequestContext;
use crate::error::Result;
use crate::limits::Limits;
use crate::name::Name;
use crate::path::Path;
use crate::record::{Entry, Record};
use crate::relation::Relation;

/// Read-modify-write transform passed to [`Model::update`]
pub type Updater<'a> = dyn FnMut(Record) -> Result<Record> + 'a;

/// Outcome of enumerating records under a prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// The backend cannot enumerate its namespace
    Unsupported,
    /// Leaf record paths under the prefix, in namespace order
    Paths(Vec<Path>),
}

/// Per-tenant storage contract
///
/// Every method takes the request context of the calling operation. Errors
/// follow the crate taxonomy: `ItemNotFound`, `RequestInvalid`,
/// `ServiceUnavailable`.
pub trait Model: Send + Sync {
    /// Size limits this backend enforces before writes
    fn limits(&self) -> Limits;

    /// Maximum canonical path length, in bytes
    fn max_path_length(&self) -> usize {
        self.limits().max_path_length
    }

    /// Maximum relation name length, in bytes
    fn max_relation_name_length(&self) -> usize {
        self.limits().max_relation_name_length
    }

    /// Maximum serialized record size, in bytes
    fn max_serialized_record_length(&self) -> usize {
        self.limits().max_serialized_record_length
    }

    /// True if `path` holds a record or is a container
    ///
    /// The root always exists. A path below an existing record is a
    /// conflict and fails with `RequestInvalid`.
    fn exists(&self, ctx: &RequestContext, path: &Path) -> Result<bool>;

    /// Load the record at `path`, or the child names if it is a container
    fn load(&self, ctx: &RequestContext, path: &Path) -> Result<Entry>;

    /// Create or overwrite the record at `path`
    ///
    /// Fails with `RequestInvalid` if `path` is the root, a container with
    /// children, or lies below an existing record.
    fn store(&self, ctx: &RequestContext, path: &Path, record: &Record) -> Result<()>;

    /// Read-modify-write
    ///
    /// The updater receives the current record, or `Record::default()` when
    /// the path is absent. Not atomic against concurrent writers: the last
    /// writer wins.
    fn update(&self, ctx: &RequestContext, path: &Path, updater: &mut Updater<'_>) -> Result<Record> {
        let current = match self.load(ctx, path) {
            Ok(Entry::Object(record)) => record,
            Ok(Entry::Container(_)) => {
                return Err(crate::Error::conflict(path, "cannot update a container"))
            }
            Err(e) if e.is_not_found() => Record::default(),
            Err(e) => return Err(e),
        };
        let next = updater(current)?;
        self.store(ctx, path, &next)?;
        Ok(next)
    }

    /// Delete the record at `path` and every relation index entry rooted there
    ///
    /// Returns true iff a record was deleted.
    fn remove(&self, ctx: &RequestContext, path: &Path) -> Result<bool>;

    /// Add an edge to both the outbound and inbound index (idempotent)
    fn relate(&self, ctx: &RequestContext, relation: &Relation) -> Result<()>;

    /// Add a batch of edges, stopping at the first failure (no rollback)
    fn relate_all(&self, ctx: &RequestContext, relations: &[Relation]) -> Result<()> {
        for relation in relations {
            self.relate(ctx, relation)?;
        }
        Ok(())
    }

    /// Remove an edge; true iff either index contained it
    fn unrelate(&self, ctx: &RequestContext, relation: &Relation) -> Result<bool>;

    /// Outbound relations from `path`, across all names
    fn outbound_relations(&self, ctx: &RequestContext, path: &Path) -> Result<Vec<Relation>>;

    /// Inbound relations to `path`, across all names
    fn inbound_relations(&self, ctx: &RequestContext, path: &Path) -> Result<Vec<Relation>>;

    /// Outbound relations from `path` under a single name
    fn outbound_relations_named(
        &self,
        ctx: &RequestContext,
        path: &Path,
        name: &Name,
    ) -> Result<Vec<Relation>>;

    /// Inbound relations to `path` under a single name
    fn inbound_relations_named(
        &self,
        ctx: &RequestContext,
        path: &Path,
        name: &Name,
    ) -> Result<Vec<Relation>>;

    /// Outbound followed by inbound relations; a self-loop is reported once
    fn relations(&self, ctx: &RequestContext, path: &Path) -> Result<Vec<Relation>> {
        let mut all = self.outbound_relations(ctx, path)?;
        for relation in self.inbound_relations(ctx, path)? {
            if !all.contains(&relation) {
                all.push(relation);
            }
        }
        Ok(all)
    }

    /// Leaf record paths under `prefix`
    ///
    /// Backends that cannot enumerate their namespace keep the default.
    fn list_records(&self, _ctx: &RequestContext, _prefix: &Path) -> Result<Listing> {
        Ok(Listing::Unsupported)
    }
}

/// Durable adjacency structure behind a [`Model`]
///
/// `add` and `remove` touch the outbound entry at `from` and the inbound
/// entry at `to`. Implementations document whether those two writes are
/// atomic.
pub trait RelationIndex: Send + Sync {
    /// Insert the edge into both indices (set semantics)
    fn add(&self, relation: &Relation) -> Result<()>;

    /// Remove the edge from both indices; true if either contained it
    fn remove(&self, relation: &Relation) -> Result<bool>;

    /// Edges leaving `from`, optionally restricted to one name
    fn list_outbound(&self, from: &Path, name: Option<&Name>) -> Result<Vec<Relation>>;

    /// Edges arriving at `to`, optionally restricted to one name
    fn list_inbound(&self, to: &Path, name: Option<&Name>) -> Result<Vec<Relation>>;

    /// Drop every index entry rooted at `path`
    ///
    /// Far-side entries (the inbound entry at the target of an outbound
    /// edge, and vice versa) are left in place.
    fn clear(&self, path: &Path) -> Result<()>;
}
