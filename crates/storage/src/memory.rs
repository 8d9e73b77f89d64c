//! In-memory model
//!
//! Same observable semantics as the file-backed model (containers are
//! implied by records below them, far-side relation entries survive a
//! remove) without touching disk. Used for tests and ephemeral tenants.
//!
//! Record sizes are still checked against the encoded form, so a record
//! accepted here is also accepted by the file backend under equal limits.

use crate::codec;
use arbor_core::{
    Entry, Error, Limits, Listing, Model, Name, Path, Record, RequestContext, Relation,
    RelationIndex, Result,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use tracing::debug;

/// `name -> targets` in insertion order
type Adjacency = BTreeMap<Name, Vec<Path>>;

#[derive(Debug, Default)]
struct Edges {
    outbound: BTreeMap<Path, Adjacency>,
    inbound: BTreeMap<Path, Adjacency>,
}

/// Relation index kept in process memory
///
/// Both sides are updated under one write lock, so `add` and `remove` are
/// atomic here.
#[derive(Debug, Default)]
pub struct MemoryRelationIndex {
    edges: RwLock<Edges>,
}

impl MemoryRelationIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }
}

fn insert(side: &mut BTreeMap<Path, Adjacency>, at: &Path, name: &Name, other: &Path) {
    let targets = side
        .entry(at.clone())
        .or_default()
        .entry(name.clone())
        .or_default();
    if !targets.contains(other) {
        targets.push(other.clone());
    }
}

fn delete(side: &mut BTreeMap<Path, Adjacency>, at: &Path, name: &Name, other: &Path) -> bool {
    let Some(names) = side.get_mut(at) else {
        return false;
    };
    let Some(targets) = names.get_mut(name) else {
        return false;
    };
    let before = targets.len();
    targets.retain(|p| p != other);
    let removed = targets.len() != before;
    if targets.is_empty() {
        names.remove(name);
    }
    if names.is_empty() {
        side.remove(at);
    }
    removed
}

fn collect(
    side: &BTreeMap<Path, Adjacency>,
    at: &Path,
    name: Option<&Name>,
    make: impl Fn(&Name, &Path) -> Relation,
) -> Vec<Relation> {
    let Some(names) = side.get(at) else {
        return Vec::new();
    };
    names
        .iter()
        .filter(|(n, _)| name.map_or(true, |wanted| *n == wanted))
        .flat_map(|(n, targets)| targets.iter().map(move |t| (n, t)))
        .map(|(n, t)| make(n, t))
        .collect()
}

impl RelationIndex for MemoryRelationIndex {
    fn add(&self, relation: &Relation) -> Result<()> {
        let mut edges = self.edges.write();
        insert(&mut edges.outbound, &relation.from, &relation.name, &relation.to);
        insert(&mut edges.inbound, &relation.to, &relation.name, &relation.from);
        Ok(())
    }

    fn remove(&self, relation: &Relation) -> Result<bool> {
        let mut edges = self.edges.write();
        let out = delete(&mut edges.outbound, &relation.from, &relation.name, &relation.to);
        let inb = delete(&mut edges.inbound, &relation.to, &relation.name, &relation.from);
        Ok(out || inb)
    }

    fn list_outbound(&self, from: &Path, name: Option<&Name>) -> Result<Vec<Relation>> {
        let edges = self.edges.read();
        Ok(collect(&edges.outbound, from, name, |n, to| {
            Relation::new(from.clone(), n.clone(), to.clone())
        }))
    }

    fn list_inbound(&self, to: &Path, name: Option<&Name>) -> Result<Vec<Relation>> {
        let edges = self.edges.read();
        Ok(collect(&edges.inbound, to, name, |n, from| {
            Relation::new(from.clone(), n.clone(), to.clone())
        }))
    }

    fn clear(&self, path: &Path) -> Result<()> {
        let mut edges = self.edges.write();
        edges.outbound.remove(path);
        edges.inbound.remove(path);
        Ok(())
    }
}

/// Model held entirely in process memory
pub struct MemoryModel {
    records: RwLock<BTreeMap<Path, Record>>,
    relations: Arc<dyn RelationIndex>,
    limits: Limits,
}

impl Default for MemoryModel {
    fn default() -> Self {
        Self::new(Limits::default())
    }
}

impl MemoryModel {
    /// Create an empty model with its own relation index
    pub fn new(limits: Limits) -> Self {
        Self::with_relation_index(limits, Arc::new(MemoryRelationIndex::new()))
    }

    /// Create an empty model delegating relations to `relations`
    pub fn with_relation_index(limits: Limits, relations: Arc<dyn RelationIndex>) -> Self {
        MemoryModel {
            records: RwLock::new(BTreeMap::new()),
            relations,
            limits,
        }
    }

    /// Number of records held
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// True when no record is held
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

/// Records strictly below `prefix`, in path order
fn descendants<'a>(
    records: &'a BTreeMap<Path, Record>,
    prefix: &'a Path,
) -> impl Iterator<Item = &'a Path> + 'a {
    records
        .range((Bound::Excluded(prefix), Bound::Unbounded))
        .map(|(path, _)| path)
        .take_while(move |path| path.starts_with(prefix))
}

/// Fail if any strict ancestor of `path` is a record
fn check_ancestors(records: &BTreeMap<Path, Record>, path: &Path) -> Result<()> {
    for ancestor in path.ancestors() {
        if !ancestor.is_root() && records.contains_key(&ancestor) {
            return Err(Error::conflict(
                path,
                &format!("ancestor {} is a record", ancestor),
            ));
        }
    }
    Ok(())
}

impl Model for MemoryModel {
    fn limits(&self) -> Limits {
        self.limits
    }

    fn exists(&self, _ctx: &RequestContext, path: &Path) -> Result<bool> {
        if path.is_root() {
            return Ok(true);
        }
        let records = self.records.read();
        check_ancestors(&records, path)?;
        Ok(records.contains_key(path) || descendants(&records, path).next().is_some())
    }

    fn load(&self, _ctx: &RequestContext, path: &Path) -> Result<Entry> {
        let records = self.records.read();
        if !path.is_root() {
            check_ancestors(&records, path)?;
            if let Some(record) = records.get(path) {
                return Ok(Entry::Object(record.clone()));
            }
        }

        let depth = path.depth();
        let mut children: Vec<Name> = descendants(&records, path)
            .filter_map(|p| p.segments().get(depth).cloned())
            .collect();
        children.dedup();

        if children.is_empty() && !path.is_root() {
            return Err(Error::not_found(path));
        }
        Ok(Entry::Container(children))
    }

    fn store(&self, ctx: &RequestContext, path: &Path, record: &Record) -> Result<()> {
        if path.is_root() {
            return Err(Error::conflict(path, "the root is always a container"));
        }
        self.limits.validate_path(path)?;
        let encoded = codec::encode(record)?;
        self.limits.validate_record_size(encoded.len())?;

        let mut records = self.records.write();
        check_ancestors(&records, path)?;
        if descendants(&records, path).next().is_some() {
            return Err(Error::conflict(path, "path is a container with children"));
        }
        records.insert(path.clone(), record.clone());
        debug!(
            target: "arbor::storage",
            request_id = %ctx.id(),
            path = %path,
            "stored record in memory"
        );
        Ok(())
    }

    fn remove(&self, ctx: &RequestContext, path: &Path) -> Result<bool> {
        if path.is_root() {
            return Err(Error::conflict(path, "the root cannot be removed"));
        }
        let mut records = self.records.write();
        check_ancestors(&records, path)?;
        if !records.contains_key(path) {
            if descendants(&records, path).next().is_some() {
                return Err(Error::conflict(path, "path is a container"));
            }
            return Ok(false);
        }
        self.relations.clear(path)?;
        records.remove(path);
        debug!(
            target: "arbor::storage",
            request_id = %ctx.id(),
            path = %path,
            "removed record from memory"
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
        let records = self.records.read();
        if !prefix.is_root() {
            check_ancestors(&records, prefix)?;
            if records.contains_key(prefix) {
                return Ok(Listing::Paths(vec![prefix.clone()]));
            }
        }
        Ok(Listing::Paths(descendants(&records, prefix).cloned().collect()))
    }
}
