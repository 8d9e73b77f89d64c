//! Query builder and executor

use super::filter::Filter;
use super::order::{Direction, SortOrder};
use super::result::{ObjectList, PathList};
use arbor_core::{Entry, Listing, Model, Object, Path, RequestContext, Result};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, debug_span};

/// Accumulates a query against one model
///
/// Defaults: the whole namespace, no filters, namespace order, a single
/// unbounded page.
///
/// Execution is a full scan of the prefix: every record below it is
/// loaded, filtered, sorted, then paged.
pub struct QueryBuilder<'m, M: Model + ?Sized> {
    model: &'m M,
    prefix: Path,
    filters: Vec<Filter>,
    order: Option<SortOrder>,
    page_size: Option<usize>,
    page: usize,
}

impl<'m, M: Model + ?Sized> QueryBuilder<'m, M> {
    /// Start a query over the whole namespace of `model`
    pub fn new(model: &'m M) -> Self {
        QueryBuilder {
            model,
            prefix: Path::root(),
            filters: Vec::new(),
            order: None,
            page_size: None,
            page: 0,
        }
    }

    /// Restrict to records at or below `prefix`
    pub fn prefix(mut self, prefix: Path) -> Self {
        self.prefix = prefix;
        self
    }

    /// Add a filter; every filter must match
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Field equals value
    pub fn filter_eq(self, field: impl Into<String>, value: JsonValue) -> Self {
        self.filter(Filter::Equals(field.into(), value))
    }

    /// Field is absent or differs from value
    pub fn filter_ne(self, field: impl Into<String>, value: JsonValue) -> Self {
        self.filter(Filter::NotEquals(field.into(), value))
    }

    /// Field is present
    pub fn filter_exists(self, field: impl Into<String>) -> Self {
        self.filter(Filter::Exists(field.into()))
    }

    /// Record carries the type tag
    pub fn filter_type(self, tag: impl Into<String>) -> Self {
        self.filter(Filter::HasType(tag.into()))
    }

    /// Arbitrary predicate
    pub fn filter_fn(self, predicate: impl Fn(&Object) -> bool + Send + Sync + 'static) -> Self {
        self.filter(Filter::Custom(Arc::new(predicate)))
    }

    /// Sort with a comparator (stable)
    pub fn order_by(
        mut self,
        comparator: impl Fn(&Object, &Object) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.order = Some(SortOrder::Custom(Arc::new(comparator)));
        self
    }

    /// Sort by a payload field (stable)
    pub fn order_by_field(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(SortOrder::Field {
            field: field.into(),
            direction,
        });
        self
    }

    /// Items per page
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Zero-based page number
    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Run the query, returning matched objects
    ///
    /// I/O failures and records that do not decode abort the query with
    /// `ServiceUnavailable`.
    pub fn execute(self, ctx: &RequestContext) -> Result<ObjectList> {
        let span = debug_span!(
            target: "arbor::query",
            "query",
            request_id = %ctx.id(),
            prefix = %self.prefix
        );
        let _enter = span.enter();

        let paths = match self.model.list_records(ctx, &self.prefix)? {
            Listing::Paths(paths) => paths,
            Listing::Unsupported => {
                debug!(target: "arbor::query", "backend cannot list records");
                return Ok(ObjectList::unsupported());
            }
        };
        let scanned = paths.len();

        let mut matched = Vec::new();
        for path in paths {
            let record = match self.model.load(ctx, &path) {
                Ok(Entry::Object(record)) => record,
                // Removed or replaced since the listing
                Ok(Entry::Container(_)) => continue,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };
            let object = Object::new(path, record);
            if self.filters.iter().all(|f| f.matches(&object)) {
                matched.push(object);
            }
        }

        if let Some(order) = &self.order {
            matched.sort_by(|a, b| order.compare(a, b));
        }

        let total = matched.len();
        let page = self.window(matched);
        debug!(
            target: "arbor::query",
            scanned,
            matched = total,
            returned = page.len(),
            "query complete"
        );
        Ok(ObjectList::new(page, total))
    }

    /// Run the query, returning only the matched paths
    pub fn execute_paths(self, ctx: &RequestContext) -> Result<PathList> {
        let objects = self.execute(ctx)?;
        if !objects.is_supported() {
            return Ok(PathList::unsupported());
        }
        let matched = objects.matched();
        let paths = objects.map(|object| object.path).collect();
        Ok(PathList::new(paths, matched))
    }

    /// Items `[size * page, size * (page + 1))`
    fn window(&self, items: Vec<Object>) -> Vec<Object> {
        match self.page_size {
            None if self.page == 0 => items,
            None => Vec::new(),
            Some(size) => items
                .into_iter()
                .skip(size.saturating_mul(self.page))
                .take(size)
                .collect(),
        }
    }
}

impl<M: Model + ?Sized> std::fmt::Debug for QueryBuilder<'_, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("prefix", &self.prefix)
            .field("filters", &self.filters)
            .field("order", &self.order)
            .field("page_size", &self.page_size)
            .field("page", &self.page)
            .finish()
    }
}
