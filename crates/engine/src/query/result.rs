//! Query results

use arbor_core::{Object, Path};

/// One page of query results
///
/// A single-pass iterator. `is_supported` tells an empty result apart from
/// a backend that cannot enumerate its namespace at all.
#[derive(Debug)]
pub struct QueryResult<T> {
    items: std::vec::IntoIter<T>,
    matched: usize,
    supported: bool,
}

/// Objects returned by [`QueryBuilder::execute`](super::QueryBuilder::execute)
pub type ObjectList = QueryResult<Object>;

/// Paths returned by [`QueryBuilder::execute_paths`](super::QueryBuilder::execute_paths)
pub type PathList = QueryResult<Path>;

impl<T> QueryResult<T> {
    pub(crate) fn new(page: Vec<T>, matched: usize) -> Self {
        QueryResult {
            items: page.into_iter(),
            matched,
            supported: true,
        }
    }

    pub(crate) fn unsupported() -> Self {
        QueryResult {
            items: Vec::new().into_iter(),
            matched: 0,
            supported: false,
        }
    }

    /// False when the backend cannot list records
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Records that passed every filter, before paging
    pub fn matched(&self) -> usize {
        self.matched
    }

    /// Remaining items of this page
    pub fn into_vec(self) -> Vec<T> {
        self.items.collect()
    }
}

impl<T> Iterator for QueryResult<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.items.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl<T> ExactSizeIterator for QueryResult<T> {}
