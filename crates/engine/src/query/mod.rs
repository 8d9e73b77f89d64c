//! Query executor
//!
//! Walks a model's namespace below a prefix, loads every record, applies
//! filters in registration order, sorts, then returns one page.
//!
//! ```rust,ignore
//! use arbor_engine::{Direction, ModelExt};
//!
//! let page = model
//!     .start_query()
//!     .prefix(Path::parse("/users")?)
//!     .filter_eq("status", json!("active"))
//!     .order_by_field("age", Direction::Descending)
//!     .page_size(20)
//!     .page(1)
//!     .execute(&ctx)?;
//! ```
//!
//! There is no secondary index: cost grows with the number of records
//! under the prefix, and every scan is logged at `debug` with its counts.

mod builder;
mod filter;
mod order;
mod result;

pub use builder::QueryBuilder;
pub use filter::{Filter, Predicate};
pub use order::{compare_fields, compare_json, Comparator, Direction, SortOrder};
pub use result::{ObjectList, PathList, QueryResult};
