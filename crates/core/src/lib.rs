//! Core types and traits for ArborDB
//!
//! This crate defines the foundational types used throughout the system:
//! - Name, Path: hierarchical addressing
//! - Record, Acl, Object, Entry: what lives at a path
//! - Relation: directed, named edges between paths
//! - Error: the ItemNotFound / RequestInvalid / ServiceUnavailable taxonomy
//! - Limits: backend-declared size maxima
//! - RequestContext: scoped per-operation handle
//! - Traits: the `Model` storage contract and the `RelationIndex` interface

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod error;
pub mod limits;
pub mod name;
pub mod path;
pub mod record;
pub mod relation;
pub mod traits;

pub use context::{CacheControl, Identity, RequestContext, RequestContextBuilder};
pub use error::{Error, Result};
pub use limits::{LimitError, Limits};
pub use name::{Name, NameError, MAX_NAME_LENGTH};
pub use path::Path;
pub use record::{Acl, Entry, Object, Record};
pub use relation::Relation;
pub use traits::{Listing, Model, RelationIndex, Updater};
