//! Engine layer for ArborDB
//!
//! This crate ties the storage backends into a multi-tenant store:
//! - AccountDirectory: accounts, per-account models, one instance per data dir
//! - BackendRegistry: backend tag -> constructor (`file`, `memory`, custom)
//! - StoreConfig: `arbor.toml` in the data directory
//! - Query executor: prefix scan, filters, ordering, paging (`ModelExt::start_query`)
//! - Logging: optional `tracing-subscriber` setup

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod config;
pub mod directory;
pub mod extensions;
pub mod ids;
pub mod logging;
pub mod query;

pub use backend::{BackendFactory, BackendRegistry, BackendSpec, FILE_BACKEND, MEMORY_BACKEND};
pub use config::{StoreConfig, CONFIG_FILE_NAME};
pub use directory::{Account, AccountDirectory, ModelInfo};
pub use extensions::ModelExt;
pub use ids::{AccountId, ModelId};
pub use query::{
    Direction, Filter, ObjectList, PathList, QueryBuilder, QueryResult, SortOrder,
};
