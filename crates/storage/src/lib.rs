//! Storage backends for ArborDB
//!
//! This crate implements the `Model` contract twice:
//! - `FileModel`: one file per record under a directory tree, with a
//!   file-backed relation index next to it
//! - `MemoryModel`: the same semantics held in process memory
//!
//! Shared pieces:
//! - `codec`: the on-disk record format, including legacy normalization
//! - `FileRelationIndex`: outbound/inbound adjacency files per path
//! - `PathLockTable`: per-path locks for the `Locked` relation mode

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod file;
pub mod files;
pub mod locks;
pub mod memory;
pub mod relations;

pub use codec::RecordFormat;
pub use file::{FileModel, FileModelOptions, OBJECTS_DIR, RELATIONS_DIR};
pub use locks::{PathGuards, PathLockTable};
pub use memory::{MemoryModel, MemoryRelationIndex};
pub use relations::{FileRelationIndex, RelationConsistency};
