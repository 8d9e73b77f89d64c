//! ArborDB - embedded, multi-tenant object and relation store
//!
//! Records live at hierarchical paths (`/users/ann`), directed named
//! relations connect paths, and queries walk, filter, sort and page the
//! namespace. Each account owns any number of independently stored models.
//!
//! # Quick Start
//!
//! ```ignore
//! use arbordb::{AccountDirectory, AccountId, Acl, ModelExt, ModelId, Path, Record, RequestContext};
//!
//! let directory = AccountDirectory::open("./data")?;
//! let account = AccountId::new("acme")?;
//! directory.create_account(&account, Acl::open())?;
//! let model = directory.init_model(&account, &ModelId::new("crm")?)?;
//!
//! let ctx = RequestContext::builder().build();
//! model.store(&ctx, &Path::parse("/users/ann")?, &Record::new(json!({"age": 31})))?;
//! let adults = model.start_query().prefix(Path::parse("/users")?).execute(&ctx)?;
//! ctx.close();
//! ```
//!
//! # Architecture
//!
//! - `arbor-core`: addressing, record model, errors, limits, request context, `Model` trait
//! - `arbor-storage`: file-backed and in-memory backends, relation indices
//! - `arbor-engine`: account directory, backend registry, config, queries

pub use arbor_core::*;
pub use arbor_engine::*;
pub use arbor_storage::{
    FileModel, FileModelOptions, FileRelationIndex, MemoryModel, MemoryRelationIndex,
    RecordFormat, RelationConsistency, OBJECTS_DIR, RELATIONS_DIR,
};
