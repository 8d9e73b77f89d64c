//! Extension traits over the storage contract
//!
//! `Model` stays object safe; operations that need generics live here and
//! are available on every model, including `dyn Model`.
//!
//! ```rust,ignore
//! use arbor_engine::ModelExt;
//!
//! let model: Arc<dyn Model> = directory.model(&account, &id)?;
//! let users = model.start_query().prefix(users_root).execute(&ctx)?;
//! ```

use crate::query::QueryBuilder;
use arbor_core::Model;

/// Query entry point for any [`Model`]
pub trait ModelExt: Model {
    /// Start a query over the whole namespace
    fn start_query(&self) -> QueryBuilder<'_, Self> {
        QueryBuilder::new(self)
    }
}

impl<M: Model + ?Sized> ModelExt for M {}
