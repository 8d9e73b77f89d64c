//! Backend factory registry
//!
//! Maps a configuration tag (`"file"`, `"memory"`, ...) to a constructor,
//! so new backends can be plugged in without touching the directory.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let registry = BackendRegistry::with_builtin();
//! registry.register("custom", |spec| Ok(Arc::new(MyModel::open(&spec.model_dir)?)));
//!
//! let model = registry.create("file", &spec)?;
//! ```

use arbor_core::{Error, Limits, Model, Result};
use arbor_storage::{FileModel, FileModelOptions, MemoryModel, RelationConsistency};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Tag of the file-backed backend
pub const FILE_BACKEND: &str = "file";
/// Tag of the in-memory backend
pub const MEMORY_BACKEND: &str = "memory";

/// Everything a factory needs to build one model instance
#[derive(Debug, Clone)]
pub struct BackendSpec {
    /// Directory reserved for this model's storage
    pub model_dir: PathBuf,
    /// Limits the instance must enforce
    pub limits: Limits,
    /// Relation update coordination
    pub consistency: RelationConsistency,
}

/// Constructor registered under a tag
pub type BackendFactory = Arc<dyn Fn(&BackendSpec) -> Result<Arc<dyn Model>> + Send + Sync>;

/// Registry of backend constructors, keyed by tag
pub struct BackendRegistry {
    factories: RwLock<HashMap<String, BackendFactory>>,
}

impl BackendRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        BackendRegistry {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry with the `file` and `memory` backends
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register(FILE_BACKEND, |spec| {
            let options = FileModelOptions {
                limits: spec.limits,
                consistency: spec.consistency,
            };
            Ok(Arc::new(FileModel::open(&spec.model_dir, options)) as Arc<dyn Model>)
        });
        registry.register(MEMORY_BACKEND, |spec| {
            Ok(Arc::new(MemoryModel::new(spec.limits)) as Arc<dyn Model>)
        });
        registry
    }

    /// Register (or replace) the constructor for `tag`
    pub fn register<F>(&self, tag: impl Into<String>, factory: F)
    where
        F: Fn(&BackendSpec) -> Result<Arc<dyn Model>> + Send + Sync + 'static,
    {
        self.factories.write().insert(tag.into(), Arc::new(factory));
    }

    /// True if a constructor is registered under `tag`
    pub fn contains(&self, tag: &str) -> bool {
        self.factories.read().contains_key(tag)
    }

    /// Registered tags, sorted
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.factories.read().keys().cloned().collect();
        tags.sort();
        tags
    }

    /// Build a model with the constructor registered under `tag`
    ///
    /// Unknown tags fail with `RequestInvalid`.
    pub fn create(&self, tag: &str, spec: &BackendSpec) -> Result<Arc<dyn Model>> {
        // Clone out so the factory runs without holding the lock
        let factory = self
            .factories
            .read()
            .get(tag)
            .cloned()
            .ok_or_else(|| Error::invalid(format!("unknown backend '{}'", tag)))?;
        factory(spec)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}
