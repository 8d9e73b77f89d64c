//! Shared test utilities for the workspace integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

pub use arbordb::{
    AccountDirectory, AccountId, Acl, Direction, Entry, Error, Limits, Listing, Model, ModelExt,
    ModelId, Name, Path, Record, Relation, RelationConsistency, RequestContext, StoreConfig,
    OBJECTS_DIR, RELATIONS_DIR,
};
pub use serde_json::json;
use tempfile::TempDir;

pub const ACCOUNT: &str = "acme";
pub const MODEL: &str = "main";

/// Parse a path, panicking on invalid input
pub fn p(s: &str) -> Path {
    Path::parse(s).expect("valid test path")
}

/// Build a relation, panicking on invalid input
pub fn rel(from: &str, name: &str, to: &str) -> Relation {
    Relation::parse(from, name, to).expect("valid test relation")
}

/// Fresh anonymous context
pub fn ctx() -> RequestContext {
    RequestContext::anonymous()
}

// ============================================================================
// TestStore - directory + one initialized model in a temp dir
// ============================================================================

/// Temp data directory with one account and one initialized model.
pub struct TestStore {
    pub directory: Arc<AccountDirectory>,
    pub model: Arc<dyn Model>,
    pub dir: TempDir,
}

impl TestStore {
    /// File-backed store with default config.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// File-backed store with endpoint locking for relation updates.
    pub fn locked() -> Self {
        Self::with_config(StoreConfig {
            relation_consistency: RelationConsistency::Locked,
            ..StoreConfig::default()
        })
    }

    /// In-memory store.
    pub fn memory() -> Self {
        Self::with_config(StoreConfig {
            backend: "memory".to_string(),
            ..StoreConfig::default()
        })
    }

    /// Store with an explicit config.
    pub fn with_config(config: StoreConfig) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let directory = AccountDirectory::open_with_config(dir.path(), config)
            .expect("Failed to open directory");
        let model = Self::init(&directory);
        TestStore {
            directory,
            model,
            dir,
        }
    }

    fn init(directory: &AccountDirectory) -> Arc<dyn Model> {
        let account = AccountId::new(ACCOUNT).unwrap();
        directory
            .create_account(&account, Acl::open())
            .expect("Failed to create account");
        directory
            .init_model(&account, &ModelId::new(MODEL).unwrap())
            .expect("Failed to init model")
    }

    /// Drop every handle and open the data directory again (simulates restart).
    pub fn reopen(self) -> Self {
        let TestStore {
            directory,
            model,
            dir,
        } = self;
        drop(model);
        drop(directory);

        let directory = AccountDirectory::open(dir.path()).expect("Failed to reopen directory");
        let model = Self::init(&directory);
        TestStore {
            directory,
            model,
            dir,
        }
    }

    /// Storage directory of the test model.
    pub fn model_dir(&self) -> PathBuf {
        self.directory
            .data_dir()
            .join("accounts")
            .join(ACCOUNT)
            .join("models")
            .join(MODEL)
    }

    /// Records root of the test model.
    pub fn objects_dir(&self) -> PathBuf {
        self.model_dir().join(OBJECTS_DIR)
    }

    /// Relation index root of the test model.
    pub fn relations_dir(&self) -> PathBuf {
        self.model_dir().join(RELATIONS_DIR)
    }

    /// On-disk location of a record.
    pub fn record_file(&self, path: &str) -> PathBuf {
        let mut file = self.objects_dir();
        for segment in p(path).segments() {
            file.push(segment.as_str());
        }
        file
    }

    /// Store `data` at `path` with default ACL and no types.
    pub fn put(&self, path: &str, data: serde_json::Value) {
        self.model
            .store(&ctx(), &p(path), &Record::new(data))
            .expect("store failed");
    }

    /// Load the record at `path`.
    pub fn get(&self, path: &str) -> Record {
        self.model
            .load(&ctx(), &p(path))
            .expect("load failed")
            .into_record()
            .expect("expected a record, found a container")
    }
}

/// True if `dir` is missing or holds no entries.
pub fn dir_is_empty_or_missing(dir: &FsPath) -> bool {
    match std::fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}
