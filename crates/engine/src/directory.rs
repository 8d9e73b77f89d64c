//! Account and model directory
//!
//! Maps tenants to their model instances. One directory exists per data
//! directory and process: opening the same path twice returns the same
//! instance, so every caller shares one model cache (and one relation lock
//! table per model).
//!
//! ## Layout
//!
//! ```text
//! <data dir>/
//!   arbor.toml
//!   accounts/
//!     <account>/
//!       account.json          {"id", "acl", "created_at"}
//!       models/
//!         <model>/
//!           model.json        {"id", "backend", "created_at"}
//!           objects/ ...      backend storage
//! ```

use crate::backend::{BackendRegistry, BackendSpec};
use crate::config::{StoreConfig, CONFIG_FILE_NAME};
use crate::ids::{AccountId, ModelId};
use arbor_core::{Acl, Error, Model, Result};
use arbor_storage::files;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path as FsPath, PathBuf};
use std::sync::{Arc, Weak};
use tracing::{info, warn};

/// Accounts root, relative to the data directory
pub const ACCOUNTS_DIR: &str = "accounts";
/// Models root, relative to an account directory
pub const MODELS_DIR: &str = "models";
/// Account descriptor file name
pub const ACCOUNT_FILE: &str = "account.json";
/// Model descriptor file name
pub const MODEL_FILE: &str = "model.json";

/// Open directories (canonical data dir -> weak reference)
///
/// Weak references let a directory be dropped once its last user is gone.
pub static OPEN_DIRECTORIES: Lazy<Mutex<HashMap<PathBuf, Weak<AccountDirectory>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// A tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Account identifier
    pub id: AccountId,
    /// Opaque access-control payload, stored and returned as-is
    pub acl: Acl,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Descriptor of an initialized model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier
    pub id: ModelId,
    /// Backend tag the model was created with
    pub backend: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

type ModelKey = (AccountId, ModelId);

/// Registry of accounts and their models under one data directory
pub struct AccountDirectory {
    data_dir: PathBuf,
    config: StoreConfig,
    backends: BackendRegistry,
    models: DashMap<ModelKey, Arc<dyn Model>>,
    // Serializes creation and removal; lookups of cached models skip it
    write_lock: Mutex<()>,
}

fn missing(what: impl fmt::Display) -> Error {
    Error::ItemNotFound {
        path: what.to_string(),
    }
}

fn read_json<T: DeserializeOwned>(path: &FsPath) -> Result<Option<T>> {
    match files::read_optional(path)? {
        None => Ok(None),
        Some(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            Error::unavailable(format!("corrupt descriptor {}: {}", path.display(), e))
        }),
    }
}

fn write_json<T: Serialize>(path: &FsPath, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    files::write_atomic(path, &bytes)
}

/// Names of subdirectories of `dir` that hold `marker` and parse as ids
fn list_ids<T>(dir: &FsPath, marker: &str) -> Result<Vec<T>>
where
    T: std::str::FromStr + Ord,
{
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io(dir.display(), e)),
    };

    let mut ids = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir.display(), e))?;
        if !entry.path().join(marker).is_file() {
            continue;
        }
        match entry.file_name().to_str().map(str::parse::<T>) {
            Some(Ok(id)) => ids.push(id),
            _ => warn!(
                target: "arbor::directory",
                entry = %entry.path().display(),
                "skipping directory that is not a valid id"
            ),
        }
    }
    ids.sort();
    Ok(ids)
}

impl AccountDirectory {
    /// Open the directory rooted at `data_dir`, creating it if needed
    ///
    /// Settings come from `arbor.toml`, written with defaults on first open.
    /// Returns the already-open instance when there is one.
    pub fn open(data_dir: impl AsRef<FsPath>) -> Result<Arc<Self>> {
        Self::open_inner(data_dir.as_ref(), None, BackendRegistry::with_builtin())
    }

    /// Open with an explicit config, persisting it to `arbor.toml`
    ///
    /// If the directory is already open in this process, the existing
    /// instance (and its config) is returned.
    pub fn open_with_config(data_dir: impl AsRef<FsPath>, config: StoreConfig) -> Result<Arc<Self>> {
        Self::open_inner(data_dir.as_ref(), Some(config), BackendRegistry::with_builtin())
    }

    /// Open with a caller-assembled backend registry
    pub fn open_with_backends(
        data_dir: impl AsRef<FsPath>,
        config: Option<StoreConfig>,
        backends: BackendRegistry,
    ) -> Result<Arc<Self>> {
        Self::open_inner(data_dir.as_ref(), config, backends)
    }

    fn open_inner(
        data_dir: &FsPath,
        config: Option<StoreConfig>,
        backends: BackendRegistry,
    ) -> Result<Arc<Self>> {
        // Create first so the path can be canonicalized
        fs::create_dir_all(data_dir).map_err(|e| Error::io(data_dir.display(), e))?;
        let canonical = data_dir
            .canonicalize()
            .map_err(|e| Error::io(data_dir.display(), e))?;

        // Held for the whole open so two threads cannot build two instances
        let mut registry = OPEN_DIRECTORIES.lock();
        if let Some(existing) = registry.get(&canonical).and_then(Weak::upgrade) {
            if config.is_some() {
                warn!(
                    target: "arbor::directory",
                    path = %canonical.display(),
                    "directory already open; explicit config ignored"
                );
            }
            info!(target: "arbor::directory", path = %canonical.display(), "returning open directory");
            return Ok(existing);
        }

        let config_path = canonical.join(CONFIG_FILE_NAME);
        let config = match config {
            Some(config) => {
                config.validate()?;
                config.write_to_file(&config_path)?;
                config
            }
            None => {
                StoreConfig::write_default_if_missing(&config_path)?;
                StoreConfig::from_file(&config_path)?
            }
        };
        if !backends.contains(&config.backend) {
            return Err(Error::invalid(format!(
                "{} names unknown backend '{}'",
                config_path.display(),
                config.backend
            )));
        }

        let accounts = canonical.join(ACCOUNTS_DIR);
        fs::create_dir_all(&accounts).map_err(|e| Error::io(accounts.display(), e))?;

        let directory = Arc::new(AccountDirectory {
            data_dir: canonical.clone(),
            config,
            backends,
            models: DashMap::new(),
            write_lock: Mutex::new(()),
        });
        registry.retain(|_, weak| weak.strong_count() > 0);
        registry.insert(canonical, Arc::downgrade(&directory));

        info!(
            target: "arbor::directory",
            path = %directory.data_dir.display(),
            backend = %directory.config.backend,
            "opened directory"
        );
        Ok(directory)
    }

    /// Canonical data directory
    pub fn data_dir(&self) -> &FsPath {
        &self.data_dir
    }

    /// Effective configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Backend registry used for new and reopened models
    pub fn backends(&self) -> &BackendRegistry {
        &self.backends
    }

    fn account_dir(&self, account: &AccountId) -> PathBuf {
        self.data_dir.join(ACCOUNTS_DIR).join(account.as_str())
    }

    fn model_dir(&self, account: &AccountId, model: &ModelId) -> PathBuf {
        self.account_dir(account).join(MODELS_DIR).join(model.as_str())
    }

    fn require_account(&self, account: &AccountId) -> Result<()> {
        if self.account_exists(account)? {
            Ok(())
        } else {
            Err(missing(format!("account {}", account)))
        }
    }

    /// True if the account has been created
    pub fn account_exists(&self, account: &AccountId) -> Result<bool> {
        let file = self.account_dir(account).join(ACCOUNT_FILE);
        Ok(files::metadata_optional(&file)?.is_some())
    }

    /// Create the account unless it exists
    ///
    /// An existing account is returned unchanged; `acl` only applies to a
    /// new one.
    pub fn create_account(&self, account: &AccountId, acl: Acl) -> Result<Account> {
        let _guard = self.write_lock.lock();
        let file = self.account_dir(account).join(ACCOUNT_FILE);
        if let Some(existing) = read_json::<Account>(&file)? {
            return Ok(existing);
        }

        let created = Account {
            id: account.clone(),
            acl,
            created_at: Utc::now(),
        };
        write_json(&file, &created)?;
        info!(target: "arbor::directory", account = %account, "created account");
        Ok(created)
    }

    /// Fetch an account descriptor
    pub fn account(&self, account: &AccountId) -> Result<Account> {
        let file = self.account_dir(account).join(ACCOUNT_FILE);
        read_json(&file)?.ok_or_else(|| missing(format!("account {}", account)))
    }

    /// All accounts, sorted
    pub fn list_accounts(&self) -> Result<Vec<AccountId>> {
        list_ids(&self.data_dir.join(ACCOUNTS_DIR), ACCOUNT_FILE)
    }

    /// Models initialized in `account`, sorted
    pub fn list_models(&self, account: &AccountId) -> Result<Vec<ModelId>> {
        self.require_account(account)?;
        list_ids(&self.account_dir(account).join(MODELS_DIR), MODEL_FILE)
    }

    /// Descriptor of an initialized model
    pub fn model_info(&self, account: &AccountId, model: &ModelId) -> Result<ModelInfo> {
        self.require_account(account)?;
        let file = self.model_dir(account, model).join(MODEL_FILE);
        read_json(&file)?.ok_or_else(|| missing(format!("model {}/{}", account, model)))
    }

    /// Initialize a model with the configured default backend
    ///
    /// Idempotent: an existing model is returned (from the cache when it is
    /// already open) and its storage is left untouched.
    pub fn init_model(&self, account: &AccountId, model: &ModelId) -> Result<Arc<dyn Model>> {
        self.init_inner(account, model, None)
    }

    /// Initialize a model with an explicit backend
    ///
    /// Fails with `RequestInvalid` if the model already exists with a
    /// different backend.
    pub fn init_model_with_backend(
        &self,
        account: &AccountId,
        model: &ModelId,
        backend: &str,
    ) -> Result<Arc<dyn Model>> {
        self.init_inner(account, model, Some(backend))
    }

    fn init_inner(
        &self,
        account: &AccountId,
        model: &ModelId,
        backend: Option<&str>,
    ) -> Result<Arc<dyn Model>> {
        let key = (account.clone(), model.clone());
        if backend.is_none() {
            if let Some(cached) = self.models.get(&key) {
                return Ok(Arc::clone(cached.value()));
            }
        }

        let _guard = self.write_lock.lock();
        self.require_account(account)?;

        let file = self.model_dir(account, model).join(MODEL_FILE);
        let info = match read_json::<ModelInfo>(&file)? {
            Some(info) => {
                if let Some(requested) = backend {
                    if requested != info.backend {
                        return Err(Error::invalid(format!(
                            "model {}/{} exists with backend '{}', not '{}'",
                            account, model, info.backend, requested
                        )));
                    }
                }
                info
            }
            None => {
                let tag = backend.unwrap_or(self.config.backend.as_str());
                if !self.backends.contains(tag) {
                    return Err(Error::invalid(format!("unknown backend '{}'", tag)));
                }
                let info = ModelInfo {
                    id: model.clone(),
                    backend: tag.to_string(),
                    created_at: Utc::now(),
                };
                write_json(&file, &info)?;
                info!(
                    target: "arbor::directory",
                    account = %account,
                    model = %model,
                    backend = %tag,
                    "initialized model"
                );
                info
            }
        };

        if let Some(cached) = self.models.get(&key) {
            return Ok(Arc::clone(cached.value()));
        }
        let instance = self.instantiate(account, &info)?;
        self.models.insert(key, Arc::clone(&instance));
        Ok(instance)
    }

    fn instantiate(&self, account: &AccountId, info: &ModelInfo) -> Result<Arc<dyn Model>> {
        let spec = BackendSpec {
            model_dir: self.model_dir(account, &info.id),
            limits: self.config.limits,
            consistency: self.config.relation_consistency,
        };
        self.backends.create(&info.backend, &spec)
    }

    /// Fetch an initialized model
    ///
    /// `ItemNotFound` if the account or the model does not exist.
    pub fn model(&self, account: &AccountId, model: &ModelId) -> Result<Arc<dyn Model>> {
        let key = (account.clone(), model.clone());
        if let Some(cached) = self.models.get(&key) {
            return Ok(Arc::clone(cached.value()));
        }

        let info = self.model_info(account, model)?;
        let _guard = self.write_lock.lock();
        if let Some(cached) = self.models.get(&key) {
            return Ok(Arc::clone(cached.value()));
        }
        let instance = self.instantiate(account, &info)?;
        self.models.insert(key, Arc::clone(&instance));
        Ok(instance)
    }

    /// Drop a model and delete its storage
    ///
    /// Returns false if the model did not exist. Handles obtained earlier
    /// keep working against whatever state they hold.
    pub fn remove_model(&self, account: &AccountId, model: &ModelId) -> Result<bool> {
        let _guard = self.write_lock.lock();
        self.require_account(account)?;

        self.models.remove(&(account.clone(), model.clone()));
        let dir = self.model_dir(account, model);
        if files::metadata_optional(&dir)?.is_none() {
            return Ok(false);
        }
        files::remove_dir_all_optional(&dir)?;
        info!(target: "arbor::directory", account = %account, model = %model, "removed model");
        Ok(true)
    }
}

impl fmt::Debug for AccountDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountDirectory")
            .field("data_dir", &self.data_dir)
            .field("config", &self.config)
            .field("open_models", &self.models.len())
            .finish()
    }
}

impl Drop for AccountDirectory {
    fn drop(&mut self) {
        let mut registry = OPEN_DIRECTORIES.lock();
        // A newer instance may already occupy the slot
        if let Some(weak) = registry.get(&self.data_dir) {
            if weak.strong_count() == 0 {
                registry.remove(&self.data_dir);
            }
        }
    }
}
