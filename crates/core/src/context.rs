//! Per-operation request context
//!
//! A `RequestContext` carries the acting identity and a cache directive
//! through every engine call. It is a scoped resource: anything attached to
//! it with [`RequestContext::on_release`] is released exactly once, either
//! by an explicit [`close`](RequestContext::close) or when the context is
//! dropped. Because release runs from `Drop`, it happens on every exit path,
//! including early `?` returns and unwinding panics.
//!
//! ```
//! use arbor_core::{CacheControl, Identity, RequestContext};
//!
//! let ctx = RequestContext::builder()
//!     .for_user(Identity::new("alice"))
//!     .using_cache(CacheControl::Bypass)
//!     .build();
//! assert_eq!(ctx.identity().as_str(), "alice");
//! ctx.close();
//! ```

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use uuid::Uuid;

/// Acting identity, issued by the identity subsystem and opaque to the engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    /// Wrap an identity string
    pub fn new(id: impl Into<String>) -> Self {
        Identity(id.into())
    }

    /// The identity used when no user is attached
    pub fn anonymous() -> Self {
        Identity("anonymous".to_string())
    }

    /// Borrow the identity string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for [`Identity::anonymous`]
    pub fn is_anonymous(&self) -> bool {
        self.0 == "anonymous"
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cache directive for the operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheControl {
    /// Do not consult or populate caches
    Bypass,
    /// Use caches normally
    #[default]
    Normal,
    /// Ignore cached data but repopulate caches with fresh reads
    ForceRefresh,
}

type ReleaseHook = Box<dyn FnOnce() + Send>;

/// Scoped per-operation handle
pub struct RequestContext {
    id: Uuid,
    identity: Identity,
    cache: CacheControl,
    started: Instant,
    hooks: Mutex<Vec<ReleaseHook>>,
}

impl RequestContext {
    /// Start building a context
    pub fn builder() -> RequestContextBuilder {
        RequestContextBuilder::default()
    }

    /// Anonymous context with normal caching
    pub fn anonymous() -> Self {
        RequestContextBuilder::default().build()
    }

    /// Unique id of this context
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Acting identity
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Cache directive
    pub fn cache_control(&self) -> CacheControl {
        self.cache
    }

    /// Attach a release action
    ///
    /// Actions run in reverse registration order when the context is
    /// closed or dropped.
    pub fn on_release(&self, hook: impl FnOnce() + Send + 'static) {
        self.hooks.lock().push(Box::new(hook));
    }

    /// Release the context now
    pub fn close(self) {
        // Drop does the work
    }

    fn release(&mut self) {
        let hooks = std::mem::take(self.hooks.get_mut());
        let count = hooks.len();
        for hook in hooks.into_iter().rev() {
            hook();
        }
        tracing::trace!(
            target: "arbor::context",
            request_id = %self.id,
            identity = %self.identity,
            hooks = count,
            elapsed_us = self.started.elapsed().as_micros() as u64,
            "request context released"
        );
    }
}

impl Drop for RequestContext {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("id", &self.id)
            .field("identity", &self.identity)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Builder for [`RequestContext`]
#[derive(Debug, Clone, Default)]
pub struct RequestContextBuilder {
    identity: Option<Identity>,
    cache: CacheControl,
}

impl RequestContextBuilder {
    /// Set the acting identity
    pub fn for_user(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Set the cache directive
    pub fn using_cache(mut self, cache: CacheControl) -> Self {
        self.cache = cache;
        self
    }

    /// Build the context
    pub fn build(self) -> RequestContext {
        RequestContext {
            id: Uuid::new_v4(),
            identity: self.identity.unwrap_or_else(Identity::anonymous),
            cache: self.cache,
            started: Instant::now(),
            hooks: Mutex::new(Vec::new()),
        }
    }
}
