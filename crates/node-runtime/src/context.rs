//! Host-provided context handed to every `calculate` call.
//!
//! `ExecutionContext` lets a host inject runtime objects (log sinks,
//! service clients, counters) into a run without the engine knowing their
//! shape. Nodes look entries up by key and type.
//!
//! # Example
//!
//! ```ignore
//! use node_runtime::{ExecutionContext, ForwardEngine};
//! use std::sync::Arc;
//!
//! let mut ctx = ExecutionContext::new();
//! ctx.set("clock", Arc::new(MyClock::default()));
//!
//! let mut engine = ForwardEngine::new(&tree)?.with_context(ctx);
//!
//! // In a calculate function:
//! if let Some(clock) = eval.context().get::<Arc<MyClock>>("clock") {
//!     clock.tick();
//! }
//! ```

use std::any::Any;
use std::collections::HashMap;

/// Typed map of values shared with node calculate functions.
///
/// Values are stored as `Box<dyn Any>`, so anything `Send + Sync` can be
/// injected, including values that cannot be serialized.
#[derive(Default)]
pub struct ExecutionContext {
    inner: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a typed value under the given key, replacing any previous one.
    pub fn set<T: Send + Sync + 'static>(&mut self, key: &str, value: T) {
        self.inner.insert(key.to_string(), Box::new(value));
    }

    /// Builder form of [`set`](Self::set).
    pub fn with<T: Send + Sync + 'static>(mut self, key: &str, value: T) -> Self {
        self.set(key, value);
        self
    }

    /// Get a typed value by key.
    ///
    /// Returns `None` if the key is missing or holds another type.
    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<&T> {
        self.inner.get(key).and_then(|v| v.downcast_ref())
    }

    pub fn get_mut<T: Send + Sync + 'static>(&mut self, key: &str) -> Option<&mut T> {
        self.inner.get_mut(key).and_then(|v| v.downcast_mut())
    }

    pub fn has(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.inner.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("keys", &self.inner.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Well-known context keys.
pub mod context_keys {
    /// Key for the print log collected by output nodes.
    pub const PRINT_LOG: &str = "print_log";
}
