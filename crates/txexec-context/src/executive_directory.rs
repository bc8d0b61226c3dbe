use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Identifies one call frame across the scheduler's resumption protocol.
pub type FrameId = (u64, u64);

/// The arena `BlockContext` uses to resolve a suspended frame on
/// resumption, breaking the `BlockContext` ↔ `Executive` ↔ `HostContext`
/// ownership cycle the original design has: `Executive` lives in a crate
/// layered above this one, so the directory stores it type-erased and the
/// caller downcasts back — an arena-plus-index redesign expressed with
/// Rust's type-erasure idiom rather than a literal weak pointer.
#[derive(Default)]
pub struct ExecutiveDirectory {
    entries: RwLock<HashMap<FrameId, Arc<dyn Any + Send + Sync>>>,
}

impl ExecutiveDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserting a duplicate `(context_id, seq)` is an invariant violation:
    /// the scheduler never submits the same frame twice concurrently.
    ///
    /// # Panics
    /// Panics if an entry already exists for `id`.
    pub fn insert<T: Any + Send + Sync>(&self, id: FrameId, executive: Arc<T>) {
        let mut entries = self.entries.write().expect("lock poisoned");
        if entries.contains_key(&id) {
            panic!("duplicate executive directory entry for {id:?}");
        }
        entries.insert(id, executive);
    }

    pub fn get<T: Any + Send + Sync>(&self, id: FrameId) -> Option<Arc<T>> {
        let entries = self.entries.read().expect("lock poisoned");
        entries.get(&id).cloned().and_then(|entry| entry.downcast::<T>().ok())
    }

    pub fn remove(&self, id: FrameId) {
        self.entries.write().expect("lock poisoned").remove(&id);
    }

    pub fn contains(&self, id: FrameId) -> bool {
        self.entries.read().expect("lock poisoned").contains_key(&id)
    }

    /// Drops every in-flight frame; used by `Executor::reset`.
    pub fn clear(&self) {
        self.entries.write().expect("lock poisoned").clear();
    }
}
