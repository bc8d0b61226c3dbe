use std::sync::Arc;

use txexec_primitives::BlockNumber;

use crate::backend::StateBackend;
use crate::layer::StateStorageLayer;

/// An ordered run of overlay layers, oldest-uncommitted first.
///
/// `nextBlockHeader` pushes a new layer on the back; `commit` advances
/// `uncommitted_cursor`; `rollback` drops layers from the back. The layer
/// at `uncommitted_cursor` is the next one eligible for a durable commit —
/// the backend has already durably received every layer before it.
pub struct LayerStack {
    backend: Arc<dyn StateBackend>,
    layers: Vec<Arc<StateStorageLayer>>,
    uncommitted_cursor: usize,
}

impl LayerStack {
    pub fn new(backend: Arc<dyn StateBackend>) -> Self {
        Self {
            backend,
            layers: Vec::new(),
            uncommitted_cursor: 0,
        }
    }

    /// The current head: the layer new executives should read/write
    /// through. Panics if `next_block_header` was never called — the
    /// façade is responsible for seeding at least one layer before routing
    /// any transaction.
    pub fn head(&self) -> Arc<StateStorageLayer> {
        self.layers
            .last()
            .cloned()
            .expect("LayerStack::head called before next_block_header")
    }

    pub fn next_block_header(&mut self, block_number: BlockNumber) {
        let parent = self.layers.last().cloned();
        let layer = match parent {
            Some(parent) => StateStorageLayer::push(parent, block_number),
            None => StateStorageLayer::genesis(block_number, self.backend.clone()),
        };
        self.layers.push(layer);
    }

    /// The layer currently eligible for `prepare`/`commit`, if any block is
    /// outstanding.
    pub fn uncommitted_head(&self) -> Option<Arc<StateStorageLayer>> {
        self.layers.get(self.uncommitted_cursor).cloned()
    }

    /// Marks the layer for `block_number` as durably committed and advances
    /// the cursor past it. `block_number` must match the cursor's current
    /// layer; anything else is a 2PC protocol violation from the caller.
    pub fn commit(&mut self, block_number: BlockNumber) -> bool {
        match self.uncommitted_head() {
            Some(layer) if layer.block_number() == block_number => {
                self.uncommitted_cursor += 1;
                true
            }
            _ => false,
        }
    }

    /// Drops every layer from the back down to and including `block_number`,
    /// leaving the stack as if that block had never been pushed.
    pub fn rollback(&mut self, block_number: BlockNumber) -> bool {
        let Some(index) = self
            .layers
            .iter()
            .position(|layer| layer.block_number() == block_number)
        else {
            return false;
        };
        self.layers.truncate(index);
        self.uncommitted_cursor = self.uncommitted_cursor.min(self.layers.len());
        true
    }

    /// Discards every layer and returns the stack to its freshly constructed
    /// state, as `Executor::reset` requires.
    pub fn reset(&mut self) {
        self.layers.clear();
        self.uncommitted_cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;

    fn stack() -> LayerStack {
        LayerStack::new(Arc::new(InMemoryBackend::new()))
    }

    #[test]
    fn head_chains_successive_block_headers() {
        let mut stack = stack();
        stack.next_block_header(1);
        stack.next_block_header(2);
        assert_eq!(stack.head().block_number(), 2);
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn commit_advances_cursor_only_on_matching_block_number() {
        let mut stack = stack();
        stack.next_block_header(1);
        assert!(!stack.commit(2));
        assert!(stack.commit(1));
        assert!(stack.uncommitted_head().is_none());
    }

    #[test]
    fn rollback_drops_the_named_layer_and_everything_after_it() {
        let mut stack = stack();
        stack.next_block_header(1);
        stack.next_block_header(2);
        stack.next_block_header(3);
        assert!(stack.rollback(2));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.head().block_number(), 1);
    }

    #[test]
    fn reset_clears_everything() {
        let mut stack = stack();
        stack.next_block_header(1);
        stack.commit(1);
        stack.reset();
        assert!(stack.is_empty());
        assert!(stack.uncommitted_head().is_none());
    }
}
