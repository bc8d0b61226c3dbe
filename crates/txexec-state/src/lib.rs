//! Layered, rollback-capable key/value state store.
//!
//! A [`StateStorageLayer`] is a copy-on-write overlay over a parent layer
//! or, at the bottom of a [`LayerStack`], the durable [`StateBackend`].
//! Every write goes through a per-layer recorder so a call frame can be
//! unwound to an earlier [`Savepoint`] without touching deeper layers.

mod backend;
mod entry;
mod error;
mod layer;
mod recorder;
mod stack;
mod table;

pub use backend::{EmptyBackend, InMemoryBackend, StateBackend};
pub use entry::Entry;
pub use error::{TableError, TableResult};
pub use layer::StateStorageLayer;
pub use recorder::Savepoint;
pub use stack::LayerStack;
pub use table::{
    validate_field_name, validate_table_name, TableSchema, MAX_FIELD_NAME_LEN, MAX_FIELDS,
    MAX_FIELD_VALUE_LEN, MAX_KEY_VALUE_LEN, SYS_TABLES,
};

#[cfg(test)]
mod proptests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use crate::{Entry, InMemoryBackend, StateStorageLayer};

    #[derive(Debug, Clone)]
    enum Op {
        Set(String, String),
        Remove(String),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..4, any::<u16>()).prop_map(|(k, v)| Op::Set(format!("k{k}"), v.to_string())),
            (0u8..4).prop_map(|k| Op::Remove(format!("k{k}"))),
        ]
    }

    proptest! {
        /// Any sequence of set/remove ops, rolled back to a savepoint taken
        /// before them, must leave every touched key reading exactly as it
        /// did at the savepoint.
        #[test]
        fn rollback_restores_pre_savepoint_reads(ops in prop::collection::vec(op_strategy(), 0..20)) {
            let layer = StateStorageLayer::genesis(0, Arc::new(InMemoryBackend::new()));
            layer.create_table("t_demo", "id", vec!["v".into()]).unwrap();

            let tracked_keys: Vec<String> = (0..4).map(|k| format!("k{k}")).collect();
            let before: Vec<Option<String>> = tracked_keys
                .iter()
                .map(|k| layer.get_row("t_demo", k).unwrap().and_then(|e| e.get("v").map(str::to_owned)))
                .collect();

            let savepoint = layer.savepoint();
            for op in ops {
                match op {
                    Op::Set(key, value) => {
                        let mut entry = Entry::new();
                        entry.set("v", value);
                        layer.set_row("t_demo", &key, entry).unwrap();
                    }
                    Op::Remove(key) => {
                        layer.remove_row("t_demo", &key).unwrap();
                    }
                }
            }
            layer.rollback(savepoint);

            let after: Vec<Option<String>> = tracked_keys
                .iter()
                .map(|k| layer.get_row("t_demo", k).unwrap().and_then(|e| e.get("v").map(str::to_owned)))
                .collect();
            prop_assert_eq!(before, after);
        }
    }
}
