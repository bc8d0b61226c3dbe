use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

use txexec_abi::{Condition, Op};
use txexec_primitives::{keccak256, BlockNumber, B256};

use crate::backend::StateBackend;
use crate::entry::Entry;
use crate::error::{TableError, TableResult};
use crate::recorder::{Recorder, RecorderEntry, RowSlot, Savepoint};
use crate::table::{self, TableSchema, SYS_TABLES};

enum Parent {
    Layer(Arc<StateStorageLayer>),
    Backend(Arc<dyn StateBackend>),
}

/// A copy-on-write overlay over a parent layer (or, at the bottom of the
/// stack, the durable backend). Reads walk the chain top-down; writes only
/// ever touch the top layer and are recorded so a frame can be unwound.
pub struct StateStorageLayer {
    parent: Parent,
    block_number: BlockNumber,
    tables: RwLock<BTreeMap<String, BTreeMap<String, RowSlot>>>,
    recorder: Mutex<Recorder>,
}

impl StateStorageLayer {
    /// Builds the bottom-most layer of a fresh stack, backed directly by
    /// the durable store.
    pub fn genesis(block_number: BlockNumber, backend: Arc<dyn StateBackend>) -> Arc<Self> {
        Arc::new(Self {
            parent: Parent::Backend(backend),
            block_number,
            tables: RwLock::new(BTreeMap::new()),
            recorder: Mutex::new(Recorder::new()),
        })
    }

    /// Pushes a new overlay on top of `parent`, for the next block number.
    pub fn push(parent: Arc<StateStorageLayer>, block_number: BlockNumber) -> Arc<Self> {
        Arc::new(Self {
            parent: Parent::Layer(parent),
            block_number,
            tables: RwLock::new(BTreeMap::new()),
            recorder: Mutex::new(Recorder::new()),
        })
    }

    pub fn block_number(&self) -> BlockNumber {
        self.block_number
    }

    // -- schema -----------------------------------------------------------

    pub fn open_table(&self, name: &str) -> TableResult<Option<TableSchema>> {
        let row = self.get_row(SYS_TABLES, name)?;
        Ok(row.map(|entry| {
            let key_field = entry.get("key_field").unwrap_or_default().to_owned();
            let value_field = entry.get("value_field").unwrap_or_default().to_owned();
            TableSchema::from_row(name, &key_field, &value_field)
        }))
    }

    pub fn create_table(
        &self,
        name: &str,
        key_field: &str,
        value_fields: Vec<String>,
    ) -> TableResult<TableSchema> {
        if self.open_table(name)?.is_some() {
            return Err(TableError::TableAlreadyExists(name.to_owned()));
        }
        let schema = TableSchema::new(name, key_field, value_fields)?;
        let mut row = Entry::new();
        row.set("key_field", schema.key_field.clone());
        row.set("value_field", schema.value_field_list());
        self.set_row(SYS_TABLES, name, row)?;
        Ok(schema)
    }

    // -- rows ---------------------------------------------------------------

    pub fn get_row(&self, table: &str, key: &str) -> TableResult<Option<Entry>> {
        {
            let tables = self.tables.read().expect("lock poisoned");
            if let Some(rows) = tables.get(table) {
                if let Some(slot) = rows.get(key) {
                    return Ok(match slot {
                        RowSlot::Present(entry) => Some(entry.clone()),
                        RowSlot::Tombstone => None,
                    });
                }
            }
        }
        match &self.parent {
            Parent::Layer(parent) => parent.get_row(table, key),
            Parent::Backend(backend) => backend.get_row(table, key),
        }
    }

    pub fn set_row(&self, table: &str, key: &str, entry: Entry) -> TableResult<()> {
        table::validate_key_value(key)?;
        for (field, value) in entry.fields() {
            table::validate_field_value(field, value)?;
        }
        let mut tables = self.tables.write().expect("lock poisoned");
        let rows = tables.entry(table.to_owned()).or_default();
        let previous = rows.get(key).cloned();
        rows.insert(key.to_owned(), RowSlot::Present(entry));
        drop(tables);
        self.recorder.lock().expect("lock poisoned").push(RecorderEntry {
            table: table.to_owned(),
            key: key.to_owned(),
            previous,
        });
        Ok(())
    }

    pub fn remove_row(&self, table: &str, key: &str) -> TableResult<()> {
        let mut tables = self.tables.write().expect("lock poisoned");
        let rows = tables.entry(table.to_owned()).or_default();
        let previous = rows.get(key).cloned();
        rows.insert(key.to_owned(), RowSlot::Tombstone);
        drop(tables);
        self.recorder.lock().expect("lock poisoned").push(RecorderEntry {
            table: table.to_owned(),
            key: key.to_owned(),
            previous,
        });
        Ok(())
    }

    pub fn get_primary_keys(
        &self,
        table: &str,
        condition: Option<&Condition>,
    ) -> TableResult<Vec<String>> {
        let mut decided = BTreeMap::new();
        self.collect_keys(table, &mut decided)?;
        let mut keys: Vec<String> = decided
            .into_iter()
            .filter(|(_, present)| *present)
            .map(|(key, _)| key)
            .collect();

        let Some(condition) = condition else {
            return Ok(keys);
        };

        if !condition.predicates.is_empty() {
            let mut filtered = Vec::with_capacity(keys.len());
            for key in keys {
                if let Some(entry) = self.get_row(table, &key)? {
                    if matches_predicates(&entry, condition) {
                        filtered.push(key);
                    }
                }
            }
            keys = filtered;
        }
        if let Some((offset, count)) = condition.limit {
            keys = keys
                .into_iter()
                .skip(offset as usize)
                .take(count as usize)
                .collect();
        }
        Ok(keys)
    }

    fn collect_keys(&self, table: &str, decided: &mut BTreeMap<String, bool>) -> TableResult<()> {
        {
            let tables = self.tables.read().expect("lock poisoned");
            if let Some(rows) = tables.get(table) {
                for (key, slot) in rows {
                    decided
                        .entry(key.clone())
                        .or_insert(matches!(slot, RowSlot::Present(_)));
                }
            }
        }
        match &self.parent {
            Parent::Layer(parent) => parent.collect_keys(table, decided),
            Parent::Backend(backend) => {
                for key in backend.primary_keys(table)? {
                    decided.entry(key).or_insert(true);
                }
                Ok(())
            }
        }
    }

    fn touched_table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect();
        if let Parent::Layer(parent) = &self.parent {
            for name in parent.touched_table_names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Deterministic digest over `table`'s full merged contents.
    pub fn table_hash(&self, table: &str) -> TableResult<B256> {
        let keys = self.get_primary_keys(table, None)?;
        let mut buf = Vec::new();
        for key in keys {
            if let Some(entry) = self.get_row(table, &key)? {
                buf.extend_from_slice(key.as_bytes());
                for (field, value) in entry.fields() {
                    buf.extend_from_slice(field.as_bytes());
                    buf.extend_from_slice(value.as_bytes());
                }
            }
        }
        Ok(keccak256(buf))
    }

    /// A digest per table that has been touched anywhere in the stack,
    /// sorted by table name so the result is order-independent.
    pub fn table_hashes(&self) -> TableResult<Vec<(String, B256)>> {
        let mut names = self.touched_table_names();
        names.sort();
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            let hash = self.table_hash(&name)?;
            out.push((name, hash));
        }
        Ok(out)
    }

    /// Deterministic digest over the top layer's table-hashes; the state
    /// root this layer currently represents.
    pub fn hash(&self) -> TableResult<B256> {
        let hashes = self.table_hashes()?;
        let mut buf = Vec::new();
        for (name, hash) in &hashes {
            buf.extend_from_slice(name.as_bytes());
            buf.extend_from_slice(hash.as_slice());
        }
        Ok(keccak256(buf))
    }

    // -- rollback -----------------------------------------------------------

    pub fn savepoint(&self) -> Savepoint {
        self.recorder.lock().expect("lock poisoned").savepoint()
    }

    /// Restores every local overlay slot touched since `savepoint` to what
    /// it held immediately before. Never touches the parent chain.
    pub fn rollback(&self, savepoint: Savepoint) {
        let drained = self
            .recorder
            .lock()
            .expect("lock poisoned")
            .drain_to(savepoint);
        let mut tables = self.tables.write().expect("lock poisoned");
        for entry in drained {
            let rows = tables.entry(entry.table).or_default();
            match entry.previous {
                Some(slot) => {
                    rows.insert(entry.key, slot);
                }
                None => {
                    rows.remove(&entry.key);
                }
            }
        }
    }
}

fn matches_predicates(entry: &Entry, condition: &Condition) -> bool {
    condition.predicates.iter().all(|(field, op, target)| {
        entry
            .get(field)
            .is_some_and(|value| compare(value, *op, target))
    })
}

fn compare(value: &str, op: Op, target: &str) -> bool {
    if let (Ok(a), Ok(b)) = (value.parse::<i128>(), target.parse::<i128>()) {
        return match op {
            Op::Eq => a == b,
            Op::Ne => a != b,
            Op::Gt => a > b,
            Op::Ge => a >= b,
            Op::Lt => a < b,
            Op::Le => a <= b,
        };
    }
    match op {
        Op::Eq => value == target,
        Op::Ne => value != target,
        Op::Gt => value > target,
        Op::Ge => value >= target,
        Op::Lt => value < target,
        Op::Le => value <= target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;

    fn fresh_layer() -> Arc<StateStorageLayer> {
        StateStorageLayer::genesis(0, Arc::new(InMemoryBackend::new()))
    }

    #[test]
    fn set_then_rollback_restores_prior_value() {
        let layer = fresh_layer();
        layer.create_table("t_demo", "id", vec!["v".into()]).unwrap();
        let mut first = Entry::new();
        first.set("v", "1");
        layer.set_row("t_demo", "k1", first).unwrap();

        let savepoint = layer.savepoint();
        let mut second = Entry::new();
        second.set("v", "2");
        layer.set_row("t_demo", "k1", second).unwrap();
        assert_eq!(layer.get_row("t_demo", "k1").unwrap().unwrap().get("v"), Some("2"));

        layer.rollback(savepoint);
        assert_eq!(layer.get_row("t_demo", "k1").unwrap().unwrap().get("v"), Some("1"));
    }

    #[test]
    fn rollback_of_first_write_removes_the_row() {
        let layer = fresh_layer();
        layer.create_table("t_demo", "id", vec!["v".into()]).unwrap();
        let savepoint = layer.savepoint();
        let mut entry = Entry::new();
        entry.set("v", "1");
        layer.set_row("t_demo", "k1", entry).unwrap();
        layer.rollback(savepoint);
        assert!(layer.get_row("t_demo", "k1").unwrap().is_none());
    }

    #[test]
    fn remove_row_is_visible_as_tombstone_over_parent() {
        let backend = Arc::new(InMemoryBackend::new());
        let mut seeded = Entry::new();
        seeded.set("v", "9");
        backend.seed_row("t_demo", "k1", seeded);
        let layer = StateStorageLayer::genesis(0, backend);
        assert_eq!(layer.get_row("t_demo", "k1").unwrap().unwrap().get("v"), Some("9"));
        layer.remove_row("t_demo", "k1").unwrap();
        assert!(layer.get_row("t_demo", "k1").unwrap().is_none());
    }

    #[test]
    fn child_layer_sees_parent_rows_until_shadowed() {
        let parent = fresh_layer();
        parent.create_table("t_demo", "id", vec!["v".into()]).unwrap();
        let mut entry = Entry::new();
        entry.set("v", "1");
        parent.set_row("t_demo", "k1", entry).unwrap();

        let child = StateStorageLayer::push(parent, 1);
        assert_eq!(child.get_row("t_demo", "k1").unwrap().unwrap().get("v"), Some("1"));

        let mut updated = Entry::new();
        updated.set("v", "2");
        child.set_row("t_demo", "k1", updated).unwrap();
        assert_eq!(child.get_row("t_demo", "k1").unwrap().unwrap().get("v"), Some("2"));
    }

    #[test]
    fn create_table_rejects_duplicate_name() {
        let layer = fresh_layer();
        layer.create_table("t_demo", "id", vec!["v".into()]).unwrap();
        let err = layer.create_table("t_demo", "id", vec!["v".into()]).unwrap_err();
        assert!(matches!(err, TableError::TableAlreadyExists(_)));
    }

    #[test]
    fn get_primary_keys_applies_condition_and_limit() {
        let layer = fresh_layer();
        layer.create_table("t_demo", "id", vec!["a".into()]).unwrap();
        for (key, value) in [("k1", "1"), ("k2", "2"), ("k3", "3")] {
            let mut entry = Entry::new();
            entry.set("a", value);
            layer.set_row("t_demo", key, entry).unwrap();
        }
        let condition = Condition::from_json(&serde_json::json!({"a": {"gt": "1"}})).unwrap();
        let keys = layer.get_primary_keys("t_demo", Some(&condition)).unwrap();
        assert_eq!(keys, vec!["k2".to_string(), "k3".to_string()]);
    }

    #[test]
    fn table_hash_is_stable_across_equivalent_writes() {
        let layer_a = fresh_layer();
        layer_a.create_table("t_demo", "id", vec!["a".into()]).unwrap();
        let mut entry = Entry::new();
        entry.set("a", "1");
        layer_a.set_row("t_demo", "k1", entry).unwrap();

        let layer_b = fresh_layer();
        layer_b.create_table("t_demo", "id", vec!["a".into()]).unwrap();
        let mut entry = Entry::new();
        entry.set("a", "1");
        layer_b.set_row("t_demo", "k1", entry).unwrap();

        assert_eq!(
            layer_a.table_hash("t_demo").unwrap(),
            layer_b.table_hash("t_demo").unwrap()
        );
    }
}
