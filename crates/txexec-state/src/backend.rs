use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::entry::Entry;
use crate::error::TableResult;
use crate::table::{TableSchema, SYS_TABLES};

/// The durable store sitting underneath the whole [`crate::LayerStack`].
///
/// The executor façade owns the real implementation (a 2PC-capable KV
/// store); this crate only needs read access to it, since every write in a
/// live block lands on the top overlay layer.
pub trait StateBackend: Send + Sync {
    fn get_row(&self, table: &str, key: &str) -> TableResult<Option<Entry>>;

    fn table_schema(&self, table: &str) -> TableResult<Option<TableSchema>>;

    /// All primary keys the backend holds for `table`, in key order.
    fn primary_keys(&self, table: &str) -> TableResult<Vec<String>>;
}

/// A backend with nothing committed to it yet: every lookup misses.
///
/// Used by the genesis block (there is no prior durable state) and by
/// `call()`'s throwaway layer when no backend handle is otherwise available.
#[derive(Debug, Default)]
pub struct EmptyBackend;

impl StateBackend for EmptyBackend {
    fn get_row(&self, _table: &str, _key: &str) -> TableResult<Option<Entry>> {
        Ok(None)
    }

    fn table_schema(&self, _table: &str) -> TableResult<Option<TableSchema>> {
        Ok(None)
    }

    fn primary_keys(&self, _table: &str) -> TableResult<Vec<String>> {
        Ok(Vec::new())
    }
}

/// A simple in-process backend, for tests and the CLI's standalone mode.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    tables: RwLock<BTreeMap<String, BTreeMap<String, Entry>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a row directly, bypassing validation; used to build genesis
    /// fixtures (e.g. a pre-populated [`SYS_TABLES`]).
    pub fn seed_row(&self, table: &str, key: &str, entry: Entry) {
        self.tables
            .write()
            .expect("lock poisoned")
            .entry(table.to_owned())
            .or_default()
            .insert(key.to_owned(), entry);
    }
}

impl StateBackend for InMemoryBackend {
    fn get_row(&self, table: &str, key: &str) -> TableResult<Option<Entry>> {
        Ok(self
            .tables
            .read()
            .expect("lock poisoned")
            .get(table)
            .and_then(|rows| rows.get(key))
            .cloned())
    }

    fn table_schema(&self, table: &str) -> TableResult<Option<TableSchema>> {
        let entry = self.get_row(SYS_TABLES, table)?;
        Ok(entry.map(|row| {
            let key_field = row.get("key_field").unwrap_or_default().to_owned();
            let value_fields = row.get("value_field").unwrap_or_default().to_owned();
            TableSchema::from_row(table, &key_field, &value_fields)
        }))
    }

    fn primary_keys(&self, table: &str) -> TableResult<Vec<String>> {
        Ok(self
            .tables
            .read()
            .expect("lock poisoned")
            .get(table)
            .map(|rows| rows.keys().cloned().collect())
            .unwrap_or_default())
    }
}
