use std::sync::Arc;

use serde_json::{Map, Value};

use txexec_abi::{encode_error_code, selector_of, split_selector, Condition};
use txexec_context::{BlockContext, Precompiled, PrecompiledError};
use txexec_primitives::Address;
use txexec_state::Entry;

use crate::words::{WordReader, WordWriter};

const CREATE_COST: i64 = 20_000;
const OPEN_COST: i64 = 500;
const SELECT_COST: i64 = 1_000;
const WRITE_COST: i64 = 5_000;

fn parse_condition(raw: &str) -> Result<Condition, PrecompiledError> {
    if raw.is_empty() {
        return Ok(Condition::default());
    }
    let value: Value = serde_json::from_str(raw).map_err(|err| PrecompiledError::new(err.to_string()))?;
    Condition::from_json(&value).map_err(|err| PrecompiledError::new(err.to_string()))
}

fn entry_to_json(entry: &Entry) -> Value {
    let mut map = Map::new();
    for (field, value) in entry.fields() {
        map.insert(field.to_owned(), Value::String(value.to_owned()));
    }
    Value::Object(map)
}

fn json_to_entry(raw: &str) -> Result<Entry, PrecompiledError> {
    let value: Value = serde_json::from_str(raw).map_err(|err| PrecompiledError::new(err.to_string()))?;
    let object = value.as_object().ok_or_else(|| PrecompiledError::new("entry must be a JSON object"))?;
    let mut entry = Entry::new();
    for (field, value) in object {
        let as_str = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        entry.set(field.clone(), as_str);
    }
    Ok(entry)
}

/// A live handle over one user table, minted by [`TableFactoryPrecompiled`].
/// Unlike [`crate::crud::CrudPrecompiled`] (which takes the table name as an
/// argument on every call), this address *is* the table: `openTable`/
/// `createTable` hand the caller a contract address bound to one table for
/// the rest of the transaction.
pub struct TablePrecompiled {
    table: String,
}

impl Precompiled for TablePrecompiled {
    fn call(
        &self,
        ctx: &BlockContext,
        input: &[u8],
        _origin: Address,
        _sender: Address,
    ) -> Result<(i64, Vec<u8>), PrecompiledError> {
        let (selector, body) =
            split_selector(input).ok_or_else(|| PrecompiledError::new("call data too short for a selector"))?;
        let mut reader = WordReader::new(body);
        let state = ctx.state();

        if selector == selector_of("select(string,string)") {
            let key = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed key"))?;
            let condition_json = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed condition"))?;
            let condition = parse_condition(&condition_json)?;
            let keys = if key.is_empty() {
                state
                    .get_primary_keys(&self.table, Some(&condition))
                    .map_err(|err| PrecompiledError::new(err.to_string()))?
            } else {
                vec![key]
            };
            let mut rows = Vec::with_capacity(keys.len());
            for row_key in keys {
                if let Some(entry) = state.get_row(&self.table, &row_key).map_err(|err| PrecompiledError::new(err.to_string()))? {
                    rows.push(entry_to_json(&entry));
                }
            }
            let mut writer = WordWriter::new();
            writer.push_dynamic(Value::Array(rows).to_string().as_bytes());
            return Ok((SELECT_COST, writer.into_bytes()));
        }

        if selector == selector_of("insert(string,string)") {
            let key = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed key"))?;
            let entry_json = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed entry"))?;
            let entry = json_to_entry(&entry_json)?;
            state
                .set_row(&self.table, &key, entry)
                .map_err(|err| PrecompiledError::new(err.to_string()))?;
            return Ok((WRITE_COST, encode_error_code(1).to_vec()));
        }

        if selector == selector_of("remove(string,string)") {
            let key = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed key"))?;
            let _condition_json = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed condition"))?;
            state
                .remove_row(&self.table, &key)
                .map_err(|err| PrecompiledError::new(err.to_string()))?;
            return Ok((WRITE_COST, encode_error_code(1).to_vec()));
        }

        Err(PrecompiledError::new("unknown Table selector"))
    }
}

/// `0x1001`: mints [`TablePrecompiled`] handles.
pub struct TableFactoryPrecompiled;

impl Precompiled for TableFactoryPrecompiled {
    fn call(
        &self,
        ctx: &BlockContext,
        input: &[u8],
        _origin: Address,
        _sender: Address,
    ) -> Result<(i64, Vec<u8>), PrecompiledError> {
        let (selector, body) =
            split_selector(input).ok_or_else(|| PrecompiledError::new("call data too short for a selector"))?;
        let mut reader = WordReader::new(body);

        if selector == selector_of("createTable(string,string,string)") {
            let table = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed table name"))?;
            let key_field = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed key field"))?;
            let value_fields = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed value fields"))?;
            let fields: Vec<String> = value_fields.split(',').map(str::to_owned).filter(|s| !s.is_empty()).collect();
            ctx.state()
                .create_table(&table, &key_field, fields)
                .map_err(|err| PrecompiledError::new(err.to_string()))?;
            let address = ctx.precompiled().register_precompiled(Arc::new(TablePrecompiled { table }));
            let mut writer = WordWriter::new();
            writer.push_address(address);
            return Ok((CREATE_COST, writer.into_bytes()));
        }

        if selector == selector_of("openTable(string)") {
            let table = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed table name"))?;
            ctx.state()
                .open_table(&table)
                .map_err(|err| PrecompiledError::new(err.to_string()))?
                .ok_or_else(|| PrecompiledError::new("no such table"))?;
            let address = ctx.precompiled().register_precompiled(Arc::new(TablePrecompiled { table }));
            let mut writer = WordWriter::new();
            writer.push_address(address);
            return Ok((OPEN_COST, writer.into_bytes()));
        }

        Err(PrecompiledError::new("unknown TableFactory selector"))
    }
}
