use serde_json::{Map, Value};

use txexec_abi::{encode_error_code, selector_of, split_selector, Condition};
use txexec_context::{BlockContext, Precompiled, PrecompiledError};
use txexec_primitives::Address;
use txexec_state::Entry;

use crate::words::{WordReader, WordWriter};

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

/// A non-empty `key` names exactly one row, still subject to `condition`;
/// an empty `key` means `condition` alone selects the batch.
fn matching_keys(
    state: &txexec_state::StateStorageLayer,
    table: &str,
    key: &str,
    condition: &Condition,
) -> Result<Vec<String>, PrecompiledError> {
    if key.is_empty() {
        return state
            .get_primary_keys(table, Some(condition))
            .map_err(|err| PrecompiledError::new(err.to_string()));
    }
    let candidates = state
        .get_primary_keys(table, Some(condition))
        .map_err(|err| PrecompiledError::new(err.to_string()))?;
    Ok(candidates.into_iter().filter(|k| k == key).collect())
}

/// `0x1002`: generic row CRUD over any user table (`select`/`insert`/
/// `update`/`remove`, each taking a table name, primary key, and a JSON
/// condition or entry blob).
pub struct CrudPrecompiled;

impl Precompiled for CrudPrecompiled {
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
            let table = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed table name"))?;
            let condition_json = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed condition"))?;
            let condition = parse_condition(&condition_json)?;
            let keys = state
                .get_primary_keys(&table, Some(&condition))
                .map_err(|err| PrecompiledError::new(err.to_string()))?;
            let mut rows = Vec::with_capacity(keys.len());
            for key in keys {
                if let Some(entry) = state.get_row(&table, &key).map_err(|err| PrecompiledError::new(err.to_string()))? {
                    rows.push(entry_to_json(&entry));
                }
            }
            let encoded = Value::Array(rows).to_string();
            let mut writer = WordWriter::new();
            writer.push_dynamic(encoded.as_bytes());
            return Ok((SELECT_COST, writer.into_bytes()));
        }

        if selector == selector_of("insert(string,string,string)") {
            let table = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed table name"))?;
            let key = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed key"))?;
            let entry_json = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed entry"))?;
            let entry = json_to_entry(&entry_json)?;
            state
                .set_row(&table, &key, entry)
                .map_err(|err| PrecompiledError::new(err.to_string()))?;
            return Ok((WRITE_COST, encode_error_code(1).to_vec()));
        }

        if selector == selector_of("update(string,string,string,string)") {
            let table = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed table name"))?;
            let key = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed key"))?;
            let entry_json = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed entry"))?;
            let condition_json = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed condition"))?;
            let condition = parse_condition(&condition_json)?;
            let patch = json_to_entry(&entry_json)?;
            let keys = matching_keys(state, &table, &key, &condition)?;
            let updated = keys.len();
            for row_key in &keys {
                let mut row = state
                    .get_row(&table, row_key)
                    .map_err(|err| PrecompiledError::new(err.to_string()))?
                    .unwrap_or_default();
                for (field, value) in patch.fields() {
                    row.set(field, value);
                }
                state
                    .set_row(&table, row_key, row)
                    .map_err(|err| PrecompiledError::new(err.to_string()))?;
            }
            return Ok((WRITE_COST, encode_error_code(updated as i64).to_vec()));
        }

        if selector == selector_of("remove(string,string,string)") {
            let table = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed table name"))?;
            let key = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed key"))?;
            let condition_json = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed condition"))?;
            let condition = parse_condition(&condition_json)?;
            let keys = matching_keys(state, &table, &key, &condition)?;
            let removed = keys.len();
            for row_key in keys {
                state
                    .remove_row(&table, &row_key)
                    .map_err(|err| PrecompiledError::new(err.to_string()))?;
            }
            return Ok((WRITE_COST, encode_error_code(removed as i64).to_vec()));
        }

        Err(PrecompiledError::new("unknown CRUD selector"))
    }
}
