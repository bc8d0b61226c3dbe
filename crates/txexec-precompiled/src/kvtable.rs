use std::sync::Arc;

use txexec_abi::{encode_error_code, selector_of, split_selector};
use txexec_context::{BlockContext, Precompiled, PrecompiledError};
use txexec_primitives::Address;
use txexec_state::Entry;

use crate::words::{WordReader, WordWriter};

const CREATE_COST: i64 = 20_000;
const OPEN_COST: i64 = 500;
const GET_COST: i64 = 500;
const SET_COST: i64 = 5_000;

/// A live single-column-keyed handle minted by [`KvTableFactoryPrecompiled`],
/// the fixed-schema sibling of [`crate::table_factory::TablePrecompiled`]:
/// one value field, addressed by `get`/`set`.
pub struct KvTablePrecompiled {
    table: String,
}

impl Precompiled for KvTablePrecompiled {
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

        if selector == selector_of("get(string)") {
            let key = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed key"))?;
            let row = state.get_row(&self.table, &key).map_err(|err| PrecompiledError::new(err.to_string()))?;
            let mut writer = WordWriter::new();
            match row {
                Some(entry) => {
                    writer.push_bool(true);
                    writer.push_dynamic(entry.get("value").unwrap_or_default().as_bytes());
                }
                None => {
                    writer.push_bool(false);
                    writer.push_dynamic(b"");
                }
            }
            return Ok((GET_COST, writer.into_bytes()));
        }

        if selector == selector_of("set(string,string)") {
            let key = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed key"))?;
            let value = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed value"))?;
            let mut row = Entry::new();
            row.set("value", value);
            state
                .set_row(&self.table, &key, row)
                .map_err(|err| PrecompiledError::new(err.to_string()))?;
            return Ok((SET_COST, encode_error_code(1).to_vec()));
        }

        if selector == selector_of("remove(string)") {
            let key = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed key"))?;
            state
                .remove_row(&self.table, &key)
                .map_err(|err| PrecompiledError::new(err.to_string()))?;
            return Ok((SET_COST, encode_error_code(1).to_vec()));
        }

        Err(PrecompiledError::new("unknown KVTable selector"))
    }
}

/// `0x1009`: mints [`KvTablePrecompiled`] handles.
pub struct KvTableFactoryPrecompiled;

impl Precompiled for KvTableFactoryPrecompiled {
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

        if selector == selector_of("createTable(string)") {
            let table = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed table name"))?;
            ctx.state()
                .create_table(&table, "key", vec!["value".to_owned()])
                .map_err(|err| PrecompiledError::new(err.to_string()))?;
            let address = ctx.precompiled().register_precompiled(Arc::new(KvTablePrecompiled { table }));
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
            let address = ctx.precompiled().register_precompiled(Arc::new(KvTablePrecompiled { table }));
            let mut writer = WordWriter::new();
            writer.push_address(address);
            return Ok((OPEN_COST, writer.into_bytes()));
        }

        Err(PrecompiledError::new("unknown KVTableFactory selector"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc as StdArc;
    use txexec_context::BlockContextConfig;
    use txexec_state::{InMemoryBackend, StateStorageLayer};

    fn genesis_ctx() -> BlockContext {
        let layer = StateStorageLayer::genesis(0, StdArc::new(InMemoryBackend::new()));
        BlockContext::genesis(&BlockContextConfig::default(), layer, HashMap::new(), HashMap::new())
    }

    #[test]
    fn create_then_set_and_get_round_trips() {
        let ctx = genesis_ctx();
        let mut create_body = WordWriter::new();
        create_body.push_dynamic(b"kv_demo");
        let mut create_input = selector_of("createTable(string)").to_vec();
        create_input.extend_from_slice(&create_body.into_bytes());
        let (_, out) = KvTableFactoryPrecompiled.call(&ctx, &create_input, Address::ZERO, Address::ZERO).unwrap();
        let table_address = WordReader::new(&out).read_address().unwrap();
        let table = ctx.precompiled().get_precompiled(table_address).unwrap();

        let mut set_body = WordWriter::new();
        set_body.push_dynamic(b"k1").push_dynamic(b"v1");
        let mut set_input = selector_of("set(string,string)").to_vec();
        set_input.extend_from_slice(&set_body.into_bytes());
        table.call(&ctx, &set_input, Address::ZERO, Address::ZERO).unwrap();

        let mut get_body = WordWriter::new();
        get_body.push_dynamic(b"k1");
        let mut get_input = selector_of("get(string)").to_vec();
        get_input.extend_from_slice(&get_body.into_bytes());
        let (_, out) = table.call(&ctx, &get_input, Address::ZERO, Address::ZERO).unwrap();
        let mut r = WordReader::new(&out);
        assert_eq!(r.read_bool(), Some(true));
        assert_eq!(r.read_string().as_deref(), Some("v1"));
    }

    #[test]
    fn get_of_missing_key_reports_false() {
        let ctx = genesis_ctx();
        let mut create_body = WordWriter::new();
        create_body.push_dynamic(b"kv_demo2");
        let mut create_input = selector_of("createTable(string)").to_vec();
        create_input.extend_from_slice(&create_body.into_bytes());
        let (_, out) = KvTableFactoryPrecompiled.call(&ctx, &create_input, Address::ZERO, Address::ZERO).unwrap();
        let table = ctx.precompiled().get_precompiled(WordReader::new(&out).read_address().unwrap()).unwrap();

        let mut get_body = WordWriter::new();
        get_body.push_dynamic(b"nope");
        let mut get_input = selector_of("get(string)").to_vec();
        get_input.extend_from_slice(&get_body.into_bytes());
        let (_, out) = table.call(&ctx, &get_input, Address::ZERO, Address::ZERO).unwrap();
        assert_eq!(WordReader::new(&out).read_bool(), Some(false));
    }
}
