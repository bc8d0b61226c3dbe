use txexec_abi::{encode_error_code, selector_of, split_selector};
use txexec_context::{BlockContext, Precompiled, PrecompiledError};
use txexec_primitives::Address;
use txexec_state::Entry;

use crate::words::{WordReader, WordWriter};

/// Reserved table for the contract naming service, keyed by `name.version`.
pub const CNS_TABLE: &str = "_sys_cns_";

const INSERT_COST: i64 = 5_000;
const SELECT_COST: i64 = 500;
/// A `(name, version)` pair already bound to a different address; CNS
/// bindings are immutable once inserted.
const ADDRESS_AND_VERSION_EXIST_ERROR: i64 = -51_200;

fn cns_key(name: &str, version: &str) -> String {
    format!("{name}.{version}")
}

/// `0x1004`: binds a `(name, version)` pair to a deployed contract address
/// and ABI (`insert(string,string,string,string)`, `selectByName`,
/// `selectByNameAndVersion`).
pub struct CnsPrecompiled;

impl Precompiled for CnsPrecompiled {
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

        if selector == selector_of("insert(string,string,string,string)") {
            let name = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed name"))?;
            let version = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed version"))?;
            let address = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed address"))?;
            let abi = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed abi"))?;
            if version.contains('.') {
                return Err(PrecompiledError::new("version must not contain '.'"));
            }
            let key = cns_key(&name, &version);
            if ctx
                .state()
                .get_row(CNS_TABLE, &key)
                .map_err(|err| PrecompiledError::new(err.to_string()))?
                .is_some()
            {
                return Ok((INSERT_COST, encode_error_code(ADDRESS_AND_VERSION_EXIST_ERROR).to_vec()));
            }
            let mut row = Entry::new();
            row.set("address", address);
            row.set("abi", abi);
            ctx.state()
                .set_row(CNS_TABLE, &key, row)
                .map_err(|err| PrecompiledError::new(err.to_string()))?;
            return Ok((INSERT_COST, encode_error_code(0).to_vec()));
        }

        if selector == selector_of("selectByNameAndVersion(string,string)") {
            let name = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed name"))?;
            let version = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed version"))?;
            let address = ctx
                .state()
                .get_row(CNS_TABLE, &cns_key(&name, &version))
                .map_err(|err| PrecompiledError::new(err.to_string()))?
                .and_then(|row| row.get("address").map(str::to_owned))
                .unwrap_or_default();
            let mut writer = WordWriter::new();
            writer.push_dynamic(address.as_bytes());
            return Ok((SELECT_COST, writer.into_bytes()));
        }

        Err(PrecompiledError::new("unknown CNS selector"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use txexec_context::BlockContextConfig;
    use txexec_state::{InMemoryBackend, StateStorageLayer};

    fn genesis_ctx() -> BlockContext {
        let layer = StateStorageLayer::genesis(0, Arc::new(InMemoryBackend::new()));
        BlockContext::genesis(&BlockContextConfig::default(), layer, HashMap::new(), HashMap::new())
    }

    #[test]
    fn insert_then_select_round_trips() {
        let ctx = genesis_ctx();
        let mut body = WordWriter::new();
        body.push_dynamic(b"HelloWorld")
            .push_dynamic(b"1.0")
            .push_dynamic(b"0x1234")
            .push_dynamic(b"[]");
        let mut input = selector_of("insert(string,string,string,string)").to_vec();
        input.extend_from_slice(&body.into_bytes());
        CnsPrecompiled.call(&ctx, &input, Address::ZERO, Address::ZERO).unwrap();

        let mut select_body = WordWriter::new();
        select_body.push_dynamic(b"HelloWorld").push_dynamic(b"1.0");
        let mut select_input = selector_of("selectByNameAndVersion(string,string)").to_vec();
        select_input.extend_from_slice(&select_body.into_bytes());
        let (_, out) = CnsPrecompiled.call(&ctx, &select_input, Address::ZERO, Address::ZERO).unwrap();
        assert_eq!(WordReader::new(&out).read_string().as_deref(), Some("0x1234"));
    }

    #[test]
    fn insert_rejects_a_dotted_version() {
        let ctx = genesis_ctx();
        let mut body = WordWriter::new();
        body.push_dynamic(b"HelloWorld")
            .push_dynamic(b"1.0.0")
            .push_dynamic(b"0x1234")
            .push_dynamic(b"[]");
        let mut input = selector_of("insert(string,string,string,string)").to_vec();
        input.extend_from_slice(&body.into_bytes());
        assert!(CnsPrecompiled.call(&ctx, &input, Address::ZERO, Address::ZERO).is_err());
    }

    #[test]
    fn inserting_the_same_name_and_version_twice_is_rejected() {
        let ctx = genesis_ctx();
        let mut body = WordWriter::new();
        body.push_dynamic(b"Foo").push_dynamic(b"1.0").push_dynamic(b"0xabc").push_dynamic(b"{}");
        let mut input = selector_of("insert(string,string,string,string)").to_vec();
        input.extend_from_slice(&body.into_bytes());
        let (_, first) = CnsPrecompiled.call(&ctx, &input, Address::ZERO, Address::ZERO).unwrap();
        assert_eq!(first, encode_error_code(0).to_vec());

        let (_, second) = CnsPrecompiled.call(&ctx, &input, Address::ZERO, Address::ZERO).unwrap();
        assert_eq!(second, encode_error_code(ADDRESS_AND_VERSION_EXIST_ERROR).to_vec());
    }
}
