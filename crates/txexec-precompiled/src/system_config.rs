use txexec_abi::{encode_error_code, selector_of, split_selector};
use txexec_context::{BlockContext, Precompiled, PrecompiledError};
use txexec_primitives::Address;
use txexec_state::Entry;

use crate::words::{WordReader, WordWriter};

/// Reserved table for node-wide configuration scalars (`tx_count_limit`,
/// `tx_gas_limit`, ...), one row per key.
pub const SYSTEM_CONFIG_TABLE: &str = "_sys_config_";

const SET_COST: i64 = 5_000;
const GET_COST: i64 = 500;

/// `0x1000`: sets/reads scalar node configuration. `setValueByKey` is the
/// only mutating method; `getValueByKey` is a read-side companion, since
/// nothing else here can reach the config table from outside a
/// `StateStorageLayer` handle.
pub struct SystemConfigPrecompiled;

impl Precompiled for SystemConfigPrecompiled {
    fn call(
        &self,
        ctx: &BlockContext,
        input: &[u8],
        _origin: Address,
        _sender: Address,
    ) -> Result<(i64, Vec<u8>), PrecompiledError> {
        let (selector, body) =
            split_selector(input).ok_or_else(|| PrecompiledError::new("call data too short for a selector"))?;

        if selector == selector_of("setValueByKey(string,string)") {
            let mut reader = WordReader::new(body);
            let key = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed key"))?;
            let value = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed value"))?;
            let mut row = Entry::new();
            row.set("value", value);
            ctx.state()
                .set_row(SYSTEM_CONFIG_TABLE, &key, row)
                .map_err(|err| PrecompiledError::new(err.to_string()))?;
            tracing::debug!(%key, "system config updated");
            return Ok((SET_COST, encode_error_code(0).to_vec()));
        }

        if selector == selector_of("getValueByKey(string)") {
            let mut reader = WordReader::new(body);
            let key = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed key"))?;
            let value = ctx
                .state()
                .get_row(SYSTEM_CONFIG_TABLE, &key)
                .map_err(|err| PrecompiledError::new(err.to_string()))?
                .and_then(|row| row.get("value").map(str::to_owned))
                .unwrap_or_default();
            let mut writer = WordWriter::new();
            writer.push_dynamic(value.as_bytes());
            return Ok((GET_COST, writer.into_bytes()));
        }

        Err(PrecompiledError::new("unknown SystemConfig selector"))
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

    fn call(ctx: &BlockContext, signature: &str, body: &[u8]) -> Vec<u8> {
        let mut input = selector_of(signature).to_vec();
        input.extend_from_slice(body);
        SystemConfigPrecompiled
            .call(ctx, &input, Address::ZERO, Address::ZERO)
            .unwrap()
            .1
    }

    #[test]
    fn set_then_get_round_trips() {
        let ctx = genesis_ctx();
        let mut body = WordWriter::new();
        body.push_dynamic(b"tx_count_limit");
        body.push_dynamic(b"1000");
        let result = call(&ctx, "setValueByKey(string,string)", &body.into_bytes());
        assert_eq!(result, encode_error_code(0).to_vec());

        let mut get_body = WordWriter::new();
        get_body.push_dynamic(b"tx_count_limit");
        let got = call(&ctx, "getValueByKey(string)", &get_body.into_bytes());
        assert_eq!(WordReader::new(&got).read_string().as_deref(), Some("1000"));
    }

    #[test]
    fn get_of_unknown_key_returns_empty_string() {
        let ctx = genesis_ctx();
        let mut get_body = WordWriter::new();
        get_body.push_dynamic(b"nope");
        let got = call(&ctx, "getValueByKey(string)", &get_body.into_bytes());
        assert_eq!(WordReader::new(&got).read_string().as_deref(), Some(""));
    }
}
