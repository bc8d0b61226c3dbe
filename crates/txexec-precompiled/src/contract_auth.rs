use txexec_abi::{encode_error_code, selector_of, split_selector};
use txexec_context::{BlockContext, Precompiled, PrecompiledError};
use txexec_primitives::Address;
use txexec_state::Entry;

use crate::words::WordReader;

/// Reserved table for per-contract deploy/method access control, keyed by
/// `contract:account` (whole-contract grants) or
/// `contract:selector:account` (method-scoped grants).
pub const CONTRACT_AUTH_TABLE: &str = "_sys_contract_auth_";

const WRITE_COST: i64 = 5_000;
const READ_COST: i64 = 200;

fn contract_key(contract: Address, account: Address) -> String {
    format!("{contract}:{account}")
}

fn method_key(contract: Address, function_selector: [u8; 4], account: Address) -> String {
    format!("{contract}:{}:{account}", hex::encode(function_selector))
}

/// `0x1008`: grants/revokes whole-contract or single-method call access.
/// A contract with no grant rows at all is ungoverned, mirroring
/// [`crate::permission::has_write_access`]'s table-level rule.
pub struct ContractAuthPrecompiled;

impl Precompiled for ContractAuthPrecompiled {
    fn call(
        &self,
        ctx: &BlockContext,
        input: &[u8],
        _origin: Address,
        sender: Address,
    ) -> Result<(i64, Vec<u8>), PrecompiledError> {
        let (selector, body) =
            split_selector(input).ok_or_else(|| PrecompiledError::new("call data too short for a selector"))?;
        let mut reader = WordReader::new(body);
        let state = ctx.state();

        if selector == selector_of("setMethodAuth(address,bytes4,address,bool)") {
            let contract = reader.read_address().ok_or_else(|| PrecompiledError::new("malformed contract"))?;
            let function_selector = reader
                .read_bytes32()
                .ok_or_else(|| PrecompiledError::new("malformed selector"))
                .map(|word| [word[28], word[29], word[30], word[31]])?;
            let account = reader.read_address().ok_or_else(|| PrecompiledError::new("malformed account"))?;
            let allow = reader.read_bool().ok_or_else(|| PrecompiledError::new("malformed flag"))?;
            if !is_call_authorized(ctx, contract, None, sender) {
                return Err(PrecompiledError::new("sender is not authorized to manage this contract's access"));
            }
            let key = method_key(contract, function_selector, account);
            if allow {
                state.set_row(CONTRACT_AUTH_TABLE, &key, Entry::new()).map_err(|err| PrecompiledError::new(err.to_string()))?;
            } else {
                state.remove_row(CONTRACT_AUTH_TABLE, &key).map_err(|err| PrecompiledError::new(err.to_string()))?;
            }
            return Ok((WRITE_COST, encode_error_code(0).to_vec()));
        }

        if selector == selector_of("checkMethodAuth(address,bytes4,address)") {
            let contract = reader.read_address().ok_or_else(|| PrecompiledError::new("malformed contract"))?;
            let function_selector = reader
                .read_bytes32()
                .ok_or_else(|| PrecompiledError::new("malformed selector"))
                .map(|word| [word[28], word[29], word[30], word[31]])?;
            let account = reader.read_address().ok_or_else(|| PrecompiledError::new("malformed account"))?;
            let allowed = is_call_authorized(ctx, contract, Some(function_selector), account);
            return Ok((READ_COST, encode_error_code(allowed as i64).to_vec()));
        }

        Err(PrecompiledError::new("unknown ContractAuth selector"))
    }
}

/// Resolution order: a method-scoped grant for `function_selector` (if
/// given) wins; otherwise falls back to a whole-contract grant; a contract
/// with no rows at all under either scope is ungoverned.
pub fn is_call_authorized(
    ctx: &BlockContext,
    contract: Address,
    function_selector: Option<[u8; 4]>,
    account: Address,
) -> bool {
    let prefix = format!("{contract}:");
    let keys = match ctx.state().get_primary_keys(CONTRACT_AUTH_TABLE, None) {
        Ok(keys) => keys,
        Err(_) => return true,
    };
    let governed: Vec<&String> = keys.iter().filter(|key| key.starts_with(&prefix)).collect();
    if governed.is_empty() {
        return true;
    }
    if let Some(selector) = function_selector {
        if governed.iter().any(|key| key.as_str() == method_key(contract, selector, account)) {
            return true;
        }
    }
    governed.iter().any(|key| key.as_str() == contract_key(contract, account))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use txexec_context::BlockContextConfig;
    use txexec_state::{InMemoryBackend, StateStorageLayer};
    use crate::words::WordWriter;

    fn genesis_ctx() -> BlockContext {
        let layer = StateStorageLayer::genesis(0, Arc::new(InMemoryBackend::new()));
        BlockContext::genesis(&BlockContextConfig::default(), layer, HashMap::new(), HashMap::new())
    }

    #[test]
    fn ungoverned_contract_allows_anyone() {
        let ctx = genesis_ctx();
        assert!(is_call_authorized(&ctx, Address::repeat_byte(1), None, Address::repeat_byte(2)));
    }

    #[test]
    fn method_grant_locks_out_everyone_else() {
        let ctx = genesis_ctx();
        let contract = Address::repeat_byte(5);
        let grantee = Address::repeat_byte(6);
        let function_selector = selector_of("transfer(address,uint256)");

        let mut body = WordWriter::new();
        body.push_address(contract);
        body.push_bytes32({
            let mut word = [0u8; 32];
            word[28..32].copy_from_slice(&function_selector);
            word
        });
        body.push_address(grantee);
        body.push_bool(true);
        let mut input = selector_of("setMethodAuth(address,bytes4,address,bool)").to_vec();
        input.extend_from_slice(&body.into_bytes());
        ContractAuthPrecompiled.call(&ctx, &input, Address::ZERO, grantee).unwrap();

        assert!(is_call_authorized(&ctx, contract, Some(function_selector), grantee));
        assert!(!is_call_authorized(&ctx, contract, Some(function_selector), Address::repeat_byte(9)));
    }
}
