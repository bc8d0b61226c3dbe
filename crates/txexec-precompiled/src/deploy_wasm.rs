use txexec_abi::{encode_error_code, selector_of, split_selector};
use txexec_context::{BlockContext, Precompiled, PrecompiledError};
use txexec_primitives::Address;
use txexec_state::Entry;

use crate::words::WordReader;

/// Reserved table recording which addresses were deployed from wasm
/// bytecode, consulted by the dispatcher when deciding whether a CALL's
/// target needs gas metering rather than straight EVM execution.
pub const WASM_DEPLOY_TABLE: &str = "_sys_wasm_deploy_";

const WRITE_COST: i64 = 5_000;
const READ_COST: i64 = 200;

/// `0x100b`: lets a wasm contract register itself so later calls are known
/// to need gas-injected bytecode, recorded explicitly in its own reserved
/// table rather than derived from a directory entry type (see DESIGN.md).
pub struct DeployWasmPrecompiled;

impl Precompiled for DeployWasmPrecompiled {
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

        if selector == selector_of("registerWasmContract(address)") {
            let contract = reader.read_address().ok_or_else(|| PrecompiledError::new("malformed address"))?;
            let mut row = Entry::new();
            row.set("wasm", "true");
            ctx.state()
                .set_row(WASM_DEPLOY_TABLE, &contract.to_string(), row)
                .map_err(|err| PrecompiledError::new(err.to_string()))?;
            return Ok((WRITE_COST, encode_error_code(0).to_vec()));
        }

        if selector == selector_of("isWasmContract(address)") {
            let contract = reader.read_address().ok_or_else(|| PrecompiledError::new("malformed address"))?;
            let is_wasm = ctx
                .state()
                .get_row(WASM_DEPLOY_TABLE, &contract.to_string())
                .map_err(|err| PrecompiledError::new(err.to_string()))?
                .is_some();
            return Ok((READ_COST, encode_error_code(is_wasm as i64).to_vec()));
        }

        Err(PrecompiledError::new("unknown DeployWasm selector"))
    }
}
