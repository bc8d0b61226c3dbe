use txexec_abi::{encode_error_code, selector_of, split_selector};
use txexec_context::{BlockContext, Precompiled, PrecompiledError};
use txexec_primitives::Address;
use txexec_state::Entry;

use crate::words::WordReader;

/// Reserved table recording which `(contract, selector)` pairs the DAG
/// planner may schedule concurrently.
pub const PARALLEL_CONFIG_TABLE: &str = "_sys_parallel_config_";

const WRITE_COST: i64 = 5_000;

fn config_key(contract: Address, function_selector: u32) -> String {
    format!("{contract}:{function_selector:08x}")
}

/// `0x1006`: registers which functions of a contract are safe to run
/// concurrently, and what argument position carries the conflict key.
pub struct ParallelConfigPrecompiled;

impl Precompiled for ParallelConfigPrecompiled {
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

        if selector == selector_of("registerParallelFunction(address,string,uint256)") {
            let contract = reader.read_address().ok_or_else(|| PrecompiledError::new("malformed address"))?;
            let function_signature = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed signature"))?;
            let conflict_argument = reader.read_u256().ok_or_else(|| PrecompiledError::new("malformed argument index"))?;
            let function_selector = u32::from_be_bytes(
                selector_of(&function_signature),
            );
            let mut row = Entry::new();
            row.set("conflict_argument", conflict_argument.to_string());
            ctx.state()
                .set_row(PARALLEL_CONFIG_TABLE, &config_key(contract, function_selector), row)
                .map_err(|err| PrecompiledError::new(err.to_string()))?;
            return Ok((WRITE_COST, encode_error_code(0).to_vec()));
        }

        if selector == selector_of("unregisterParallelFunction(address,string)") {
            let contract = reader.read_address().ok_or_else(|| PrecompiledError::new("malformed address"))?;
            let function_signature = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed signature"))?;
            let function_selector = u32::from_be_bytes(selector_of(&function_signature));
            ctx.state()
                .remove_row(PARALLEL_CONFIG_TABLE, &config_key(contract, function_selector))
                .map_err(|err| PrecompiledError::new(err.to_string()))?;
            return Ok((WRITE_COST, encode_error_code(0).to_vec()));
        }

        Err(PrecompiledError::new("unknown ParallelConfig selector"))
    }
}
