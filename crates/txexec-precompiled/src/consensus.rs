use txexec_abi::{encode_error_code, selector_of, split_selector};
use txexec_context::{BlockContext, Precompiled, PrecompiledError};
use txexec_primitives::Address;
use txexec_state::Entry;

use crate::words::WordReader;

pub const CONSENSUS_TABLE: &str = "_sys_consensus_";

const WRITE_COST: i64 = 5_000;
/// A sealer demoted to observer while it is the only sealer would stall
/// block production entirely; rejected with this code instead.
const LAST_SEALER_ERROR: i64 = -51_101;

fn is_sealer(ctx: &BlockContext, node_id: &str) -> Result<bool, PrecompiledError> {
    Ok(ctx
        .state()
        .get_row(CONSENSUS_TABLE, node_id)
        .map_err(|err| PrecompiledError::new(err.to_string()))?
        .is_some_and(|row| row.get("type") == Some("sealer")))
}

fn sealer_count(ctx: &BlockContext) -> Result<usize, PrecompiledError> {
    let state = ctx.state();
    let keys = state
        .get_primary_keys(CONSENSUS_TABLE, None)
        .map_err(|err| PrecompiledError::new(err.to_string()))?;
    let mut count = 0;
    for key in keys {
        if let Some(row) = state.get_row(CONSENSUS_TABLE, &key).map_err(|err| PrecompiledError::new(err.to_string()))? {
            if row.get("type") == Some("sealer") {
                count += 1;
            }
        }
    }
    Ok(count)
}

/// `0x1003`: maintains the sealer/observer node list consulted by block
/// production (`addSealer`/`addObserver`/`remove`, keyed by node id).
pub struct ConsensusPrecompiled;

impl Precompiled for ConsensusPrecompiled {
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

        if selector == selector_of("addSealer(string,uint256)") {
            let node_id = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed node id"))?;
            let weight = reader.read_u256().ok_or_else(|| PrecompiledError::new("malformed weight"))?;
            let mut row = Entry::new();
            row.set("type", "sealer");
            row.set("weight", weight.to_string());
            ctx.state()
                .set_row(CONSENSUS_TABLE, &node_id, row)
                .map_err(|err| PrecompiledError::new(err.to_string()))?;
            return Ok((WRITE_COST, encode_error_code(0).to_vec()));
        }

        if selector == selector_of("addObserver(string)") {
            let node_id = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed node id"))?;
            if is_sealer(ctx, &node_id)? && sealer_count(ctx)? <= 1 {
                return Ok((WRITE_COST, encode_error_code(LAST_SEALER_ERROR).to_vec()));
            }
            let mut row = Entry::new();
            row.set("type", "observer");
            row.set("weight", "0");
            ctx.state()
                .set_row(CONSENSUS_TABLE, &node_id, row)
                .map_err(|err| PrecompiledError::new(err.to_string()))?;
            return Ok((WRITE_COST, encode_error_code(0).to_vec()));
        }

        if selector == selector_of("remove(string)") {
            let node_id = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed node id"))?;
            ctx.state()
                .remove_row(CONSENSUS_TABLE, &node_id)
                .map_err(|err| PrecompiledError::new(err.to_string()))?;
            return Ok((WRITE_COST, encode_error_code(0).to_vec()));
        }

        Err(PrecompiledError::new("unknown Consensus selector"))
    }
}
