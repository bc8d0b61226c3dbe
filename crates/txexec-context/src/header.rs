use serde::{Deserialize, Serialize};
use txexec_primitives::{BlockNumber, B256};

/// The per-block header fields the execution core actually needs; everything
/// about consensus (signatures, sealer list encoding, ...) is the
/// scheduler's concern and never reaches this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: BlockNumber,
    pub timestamp: u64,
    pub version: u32,
    pub gas_limit: u64,
    pub parent_hash: B256,
}

impl BlockHeader {
    pub fn genesis(gas_limit: u64) -> Self {
        Self {
            number: 0,
            timestamp: 0,
            version: 0,
            gas_limit,
            parent_hash: B256::ZERO,
        }
    }
}
