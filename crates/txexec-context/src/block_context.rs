use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use txexec_primitives::{keccak256, Address, BlockNumber, B256};
use txexec_state::StateStorageLayer;

use crate::executive_directory::{ExecutiveDirectory, FrameId};
use crate::header::BlockHeader;
use crate::precompiled::{EthereumPrecompiled, Precompiled, PrecompiledRegistry};
use crate::schedule::Schedule;

/// Construction-time configuration for a [`BlockContext`]; deserialisable so
/// the façade can load it from a node config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockContextConfig {
    pub wasm: bool,
    pub tx_gas_limit: u64,
    #[serde(default)]
    pub schedule: Schedule,
}

impl Default for BlockContextConfig {
    fn default() -> Self {
        Self {
            wasm: false,
            tx_gas_limit: 3_000_000_000,
            schedule: Schedule::default(),
        }
    }
}

/// Executor-wide configuration that outlives any one block: worker-pool
/// size and wall-clock budget for the parallel DAG planner, and the node's
/// default [`BlockContextConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default)]
    pub block: BlockContextConfig,
    #[serde(default = "ExecutorConfig::default_dag_workers")]
    pub dag_workers: usize,
    #[serde(default = "ExecutorConfig::default_dag_timeout_ms")]
    pub dag_timeout_ms: u64,
}

impl ExecutorConfig {
    fn default_dag_workers() -> usize {
        4
    }

    fn default_dag_timeout_ms() -> u64 {
        5_000
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            block: BlockContextConfig::default(),
            dag_workers: Self::default_dag_workers(),
            dag_timeout_ms: Self::default_dag_timeout_ms(),
        }
    }
}

/// Per-block, shared-by-every-executive environment: the header, schedule
/// constants, the current state layer, the precompiled registry, and the
/// directory used to resume suspended call frames.
pub struct BlockContext {
    pub header: BlockHeader,
    pub schedule: Schedule,
    pub wasm: bool,
    pub tx_gas_limit: u64,
    state: Arc<StateStorageLayer>,
    precompiled: PrecompiledRegistry,
    executives: ExecutiveDirectory,
    ancestor_hashes: HashMap<BlockNumber, B256>,
}

impl BlockContext {
    pub fn new(
        header: BlockHeader,
        config: &BlockContextConfig,
        state: Arc<StateStorageLayer>,
        constant_precompiled: HashMap<Address, Arc<dyn Precompiled>>,
        ethereum_precompiled: HashMap<Address, Arc<dyn EthereumPrecompiled>>,
        ancestor_hashes: HashMap<BlockNumber, B256>,
    ) -> Self {
        tracing::debug!(number = header.number, wasm = config.wasm, "opening block context");
        Self {
            header,
            schedule: config.schedule.clone(),
            wasm: config.wasm,
            tx_gas_limit: config.tx_gas_limit,
            state,
            precompiled: PrecompiledRegistry::new(constant_precompiled, ethereum_precompiled),
            executives: ExecutiveDirectory::new(),
            ancestor_hashes,
        }
    }

    /// Builds the genesis block's context: an empty state layer, the
    /// supplied precompiled catalogue, and no ancestor hashes (there is no
    /// prior block).
    pub fn genesis(
        config: &BlockContextConfig,
        state: Arc<StateStorageLayer>,
        constant_precompiled: HashMap<Address, Arc<dyn Precompiled>>,
        ethereum_precompiled: HashMap<Address, Arc<dyn EthereumPrecompiled>>,
    ) -> Self {
        Self::new(
            BlockHeader::genesis(config.tx_gas_limit),
            config,
            state,
            constant_precompiled,
            ethereum_precompiled,
            HashMap::new(),
        )
    }

    pub fn state(&self) -> &Arc<StateStorageLayer> {
        &self.state
    }

    pub fn precompiled(&self) -> &PrecompiledRegistry {
        &self.precompiled
    }

    pub fn executives(&self) -> &ExecutiveDirectory {
        &self.executives
    }

    /// Looks up an ancestor block's hash; `number_hash(header.number - 1)`
    /// is `header.parent_hash`; anything further back comes from the
    /// façade-supplied ancestor map. Unknown numbers hash to zero, matching
    /// `BLOCKHASH`'s out-of-range behaviour.
    pub fn number_hash(&self, number: BlockNumber) -> B256 {
        if number + 1 == self.header.number {
            return self.header.parent_hash;
        }
        self.ancestor_hashes.get(&number).copied().unwrap_or(B256::ZERO)
    }

    pub fn hash_bytes(&self, data: impl AsRef<[u8]>) -> B256 {
        keccak256(data)
    }
}

pub type ResumeId = FrameId;
