//! The native-contract catalogue: fixed system contracts addressed
//! `0x1000..`, dispatched by selector the same way a VM-executed contract
//! would be, but running as plain Rust instead of interpreted bytecode.
//!
//! [`constant_catalogue`] builds the map a [`txexec_context::BlockContext`]
//! is constructed with; `table_factory`/`kvtable` additionally mint
//! *dynamic* per-table handles at runtime through
//! [`txexec_context::PrecompiledRegistry::register_precompiled`].

pub mod addresses;
mod cns;
mod consensus;
mod contract_auth;
mod crud;
mod crypto;
mod deploy_wasm;
mod file_system;
mod kvtable;
mod parallel_config;
mod permission;
mod system_config;
mod table_factory;
mod words;

use std::collections::HashMap;
use std::sync::Arc;

use txexec_context::Precompiled;
use txexec_primitives::Address;

pub use cns::{CnsPrecompiled, CNS_TABLE};
pub use consensus::{ConsensusPrecompiled, CONSENSUS_TABLE};
pub use contract_auth::{is_call_authorized, ContractAuthPrecompiled, CONTRACT_AUTH_TABLE};
pub use crud::CrudPrecompiled;
pub use crypto::CryptoPrecompiled;
pub use deploy_wasm::{DeployWasmPrecompiled, WASM_DEPLOY_TABLE};
pub use file_system::{FileSystemPrecompiled, BFS_TABLE};
pub use kvtable::{KvTableFactoryPrecompiled, KvTablePrecompiled};
pub use parallel_config::{ParallelConfigPrecompiled, PARALLEL_CONFIG_TABLE};
pub use permission::{has_write_access, PermissionPrecompiled, PERMISSION_TABLE};
pub use system_config::{SystemConfigPrecompiled, SYSTEM_CONFIG_TABLE};
pub use table_factory::{TableFactoryPrecompiled, TablePrecompiled};
pub use words::{WordReader, WordWriter};

/// The full fixed-address catalogue, ready to hand to
/// [`txexec_context::BlockContext::new`]/`genesis`.
pub fn constant_catalogue() -> HashMap<Address, Arc<dyn Precompiled>> {
    let mut catalogue: HashMap<Address, Arc<dyn Precompiled>> = HashMap::new();
    catalogue.insert(addresses::system_config(), Arc::new(SystemConfigPrecompiled));
    catalogue.insert(addresses::table_factory(), Arc::new(TableFactoryPrecompiled));
    catalogue.insert(addresses::crud(), Arc::new(CrudPrecompiled));
    catalogue.insert(addresses::consensus(), Arc::new(ConsensusPrecompiled));
    catalogue.insert(addresses::cns(), Arc::new(CnsPrecompiled));
    catalogue.insert(addresses::parallel_config(), Arc::new(ParallelConfigPrecompiled));
    catalogue.insert(addresses::file_system(), Arc::new(FileSystemPrecompiled));
    catalogue.insert(addresses::contract_auth(), Arc::new(ContractAuthPrecompiled));
    catalogue.insert(addresses::kv_table_factory(), Arc::new(KvTableFactoryPrecompiled));
    catalogue.insert(addresses::crypto(), Arc::new(CryptoPrecompiled));
    catalogue.insert(addresses::deploy_wasm(), Arc::new(DeployWasmPrecompiled));
    catalogue.insert(addresses::permission(), Arc::new(PermissionPrecompiled));
    catalogue
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_catalogue_covers_every_reserved_address() {
        let catalogue = constant_catalogue();
        assert_eq!(catalogue.len(), 12);
        assert!(catalogue.contains_key(&addresses::system_config()));
        assert!(catalogue.contains_key(&addresses::permission()));
    }
}
