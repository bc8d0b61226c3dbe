use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use thiserror::Error;
use txexec_primitives::Address;

use crate::block_context::BlockContext;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct PrecompiledError(pub String);

impl PrecompiledError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A native contract, addressed like any other but executed directly
/// instead of by a VM. Implementations live in `txexec-precompiled`; this
/// crate only owns the registry they are dispatched through.
pub trait Precompiled: Send + Sync {
    fn call(
        &self,
        ctx: &BlockContext,
        input: &[u8],
        origin: Address,
        sender: Address,
    ) -> Result<(i64, Vec<u8>), PrecompiledError>;
}

/// The small, fixed set of Ethereum-compatible precompiles (`ecrecover`,
/// `sha256`, ...). The execution core treats their actual cryptography as an
/// external VM-backend capability; only the pricer/executor seam lives here,
/// injected at construction so nothing is a process-wide static.
pub trait EthereumPrecompiled: Send + Sync {
    fn cost(&self, input: &[u8]) -> u64;
    fn execute(&self, input: &[u8]) -> Result<Vec<u8>, PrecompiledError>;
}

/// First dynamically-minted address, chosen well clear of both the
/// Ethereum-precompile range (`0x01..=0x09`) and the system catalogue
/// (`0x1000..`) so no live collision is possible.
const DYNAMIC_BASE: u64 = 0x1_0000_0000;

fn address_from_u64(value: u64) -> Address {
    let mut bytes = [0u8; 20];
    bytes[12..20].copy_from_slice(&value.to_be_bytes());
    Address::from(bytes)
}

/// Two maps over precompiled instances: a *constant* one populated once at
/// construction (the system catalogue), and a *dynamic* one minted during a
/// block to hand out live `Table`/`Entry` handles as pseudo-addresses.
pub struct PrecompiledRegistry {
    constant: HashMap<Address, Arc<dyn Precompiled>>,
    ethereum: HashMap<Address, Arc<dyn EthereumPrecompiled>>,
    dynamic: RwLock<HashMap<Address, Arc<dyn Precompiled>>>,
    next_dynamic: AtomicU64,
}

impl PrecompiledRegistry {
    pub fn new(
        constant: HashMap<Address, Arc<dyn Precompiled>>,
        ethereum: HashMap<Address, Arc<dyn EthereumPrecompiled>>,
    ) -> Self {
        Self {
            constant,
            ethereum,
            dynamic: RwLock::new(HashMap::new()),
            next_dynamic: AtomicU64::new(DYNAMIC_BASE),
        }
    }

    /// Mints a fresh address for `instance` and makes it reachable through
    /// [`Self::get_precompiled`] for the rest of the block.
    pub fn register_precompiled(&self, instance: Arc<dyn Precompiled>) -> Address {
        let counter = self.next_dynamic.fetch_add(1, Ordering::SeqCst);
        let address = address_from_u64(counter);
        tracing::debug!(%address, "registered dynamic precompiled");
        self.dynamic
            .write()
            .expect("lock poisoned")
            .insert(address, instance);
        address
    }

    pub fn is_precompiled(&self, address: Address) -> bool {
        self.constant.contains_key(&address)
            || self.dynamic.read().expect("lock poisoned").contains_key(&address)
    }

    pub fn get_precompiled(&self, address: Address) -> Option<Arc<dyn Precompiled>> {
        self.constant.get(&address).cloned().or_else(|| {
            self.dynamic
                .read()
                .expect("lock poisoned")
                .get(&address)
                .cloned()
        })
    }

    pub fn is_ethereum_precompiled(&self, address: Address) -> bool {
        self.ethereum.contains_key(&address)
    }

    pub fn cost_of_precompiled(&self, address: Address, input: &[u8]) -> Option<u64> {
        self.ethereum.get(&address).map(|p| p.cost(input))
    }

    pub fn execute_origin_precompiled(
        &self,
        address: Address,
        input: &[u8],
    ) -> Option<Result<Vec<u8>, PrecompiledError>> {
        self.ethereum.get(&address).map(|p| p.execute(input))
    }

    /// Clears the dynamic map; called at block end. The map is append-only
    /// within a block and cleared once the block is done.
    pub fn clear_dynamic(&self) {
        self.dynamic.write().expect("lock poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;
    impl Precompiled for Echo {
        fn call(
            &self,
            _ctx: &BlockContext,
            input: &[u8],
            _origin: Address,
            _sender: Address,
        ) -> Result<(i64, Vec<u8>), PrecompiledError> {
            Ok((0, input.to_vec()))
        }
    }

    #[test]
    fn dynamic_registration_yields_distinct_retrievable_addresses() {
        let registry = PrecompiledRegistry::new(HashMap::new(), HashMap::new());
        let a1 = registry.register_precompiled(Arc::new(Echo));
        let a2 = registry.register_precompiled(Arc::new(Echo));
        assert_ne!(a1, a2);
        assert!(registry.is_precompiled(a1));
        assert!(registry.get_precompiled(a1).is_some());
    }

    #[test]
    fn clear_dynamic_forgets_prior_registrations() {
        let registry = PrecompiledRegistry::new(HashMap::new(), HashMap::new());
        let addr = registry.register_precompiled(Arc::new(Echo));
        registry.clear_dynamic();
        assert!(!registry.is_precompiled(addr));
    }
}
