use std::sync::Arc;

use txexec_context::{BlockContext, CallParameters};
use txexec_primitives::{Address, BlockNumber, Bytes, B256, U256};

use crate::accounts;
use crate::asset::{self, AssetError};
use crate::dispatcher::CallDispatcher;

/// Per-frame view of the world handed to the VM: storage, balance, code,
/// logs, and sub-calls, all scoped to whichever contract is currently
/// executing.
pub struct HostContext<'a> {
    ctx: &'a BlockContext,
    contract_address: Address,
    dispatcher: Arc<dyn CallDispatcher>,
    log_entries: Vec<txexec_context::LogEntry>,
}

impl<'a> HostContext<'a> {
    pub fn new(
        ctx: &'a BlockContext,
        contract_address: Address,
        dispatcher: Arc<dyn CallDispatcher>,
    ) -> Self {
        Self {
            ctx,
            contract_address,
            dispatcher,
            log_entries: Vec::new(),
        }
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    pub fn store(&self, key: U256) -> U256 {
        accounts::storage_get(self.ctx.state(), self.contract_address, key)
    }

    pub fn set_store(&self, key: U256, value: U256) {
        accounts::storage_set(self.ctx.state(), self.contract_address, key, value);
    }

    pub fn code_at(&self, address: Address) -> Bytes {
        if self.ctx.precompiled().is_precompiled(address) {
            return Bytes::new();
        }
        accounts::code_of(self.ctx.state(), address)
    }

    pub fn code_hash_at(&self, address: Address) -> B256 {
        accounts::code_hash_of(self.ctx.state(), address)
    }

    /// A precompiled address reports size 1, matching how `EXTCODESIZE`
    /// observes the static Ethereum precompiles.
    pub fn code_size_at(&self, address: Address) -> usize {
        if self.ctx.precompiled().is_precompiled(address) {
            1
        } else {
            accounts::code_of(self.ctx.state(), address).len()
        }
    }

    pub fn exists(&self, address: Address) -> bool {
        self.ctx.precompiled().is_precompiled(address) || accounts::account_exists(self.ctx.state(), address)
    }

    pub fn balance(&self, address: Address) -> U256 {
        accounts::balance_of(self.ctx.state(), address)
    }

    /// Schedules `address` for deletion. Balance transfer is intentionally
    /// a no-op here (see DESIGN.md's Open Question note).
    pub fn suicide(&self, address: Address) {
        tracing::debug!(contract = %self.contract_address, target = %address, "suicide scheduled");
        accounts::suicide(self.ctx.state(), address);
    }

    pub fn log(&mut self, topics: Vec<B256>, data: Bytes) {
        self.log_entries.push(txexec_context::LogEntry {
            address: self.contract_address,
            topics,
            data,
        });
    }

    pub fn take_log_entries(&mut self) -> Vec<txexec_context::LogEntry> {
        std::mem::take(&mut self.log_entries)
    }

    pub fn block_hash(&self, number: BlockNumber) -> B256 {
        self.ctx.number_hash(number)
    }

    pub fn call(&self, params: CallParameters) -> CallParameters {
        self.dispatcher.call(params)
    }

    pub fn create(&self, init_code: Bytes, salt: Option<B256>, gas: i64) -> CallParameters {
        self.dispatcher.create(self.contract_address, init_code, salt, gas)
    }

    pub fn asset_balance(&self, asset_name: &str, account: Address) -> U256 {
        asset::balance_of(self.ctx.state(), asset_name, account)
    }

    pub fn asset_register(
        &self,
        asset_name: &str,
        total_supply: U256,
        fungible: bool,
    ) -> Result<(), AssetError> {
        asset::register(self.ctx.state(), asset_name, self.contract_address, total_supply, fungible)
    }

    pub fn asset_transfer(
        &self,
        asset_name: &str,
        to: Address,
        amount: U256,
    ) -> Result<(), AssetError> {
        asset::transfer(self.ctx.state(), asset_name, self.contract_address, to, amount)
    }
}
