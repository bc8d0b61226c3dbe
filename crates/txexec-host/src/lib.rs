//! Per-frame host interface exposed to the VM: storage, balance, code,
//! logs, sub-calls, and table-driven asset bookkeeping.

mod accounts;
mod asset;
mod dispatcher;
mod host_context;

pub use accounts::{ACCOUNTS_TABLE, CODE_TABLE};
pub use asset::{AssetError, ASSET_INFO_TABLE};
pub use dispatcher::CallDispatcher;
pub use host_context::HostContext;

pub mod account_ops {
    //! Free functions over the reserved account/code/storage tables, for
    //! callers that need them without a full `HostContext` (e.g. the
    //! executive's CREATE path, which writes code before any `HostContext`
    //! for the new contract exists).
    pub use crate::accounts::{
        account_exists, balance_of, code_hash_of, code_of, is_frozen, next_nonce, nonce_of,
        set_balance, set_code, storage_get, storage_set, suicide,
    };
}
