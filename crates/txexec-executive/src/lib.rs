//! The call machine: gas accounting, CREATE/CALL dispatch, the fixed VM
//! result mapping, and the `Executive` suspend/resume state machine.

mod dispatch;
mod executive;
mod gas;
mod sync_dispatcher;
mod vm;

pub use dispatch::run as dispatch;
pub use executive::{Executive, ExecutiveState};
pub use gas::base_gas_required;
pub use sync_dispatcher::SyncCallDispatcher;
pub use vm::{map_vm_outcome, Vm, VmOutcome};
