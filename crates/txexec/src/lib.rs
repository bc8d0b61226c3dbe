//! The executor façade: wires the state stack, precompiled catalogue, VM,
//! and parallel DAG planner into the operations a scheduler drives a block
//! through — `nextBlockHeader`, `executeTransaction`, `call`,
//! `dagExecuteTransactions`, `getTableHashes`, and the `prepare`/`commit`/
//! `rollback`/`reset` two-phase commit boundary.

mod error;
mod executor;
mod receipt;

pub use error::ExecutorError;
pub use executor::Executor;
pub use receipt::ExecutionMessage;

pub use txexec_context::{BlockHeader, ExecutorConfig, TransactionInput};
