use thiserror::Error;
use txexec_primitives::BlockNumber;
use txexec_state::TableError;

/// Errors the façade itself can return, as opposed to the revert statuses
/// an [`crate::ExecutionMessage`] carries for a transaction that ran but
/// failed. These are protocol-level misuse: calling an operation before
/// `nextBlockHeader`, asking about a block number the stack never saw, or
/// a 2PC call that doesn't match the outstanding layer.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("no active block context; call next_block_header first")]
    NoActiveBlock,
    #[error("block {0} has no recorded table state")]
    UnknownBlock(BlockNumber),
    #[error("table error: {0}")]
    Table(#[from] TableError),
}
