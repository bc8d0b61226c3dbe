//! Per-block immutable environment shared by every executive in that
//! block: the header, VM schedule constants, the current state layer, the
//! precompiled registry, and the directory used to resume suspended call
//! frames across scheduler round-trips.

mod block_context;
mod executive_directory;
mod header;
mod message;
mod precompiled;
mod schedule;

pub use block_context::{BlockContext, BlockContextConfig, ExecutorConfig, ResumeId};
pub use executive_directory::{ExecutiveDirectory, FrameId};
pub use header::BlockHeader;
pub use message::{CallKind, CallParameters, ExecutionStatus, LogEntry, TransactionInput};
pub use precompiled::{EthereumPrecompiled, Precompiled, PrecompiledError, PrecompiledRegistry};
pub use schedule::Schedule;
