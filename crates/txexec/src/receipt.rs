use txexec_context::{CallParameters, ExecutionStatus, LogEntry};
use txexec_primitives::{Address, Bytes};

/// What `executeTransaction`/`call`/`dagExecuteTransactions` hand back to
/// the scheduler: the externally-relevant projection of a finished
/// [`CallParameters`] frame, not the internal suspend/resume message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMessage {
    pub status: ExecutionStatus,
    pub gas_used: i64,
    pub output: Bytes,
    pub logs: Vec<LogEntry>,
    pub new_contract_address: Option<Address>,
    pub revert_reason: String,
}

impl ExecutionMessage {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// `gas_limit` is the gas the top-level frame was given; `result.gas`
    /// is whatever is left over once the frame finished or reverted.
    pub(crate) fn from_result(gas_limit: i64, result: CallParameters) -> Self {
        Self {
            status: result.status,
            gas_used: (gas_limit - result.gas).max(0),
            output: result.data,
            logs: result.log_entries,
            new_contract_address: result.new_evm_contract_address,
            revert_reason: result.message,
        }
    }
}
