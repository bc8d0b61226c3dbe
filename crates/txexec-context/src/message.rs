use txexec_primitives::{Address, Bytes, B256};

/// Immutable input to one execution, as submitted by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionInput {
    /// Present when the scheduler is asking the executor to resolve and run
    /// a pooled transaction by hash; absent for an inlined call.
    pub tx_hash: Option<B256>,
    pub from: Address,
    /// `None` means *create*.
    pub to: Option<Address>,
    pub input: Bytes,
    pub gas: i64,
    pub origin: Address,
    pub create_salt: Option<B256>,
    pub static_call: bool,
}

/// Which leg of the call machine's protocol a [`CallParameters`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// An in-flight message, either the root call or a sub-call request.
    Message,
    /// A frame completed successfully.
    Finished,
    /// A frame completed by reverting.
    Revert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// The 1:1 status a VM/precompiled/dispatch result is mapped to via a fixed
/// VM-result mapping table. `None` means success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStatus {
    #[default]
    None,
    RevertInstruction,
    OutOfGas,
    BadInstruction,
    BadJumpDestination,
    OutOfStack,
    StackUnderflow,
    Unknown,
    WasmValidationFailure,
    WasmArgumentOutOfRange,
    WasmUnreachableInstruction,
    ContractFrozen,
    CallAddressError,
    PrecompiledError,
    NoAuthorized,
}

impl ExecutionStatus {
    pub fn is_success(self) -> bool {
        matches!(self, ExecutionStatus::None)
    }
}

/// The internal message of the call machine; flows in both directions
/// between an executive and the scheduler across suspension points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallParameters {
    pub kind: CallKind,
    pub sender_address: Address,
    pub code_address: Address,
    pub receive_address: Address,
    pub origin: Address,
    pub data: Bytes,
    pub gas: i64,
    pub static_call: bool,
    pub create: bool,
    pub log_entries: Vec<LogEntry>,
    pub message: String,
    pub status: ExecutionStatus,
    pub new_evm_contract_address: Option<Address>,
    pub create_salt: Option<B256>,
}

impl CallParameters {
    /// A bare message frame, before the executive has decided its outcome.
    pub fn message(
        sender_address: Address,
        code_address: Address,
        receive_address: Address,
        origin: Address,
        data: Bytes,
        gas: i64,
        static_call: bool,
        create: bool,
    ) -> Self {
        Self {
            kind: CallKind::Message,
            sender_address,
            code_address,
            receive_address,
            origin,
            data,
            gas,
            static_call,
            create,
            log_entries: Vec::new(),
            message: String::new(),
            status: ExecutionStatus::None,
            new_evm_contract_address: None,
            create_salt: None,
        }
    }

    pub fn finish(mut self, gas_left: i64) -> Self {
        self.kind = CallKind::Finished;
        self.gas = gas_left;
        self.status = ExecutionStatus::None;
        self
    }

    pub fn revert(mut self, status: ExecutionStatus, message: impl Into<String>) -> Self {
        self.kind = CallKind::Revert;
        self.status = status;
        self.message = message.into();
        self
    }
}
