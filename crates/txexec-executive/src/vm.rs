use txexec_context::{BlockContext, CallParameters, ExecutionStatus};
use txexec_host::HostContext;
use txexec_primitives::Bytes;

/// The raw result a VM back-end reports for one frame, before it's folded
/// into a [`CallParameters`]. The VM itself (interpreter, gas metering,
/// instruction set) is an external collaborator; this crate only consumes
/// its outcome through the [`Vm`] trait.
#[derive(Debug, Clone)]
pub enum VmOutcome {
    Success { gas_left: i64, output: Vec<u8> },
    Revert { gas_left: i64, output: Vec<u8> },
    OutOfGas,
    Failure,
    Invalid,
    UndefinedInstruction,
    BadJumpDestination,
    StackOverflow,
    StackUnderflow,
    InvalidMemoryAccess,
    StaticModeViolation,
    ContractValidationFailure,
    ArgumentOutOfRange,
    WasmUnreachableInstruction,
    InternalError,
}

/// The fixed VM-result mapping: every non-success outcome has exactly one
/// [`ExecutionStatus`].
pub fn map_vm_outcome(outcome: &VmOutcome) -> ExecutionStatus {
    match outcome {
        VmOutcome::Success { .. } => ExecutionStatus::None,
        VmOutcome::Revert { .. } => ExecutionStatus::RevertInstruction,
        VmOutcome::OutOfGas => ExecutionStatus::OutOfGas,
        VmOutcome::Failure | VmOutcome::Invalid | VmOutcome::UndefinedInstruction => {
            ExecutionStatus::BadInstruction
        }
        VmOutcome::BadJumpDestination => ExecutionStatus::BadJumpDestination,
        VmOutcome::StackOverflow => ExecutionStatus::OutOfStack,
        VmOutcome::StackUnderflow => ExecutionStatus::StackUnderflow,
        VmOutcome::InvalidMemoryAccess | VmOutcome::StaticModeViolation | VmOutcome::InternalError => {
            ExecutionStatus::Unknown
        }
        VmOutcome::ContractValidationFailure => ExecutionStatus::WasmValidationFailure,
        VmOutcome::ArgumentOutOfRange => ExecutionStatus::WasmArgumentOutOfRange,
        VmOutcome::WasmUnreachableInstruction => ExecutionStatus::WasmUnreachableInstruction,
    }
}

/// A code-backed frame's execution capability, injected rather than called
/// through a process-wide singleton, for the same reason the precompiled
/// registry is injected rather than global.
pub trait Vm: Send + Sync {
    fn execute(
        &self,
        ctx: &BlockContext,
        host: &mut HostContext,
        message: &CallParameters,
        code: &Bytes,
    ) -> VmOutcome;
}
