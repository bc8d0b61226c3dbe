use std::sync::{Arc, Mutex};

use txexec_context::{BlockContext, CallParameters, TransactionInput};
use txexec_host::CallDispatcher;

use crate::dispatch;
use crate::vm::Vm;

/// The call machine's lifecycle. `AwaitingExternalReturn` and
/// [`Executive::push_message`] describe a real suspend/resume round trip
/// with a scheduler; this crate's own [`crate::SyncCallDispatcher`] never
/// needs them because it resolves sub-calls in-process instead (see
/// DESIGN.md's Open Question note), but the API is faithful to the protocol
/// for a scheduler that does drive frames across a real suspension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutiveState {
    Idle,
    Executing,
    AwaitingExternalReturn,
    Finished,
}

/// One call frame, addressed by `(context_id, seq)` in a [`BlockContext`]'s
/// `ExecutiveDirectory`.
pub struct Executive {
    pub context_id: u64,
    pub seq: u64,
    state: Mutex<ExecutiveState>,
}

impl Executive {
    pub fn new(context_id: u64, seq: u64) -> Self {
        Self {
            context_id,
            seq,
            state: Mutex::new(ExecutiveState::Idle),
        }
    }

    pub fn state(&self) -> ExecutiveState {
        *self.state.lock().expect("lock poisoned")
    }

    fn transition(&self, next: ExecutiveState) {
        *self.state.lock().expect("lock poisoned") = next;
    }

    /// Runs `input` to completion, returning its `Finished`/`Revert`
    /// outcome. Takes a state-layer savepoint up front and rolls back to it
    /// unless the frame finishes successfully.
    pub fn start(
        &self,
        ctx: &BlockContext,
        input: TransactionInput,
        vm: &dyn Vm,
        dispatcher: Arc<dyn CallDispatcher>,
    ) -> CallParameters {
        assert_eq!(self.state(), ExecutiveState::Idle, "executive already started");
        self.transition(ExecutiveState::Executing);
        let result = dispatch::run(ctx, &input, vm, dispatcher);
        self.transition(ExecutiveState::Finished);
        result
    }

    /// Resumes a frame a scheduler suspended after yielding an external-call
    /// message. Not exercised by [`crate::SyncCallDispatcher`]; kept for a
    /// scheduler that drives the suspend/resume protocol itself.
    pub fn push_message(&self, _message: CallParameters) {
        assert_eq!(
            self.state(),
            ExecutiveState::AwaitingExternalReturn,
            "push_message outside of a suspended frame"
        );
        self.transition(ExecutiveState::Executing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_executive_starts_idle() {
        let executive = Executive::new(1, 0);
        assert_eq!(executive.state(), ExecutiveState::Idle);
    }

    #[test]
    #[should_panic(expected = "already started")]
    fn starting_twice_panics() {
        use std::sync::Arc;
        use txexec_context::{BlockContextConfig, CallParameters};
        use txexec_primitives::{Address, Bytes, B256};
        use txexec_state::{InMemoryBackend, StateStorageLayer};

        struct NoopDispatcher;
        impl CallDispatcher for NoopDispatcher {
            fn call(&self, params: CallParameters) -> CallParameters {
                params.finish(0)
            }
            fn create(&self, _sender: Address, _init_code: Bytes, _salt: Option<B256>, gas: i64) -> CallParameters {
                CallParameters::message(Address::ZERO, Address::ZERO, Address::ZERO, Address::ZERO, Bytes::new(), gas, false, true)
                    .finish(gas)
            }
        }
        struct NoopVm;
        impl Vm for NoopVm {
            fn execute(
                &self,
                _ctx: &BlockContext,
                _host: &mut txexec_host::HostContext,
                message: &CallParameters,
                _code: &Bytes,
            ) -> crate::vm::VmOutcome {
                crate::vm::VmOutcome::Success { gas_left: message.gas, output: vec![] }
            }
        }

        let layer = StateStorageLayer::genesis(0, Arc::new(InMemoryBackend::new()));
        let ctx = BlockContext::genesis(
            &BlockContextConfig::default(),
            layer,
            std::collections::HashMap::new(),
            std::collections::HashMap::new(),
        );
        let executive = Executive::new(1, 0);
        let input = TransactionInput {
            tx_hash: None,
            from: Address::repeat_byte(1),
            to: Some(Address::repeat_byte(2)),
            input: Bytes::new(),
            gas: 1_000_000,
            origin: Address::repeat_byte(1),
            create_salt: None,
            static_call: false,
        };
        let _ = executive.start(&ctx, input.clone(), &NoopVm, Arc::new(NoopDispatcher));
        let _ = executive.start(&ctx, input, &NoopVm, Arc::new(NoopDispatcher));
    }
}
