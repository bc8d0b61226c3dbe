use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use txexec_context::{BlockContext, CallParameters, TransactionInput};
use txexec_host::CallDispatcher;
use txexec_primitives::{Address, Bytes, B256};

use crate::executive::Executive;
use crate::vm::Vm;

/// The default, in-process resolution of [`CallDispatcher`]: every sub-call
/// or CREATE spawns a fresh [`Executive`], registers it in the owning
/// [`BlockContext`]'s directory for the duration of the call, and runs it to
/// completion before returning — no real suspend/resume round trip with a
/// scheduler (see DESIGN.md's Open Question note on this).
pub struct SyncCallDispatcher {
    ctx: Arc<BlockContext>,
    vm: Arc<dyn Vm>,
    context_id: u64,
    next_seq: AtomicU64,
    self_weak: Weak<SyncCallDispatcher>,
}

impl SyncCallDispatcher {
    pub fn new(ctx: Arc<BlockContext>, vm: Arc<dyn Vm>, context_id: u64) -> Arc<Self> {
        Arc::new_cyclic(|self_weak| Self {
            ctx,
            vm,
            context_id,
            next_seq: AtomicU64::new(1),
            self_weak: self_weak.clone(),
        })
    }

    fn run_frame(&self, input: TransactionInput) -> CallParameters {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let frame_id = (self.context_id, seq);
        let executive = Arc::new(Executive::new(self.context_id, seq));
        self.ctx.executives().insert(frame_id, executive.clone());
        let self_arc = self.self_weak.upgrade().expect("dispatcher outlived by its own frame");
        let result = executive.start(&self.ctx, input, self.vm.as_ref(), self_arc);
        self.ctx.executives().remove(frame_id);
        result
    }
}

impl CallDispatcher for SyncCallDispatcher {
    fn call(&self, params: CallParameters) -> CallParameters {
        let input = TransactionInput {
            tx_hash: None,
            from: params.sender_address,
            to: Some(params.receive_address),
            input: params.data,
            gas: params.gas,
            origin: params.origin,
            create_salt: None,
            static_call: params.static_call,
        };
        self.run_frame(input)
    }

    fn create(&self, sender: Address, init_code: Bytes, salt: Option<B256>, gas: i64) -> CallParameters {
        let input = TransactionInput {
            tx_hash: None,
            from: sender,
            to: None,
            input: init_code,
            gas,
            origin: sender,
            create_salt: salt,
            static_call: false,
        };
        self.run_frame(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use txexec_context::{BlockContextConfig, ExecutionStatus};
    use txexec_state::{InMemoryBackend, StateStorageLayer};

    struct DeployingVm;
    impl Vm for DeployingVm {
        fn execute(
            &self,
            _ctx: &BlockContext,
            _host: &mut txexec_host::HostContext,
            message: &CallParameters,
            _code: &Bytes,
        ) -> crate::vm::VmOutcome {
            crate::vm::VmOutcome::Success { gas_left: message.gas, output: b"\x60\x00".to_vec() }
        }
    }

    #[test]
    fn dispatcher_create_deploys_through_a_nested_executive() {
        let layer = StateStorageLayer::genesis(0, Arc::new(InMemoryBackend::new()));
        let ctx = Arc::new(BlockContext::genesis(
            &BlockContextConfig::default(),
            layer,
            HashMap::new(),
            HashMap::new(),
        ));
        let dispatcher = SyncCallDispatcher::new(ctx, Arc::new(DeployingVm), 1);
        let result = dispatcher.create(Address::repeat_byte(1), Bytes::from_static(b"\x60\x00"), None, 1_000_000);
        assert_eq!(result.status, ExecutionStatus::None);
        assert!(result.new_evm_contract_address.is_some());
    }

    #[test]
    fn dispatcher_call_recurses_into_a_fresh_frame_per_sub_call() {
        let layer = StateStorageLayer::genesis(0, Arc::new(InMemoryBackend::new()));
        let ctx = Arc::new(BlockContext::genesis(
            &BlockContextConfig::default(),
            layer,
            HashMap::new(),
            HashMap::new(),
        ));
        txexec_host::account_ops::set_code(ctx.state(), Address::repeat_byte(9), &Bytes::from_static(b"\x60\x00"));
        let dispatcher = SyncCallDispatcher::new(ctx, Arc::new(DeployingVm), 1);
        let params = CallParameters::message(
            Address::repeat_byte(1),
            Address::repeat_byte(9),
            Address::repeat_byte(9),
            Address::repeat_byte(1),
            Bytes::new(),
            1_000_000,
            false,
            false,
        );
        let result = dispatcher.call(params);
        assert_eq!(result.status, ExecutionStatus::None);
    }
}
