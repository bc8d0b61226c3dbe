use txexec_context::CallParameters;
use txexec_primitives::{Address, Bytes, B256};

/// The seam between a [`crate::HostContext`] and the call machine that owns
/// it. `txexec-executive` implements this and hands an `Arc<dyn
/// CallDispatcher>` to each `HostContext` it constructs, so this crate never
/// needs to depend on the executive crate above it.
///
/// A call is expressed as a full round trip rather than a suspend/resume
/// pair: the dispatcher internally yields an `EXTERNAL_CALL` message to the
/// scheduler and blocks on the owning executive's coroutine channel until
/// the scheduler resumes it; from the host's point of view it is simply a
/// (possibly slow) function call.
pub trait CallDispatcher: Send + Sync {
    /// Runs `params` as a sub-call and returns its outcome as a `Finished`
    /// or `Revert` [`CallParameters`].
    fn call(&self, params: CallParameters) -> CallParameters;

    /// Runs CREATE/CREATE2 with `init_code` and returns its outcome; a
    /// successful result's `new_evm_contract_address` is the deployed
    /// address.
    fn create(
        &self,
        sender: Address,
        init_code: Bytes,
        salt: Option<B256>,
        gas: i64,
    ) -> CallParameters;
}
