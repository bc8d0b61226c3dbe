use std::sync::Arc;

use txexec_context::{BlockContext, CallParameters, ExecutionStatus, TransactionInput};
use txexec_host::{account_ops, CallDispatcher, HostContext};

use crate::gas::base_gas_required;
use crate::vm::{map_vm_outcome, Vm, VmOutcome};

/// Runs one top-level or sub-call frame: charges intrinsic gas, routes to
/// CREATE, a precompile, or a code-backed VM frame, and rolls the state
/// layer back to its pre-call savepoint unless the frame finishes
/// successfully.
pub fn run(
    ctx: &BlockContext,
    input: &TransactionInput,
    vm: &dyn Vm,
    dispatcher: Arc<dyn CallDispatcher>,
) -> CallParameters {
    let state = ctx.state();
    let savepoint = state.savepoint();
    let create = input.to.is_none();
    let base_gas = base_gas_required(&ctx.schedule, create, &input.input) as i64;

    let result = if input.gas < base_gas {
        revert_shell(input, ExecutionStatus::OutOfGas, "intrinsic gas exceeds gas limit")
    } else {
        let remaining_gas = input.gas - base_gas;
        if create {
            dispatch_create(ctx, input, remaining_gas, vm, dispatcher)
        } else {
            dispatch_call(ctx, input, remaining_gas, vm, dispatcher)
        }
    };

    if !result.status.is_success() {
        state.rollback(savepoint);
    }
    result
}

fn revert_shell(input: &TransactionInput, status: ExecutionStatus, message: impl Into<String>) -> CallParameters {
    let to = input.to.unwrap_or(input.from);
    CallParameters::message(
        input.from,
        to,
        to,
        input.origin,
        input.input.clone(),
        0,
        input.static_call,
        input.to.is_none(),
    )
    .revert(status, message)
}

fn dispatch_create(
    ctx: &BlockContext,
    input: &TransactionInput,
    remaining_gas: i64,
    vm: &dyn Vm,
    dispatcher: Arc<dyn CallDispatcher>,
) -> CallParameters {
    let state = ctx.state();
    let sender = input.from;
    let nonce = account_ops::next_nonce(state, sender);
    let address = match input.create_salt {
        Some(salt) => txexec_primitives::create2_address(sender, salt, &input.input),
        None => txexec_primitives::create1_address(sender, nonce),
    };

    if account_ops::account_exists(state, address) {
        return revert_shell(input, ExecutionStatus::CallAddressError, "contract address collision");
    }

    let mut message = CallParameters::message(
        sender,
        address,
        address,
        input.origin,
        input.input.clone(),
        remaining_gas,
        input.static_call,
        true,
    );
    message.create_salt = input.create_salt;

    let mut host = HostContext::new(ctx, address, dispatcher);
    let outcome = vm.execute(ctx, &mut host, &message, &input.input);
    match outcome {
        VmOutcome::Success { gas_left, output } => {
            let code_gas = ctx.schedule.create_data_gas as i64 * output.len() as i64;
            if output.len() > ctx.schedule.max_code_size || gas_left < code_gas {
                message.revert(ExecutionStatus::OutOfGas, "deployed code exceeds size or gas budget")
            } else {
                account_ops::set_code(state, address, &output.clone().into());
                let mut finished = message.finish(gas_left - code_gas);
                finished.data = output.into();
                finished.new_evm_contract_address = Some(address);
                finished.log_entries = host.take_log_entries();
                finished
            }
        }
        other => message.revert(map_vm_outcome(&other), "init code execution failed"),
    }
}

fn dispatch_call(
    ctx: &BlockContext,
    input: &TransactionInput,
    remaining_gas: i64,
    vm: &dyn Vm,
    dispatcher: Arc<dyn CallDispatcher>,
) -> CallParameters {
    let state = ctx.state();
    let to = input.to.expect("dispatch_call requires a receiver");
    let message = CallParameters::message(
        input.from,
        to,
        to,
        input.origin,
        input.input.clone(),
        remaining_gas,
        input.static_call,
        false,
    );

    if account_ops::is_frozen(state, to) {
        return message.revert(ExecutionStatus::ContractFrozen, "target contract is frozen");
    }

    if ctx.precompiled().is_ethereum_precompiled(to) {
        let cost = ctx
            .precompiled()
            .cost_of_precompiled(to, &input.input)
            .unwrap_or(u64::MAX) as i64;
        if remaining_gas < cost {
            return message.revert(ExecutionStatus::OutOfGas, "ethereum precompile cost exceeds gas limit");
        }
        return match ctx.precompiled().execute_origin_precompiled(to, &input.input) {
            Some(Ok(output)) => {
                let mut finished = message.finish(remaining_gas - cost);
                finished.data = output.into();
                finished
            }
            Some(Err(err)) => message.revert(ExecutionStatus::PrecompiledError, err.0),
            None => message.revert(ExecutionStatus::CallAddressError, "ethereum precompile vanished"),
        };
    }

    if let Some(precompiled) = ctx.precompiled().get_precompiled(to) {
        return match precompiled.call(ctx, &input.input, input.origin, input.from) {
            Ok((gas_used, output)) => {
                let mut finished = message.finish(remaining_gas - gas_used);
                finished.data = output.into();
                finished
            }
            Err(err) => message.revert(ExecutionStatus::PrecompiledError, err.0),
        };
    }

    let code = account_ops::code_of(state, to);
    if code.is_empty() {
        if !account_ops::account_exists(state, to) {
            return message.revert(ExecutionStatus::CallAddressError, "call to nonexistent account");
        }
        // an existing, codeless account (a plain value transfer target):
        // succeeds trivially, spending no further gas.
        return message.finish(remaining_gas);
    }

    let mut host = HostContext::new(ctx, to, dispatcher);
    let outcome = vm.execute(ctx, &mut host, &message, &code);
    let status = map_vm_outcome(&outcome);
    match outcome {
        VmOutcome::Success { gas_left, output } => {
            let mut finished = message.finish(gas_left);
            finished.data = output.into();
            finished.log_entries = host.take_log_entries();
            finished
        }
        VmOutcome::Revert { gas_left, output } => {
            let mut reverted = message.revert(status, "execution reverted");
            reverted.gas = gas_left;
            reverted.data = output.into();
            reverted
        }
        _ => message.revert(status, "execution failed"),
    }
}
