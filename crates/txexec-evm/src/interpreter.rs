use std::collections::HashSet;

use txexec_context::{BlockContext, CallParameters};
use txexec_executive::{Vm, VmOutcome};
use txexec_host::HostContext;
use txexec_primitives::{keccak256, Address, Bytes, U256};

use crate::gas;
use crate::memory::Memory;
use crate::opcode as op;

/// A stack machine over EVM-shaped bytecode. Unsupported opcodes (anything
/// this catalogue doesn't list, `DELEGATECALL`/`CALLCODE` among them, since
/// the call dispatcher has no notion of "borrowed storage") come back as
/// [`VmOutcome::UndefinedInstruction`] rather than panicking.
pub struct BytecodeInterpreter;

impl Vm for BytecodeInterpreter {
    fn execute(
        &self,
        ctx: &BlockContext,
        host: &mut HostContext<'_>,
        message: &CallParameters,
        code: &Bytes,
    ) -> VmOutcome {
        run(ctx, host, message, code)
    }
}

fn jump_destinations(code: &[u8]) -> HashSet<usize> {
    let mut set = HashSet::new();
    let mut i = 0;
    while i < code.len() {
        let opcode = code[i];
        if opcode == op::JUMPDEST {
            set.insert(i);
            i += 1;
        } else if (op::PUSH1..=op::PUSH32).contains(&opcode) {
            i += 1 + (opcode - op::PUSH1 + 1) as usize;
        } else {
            i += 1;
        }
    }
    set
}

fn as_usize(value: U256) -> Option<usize> {
    let limbs = value.as_limbs();
    if limbs[1] != 0 || limbs[2] != 0 || limbs[3] != 0 {
        return None;
    }
    usize::try_from(limbs[0]).ok()
}

fn address_from_word(value: U256) -> Address {
    let bytes: [u8; 32] = value.to_be_bytes();
    Address::from_slice(&bytes[12..32])
}

fn word_from_address(address: Address) -> U256 {
    let mut bytes = [0u8; 32];
    bytes[12..32].copy_from_slice(address.as_slice());
    U256::from_be_bytes(bytes)
}

#[allow(clippy::too_many_lines)]
pub fn run(ctx: &BlockContext, host: &mut HostContext<'_>, message: &CallParameters, code: &Bytes) -> VmOutcome {
    let code = code.as_ref();
    let destinations = jump_destinations(code);

    let mut stack: Vec<U256> = Vec::with_capacity(32);
    let mut memory = Memory::default();
    let mut gas_left = message.gas;
    let mut pc: usize = 0;
    let mut return_data: Vec<u8> = Vec::new();

    macro_rules! charge {
        ($cost:expr) => {{
            gas_left -= $cost;
            if gas_left < 0 {
                return VmOutcome::OutOfGas;
            }
        }};
    }
    macro_rules! pop {
        () => {
            match stack.pop() {
                Some(value) => value,
                None => return VmOutcome::StackUnderflow,
            }
        };
    }
    macro_rules! pop_usize {
        () => {
            match as_usize(pop!()) {
                Some(value) => value,
                None => return VmOutcome::InvalidMemoryAccess,
            }
        };
    }
    macro_rules! push {
        ($value:expr) => {{
            if stack.len() >= 1024 {
                return VmOutcome::StackOverflow;
            }
            stack.push($value);
        }};
    }

    loop {
        if pc >= code.len() {
            return VmOutcome::Success { gas_left, output: Vec::new() };
        }
        let opcode = code[pc];
        match opcode {
            op::STOP => return VmOutcome::Success { gas_left, output: Vec::new() },

            op::ADD => { charge!(gas::VERYLOW); let (a, b) = (pop!(), pop!()); push!(a.wrapping_add(b)); pc += 1; }
            op::MUL => { charge!(gas::LOW); let (a, b) = (pop!(), pop!()); push!(a.wrapping_mul(b)); pc += 1; }
            op::SUB => { charge!(gas::VERYLOW); let (a, b) = (pop!(), pop!()); push!(a.wrapping_sub(b)); pc += 1; }
            op::DIV => {
                charge!(gas::LOW);
                let (a, b) = (pop!(), pop!());
                push!(if b.is_zero() { U256::ZERO } else { a.wrapping_div(b) });
                pc += 1;
            }
            op::MOD => {
                charge!(gas::LOW);
                let (a, b) = (pop!(), pop!());
                push!(if b.is_zero() { U256::ZERO } else { a.wrapping_rem(b) });
                pc += 1;
            }
            op::EXP => {
                charge!(gas::EXP);
                let (base, exponent) = (pop!(), pop!());
                let significant_bits = 256usize - exponent.leading_zeros() as usize;
                let byte_len = significant_bits.div_ceil(8) as i64;
                charge!(byte_len * gas::EXP_BYTE);
                push!(base.wrapping_pow(exponent));
                pc += 1;
            }
            op::LT => { charge!(gas::VERYLOW); let (a, b) = (pop!(), pop!()); push!(bool_word(a < b)); pc += 1; }
            op::GT => { charge!(gas::VERYLOW); let (a, b) = (pop!(), pop!()); push!(bool_word(a > b)); pc += 1; }
            op::EQ => { charge!(gas::VERYLOW); let (a, b) = (pop!(), pop!()); push!(bool_word(a == b)); pc += 1; }
            op::ISZERO => { charge!(gas::VERYLOW); let a = pop!(); push!(bool_word(a.is_zero())); pc += 1; }
            op::AND => { charge!(gas::VERYLOW); let (a, b) = (pop!(), pop!()); push!(a & b); pc += 1; }
            op::OR => { charge!(gas::VERYLOW); let (a, b) = (pop!(), pop!()); push!(a | b); pc += 1; }
            op::XOR => { charge!(gas::VERYLOW); let (a, b) = (pop!(), pop!()); push!(a ^ b); pc += 1; }
            op::NOT => { charge!(gas::VERYLOW); let a = pop!(); push!(!a); pc += 1; }
            op::BYTE => {
                charge!(gas::VERYLOW);
                let (index, value) = (pop!(), pop!());
                let bytes = value.to_be_bytes::<32>();
                let result = as_usize(index).filter(|&i| i < 32).map(|i| bytes[i]).unwrap_or(0);
                push!(U256::from(result));
                pc += 1;
            }
            op::SHL => {
                charge!(gas::VERYLOW);
                let (shift, value) = (pop!(), pop!());
                push!(as_usize(shift).filter(|&s| s < 256).map(|s| value.wrapping_shl(s)).unwrap_or(U256::ZERO));
                pc += 1;
            }
            op::SHR => {
                charge!(gas::VERYLOW);
                let (shift, value) = (pop!(), pop!());
                push!(as_usize(shift).filter(|&s| s < 256).map(|s| value.wrapping_shr(s)).unwrap_or(U256::ZERO));
                pc += 1;
            }

            op::KECCAK256 => {
                charge!(gas::KECCAK256);
                let offset = pop_usize!();
                let len = pop_usize!();
                charge!(memory.charge_expansion(offset, len));
                charge!(len.div_ceil(32) as i64 * gas::KECCAK256_WORD);
                let data = memory.slice(offset, len);
                push!(U256::from_be_bytes(keccak256(data).0));
                pc += 1;
            }

            op::ADDRESS => { charge!(gas::BASE); push!(word_from_address(host.contract_address())); pc += 1; }
            op::BALANCE => {
                charge!(gas::BALANCE);
                let address = address_from_word(pop!());
                push!(host.balance(address));
                pc += 1;
            }
            op::ORIGIN => { charge!(gas::BASE); push!(word_from_address(message.origin)); pc += 1; }
            op::CALLER => { charge!(gas::BASE); push!(word_from_address(message.sender_address)); pc += 1; }
            op::CALLVALUE => { charge!(gas::BASE); push!(U256::ZERO); pc += 1; }
            op::CALLDATALOAD => {
                charge!(gas::VERYLOW);
                let offset = pop_usize!();
                let mut buf = [0u8; 32];
                let data = message.data.as_ref();
                for (i, slot) in buf.iter_mut().enumerate() {
                    if let Some(&byte) = data.get(offset + i) {
                        *slot = byte;
                    }
                }
                push!(U256::from_be_bytes(buf));
                pc += 1;
            }
            op::CALLDATASIZE => { charge!(gas::BASE); push!(U256::from(message.data.len())); pc += 1; }
            op::CALLDATACOPY => {
                charge!(gas::VERYLOW);
                let dest = pop_usize!();
                let offset = pop_usize!();
                let len = pop_usize!();
                charge!(memory.charge_expansion(dest, len));
                charge!(len.div_ceil(32) as i64 * gas::COPY_WORD);
                let data = copy_window(message.data.as_ref(), offset, len);
                memory.store(dest, &data);
                pc += 1;
            }
            op::CODESIZE => { charge!(gas::BASE); push!(U256::from(code.len())); pc += 1; }
            op::CODECOPY => {
                charge!(gas::VERYLOW);
                let dest = pop_usize!();
                let offset = pop_usize!();
                let len = pop_usize!();
                charge!(memory.charge_expansion(dest, len));
                charge!(len.div_ceil(32) as i64 * gas::COPY_WORD);
                let data = copy_window(code, offset, len);
                memory.store(dest, &data);
                pc += 1;
            }
            op::GASPRICE => { charge!(gas::BASE); push!(U256::ZERO); pc += 1; }
            op::EXTCODESIZE => {
                charge!(gas::EXTCODESIZE);
                let address = address_from_word(pop!());
                push!(U256::from(host.code_size_at(address)));
                pc += 1;
            }
            op::EXTCODECOPY => {
                charge!(gas::EXTCODESIZE);
                let address = address_from_word(pop!());
                let dest = pop_usize!();
                let offset = pop_usize!();
                let len = pop_usize!();
                charge!(memory.charge_expansion(dest, len));
                charge!(len.div_ceil(32) as i64 * gas::COPY_WORD);
                let data = copy_window(host.code_at(address).as_ref(), offset, len);
                memory.store(dest, &data);
                pc += 1;
            }
            op::RETURNDATASIZE => { charge!(gas::BASE); push!(U256::from(return_data.len())); pc += 1; }
            op::RETURNDATACOPY => {
                charge!(gas::VERYLOW);
                let dest = pop_usize!();
                let offset = pop_usize!();
                let len = pop_usize!();
                if offset + len > return_data.len() {
                    return VmOutcome::InvalidMemoryAccess;
                }
                charge!(memory.charge_expansion(dest, len));
                memory.store(dest, &return_data[offset..offset + len]);
                pc += 1;
            }
            op::EXTCODEHASH => {
                charge!(gas::EXTCODEHASH);
                let address = address_from_word(pop!());
                push!(U256::from_be_bytes(host.code_hash_at(address).0));
                pc += 1;
            }
            op::BLOCKHASH => {
                charge!(gas::BLOCKHASH);
                let number = pop_usize!() as u64;
                push!(U256::from_be_bytes(host.block_hash(number).0));
                pc += 1;
            }
            op::COINBASE => { charge!(gas::BASE); push!(U256::ZERO); pc += 1; }
            op::TIMESTAMP => { charge!(gas::BASE); push!(U256::from(ctx.header.timestamp)); pc += 1; }
            op::NUMBER => { charge!(gas::BASE); push!(U256::from(ctx.header.number)); pc += 1; }
            op::GASLIMIT => { charge!(gas::BASE); push!(U256::from(ctx.tx_gas_limit)); pc += 1; }
            op::CHAINID => { charge!(gas::BASE); push!(U256::ZERO); pc += 1; }
            op::SELFBALANCE => { charge!(gas::LOW); push!(host.balance(host.contract_address())); pc += 1; }

            op::POP => { charge!(gas::BASE); pop!(); pc += 1; }
            op::MLOAD => {
                charge!(gas::VERYLOW);
                let offset = pop_usize!();
                charge!(memory.charge_expansion(offset, 32));
                push!(U256::from_be_bytes(memory.load32(offset)));
                pc += 1;
            }
            op::MSTORE => {
                charge!(gas::VERYLOW);
                let offset = pop_usize!();
                let value = pop!();
                charge!(memory.charge_expansion(offset, 32));
                memory.store(offset, &value.to_be_bytes::<32>());
                pc += 1;
            }
            op::MSTORE8 => {
                charge!(gas::VERYLOW);
                let offset = pop_usize!();
                let value = pop!();
                charge!(memory.charge_expansion(offset, 1));
                memory.store(offset, &[value.to_be_bytes::<32>()[31]]);
                pc += 1;
            }
            op::SLOAD => {
                charge!(gas::SLOAD);
                let key = pop!();
                push!(host.store(key));
                pc += 1;
            }
            op::SSTORE => {
                if message.static_call {
                    return VmOutcome::StaticModeViolation;
                }
                let key = pop!();
                let value = pop!();
                let was_zero = host.store(key).is_zero();
                charge!(if was_zero && !value.is_zero() { gas::SSTORE_SET } else { gas::SSTORE_RESET });
                host.set_store(key, value);
                pc += 1;
            }
            op::JUMP => {
                charge!(gas::MID);
                let dest = pop_usize!();
                if !destinations.contains(&dest) {
                    return VmOutcome::BadJumpDestination;
                }
                pc = dest;
            }
            op::JUMPI => {
                charge!(HIGH_JUMPI);
                let dest = pop_usize!();
                let condition = pop!();
                if condition.is_zero() {
                    pc += 1;
                } else {
                    if !destinations.contains(&dest) {
                        return VmOutcome::BadJumpDestination;
                    }
                    pc = dest;
                }
            }
            op::PC => { charge!(gas::BASE); push!(U256::from(pc)); pc += 1; }
            op::MSIZE => { charge!(gas::BASE); push!(U256::from(memory.len())); pc += 1; }
            op::GAS => { charge!(gas::BASE); push!(U256::from(gas_left.max(0) as u64)); pc += 1; }
            op::JUMPDEST => { charge!(gas::JUMPDEST); pc += 1; }

            op::PUSH0 => { charge!(gas::BASE); push!(U256::ZERO); pc += 1; }
            n if (op::PUSH1..=op::PUSH32).contains(&n) => {
                charge!(gas::VERYLOW);
                let width = (n - op::PUSH1 + 1) as usize;
                let start = pc + 1;
                let end = (start + width).min(code.len());
                let mut buf = [0u8; 32];
                let slice = &code[start..end];
                buf[32 - width..32 - width + slice.len()].copy_from_slice(slice);
                push!(U256::from_be_bytes(buf));
                pc = start + width;
            }
            n if (op::DUP1..=op::DUP16).contains(&n) => {
                charge!(gas::VERYLOW);
                let depth = (n - op::DUP1 + 1) as usize;
                if stack.len() < depth {
                    return VmOutcome::StackUnderflow;
                }
                let value = stack[stack.len() - depth];
                push!(value);
                pc += 1;
            }
            n if (op::SWAP1..=op::SWAP16).contains(&n) => {
                charge!(gas::VERYLOW);
                let depth = (n - op::SWAP1 + 1) as usize;
                let len = stack.len();
                if len <= depth {
                    return VmOutcome::StackUnderflow;
                }
                stack.swap(len - 1, len - 1 - depth);
                pc += 1;
            }
            n if (op::LOG0..=op::LOG4).contains(&n) => {
                if message.static_call {
                    return VmOutcome::StaticModeViolation;
                }
                let topic_count = (n - op::LOG0) as usize;
                charge!(gas::LOG + gas::LOG_TOPIC * topic_count as i64);
                let offset = pop_usize!();
                let len = pop_usize!();
                charge!(memory.charge_expansion(offset, len));
                charge!(gas::LOG_DATA * len as i64);
                let mut topics = Vec::with_capacity(topic_count);
                for _ in 0..topic_count {
                    topics.push(txexec_primitives::B256::from(pop!().to_be_bytes::<32>()));
                }
                let data = memory.slice(offset, len);
                host.log(topics, Bytes::from(data));
                pc += 1;
            }

            op::CREATE | op::CREATE2 => {
                if message.static_call {
                    return VmOutcome::StaticModeViolation;
                }
                charge!(gas::CREATE);
                pop!(); // value: no native value transfer in this execution model
                let offset = pop_usize!();
                let len = pop_usize!();
                let salt = if opcode == op::CREATE2 { Some(pop!()) } else { None };
                charge!(memory.charge_expansion(offset, len));
                let init_code = Bytes::from(memory.slice(offset, len));
                let salt = salt.map(|word| txexec_primitives::B256::from(word.to_be_bytes::<32>()));
                let result = host.create(init_code, salt, gas_left);
                gas_left = result.gas;
                if result.status.is_success() {
                    push!(result.new_evm_contract_address.map(word_from_address).unwrap_or(U256::ZERO));
                } else {
                    push!(U256::ZERO);
                }
                return_data = result.data.to_vec();
                pc += 1;
            }

            op::CALL | op::STATICCALL => {
                let call_gas = pop_usize!() as i64;
                let address = address_from_word(pop!());
                if opcode == op::CALL {
                    pop!(); // value: asset transfer goes through the asset precompile, not native value
                }
                let args_offset = pop_usize!();
                let args_len = pop_usize!();
                let ret_offset = pop_usize!();
                let ret_len = pop_usize!();
                charge!(gas::CALL);
                charge!(memory.charge_expansion(args_offset, args_len));
                charge!(memory.charge_expansion(ret_offset, ret_len));
                let call_data = Bytes::from(memory.slice(args_offset, args_len));
                let static_call = message.static_call || opcode == op::STATICCALL;
                let params = CallParameters::message(
                    host.contract_address(),
                    address,
                    address,
                    message.origin,
                    call_data,
                    call_gas.min(gas_left),
                    static_call,
                    false,
                );
                let result = host.call(params);
                gas_left -= call_gas.min(gas_left) - result.gas;
                push!(bool_word(result.status.is_success()));
                let data = result.data.to_vec();
                let copy_len = ret_len.min(data.len());
                if copy_len > 0 {
                    memory.store(ret_offset, &data[..copy_len]);
                }
                return_data = data;
                pc += 1;
            }

            op::RETURN => {
                let offset = pop_usize!();
                let len = pop_usize!();
                charge!(memory.charge_expansion(offset, len));
                return VmOutcome::Success { gas_left, output: memory.slice(offset, len) };
            }
            op::REVERT => {
                let offset = pop_usize!();
                let len = pop_usize!();
                charge!(memory.charge_expansion(offset, len));
                return VmOutcome::Revert { gas_left, output: memory.slice(offset, len) };
            }
            op::INVALID => return VmOutcome::Invalid,
            op::SELFDESTRUCT => {
                if message.static_call {
                    return VmOutcome::StaticModeViolation;
                }
                charge!(gas::SELFDESTRUCT);
                let beneficiary = address_from_word(pop!());
                host.suicide(host.contract_address());
                let _ = beneficiary; // no native balance to sweep in this execution model
                return VmOutcome::Success { gas_left, output: Vec::new() };
            }

            _ => return VmOutcome::UndefinedInstruction,
        }
    }
}

const HIGH_JUMPI: i64 = gas::HIGH;

fn bool_word(value: bool) -> U256 {
    if value { U256::from(1u64) } else { U256::ZERO }
}

fn copy_window(source: &[u8], offset: usize, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    let end = (offset + len).min(source.len());
    if offset < end {
        out[..end - offset].copy_from_slice(&source[offset..end]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use txexec_context::BlockContextConfig;
    use txexec_host::CallDispatcher;
    use txexec_primitives::B256;
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

    fn genesis_ctx() -> BlockContext {
        let layer = StateStorageLayer::genesis(0, Arc::new(InMemoryBackend::new()));
        BlockContext::genesis(&BlockContextConfig::default(), layer, HashMap::new(), HashMap::new())
    }

    fn run_code(ctx: &BlockContext, code: &[u8], gas: i64) -> VmOutcome {
        let dispatcher: Arc<dyn CallDispatcher> = Arc::new(NoopDispatcher);
        let mut host = HostContext::new(ctx, Address::repeat_byte(9), dispatcher);
        let message = CallParameters::message(
            Address::repeat_byte(1),
            Address::repeat_byte(9),
            Address::repeat_byte(9),
            Address::repeat_byte(1),
            Bytes::new(),
            gas,
            false,
            false,
        );
        run(ctx, &mut host, &message, &Bytes::copy_from_slice(code))
    }

    #[test]
    fn push_add_return_yields_the_sum() {
        let ctx = genesis_ctx();
        // PUSH1 2, PUSH1 3, ADD, PUSH1 0, MSTORE, PUSH1 32, PUSH1 0, RETURN
        let code = [
            0x60, 0x02, 0x60, 0x03, 0x01, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3,
        ];
        match run_code(&ctx, &code, 100_000) {
            VmOutcome::Success { output, .. } => {
                let mut expected = [0u8; 32];
                expected[31] = 5;
                assert_eq!(output, expected);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn sstore_then_sload_round_trips_through_the_host() {
        let ctx = genesis_ctx();
        // PUSH1 7, PUSH1 1, SSTORE, PUSH1 1, SLOAD, PUSH1 0, MSTORE, PUSH1 32, PUSH1 0, RETURN
        let code = [
            0x60, 0x07, 0x60, 0x01, 0x55, 0x60, 0x01, 0x54, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3,
        ];
        match run_code(&ctx, &code, 100_000) {
            VmOutcome::Success { output, .. } => {
                let mut expected = [0u8; 32];
                expected[31] = 7;
                assert_eq!(output, expected);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn jump_to_a_non_jumpdest_is_rejected() {
        let ctx = genesis_ctx();
        // PUSH1 4, JUMP, STOP, STOP (destination 4 is not a JUMPDEST)
        let code = [0x60, 0x04, 0x56, 0x00, 0x00];
        assert!(matches!(run_code(&ctx, &code, 100_000), VmOutcome::BadJumpDestination));
    }

    #[test]
    fn running_out_of_gas_stops_execution() {
        let ctx = genesis_ctx();
        let code = [0x60, 0x02, 0x60, 0x03, 0x01, 0x00];
        assert!(matches!(run_code(&ctx, &code, 1), VmOutcome::OutOfGas));
    }

    #[test]
    fn an_undefined_opcode_is_reported_distinctly() {
        let ctx = genesis_ctx();
        let code = [0x0c]; // unassigned opcode
        assert!(matches!(run_code(&ctx, &code, 100_000), VmOutcome::UndefinedInstruction));
    }

    #[test]
    fn revert_carries_its_output_and_a_revert_status() {
        let ctx = genesis_ctx();
        // PUSH1 0, PUSH1 0, REVERT
        let code = [0x60, 0x00, 0x60, 0x00, 0xfd];
        match run_code(&ctx, &code, 100_000) {
            VmOutcome::Revert { output, .. } => assert!(output.is_empty()),
            other => panic!("expected revert, got {other:?}"),
        }
    }
}
