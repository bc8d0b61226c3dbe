//! EVM opcode bytes this interpreter recognizes. Anything not listed here
//! falls through to [`crate::interpreter::run`]'s default arm and is
//! reported as [`txexec_executive::VmOutcome::UndefinedInstruction`].

#![allow(dead_code)]

pub(crate) const STOP: u8 = 0x00;
pub(crate) const ADD: u8 = 0x01;
pub(crate) const MUL: u8 = 0x02;
pub(crate) const SUB: u8 = 0x03;
pub(crate) const DIV: u8 = 0x04;
pub(crate) const MOD: u8 = 0x06;
pub(crate) const EXP: u8 = 0x0a;
pub(crate) const LT: u8 = 0x10;
pub(crate) const GT: u8 = 0x11;
pub(crate) const EQ: u8 = 0x14;
pub(crate) const ISZERO: u8 = 0x15;
pub(crate) const AND: u8 = 0x16;
pub(crate) const OR: u8 = 0x17;
pub(crate) const XOR: u8 = 0x18;
pub(crate) const NOT: u8 = 0x19;
pub(crate) const BYTE: u8 = 0x1a;
pub(crate) const SHL: u8 = 0x1b;
pub(crate) const SHR: u8 = 0x1c;
pub(crate) const KECCAK256: u8 = 0x20;
pub(crate) const ADDRESS: u8 = 0x30;
pub(crate) const BALANCE: u8 = 0x31;
pub(crate) const ORIGIN: u8 = 0x32;
pub(crate) const CALLER: u8 = 0x33;
pub(crate) const CALLVALUE: u8 = 0x34;
pub(crate) const CALLDATALOAD: u8 = 0x35;
pub(crate) const CALLDATASIZE: u8 = 0x36;
pub(crate) const CALLDATACOPY: u8 = 0x37;
pub(crate) const CODESIZE: u8 = 0x38;
pub(crate) const CODECOPY: u8 = 0x39;
pub(crate) const GASPRICE: u8 = 0x3a;
pub(crate) const EXTCODESIZE: u8 = 0x3b;
pub(crate) const EXTCODECOPY: u8 = 0x3c;
pub(crate) const RETURNDATASIZE: u8 = 0x3d;
pub(crate) const RETURNDATACOPY: u8 = 0x3e;
pub(crate) const EXTCODEHASH: u8 = 0x3f;
pub(crate) const BLOCKHASH: u8 = 0x40;
pub(crate) const COINBASE: u8 = 0x41;
pub(crate) const TIMESTAMP: u8 = 0x42;
pub(crate) const NUMBER: u8 = 0x43;
pub(crate) const GASLIMIT: u8 = 0x45;
pub(crate) const CHAINID: u8 = 0x46;
pub(crate) const SELFBALANCE: u8 = 0x47;
pub(crate) const POP: u8 = 0x50;
pub(crate) const MLOAD: u8 = 0x51;
pub(crate) const MSTORE: u8 = 0x52;
pub(crate) const MSTORE8: u8 = 0x53;
pub(crate) const SLOAD: u8 = 0x54;
pub(crate) const SSTORE: u8 = 0x55;
pub(crate) const JUMP: u8 = 0x56;
pub(crate) const JUMPI: u8 = 0x57;
pub(crate) const PC: u8 = 0x58;
pub(crate) const MSIZE: u8 = 0x59;
pub(crate) const GAS: u8 = 0x5a;
pub(crate) const JUMPDEST: u8 = 0x5b;
pub(crate) const PUSH0: u8 = 0x5f;
pub(crate) const PUSH1: u8 = 0x60;
pub(crate) const PUSH32: u8 = 0x7f;
pub(crate) const DUP1: u8 = 0x80;
pub(crate) const DUP16: u8 = 0x8f;
pub(crate) const SWAP1: u8 = 0x90;
pub(crate) const SWAP16: u8 = 0x9f;
pub(crate) const LOG0: u8 = 0xa0;
pub(crate) const LOG4: u8 = 0xa4;
pub(crate) const CREATE: u8 = 0xf0;
pub(crate) const CALL: u8 = 0xf1;
pub(crate) const RETURN: u8 = 0xf3;
pub(crate) const DELEGATECALL: u8 = 0xf4;
pub(crate) const CREATE2: u8 = 0xf5;
pub(crate) const STATICCALL: u8 = 0xfa;
pub(crate) const REVERT: u8 = 0xfd;
pub(crate) const INVALID: u8 = 0xfe;
pub(crate) const SELFDESTRUCT: u8 = 0xff;
