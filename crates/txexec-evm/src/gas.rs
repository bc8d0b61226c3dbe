//! Per-opcode gas prices. Mirrors the historical EVM fee schedule's naming
//! (`VERYLOW`, `LOW`, `MID`, ...) rather than inventing a new table.

pub const ZERO: i64 = 0;
pub const BASE: i64 = 2;
pub const VERYLOW: i64 = 3;
pub const LOW: i64 = 5;
pub const MID: i64 = 8;
pub const HIGH: i64 = 10;
pub const JUMPDEST: i64 = 1;
pub const EXP: i64 = 10;
pub const EXP_BYTE: i64 = 50;
pub const MEMORY_WORD: i64 = 3;
pub const LOG: i64 = 375;
pub const LOG_DATA: i64 = 8;
pub const LOG_TOPIC: i64 = 375;
pub const KECCAK256: i64 = 30;
pub const KECCAK256_WORD: i64 = 6;
pub const COPY_WORD: i64 = 3;
pub const BLOCKHASH: i64 = 20;
pub const BALANCE: i64 = 700;
pub const EXTCODESIZE: i64 = 700;
pub const EXTCODEHASH: i64 = 700;
pub const SLOAD: i64 = 800;
pub const SSTORE_SET: i64 = 20_000;
pub const SSTORE_RESET: i64 = 5_000;
pub const SELFDESTRUCT: i64 = 5_000;
pub const CALL: i64 = 700;
pub const CREATE: i64 = 32_000;
pub const CODEDEPOSIT: i64 = 200;
