//! Rewrites WASM bytecode to charge gas for every executed instruction and
//! for memory growth before it is stored or run, and rejects modules that use
//! an instruction this engine won't execute deterministically. Built on
//! `wasm-instrument`'s gas-metering pass instead of a hand-rolled bytecode
//! rewriter.

mod cost_table;
mod inject;
mod validate;

pub use cost_table::InstructionCostTable;
pub use inject::{inject_gas_metering, GasInjectionError};
pub use validate::{scan_for_forbidden_instructions, ForbiddenInstruction};
