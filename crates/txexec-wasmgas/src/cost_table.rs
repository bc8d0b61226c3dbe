use std::num::NonZeroU32;

use wasm_instrument::gas_metering::{MemoryGrowCost, Rules};
use wasm_instrument::parity_wasm::elements::Instruction;

/// Per-instruction gas prices: a flat cost for ordinary arithmetic/
/// control-flow opcodes, a heavier cost for memory access, a still heavier
/// one for calls, and outright rejection of floating-point opcodes (floats
/// are excluded from consensus-critical execution since their rounding is
/// platform-dependent).
#[derive(Debug, Clone, Copy)]
pub struct InstructionCostTable {
    pub base: u32,
    pub memory_access: u32,
    pub memory_grow_per_page: u32,
    pub call: u32,
}

impl Default for InstructionCostTable {
    fn default() -> Self {
        Self {
            base: 1,
            memory_access: 2,
            memory_grow_per_page: 8_000,
            call: 10,
        }
    }
}

impl Rules for InstructionCostTable {
    fn instruction_cost(&self, instruction: &Instruction) -> Option<u32> {
        use Instruction::*;
        match instruction {
            F32Load(_, _) | F64Load(_, _) | F32Store(_, _) | F64Store(_, _) | F32Const(_)
            | F64Const(_) | F32Eq | F32Ne | F32Lt | F32Gt | F32Le | F32Ge | F64Eq | F64Ne | F64Lt
            | F64Gt | F64Le | F64Ge | F32Abs | F32Neg | F32Ceil | F32Floor | F32Trunc | F32Nearest
            | F32Sqrt | F32Add | F32Sub | F32Mul | F32Div | F32Min | F32Max | F32Copysign | F64Abs
            | F64Neg | F64Ceil | F64Floor | F64Trunc | F64Nearest | F64Sqrt | F64Add | F64Sub | F64Mul
            | F64Div | F64Min | F64Max | F64Copysign | I32TruncSF32 | I32TruncUF32 | I32TruncSF64
            | I32TruncUF64 | I64TruncSF32 | I64TruncUF32 | I64TruncSF64 | I64TruncUF64
            | F32ConvertSI32 | F32ConvertUI32 | F32ConvertSI64 | F32ConvertUI64 | F32DemoteF64
            | F64ConvertSI32 | F64ConvertUI32 | F64ConvertSI64 | F64ConvertUI64 | F64PromoteF32
            | I32ReinterpretF32 | I64ReinterpretF64 | F32ReinterpretI32 | F64ReinterpretI64 => None,

            I32Load(_, _) | I64Load(_, _) | I32Load8S(_, _) | I32Load8U(_, _) | I32Load16S(_, _)
            | I32Load16U(_, _) | I64Load8S(_, _) | I64Load8U(_, _) | I64Load16S(_, _)
            | I64Load16U(_, _) | I64Load32S(_, _) | I64Load32U(_, _) | I32Store(_, _) | I64Store(_, _)
            | I32Store8(_, _) | I32Store16(_, _) | I64Store8(_, _) | I64Store16(_, _)
            | I64Store32(_, _) => Some(self.memory_access),

            Call(_) | CallIndirect(_, _) => Some(self.call),

            _ => Some(self.base),
        }
    }

    fn memory_grow_cost(&self) -> MemoryGrowCost {
        NonZeroU32::new(self.memory_grow_per_page)
            .map(MemoryGrowCost::Linear)
            .unwrap_or(MemoryGrowCost::Free)
    }

    fn call_per_local_cost(&self) -> u32 {
        1
    }
}
