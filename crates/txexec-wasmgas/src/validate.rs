use wasm_instrument::parity_wasm::elements::{Instruction, Module};

/// Raised when a code section contains an instruction this engine refuses to
/// run deterministically (floating point). Carries the instruction name and
/// its location (function index, instruction index within that function).
#[derive(Debug, Clone, thiserror::Error)]
#[error("forbidden instruction `{name}` in function {function_index} at instruction {instruction_index}")]
pub struct ForbiddenInstruction {
    pub name: String,
    pub function_index: usize,
    pub instruction_index: usize,
}

fn forbidden_name(instruction: &Instruction) -> Option<&'static str> {
    use Instruction::*;
    Some(match instruction {
        F32Load(_, _) => "f32.load",
        F64Load(_, _) => "f64.load",
        F32Store(_, _) => "f32.store",
        F64Store(_, _) => "f64.store",
        F32Const(_) => "f32.const",
        F64Const(_) => "f64.const",
        F32Eq => "f32.eq",
        F32Ne => "f32.ne",
        F32Lt => "f32.lt",
        F32Gt => "f32.gt",
        F32Le => "f32.le",
        F32Ge => "f32.ge",
        F64Eq => "f64.eq",
        F64Ne => "f64.ne",
        F64Lt => "f64.lt",
        F64Gt => "f64.gt",
        F64Le => "f64.le",
        F64Ge => "f64.ge",
        F32Abs => "f32.abs",
        F32Neg => "f32.neg",
        F32Ceil => "f32.ceil",
        F32Floor => "f32.floor",
        F32Trunc => "f32.trunc",
        F32Nearest => "f32.nearest",
        F32Sqrt => "f32.sqrt",
        F32Add => "f32.add",
        F32Sub => "f32.sub",
        F32Mul => "f32.mul",
        F32Div => "f32.div",
        F32Min => "f32.min",
        F32Max => "f32.max",
        F32Copysign => "f32.copysign",
        F64Abs => "f64.abs",
        F64Neg => "f64.neg",
        F64Ceil => "f64.ceil",
        F64Floor => "f64.floor",
        F64Trunc => "f64.trunc",
        F64Nearest => "f64.nearest",
        F64Sqrt => "f64.sqrt",
        F64Add => "f64.add",
        F64Sub => "f64.sub",
        F64Mul => "f64.mul",
        F64Div => "f64.div",
        F64Min => "f64.min",
        F64Max => "f64.max",
        F64Copysign => "f64.copysign",
        I32TruncSF32 => "i32.trunc_s/f32",
        I32TruncUF32 => "i32.trunc_u/f32",
        I32TruncSF64 => "i32.trunc_s/f64",
        I32TruncUF64 => "i32.trunc_u/f64",
        I64TruncSF32 => "i64.trunc_s/f32",
        I64TruncUF32 => "i64.trunc_u/f32",
        I64TruncSF64 => "i64.trunc_s/f64",
        I64TruncUF64 => "i64.trunc_u/f64",
        F32ConvertSI32 => "f32.convert_s/i32",
        F32ConvertUI32 => "f32.convert_u/i32",
        F32ConvertSI64 => "f32.convert_s/i64",
        F32ConvertUI64 => "f32.convert_u/i64",
        F32DemoteF64 => "f32.demote/f64",
        F64ConvertSI32 => "f64.convert_s/i32",
        F64ConvertUI32 => "f64.convert_u/i32",
        F64ConvertSI64 => "f64.convert_s/i64",
        F64ConvertUI64 => "f64.convert_u/i64",
        F64PromoteF32 => "f64.promote/f32",
        I32ReinterpretF32 => "i32.reinterpret/f32",
        I64ReinterpretF64 => "i64.reinterpret/f64",
        F32ReinterpretI32 => "f32.reinterpret/i32",
        F64ReinterpretI64 => "f64.reinterpret/i64",
        _ => return None,
    })
}

/// Walks every function body's instructions and fails on the first one this
/// engine won't run deterministically, reporting its name and location so
/// callers can surface both in a validation-failure status.
pub fn scan_for_forbidden_instructions(module: &Module) -> Result<(), ForbiddenInstruction> {
    let Some(code_section) = module.code_section() else {
        return Ok(());
    };
    for (function_index, body) in code_section.bodies().iter().enumerate() {
        for (instruction_index, instruction) in body.code().elements().iter().enumerate() {
            if let Some(name) = forbidden_name(instruction) {
                return Err(ForbiddenInstruction {
                    name: name.to_string(),
                    function_index,
                    instruction_index,
                });
            }
        }
    }
    Ok(())
}
