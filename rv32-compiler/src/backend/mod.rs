//! The RV32 backend: canonicalization, register allocation, emission.

pub mod abi;
pub mod canon;
pub mod codegen;
pub mod regalloc;

pub use abi::Register;
pub use codegen::{AsmItem, AssemblyGenerator, RiscvAsm, RvInstr};

use crate::ir::Instruction;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CodegenError {
    /// All seven registers hold variables that are still referenced later
    /// in the instruction stream; there is no spill path.
    #[error("no register available for `{var}`: all registers hold live variables")]
    RegisterExhaustion { var: String },

    /// `a ** b` with a constant negative `b` has no integer result.
    #[error("cannot raise {base} to negative constant exponent {exp}")]
    NegativeExponent { base: i32, exp: i32 },

    /// An operand that must be register-resident is still an immediate,
    /// meaning the instruction list was not canonicalized.
    #[error("immediate operand where a register is required: {instr}")]
    ImmediateOperand { instr: String },
}

/// Lower an IR instruction list all the way to an RV32 listing:
/// canonicalize operand shapes, then emit with on-demand register
/// allocation.
pub fn compile_ir_to_riscv(instrs: &[Instruction]) -> Result<RiscvAsm, CodegenError> {
    let canonical = canon::canonicalize(instrs)?;
    debug!(
        raw = instrs.len(),
        canonical = canonical.len(),
        "canonicalized IR"
    );

    let mut gen = AssemblyGenerator::new();
    gen.run(&canonical)?;
    let asm = gen.finish();
    debug!(items = asm.items.len(), "emitted assembly");
    Ok(asm)
}
