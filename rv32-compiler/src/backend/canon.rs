//! Peephole canonicalization of raw IR.
//!
//! Rewrites each binary instruction so its operand shapes match what the
//! target directly supports: no immediate-immediate arithmetic, and an
//! immediate operand only on the right of `add`/`sub`. Instructions after
//! the first `Ret` are unreachable and dropped. Order is preserved; the
//! pass is idempotent.

use super::CodegenError;
use crate::ir::{BinOp, Instruction, Value, Var};

pub fn canonicalize(instrs: &[Instruction]) -> Result<Vec<Instruction>, CodegenError> {
    let mut out = Vec::with_capacity(instrs.len());
    let mut next_temp = 0u32;
    // Materialization temporaries use the `$c` prefix so they cannot
    // collide with the front end's `$t` names.
    let mut fresh = || {
        let var = Var::named(format!("$c{}", next_temp));
        next_temp += 1;
        var
    };

    for ins in instrs {
        match ins {
            Instruction::Mov { .. } => out.push(ins.clone()),
            Instruction::Ret { .. } => {
                out.push(ins.clone());
                break;
            }
            Instruction::Binary { op, dst, lhs, rhs } => match (lhs, rhs) {
                (Value::Imm(a), Value::Imm(b)) => {
                    out.push(Instruction::mov(dst.clone(), Value::Imm(fold(*op, *a, *b)?)));
                }
                (Value::Imm(_), Value::Var(_)) => {
                    if op.is_commutative() {
                        out.push(Instruction::binary(
                            *op,
                            dst.clone(),
                            rhs.clone(),
                            lhs.clone(),
                        ));
                    } else {
                        // The immediate must become register-resident on
                        // the left.
                        let temp = fresh();
                        out.push(Instruction::mov(temp.clone(), lhs.clone()));
                        out.push(Instruction::binary(
                            *op,
                            dst.clone(),
                            Value::Var(temp),
                            rhs.clone(),
                        ));
                    }
                }
                (Value::Var(_), Value::Imm(_)) => match op {
                    // The target has addi/subi.
                    BinOp::Add | BinOp::Sub => out.push(ins.clone()),
                    // No register-immediate multiply or power.
                    BinOp::Mul | BinOp::Pow => {
                        let temp = fresh();
                        out.push(Instruction::mov(temp.clone(), rhs.clone()));
                        out.push(Instruction::binary(
                            *op,
                            dst.clone(),
                            lhs.clone(),
                            Value::Var(temp),
                        ));
                    }
                },
                (Value::Var(_), Value::Var(_)) => out.push(ins.clone()),
            },
        }
    }

    Ok(out)
}

/// Compile-time evaluation of an immediate-immediate binary instruction.
/// Arithmetic wraps; a negative exponent has no integer result and is
/// rejected outright.
fn fold(op: BinOp, a: i32, b: i32) -> Result<i32, CodegenError> {
    Ok(match op {
        BinOp::Add => a.wrapping_add(b),
        BinOp::Sub => a.wrapping_sub(b),
        BinOp::Mul => a.wrapping_mul(b),
        BinOp::Pow => {
            if b < 0 {
                return Err(CodegenError::NegativeExponent { base: a, exp: b });
            }
            a.wrapping_pow(b as u32)
        }
    })
}
