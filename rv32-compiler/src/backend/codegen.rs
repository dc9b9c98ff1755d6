//! RV32 instruction types and the assembly emitter.
//!
//! The emitter makes one pass over the canonical instruction list,
//! assigning registers to each instruction's operands (lhs, rhs, then
//! destination) just before rendering it, so the allocator's forward
//! liveness scan is always anchored at the instruction being emitted.

use super::abi::Register;
use super::regalloc::RegisterAllocator;
use super::CodegenError;
use crate::ir::{BinOp, Instruction, Value};
use std::fmt;

// ============================================================================
// Typed RV32 instructions
// ============================================================================

/// A typed RV32 instruction as the backend emits it. `blez` and `j` exist
/// solely for the exponentiation expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RvInstr {
    /// `add rd, ra, rb`
    Add {
        d: Register,
        a: Register,
        b: Register,
    },
    /// `addi rd, ra, imm`
    Addi {
        d: Register,
        a: Register,
        imm: i32,
    },
    /// `sub rd, ra, rb`
    Sub {
        d: Register,
        a: Register,
        b: Register,
    },
    /// `subi rd, ra, imm`
    Subi {
        d: Register,
        a: Register,
        imm: i32,
    },
    /// `mul rd, ra, rb`
    Mul {
        d: Register,
        a: Register,
        b: Register,
    },
    /// `mv rd, rs`
    Mv { d: Register, s: Register },
    /// `li rd, imm`
    Li { d: Register, imm: i32 },
    /// `blez rs, target` — branch if `rs <= 0`
    Blez { s: Register, target: String },
    /// `j target`
    Jump { target: String },
}

impl fmt::Display for RvInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RvInstr::Add { d, a, b } => write!(f, "add {}, {}, {}", d, a, b),
            RvInstr::Addi { d, a, imm } => write!(f, "addi {}, {}, {}", d, a, imm),
            RvInstr::Sub { d, a, b } => write!(f, "sub {}, {}, {}", d, a, b),
            RvInstr::Subi { d, a, imm } => write!(f, "subi {}, {}, {}", d, a, imm),
            RvInstr::Mul { d, a, b } => write!(f, "mul {}, {}, {}", d, a, b),
            RvInstr::Mv { d, s } => write!(f, "mv {}, {}", d, s),
            RvInstr::Li { d, imm } => write!(f, "li {}, {}", d, imm),
            RvInstr::Blez { s, target } => write!(f, "blez {}, {}", s, target),
            RvInstr::Jump { target } => write!(f, "j {}", target),
        }
    }
}

// ============================================================================
// Assembly output items
// ============================================================================

/// A structured assembly output element; flattened to text at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsmItem {
    /// A section marker such as `.text`.
    Section(&'static str),
    /// A label on its own line.
    Label(String),
    /// An instruction, optionally annotated with the IR it came from.
    Instr {
        instr: RvInstr,
        comment: Option<String>,
    },
}

impl fmt::Display for AsmItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmItem::Section(name) => write!(f, "{}", name),
            AsmItem::Label(name) => write!(f, "{}:", name),
            AsmItem::Instr { instr, comment } => {
                write!(f, "\t{}", instr)?;
                if let Some(ir) = comment {
                    write!(f, "\t\t# {}", ir)?;
                }
                Ok(())
            }
        }
    }
}

/// The finished assembly listing.
#[derive(Debug, Clone)]
pub struct RiscvAsm {
    pub items: Vec<AsmItem>,
}

impl RiscvAsm {
    pub fn to_lines(&self) -> Vec<String> {
        self.items.iter().map(|item| item.to_string()).collect()
    }
}

impl fmt::Display for RiscvAsm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            writeln!(f, "{}", item)?;
        }
        Ok(())
    }
}

// ============================================================================
// Emitter
// ============================================================================

pub struct AssemblyGenerator {
    regs: RegisterAllocator,
    items: Vec<AsmItem>,
    pow_blocks: u32,
}

impl AssemblyGenerator {
    pub fn new() -> Self {
        Self {
            regs: RegisterAllocator::new(),
            items: Vec::new(),
            pow_blocks: 0,
        }
    }

    /// Lower a canonical instruction list to assembly, allocating
    /// registers on the fly. Emission stops at (and includes) the first
    /// `Ret`.
    pub fn run(&mut self, instrs: &[Instruction]) -> Result<(), CodegenError> {
        self.items.push(AsmItem::Section(".text"));

        for (at, ins) in instrs.iter().enumerate() {
            let ir = ins.to_string();
            match ins {
                Instruction::Mov { dst, src } => {
                    let src_reg = self.regs.allocate(src, at, instrs)?;
                    let d = self.regs.allocate_var(dst, at, instrs)?;
                    let instr = match (src, src_reg) {
                        (Value::Imm(imm), _) => RvInstr::Li { d, imm: *imm },
                        (Value::Var(_), Some(s)) => RvInstr::Mv { d, s },
                        (Value::Var(_), None) => unreachable!("variable operands get registers"),
                    };
                    self.push(instr, &ir);
                }
                Instruction::Binary { op, dst, lhs, rhs } => {
                    let lhs_reg = self.regs.allocate(lhs, at, instrs)?;
                    let rhs_reg = self.regs.allocate(rhs, at, instrs)?;
                    let d = self.regs.allocate_var(dst, at, instrs)?;
                    let a = lhs_reg.ok_or_else(|| CodegenError::ImmediateOperand {
                        instr: ir.clone(),
                    })?;
                    match (op, rhs, rhs_reg) {
                        (BinOp::Add, Value::Imm(imm), _) => {
                            self.push(RvInstr::Addi { d, a, imm: *imm }, &ir);
                        }
                        (BinOp::Sub, Value::Imm(imm), _) => {
                            self.push(RvInstr::Subi { d, a, imm: *imm }, &ir);
                        }
                        (BinOp::Add, _, Some(b)) => {
                            self.push(RvInstr::Add { d, a, b }, &ir);
                        }
                        (BinOp::Sub, _, Some(b)) => {
                            self.push(RvInstr::Sub { d, a, b }, &ir);
                        }
                        (BinOp::Mul, _, Some(b)) => {
                            self.push(RvInstr::Mul { d, a, b }, &ir);
                        }
                        (BinOp::Pow, _, Some(b)) => {
                            self.emit_pow(d, a, b, &ir);
                        }
                        // A multiply/power immediate survived
                        // canonicalization: refuse to emit a wrong
                        // listing.
                        (BinOp::Mul | BinOp::Pow, Value::Imm(_), _) => {
                            return Err(CodegenError::ImmediateOperand { instr: ir });
                        }
                        (_, Value::Var(_), None) => {
                            unreachable!("variable operands get registers")
                        }
                    }
                }
                Instruction::Ret { value } => {
                    let instr = match value {
                        Value::Imm(imm) => RvInstr::Li {
                            d: Register::RETURN_REG,
                            imm: *imm,
                        },
                        Value::Var(_) => {
                            let s = self
                                .regs
                                .allocate(value, at, instrs)?
                                .expect("variable operands get registers");
                            RvInstr::Mv {
                                d: Register::RETURN_REG,
                                s,
                            }
                        }
                    };
                    self.push(instr, &ir);
                    break;
                }
            }
        }

        Ok(())
    }

    pub fn finish(self) -> RiscvAsm {
        RiscvAsm { items: self.items }
    }

    fn push(&mut self, instr: RvInstr, ir: &str) {
        self.items.push(AsmItem::Instr {
            instr,
            comment: Some(ir.to_string()),
        });
    }

    /// Inline exponentiation: copy the base into the destination, count
    /// the exponent down in `a0`, and multiply once per remaining count.
    /// Labels are numbered per expansion so blocks cannot collide.
    ///
    /// An exponent of zero or less leaves the destination equal to the
    /// base; constant exponents never reach here (the canonicalizer folds
    /// or rejects them).
    fn emit_pow(&mut self, d: Register, base: Register, exp: Register, ir: &str) {
        let n = self.pow_blocks;
        self.pow_blocks += 1;
        let loop_label = format!("pow_loop_{}", n);
        let done_label = format!("pow_done_{}", n);
        let counter = Register::POW_COUNTER;

        self.push(RvInstr::Mv { d, s: base }, ir);
        self.push(RvInstr::Mv { d: counter, s: exp }, ir);
        self.items.push(AsmItem::Label(loop_label.clone()));
        self.push(
            RvInstr::Addi {
                d: counter,
                a: counter,
                imm: -1,
            },
            ir,
        );
        self.push(
            RvInstr::Blez {
                s: counter,
                target: done_label.clone(),
            },
            ir,
        );
        self.push(RvInstr::Mul { d, a: d, b: base }, ir);
        self.push(
            RvInstr::Jump {
                target: loop_label,
            },
            ir,
        );
        self.items.push(AsmItem::Label(done_label));
    }
}

impl Default for AssemblyGenerator {
    fn default() -> Self {
        Self::new()
    }
}
