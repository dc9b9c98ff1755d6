//! The three-address intermediate representation.
//!
//! Instructions are produced in program order by the front end, rewritten
//! at most once by the canonicalizer, and never mutated after entering the
//! backend.

pub mod generator;

use std::fmt;

/// A named IR variable. Front-end temporaries use the reserved `$t`
/// prefix, canonicalizer temporaries `$c`; neither is lexable, so they
/// can never collide with a source identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Var {
    pub name: String,
}

impl Var {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// An IR operand: a variable or an integer immediate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Var(Var),
    Imm(i32),
}

impl Value {
    pub fn var(name: impl Into<String>) -> Self {
        Value::Var(Var::named(name))
    }

    pub fn is_imm(&self) -> bool {
        matches!(self, Value::Imm(_))
    }

    pub fn as_var(&self) -> Option<&Var> {
        match self {
            Value::Var(v) => Some(v),
            Value::Imm(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Var(v) => write!(f, "{}", v),
            Value::Imm(i) => write!(f, "{}", i),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Pow,
}

impl BinOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            BinOp::Add => "ADD",
            BinOp::Sub => "SUB",
            BinOp::Mul => "MUL",
            BinOp::Pow => "POW",
        }
    }

    /// Only addition may have its operands swapped by the canonicalizer;
    /// the target's register-immediate forms put the immediate on the
    /// right, which makes the rest order-sensitive.
    pub fn is_commutative(&self) -> bool {
        matches!(self, BinOp::Add)
    }
}

/// A three-address instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Mov {
        dst: Var,
        src: Value,
    },
    Binary {
        op: BinOp,
        dst: Var,
        lhs: Value,
        rhs: Value,
    },
    Ret {
        value: Value,
    },
}

impl Instruction {
    pub fn mov(dst: Var, src: Value) -> Self {
        Instruction::Mov { dst, src }
    }

    pub fn binary(op: BinOp, dst: Var, lhs: Value, rhs: Value) -> Self {
        Instruction::Binary { op, dst, lhs, rhs }
    }

    pub fn ret(value: Value) -> Self {
        Instruction::Ret { value }
    }

    /// Source operands, in left-to-right order. The destination is not an
    /// operand: the allocator's forward liveness scan deliberately treats
    /// a variable that is only written again as dead.
    pub fn operands(&self) -> Vec<&Value> {
        match self {
            Instruction::Mov { src, .. } => vec![src],
            Instruction::Binary { lhs, rhs, .. } => vec![lhs, rhs],
            Instruction::Ret { value } => vec![value],
        }
    }

    pub fn dst(&self) -> Option<&Var> {
        match self {
            Instruction::Mov { dst, .. } | Instruction::Binary { dst, .. } => Some(dst),
            Instruction::Ret { .. } => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Mov { dst, src } => write!(f, "(MOV, {}, {})", dst, src),
            Instruction::Binary { op, dst, lhs, rhs } => {
                write!(f, "({}, {}, {}, {})", op.mnemonic(), dst, lhs, rhs)
            }
            Instruction::Ret { value } => write!(f, "(RET, {})", value),
        }
    }
}

/// Human-readable dump of a whole program, one instruction per line.
pub fn ir_to_lines(instrs: &[Instruction]) -> Vec<String> {
    instrs.iter().map(|ins| ins.to_string()).collect()
}
