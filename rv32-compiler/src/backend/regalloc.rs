//! On-demand register allocation with forward-liveness reclamation.
//!
//! The variable-to-register binding is a bijection maintained as two
//! synchronized maps; every mutation goes through [`RegisterAllocator::bind`]
//! so the two sides cannot drift apart. There is no spill path: when every
//! register is bound and every occupant is still referenced somewhere in
//! the remaining instruction stream, allocation fails and compilation
//! aborts.

use super::abi::Register;
use super::CodegenError;
use crate::ir::{Instruction, Value, Var};
use std::collections::{HashMap, HashSet};

#[derive(Default)]
pub struct RegisterAllocator {
    var_to_reg: HashMap<Var, Register>,
    reg_to_var: HashMap<Register, Var>,
}

impl RegisterAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable to a register, evicting any prior occupant on
    /// either side. The single mutation point for both maps.
    fn bind(&mut self, var: Var, reg: Register) {
        if let Some(old_reg) = self.var_to_reg.remove(&var) {
            self.reg_to_var.remove(&old_reg);
        }
        if let Some(old_var) = self.reg_to_var.remove(&reg) {
            self.var_to_reg.remove(&old_var);
        }
        self.var_to_reg.insert(var.clone(), reg);
        self.reg_to_var.insert(reg, var);
    }

    pub fn get(&self, var: &Var) -> Option<Register> {
        self.var_to_reg.get(var).copied()
    }

    /// Current bindings, for invariant checks.
    pub fn bindings(&self) -> impl Iterator<Item = (&Var, Register)> {
        self.var_to_reg.iter().map(|(v, &r)| (v, r))
    }

    /// Allocate a register for an operand of the instruction at `at`.
    /// Immediates never occupy a register.
    pub fn allocate(
        &mut self,
        value: &Value,
        at: usize,
        instrs: &[Instruction],
    ) -> Result<Option<Register>, CodegenError> {
        match value {
            Value::Imm(_) => Ok(None),
            Value::Var(var) => self.allocate_var(var, at, instrs).map(Some),
        }
    }

    /// Allocate a register for a variable at instruction index `at`:
    /// its existing binding, else the first free register, else a register
    /// whose occupant is provably dead for the rest of the stream.
    pub fn allocate_var(
        &mut self,
        var: &Var,
        at: usize,
        instrs: &[Instruction],
    ) -> Result<Register, CodegenError> {
        if let Some(&reg) = self.var_to_reg.get(var) {
            return Ok(reg);
        }

        for reg in Register::ALLOCATABLE {
            if !self.reg_to_var.contains_key(&reg) {
                self.bind(var.clone(), reg);
                return Ok(reg);
            }
        }

        // Every register is bound: scan the remaining stream and keep
        // only registers whose variable is never referenced again. The
        // scan starts at the current instruction so its own operands are
        // always protected.
        let mut reclaimable: HashSet<Register> = Register::ALLOCATABLE.into_iter().collect();
        for ins in &instrs[at..] {
            for operand in ins.operands() {
                if let Some(v) = operand.as_var() {
                    if let Some(&reg) = self.var_to_reg.get(v) {
                        reclaimable.remove(&reg);
                    }
                }
            }
        }

        if let Some(reg) = Register::ALLOCATABLE
            .into_iter()
            .find(|r| reclaimable.contains(r))
        {
            self.bind(var.clone(), reg);
            return Ok(reg);
        }

        Err(CodegenError::RegisterExhaustion {
            var: var.name.clone(),
        })
    }
}
