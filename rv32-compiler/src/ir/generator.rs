//! IR synthesis as a semantic-action observer.
//!
//! Keeps a value stack in lock-step with the automaton's symbol stack.
//! Shifted operator and keyword tokens occupy stack slots as plain
//! placeholder values; reductions pop exactly what the production body
//! covers and push the synthesized value (or `None` for statements).

use crate::frontend::grammar::{Production, RuleKind};
use crate::frontend::lexer::{Token, TokenKind};
use crate::frontend::parser::ActionObserver;
use crate::frontend::table::StateId;
use crate::ir::{BinOp, Instruction, Value, Var};
use crate::symtab::SymbolTable;
use crate::CompileError;

#[derive(Default)]
pub struct IrGenerator {
    stack: Vec<Option<Value>>,
    instrs: Vec<Instruction>,
    next_temp: u32,
}

impl IrGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value-stack depth; mirrors the automaton's symbol stack
    /// (minus its sentinel).
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The accumulated instruction list, in emission order.
    pub fn into_ir(self) -> Vec<Instruction> {
        self.instrs
    }

    /// Fresh temporary. The counter lives on the generator instance, so
    /// independent compilations cannot interfere.
    fn temp(&mut self) -> Var {
        let var = Var::named(format!("$t{}", self.next_temp));
        self.next_temp += 1;
        var
    }

    fn pop_value(&mut self) -> Value {
        self.stack
            .pop()
            .expect("value stack mirrors the automaton")
            .expect("operand slot holds a value")
    }

    fn pop_placeholder(&mut self) {
        self.stack.pop().expect("value stack mirrors the automaton");
    }

    fn reduce_binary(&mut self, op: BinOp) {
        let rhs = self.pop_value();
        self.pop_placeholder(); // operator token
        let lhs = self.pop_value();
        let temp = self.temp();
        self.instrs
            .push(Instruction::binary(op, temp.clone(), lhs, rhs));
        self.stack.push(Some(Value::Var(temp)));
    }
}

impl ActionObserver for IrGenerator {
    fn on_shift(
        &mut self,
        _state: StateId,
        token: &Token,
        _symtab: &mut SymbolTable,
    ) -> Result<(), CompileError> {
        let value = match token.kind {
            TokenKind::IntConst => {
                let parsed =
                    token
                        .text
                        .parse::<i32>()
                        .map_err(|_| CompileError::LiteralOutOfRange {
                            text: token.text.clone(),
                        })?;
                Value::Imm(parsed)
            }
            _ => Value::var(token.text.clone()),
        };
        self.stack.push(Some(value));
        Ok(())
    }

    fn on_reduce(
        &mut self,
        _state: StateId,
        production: &Production,
        _symtab: &mut SymbolTable,
    ) -> Result<(), CompileError> {
        match production.kind {
            RuleKind::Assign => {
                // Stmt -> id = Expr
                let value = self.pop_value();
                self.pop_placeholder(); // =
                let dst = self.pop_value();
                let Value::Var(dst) = dst else {
                    unreachable!("assignment target is a shifted identifier")
                };
                self.instrs.push(Instruction::mov(dst, value));
                self.stack.push(None);
            }
            RuleKind::Return => {
                // Stmt -> return Expr
                let value = self.pop_value();
                self.pop_placeholder(); // return
                self.instrs.push(Instruction::ret(value));
                self.stack.push(None);
            }
            RuleKind::Add => self.reduce_binary(BinOp::Add),
            RuleKind::Sub => self.reduce_binary(BinOp::Sub),
            RuleKind::Mul => self.reduce_binary(BinOp::Mul),
            RuleKind::Pow => self.reduce_binary(BinOp::Pow),
            RuleKind::Paren => {
                // Atom -> ( Expr )
                self.pop_placeholder(); // )
                let inner = self.pop_value();
                self.pop_placeholder(); // (
                self.stack.push(Some(inner));
            }
            // Pop one, push the same: the value stays where it is.
            RuleKind::Unit => {}
            _ => {
                for _ in 0..production.body.len() {
                    self.pop_placeholder();
                }
                self.stack.push(None);
            }
        }
        Ok(())
    }
}
