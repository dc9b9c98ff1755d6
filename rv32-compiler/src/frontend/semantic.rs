//! Type propagation as a semantic-action observer.
//!
//! A single flow-insensitive pass: the `int` keyword carries its type up
//! through `Decl -> int`, and `Stmt -> Decl id` writes it into the symbol
//! table. Every other reduction just keeps the shadow stack in lock-step
//! with the automaton.

use super::grammar::{Production, RuleKind};
use super::lexer::{Token, TokenKind};
use super::parser::{ActionObserver, Symbol, SymbolKind};
use super::table::StateId;
use crate::symtab::{SourceType, SymbolTable};
use crate::CompileError;

#[derive(Default)]
pub struct SemanticAnalyzer {
    stack: Vec<Symbol>,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current shadow-stack depth; mirrors the automaton's symbol stack
    /// (minus its sentinel).
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn pop(&mut self) -> Symbol {
        self.stack.pop().expect("shadow stack mirrors the automaton")
    }
}

impl ActionObserver for SemanticAnalyzer {
    fn on_shift(
        &mut self,
        _state: StateId,
        token: &Token,
        _symtab: &mut SymbolTable,
    ) -> Result<(), CompileError> {
        let mut symbol = Symbol::terminal(token.clone());
        if token.kind == TokenKind::Int {
            symbol = symbol.with_type(SourceType::Int);
        }
        self.stack.push(symbol);
        Ok(())
    }

    fn on_reduce(
        &mut self,
        _state: StateId,
        production: &Production,
        symtab: &mut SymbolTable,
    ) -> Result<(), CompileError> {
        match production.kind {
            RuleKind::Declare => {
                // Stmt -> Decl id
                let id = self.pop();
                let decl = self.pop();
                let SymbolKind::Terminal(token) = id.kind else {
                    unreachable!("declaration reduces over a shifted identifier")
                };
                let ty = decl.ty.expect("Decl symbol always carries a type");
                symtab
                    .set_type(&token.text, ty)
                    .map_err(|_| CompileError::Redeclaration {
                        name: token.text.clone(),
                    })?;
                self.stack.push(Symbol::nonterminal(production.head));
            }
            RuleKind::TypeInt => {
                // Decl -> int
                self.pop();
                self.stack
                    .push(Symbol::nonterminal(production.head).with_type(SourceType::Int));
            }
            _ => {
                for _ in 0..production.body.len() {
                    self.pop();
                }
                self.stack.push(Symbol::nonterminal(production.head));
            }
        }
        Ok(())
    }
}
