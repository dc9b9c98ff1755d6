//! Table-driven LR parsing automaton.
//!
//! The automaton owns nothing but the token queue and the action/goto
//! table. All semantic work happens in [`ActionObserver`]s, which are
//! notified of every shift/reduce/accept *before* the corresponding stack
//! mutation, in registration order.

use super::grammar::{NonTerminal, Production};
use super::lexer::Token;
use super::table::{Action, LrTable, StateId};
use crate::symtab::{SourceType, SymbolTable};
use crate::CompileError;
use std::collections::VecDeque;

/// An entry on the automaton's symbol stack: a shifted terminal or a
/// synthesized nonterminal, with the inferred source type used by the
/// type-propagation observer.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub ty: Option<SourceType>,
}

#[derive(Debug, Clone)]
pub enum SymbolKind {
    Terminal(Token),
    NonTerminal(NonTerminal),
}

impl Symbol {
    pub fn terminal(token: Token) -> Self {
        Self {
            kind: SymbolKind::Terminal(token),
            ty: None,
        }
    }

    pub fn nonterminal(head: NonTerminal) -> Self {
        Self {
            kind: SymbolKind::NonTerminal(head),
            ty: None,
        }
    }

    pub fn with_type(mut self, ty: SourceType) -> Self {
        self.ty = Some(ty);
        self
    }
}

/// A semantic-action observer riding on the automaton.
///
/// Callbacks fire before the automaton mutates its own stacks, so an
/// observer mirroring the stack arithmetic (push one per shift, pop
/// `|body|` and push one per reduce) stays in lock-step with it. The
/// symbol table is handed to every callback; errors abort the parse.
pub trait ActionObserver {
    fn on_shift(
        &mut self,
        state: StateId,
        token: &Token,
        symtab: &mut SymbolTable,
    ) -> Result<(), CompileError>;

    fn on_reduce(
        &mut self,
        state: StateId,
        production: &Production,
        symtab: &mut SymbolTable,
    ) -> Result<(), CompileError>;

    fn on_accept(&mut self, _state: StateId, _symtab: &mut SymbolTable) -> Result<(), CompileError> {
        Ok(())
    }
}

pub struct SyntaxAnalyzer {
    table: LrTable,
    tokens: VecDeque<Token>,
}

impl SyntaxAnalyzer {
    pub fn new(table: LrTable) -> Self {
        Self {
            table,
            tokens: VecDeque::new(),
        }
    }

    /// Buffer the token stream in arrival order.
    pub fn load_tokens(&mut self, tokens: impl IntoIterator<Item = Token>) {
        self.tokens.extend(tokens);
    }

    /// Run the automaton to completion, driving the observers inline.
    ///
    /// A missing action-table entry is a fatal syntax error; no recovery
    /// is attempted.
    pub fn run(
        &mut self,
        symtab: &mut SymbolTable,
        observers: &mut [&mut dyn ActionObserver],
    ) -> Result<(), CompileError> {
        let mut symbol_stack: Vec<Symbol> = vec![Symbol::terminal(Token::eof())];
        let mut state_stack: Vec<StateId> = vec![self.table.init()];

        loop {
            let Some(lookahead) = self.tokens.front() else {
                return Err(CompileError::UnexpectedEof);
            };
            let kind = lookahead.kind;
            let state = *state_stack.last().expect("state stack is never empty");

            match self.table.action(state, kind) {
                Some(Action::Shift(next)) => {
                    let token = self.tokens.front().expect("lookahead checked above");
                    for observer in observers.iter_mut() {
                        observer.on_shift(state, token, symtab)?;
                    }
                    let token = self.tokens.pop_front().expect("lookahead checked above");
                    symbol_stack.push(Symbol::terminal(token));
                    state_stack.push(next);
                }
                Some(Action::Reduce(index)) => {
                    let production = self.table.production(index);
                    for observer in observers.iter_mut() {
                        observer.on_reduce(state, production, symtab)?;
                    }
                    for _ in 0..production.body.len() {
                        symbol_stack.pop();
                        state_stack.pop();
                    }
                    let top = *state_stack.last().expect("sentinel below every reduction");
                    let next = self
                        .table
                        .goto(top, production.head)
                        .expect("goto entry exists for every legal reduction");
                    symbol_stack.push(Symbol::nonterminal(production.head));
                    state_stack.push(next);
                }
                Some(Action::Accept) => {
                    for observer in observers.iter_mut() {
                        observer.on_accept(state, symtab)?;
                    }
                    return Ok(());
                }
                None => {
                    return Err(CompileError::Syntax {
                        state: state.0,
                        token: lookahead.to_string(),
                    })
                }
            }
        }
    }
}
