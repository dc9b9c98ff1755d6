//! SLR(1) action/goto table construction.
//!
//! The parsing automaton consumes the finished table purely through
//! [`LrTable::action`] and [`LrTable::goto`]; nothing outside this module
//! depends on how the table is built.
//!
//! The construction is the textbook one: canonical LR(0) item-set
//! collection, FOLLOW sets over the (epsilon-free) grammar, shift entries
//! from terminal transitions and reduce entries over FOLLOW of the head.

use super::grammar::{Grammar, NonTerminal, Sym};
use super::lexer::TokenKind;
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;

/// Opaque automaton state identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift(StateId),
    /// Index into the grammar's production list.
    Reduce(usize),
    Accept,
}

/// A conflict found while filling the table. The source grammar is SLR(1),
/// so seeing one of these means the grammar itself was edited badly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarConflict {
    #[error("shift/reduce conflict in state {state} on {token:?}")]
    ShiftReduce { state: usize, token: TokenKind },
    #[error("reduce/reduce conflict in state {state} on {token:?}")]
    ReduceReduce { state: usize, token: TokenKind },
}

/// An LR(0) item: production index plus dot position.
type Item = (usize, usize);

pub struct LrTable {
    grammar: Grammar,
    actions: HashMap<(StateId, TokenKind), Action>,
    gotos: HashMap<(StateId, NonTerminal), StateId>,
    init: StateId,
    state_count: usize,
}

impl LrTable {
    pub fn build(grammar: &Grammar) -> Result<Self, GrammarConflict> {
        Builder::new(grammar).build()
    }

    pub fn init(&self) -> StateId {
        self.init
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }

    pub fn action(&self, state: StateId, token: TokenKind) -> Option<Action> {
        self.actions.get(&(state, token)).copied()
    }

    pub fn goto(&self, state: StateId, head: NonTerminal) -> Option<StateId> {
        self.gotos.get(&(state, head)).copied()
    }

    pub fn production(&self, index: usize) -> &super::grammar::Production {
        &self.grammar.productions[index]
    }
}

struct Builder<'g> {
    grammar: &'g Grammar,
    follow: HashMap<NonTerminal, HashSet<TokenKind>>,
}

impl<'g> Builder<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        let first = Self::first_sets(grammar);
        let follow = Self::follow_sets(grammar, &first);
        Self { grammar, follow }
    }

    /// FIRST over an epsilon-free grammar: only the leading body symbol
    /// contributes.
    fn first_sets(grammar: &Grammar) -> HashMap<NonTerminal, HashSet<TokenKind>> {
        let mut first: HashMap<NonTerminal, HashSet<TokenKind>> = HashMap::new();
        let mut changed = true;
        while changed {
            changed = false;
            for prod in &grammar.productions {
                let add: Vec<TokenKind> = match prod.body[0] {
                    Sym::Terminal(tk) => vec![tk],
                    Sym::NonTerminal(nt) => first
                        .get(&nt)
                        .map(|s| s.iter().copied().collect())
                        .unwrap_or_default(),
                };
                let entry = first.entry(prod.head).or_default();
                for tk in add {
                    changed |= entry.insert(tk);
                }
            }
        }
        first
    }

    fn follow_sets(
        grammar: &Grammar,
        first: &HashMap<NonTerminal, HashSet<TokenKind>>,
    ) -> HashMap<NonTerminal, HashSet<TokenKind>> {
        let mut follow: HashMap<NonTerminal, HashSet<TokenKind>> = HashMap::new();
        follow.entry(grammar.start).or_default().insert(TokenKind::Eof);

        let mut changed = true;
        while changed {
            changed = false;
            for prod in &grammar.productions {
                for (i, sym) in prod.body.iter().enumerate() {
                    let Sym::NonTerminal(nt) = sym else { continue };
                    let add: Vec<TokenKind> = match prod.body.get(i + 1) {
                        Some(Sym::Terminal(tk)) => vec![*tk],
                        Some(Sym::NonTerminal(next)) => first
                            .get(next)
                            .map(|s| s.iter().copied().collect())
                            .unwrap_or_default(),
                        // Last body symbol: FOLLOW(head) flows in.
                        None => follow
                            .get(&prod.head)
                            .map(|s| s.iter().copied().collect())
                            .unwrap_or_default(),
                    };
                    let entry = follow.entry(*nt).or_default();
                    for tk in add {
                        changed |= entry.insert(tk);
                    }
                }
            }
        }
        follow
    }

    fn closure(&self, mut items: BTreeSet<Item>) -> BTreeSet<Item> {
        let mut work: Vec<Item> = items.iter().copied().collect();
        while let Some((prod, dot)) = work.pop() {
            let body = &self.grammar.productions[prod].body;
            let Some(Sym::NonTerminal(nt)) = body.get(dot) else {
                continue;
            };
            for (idx, candidate) in self.grammar.productions.iter().enumerate() {
                if candidate.head == *nt && items.insert((idx, 0)) {
                    work.push((idx, 0));
                }
            }
        }
        items
    }

    fn transition(&self, state: &BTreeSet<Item>, over: Sym) -> BTreeSet<Item> {
        let mut moved = BTreeSet::new();
        for &(prod, dot) in state {
            if self.grammar.productions[prod].body.get(dot) == Some(&over) {
                moved.insert((prod, dot + 1));
            }
        }
        self.closure(moved)
    }

    fn build(self) -> Result<LrTable, GrammarConflict> {
        // Canonical LR(0) collection.
        let start_state = self.closure(BTreeSet::from([(0usize, 0usize)]));
        let mut states: Vec<BTreeSet<Item>> = vec![start_state.clone()];
        let mut index: HashMap<BTreeSet<Item>, usize> = HashMap::from([(start_state, 0)]);
        let mut transitions: HashMap<(usize, Sym), usize> = HashMap::new();

        let mut work = vec![0usize];
        while let Some(id) = work.pop() {
            let state = states[id].clone();
            let symbols: BTreeSet<Sym> = state
                .iter()
                .filter_map(|&(prod, dot)| self.grammar.productions[prod].body.get(dot).copied())
                .collect();
            for sym in symbols {
                let target = self.transition(&state, sym);
                let target_id = *index.entry(target.clone()).or_insert_with(|| {
                    states.push(target);
                    work.push(states.len() - 1);
                    states.len() - 1
                });
                transitions.insert((id, sym), target_id);
            }
        }

        // Fill the action/goto tables.
        let mut actions: HashMap<(StateId, TokenKind), Action> = HashMap::new();
        let mut gotos: HashMap<(StateId, NonTerminal), StateId> = HashMap::new();

        for (&(id, sym), &target) in &transitions {
            match sym {
                Sym::Terminal(tk) => {
                    actions.insert((StateId(id), tk), Action::Shift(StateId(target)));
                }
                Sym::NonTerminal(nt) => {
                    gotos.insert((StateId(id), nt), StateId(target));
                }
            }
        }

        for (id, state) in states.iter().enumerate() {
            for &(prod, dot) in state {
                if dot != self.grammar.productions[prod].body.len() {
                    continue;
                }
                if prod == 0 {
                    // `Start -> Program .` accepts on end of input.
                    actions.insert((StateId(id), TokenKind::Eof), Action::Accept);
                    continue;
                }
                let head = self.grammar.productions[prod].head;
                let follow = self.follow.get(&head).cloned().unwrap_or_default();
                for tk in follow {
                    match actions.get(&(StateId(id), tk)) {
                        None => {
                            actions.insert((StateId(id), tk), Action::Reduce(prod));
                        }
                        Some(Action::Shift(_)) | Some(Action::Accept) => {
                            return Err(GrammarConflict::ShiftReduce { state: id, token: tk });
                        }
                        Some(Action::Reduce(other)) if *other != prod => {
                            return Err(GrammarConflict::ReduceReduce { state: id, token: tk });
                        }
                        Some(Action::Reduce(_)) => {}
                    }
                }
            }
        }

        Ok(LrTable {
            grammar: self.grammar.clone(),
            actions,
            gotos,
            init: StateId(0),
            state_count: states.len(),
        })
    }
}
