//! The source-language grammar.
//!
//! Productions carry a [`RuleKind`] tag so the syntax-directed observers can
//! dispatch on what a reduction *means* instead of on a bare production
//! number.

use super::lexer::TokenKind;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NonTerminal {
    /// Augmented start symbol; reduced exactly once, at accept.
    Start,
    Program,
    StmtList,
    Stmt,
    Decl,
    Expr,
    Term,
    Factor,
    Atom,
}

impl fmt::Display for NonTerminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A grammar symbol: a terminal (by token kind) or a nonterminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sym {
    Terminal(TokenKind),
    NonTerminal(NonTerminal),
}

/// What a reduction means to the semantic-action observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// `Stmt -> Decl id`
    Declare,
    /// `Decl -> int`
    TypeInt,
    /// `Stmt -> id = Expr`
    Assign,
    /// `Stmt -> return Expr`
    Return,
    Add,
    Sub,
    Mul,
    Pow,
    /// `Atom -> ( Expr )`
    Paren,
    /// Single-symbol renaming productions; the value is left in place.
    Unit,
    /// Structural productions with no semantic value.
    Other,
}

#[derive(Debug, Clone)]
pub struct Production {
    pub head: NonTerminal,
    pub body: Vec<Sym>,
    pub kind: RuleKind,
}

#[derive(Debug, Clone)]
pub struct Grammar {
    /// Production 0 is the augmented `Start -> Program`.
    pub productions: Vec<Production>,
    pub start: NonTerminal,
}

fn t(kind: TokenKind) -> Sym {
    Sym::Terminal(kind)
}

fn n(nt: NonTerminal) -> Sym {
    Sym::NonTerminal(nt)
}

/// The fixed grammar of the source language.
pub fn source_grammar() -> Grammar {
    use NonTerminal::*;
    use RuleKind::*;
    use TokenKind::*;

    let p = |head, body, kind| Production { head, body, kind };

    Grammar {
        start: Start,
        productions: vec![
            p(Start, vec![n(Program)], Other),
            p(Program, vec![n(StmtList)], Other),
            p(StmtList, vec![n(Stmt), t(Semicolon), n(StmtList)], Other),
            p(StmtList, vec![n(Stmt), t(Semicolon)], Other),
            p(Stmt, vec![n(Decl), t(Ident)], Declare),
            p(Decl, vec![t(Int)], TypeInt),
            p(Stmt, vec![t(Ident), t(TokenKind::Assign), n(Expr)], RuleKind::Assign),
            p(Stmt, vec![t(TokenKind::Return), n(Expr)], RuleKind::Return),
            p(Expr, vec![n(Expr), t(Plus), n(Term)], Add),
            p(Expr, vec![n(Expr), t(Minus), n(Term)], Sub),
            p(Expr, vec![n(Term)], Unit),
            p(Term, vec![n(Term), t(Star), n(Factor)], Mul),
            p(Term, vec![n(Factor)], Unit),
            p(Factor, vec![n(Factor), t(DoubleStar), n(Atom)], Pow),
            p(Factor, vec![n(Atom)], Unit),
            p(Atom, vec![t(LParen), n(Expr), t(RParen)], Paren),
            p(Atom, vec![t(Ident)], Unit),
            p(Atom, vec![t(IntConst)], Unit),
        ],
    }
}
