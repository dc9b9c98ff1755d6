pub mod backend;
pub mod frontend;
pub mod ir;
pub mod symtab;

use thiserror::Error;
use tracing::debug;

use frontend::lexer::LexicalError;
use frontend::parser::SyntaxAnalyzer;
use frontend::semantic::SemanticAnalyzer;
use frontend::table::{GrammarConflict, LrTable};
use ir::generator::IrGenerator;
use ir::Instruction;
use symtab::SymbolTable;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("lexical error: {0}")]
    Lexical(#[from] LexicalError),

    #[error("syntax error: unexpected {token} in state {state}")]
    Syntax { state: usize, token: String },

    #[error("syntax error: input ended before the program was accepted")]
    UnexpectedEof,

    #[error("semantic error: variable '{name}' is already declared")]
    Redeclaration { name: String },

    #[error("integer literal '{text}' is out of range")]
    LiteralOutOfRange { text: String },

    #[error("grammar error: {0}")]
    Grammar(#[from] GrammarConflict),

    #[error("codegen error: {0}")]
    Codegen(#[from] backend::CodegenError),
}

/// Run the front end: tokenize, parse, and synthesize three-address IR.
///
/// The type-propagation and IR-synthesis observers ride along on the LR
/// automaton; on success the populated symbol table is returned next to
/// the instruction list.
pub fn compile_to_ir(source: &str) -> Result<(Vec<Instruction>, SymbolTable), CompileError> {
    let mut symtab = SymbolTable::new();

    let tokens = frontend::lexer::lex(source, &mut symtab)?;
    debug!(tokens = tokens.len(), "lexing finished");

    let table = LrTable::build(&frontend::grammar::source_grammar())?;
    debug!(states = table.state_count(), "SLR(1) table built");

    let mut semantic = SemanticAnalyzer::new();
    let mut irgen = IrGenerator::new();

    let mut parser = SyntaxAnalyzer::new(table);
    parser.load_tokens(tokens);
    parser.run(&mut symtab, &mut [&mut semantic, &mut irgen])?;

    let instrs = irgen.into_ir();
    debug!(instructions = instrs.len(), "IR synthesis finished");
    Ok((instrs, symtab))
}

/// Compile source text all the way to RV32 assembly.
pub fn compile_to_riscv(source: &str) -> Result<String, CompileError> {
    let (instrs, _symtab) = compile_to_ir(source)?;
    let asm = backend::compile_ir_to_riscv(&instrs)?;
    Ok(asm.to_string())
}
