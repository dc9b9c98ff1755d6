use crate::symtab::SymbolTable;
use logos::Logos;
use std::fmt;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[logos(skip r"[ \t\r\n]+")] // Whitespace
pub enum TokenKind {
    // --- Keywords ---
    #[token("int")]
    Int,
    #[token("return")]
    Return,

    // --- Identifiers and Numbers ---
    #[regex(r"[A-Za-z][A-Za-z0-9]*")]
    Ident,
    #[regex(r"[0-9]+")]
    IntConst,

    // --- Operators ---
    #[token("=")]
    Assign,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("**")]
    DoubleStar,

    // --- Punctuation ---
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,

    /// Synthetic end-of-input marker, appended after the last real token.
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Int => "'int'",
            TokenKind::Return => "'return'",
            TokenKind::Ident => "identifier",
            TokenKind::IntConst => "number",
            TokenKind::Assign => "'='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::DoubleStar => "'**'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::Eof => "end of input",
        };
        write!(f, "{}", s)
    }
}

/// A lexeme: its kind plus the exact source text it covered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn eof() -> Self {
        Self::new(TokenKind::Eof, "")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Ident => write!(f, "id '{}'", self.text),
            TokenKind::IntConst => write!(f, "number {}", self.text),
            TokenKind::Eof => write!(f, "end of input"),
            kind => write!(f, "{}", kind),
        }
    }
}

/// Custom error type for lexical errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalError {
    pub location: usize,
    pub line: usize,
    pub column: usize,
    pub unexpected_char: char,
    pub context: String,
}

impl fmt::Display for LexicalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unexpected character '{}' at line {}, column {}\n  context: {}",
            self.unexpected_char, self.line, self.column, self.context
        )
    }
}

impl std::error::Error for LexicalError {}

/// Convert a byte position to line and column numbers (1-based)
fn position_to_line_col(source: &str, position: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;

    for (i, ch) in source.char_indices() {
        if i >= position {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Get context around an error position (the line containing the error)
fn get_error_context(source: &str, position: usize) -> String {
    let line_start = source[..position]
        .rfind('\n')
        .map(|pos| pos + 1)
        .unwrap_or(0);

    let line_end = source[position..]
        .find('\n')
        .map(|pos| position + pos)
        .unwrap_or(source.len());

    source[line_start..line_end].trim().to_string()
}

fn create_lexical_error(source: &str, position: usize) -> LexicalError {
    let (line, column) = position_to_line_col(source, position);
    let unexpected_char = source[position..].chars().next().unwrap_or('\0');
    let context = get_error_context(source, position);

    LexicalError {
        location: position,
        line,
        column,
        unexpected_char,
        context,
    }
}

/// Tokenize a whole source file, registering identifiers in the symbol
/// table as they appear. The returned stream always ends with `Eof`.
pub fn lex(source: &str, symtab: &mut SymbolTable) -> Result<Vec<Token>, LexicalError> {
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(kind) => {
                let text = lexer.slice();
                if kind == TokenKind::Ident {
                    symtab.add(text);
                }
                tokens.push(Token::new(kind, text));
            }
            Err(()) => return Err(create_lexical_error(source, lexer.span().start)),
        }
    }

    tokens.push(Token::eof());
    Ok(tokens)
}
