pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod semantic;
pub mod table;
