//! Parsing logic for the IR including a scanner (tokenizer).

mod parser;
mod scanner;
mod token;

pub use parser::Parse;
pub use parser::Parser;
pub use scanner::Scanner;
pub use token::Position;
pub use token::Token;
pub use token::TokenKind;
