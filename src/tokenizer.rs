//! # Tokenizer/ Lexer
//!
//! Decodes an input sequence of UTF-8 bytes from a JSONPath query into code
//! points, and the code points into a token stream.
pub mod lexer;
pub mod reader;
pub mod token;

// Re-exports
pub use lexer::{Lexer, tokenize, unescape_string_literal};
pub use reader::{CodePoint, CodepointReader};
pub use token::{Token, TokenKind};
