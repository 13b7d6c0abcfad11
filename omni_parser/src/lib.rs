//! Pure Rust lexer and parser for the Omni language.
//!
//! The pipeline is: source text → [`lexer::tokenize`] →
//! [`token::rewrite_generics`] → [`parser::Parser`] → [`ast::Module`].

// Library code never prints; user-facing text is returned as values.
#![deny(clippy::print_stderr)]

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;

pub use error::{ParseError, ParseErrors, ParseResult};
pub use lexer::tokenize;
pub use parser::{parse_source, Parser};
pub use span::{Position, SourceMap, Span};
pub use token::{rewrite_generics, Token, TokenKind};
