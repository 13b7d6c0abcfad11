//! Lex and parse error types

use crate::span::Span;
use thiserror::Error;

/// Parse error type
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    /// Unexpected token
    #[error("unexpected token '{found}', expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        span: Span,
    },

    /// Unexpected end of input
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String, span: Span },

    /// Invalid escape sequence
    #[error("invalid escape sequence '{sequence}'")]
    InvalidEscape { sequence: String, span: Span },

    /// Unterminated string
    #[error("unterminated string literal")]
    UnterminatedString { span: Span },

    /// Unterminated block comment
    #[error("unterminated block comment")]
    UnterminatedBlockComment { span: Span },

    /// Invalid character literal
    #[error("invalid character literal")]
    InvalidCharLiteral { span: Span },

    /// Character the lexer cannot start a token with
    #[error("unexpected character '{found}'")]
    StrayCharacter { found: String, span: Span },

    /// Unterminated `${` interpolation segment
    #[error("unterminated '${{' in string interpolation")]
    UnterminatedInterpolation { span: Span },

    /// `|` used directly inside a generic argument list
    #[error("union types are not allowed directly inside generic arguments")]
    UnionInGenericArgs { span: Span },

    /// Invalid syntax with a free-form message
    #[error("{message}")]
    InvalidSyntax { message: String, span: Span },
}

impl ParseError {
    /// Get the span of the error.
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::UnexpectedEof { span, .. } => *span,
            ParseError::InvalidEscape { span, .. } => *span,
            ParseError::UnterminatedString { span } => *span,
            ParseError::UnterminatedBlockComment { span } => *span,
            ParseError::InvalidCharLiteral { span } => *span,
            ParseError::StrayCharacter { span, .. } => *span,
            ParseError::UnterminatedInterpolation { span } => *span,
            ParseError::UnionInGenericArgs { span } => *span,
            ParseError::InvalidSyntax { span, .. } => *span,
        }
    }

    /// True for errors produced while scanning raw characters.
    pub fn is_lexical(&self) -> bool {
        matches!(
            self,
            ParseError::InvalidEscape { .. }
                | ParseError::UnterminatedString { .. }
                | ParseError::UnterminatedBlockComment { .. }
                | ParseError::InvalidCharLiteral { .. }
                | ParseError::StrayCharacter { .. }
        )
    }

    pub fn unexpected_token(
        found: impl Into<String>,
        expected: impl Into<String>,
        span: Span,
    ) -> Self {
        ParseError::UnexpectedToken {
            found: found.into(),
            expected: expected.into(),
            span,
        }
    }

    pub fn unexpected_eof(expected: impl Into<String>, span: Span) -> Self {
        ParseError::UnexpectedEof {
            expected: expected.into(),
            span,
        }
    }

    pub fn invalid_syntax(message: impl Into<String>, span: Span) -> Self {
        ParseError::InvalidSyntax {
            message: message.into(),
            span,
        }
    }
}

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Collection of parse errors for error recovery
#[derive(Debug, Default)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn take(self) -> Vec<ParseError> {
        self.errors
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    pub fn first(&self) -> Option<&ParseError> {
        self.errors.first()
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParseErrors {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
