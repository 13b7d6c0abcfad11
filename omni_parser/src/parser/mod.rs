//! Recursive descent parser for the Omni language
//!
//! Consumes the rewritten token stream and produces a [`Module`]. Errors
//! are accumulated; the parser synchronizes at declaration and statement
//! boundaries and always returns a best-effort partial module so
//! downstream passes can surface additional diagnostics.

mod decls;
mod exprs;
mod interp;
mod stmts;
mod types;

use crate::ast::{Decl, Import, Module};
use crate::error::{ParseError, ParseErrors, ParseResult};
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Omni parser
pub struct Parser {
    /// Rewritten token stream; always ends with an `Eof` token.
    tokens: Vec<Token>,
    /// Cursor into `tokens`.
    pos: usize,
    /// Collected errors (for error recovery)
    errors: ParseErrors,
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser").field("pos", &self.pos).finish()
    }
}

impl Parser {
    /// Create a parser over a rewritten token stream.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let span = tokens.last().map(|t| t.span).unwrap_or_else(Span::empty);
            tokens.push(Token::new(TokenKind::Eof, "", span));
        }
        Self {
            tokens,
            pos: 0,
            errors: ParseErrors::new(),
        }
    }

    /// Parse the token stream into a module plus accumulated errors.
    pub fn parse(mut self) -> (Module, ParseErrors) {
        let start_span = self.current_span();
        let mut imports: Vec<Import> = Vec::new();
        let mut decls: Vec<Decl> = Vec::new();

        while !self.at_end() {
            while self.check(TokenKind::Semicolon) {
                self.advance();
            }
            if self.at_end() {
                break;
            }

            match self.parse_decl() {
                Ok(Decl::Import(import)) => imports.push(import),
                Ok(decl) => decls.push(decl),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize_decl();
                }
            }
        }

        let span = Span::between(start_span, self.current_span());
        (
            Module {
                imports,
                decls,
                span,
            },
            self.errors,
        )
    }

    // ==================== Token Management ====================

    /// The current token. Never panics; the stream ends with `Eof`.
    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// The current token's kind.
    pub(crate) fn kind(&self) -> TokenKind {
        self.current().kind
    }

    /// Kind of the token `n` places ahead of the current one.
    pub(crate) fn peek_kind(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    /// Check if the current token matches.
    pub(crate) fn check(&self, expected: TokenKind) -> bool {
        self.kind() == expected
    }

    /// Check if the current token is any of the given kinds.
    pub(crate) fn check_any(&self, expected: &[TokenKind]) -> bool {
        expected.contains(&self.kind())
    }

    /// Consume and return the current token. Never advances past `Eof`.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it matches, error otherwise.
    pub(crate) fn expect(&mut self, expected: TokenKind) -> ParseResult<Token> {
        if self.check(expected) {
            Ok(self.advance())
        } else if self.at_end() {
            Err(ParseError::unexpected_eof(
                expected.describe(),
                self.current_span(),
            ))
        } else {
            Err(ParseError::unexpected_token(
                self.current().lexeme.clone(),
                expected.describe(),
                self.current_span(),
            ))
        }
    }

    /// Consume an identifier and return its text.
    pub(crate) fn expect_ident(&mut self) -> ParseResult<(String, Span)> {
        let token = self.expect(TokenKind::Ident)?;
        Ok((token.lexeme, token.span))
    }

    /// Span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.current().span
    }

    /// Check if we're at the end of input.
    pub(crate) fn at_end(&self) -> bool {
        self.kind() == TokenKind::Eof
    }

    /// Save the cursor for speculative parsing.
    pub(crate) fn mark(&self) -> usize {
        self.pos
    }

    /// Rewind the cursor to a previously saved mark.
    pub(crate) fn rewind(&mut self, mark: usize) {
        self.pos = mark;
    }

    /// Record an error without aborting the current production.
    pub(crate) fn report(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    // ==================== Error Recovery ====================

    /// Skip to the next declaration boundary.
    pub(crate) fn synchronize_decl(&mut self) {
        // Always advance at least once to avoid infinite loops.
        if !self.at_end() {
            self.advance();
        }
        while !self.at_end() {
            if self.check_any(&[
                TokenKind::KwFunc,
                TokenKind::KwLet,
                TokenKind::KwVar,
                TokenKind::KwStruct,
                TokenKind::KwEnum,
                TokenKind::KwType,
                TokenKind::KwImport,
            ]) {
                return;
            }
            self.advance();
        }
    }

    /// Skip to the next statement boundary.
    pub(crate) fn synchronize_stmt(&mut self) {
        if !self.at_end() {
            self.advance();
        }
        while !self.at_end() {
            if self.check_any(&[
                TokenKind::RBrace,
                TokenKind::KwReturn,
                TokenKind::KwIf,
                TokenKind::KwFor,
                TokenKind::KwLet,
                TokenKind::KwVar,
            ]) {
                return;
            }
            self.advance();
        }
    }
}

/// Convenience entry point: lex, rewrite and parse source text.
pub fn parse_source(source: &str) -> Result<(Module, ParseErrors), Vec<ParseError>> {
    let tokens = crate::lexer::tokenize(source)?;
    let tokens = crate::token::rewrite_generics(tokens);
    Ok(Parser::new(tokens).parse())
}
