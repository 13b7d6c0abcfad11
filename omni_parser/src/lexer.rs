//! Lexer for Omni source code
//!
//! Wraps the logos-generated lexer with additional functionality for
//! strings (including interpolation detection), block comments, and
//! character-literal validation.

use logos::Logos;

use crate::error::ParseError;
use crate::span::{SourceMap, Span};
use crate::token::{Token, TokenKind};

/// The escape characters accepted after a backslash.
const VALID_ESCAPES: &[u8] = b"ntr\\\"0'";

/// Omni lexer
pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, TokenKind>,
    source_map: SourceMap,
    /// Offset from original source (used after restarting lexer)
    offset: usize,
    /// Errors collected while scanning
    errors: Vec<ParseError>,
}

impl<'a> std::fmt::Debug for Lexer<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer").field("offset", &self.offset).finish()
    }
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'a str) -> Self {
        let source_map = SourceMap::new(source);
        Self {
            source,
            inner: TokenKind::lexer(source),
            source_map,
            offset: 0,
            errors: Vec::new(),
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    fn make_span(&self, start: usize, end: usize) -> Span {
        self.source_map.span(start, end)
    }

    fn make_token(&self, kind: TokenKind, start: usize, end: usize) -> Token {
        Token::new(kind, &self.source[start..end], self.make_span(start, end))
    }

    /// Get the next token, recording any errors encountered on the way.
    fn next_token(&mut self) -> Option<Token> {
        loop {
            let result = self.inner.next()?;
            let span = self.inner.span();
            let start = self.offset + span.start;
            let end = self.offset + span.end;

            match result {
                Ok(TokenKind::DoubleQuote) => match self.scan_string_to_close(start, end) {
                    Ok(string_end) => {
                        self.restart_from(string_end);
                        let lexeme = &self.source[start..string_end];
                        let kind = if lexeme.contains("${") {
                            TokenKind::StrInterpLit
                        } else {
                            TokenKind::StrLit
                        };
                        return Some(self.make_token(kind, start, string_end));
                    }
                    Err(e) => {
                        self.errors.push(e);
                        self.restart_from(self.source.len());
                        return None;
                    }
                },

                Ok(TokenKind::BlockCommentStart) => {
                    match self.scan_block_comment(start, end) {
                        Ok(comment_end) => {
                            self.restart_from(comment_end);
                            continue;
                        }
                        Err(e) => {
                            self.errors.push(e);
                            self.restart_from(self.source.len());
                            return None;
                        }
                    }
                }

                Ok(TokenKind::CharLit) => {
                    if let Some(e) = self.check_char_escape(start, end) {
                        self.errors.push(e);
                    }
                    return Some(self.make_token(TokenKind::CharLit, start, end));
                }

                Ok(kind) => return Some(self.make_token(kind, start, end)),

                Err(()) => {
                    // Stray character: report it and skip to the next
                    // whitespace boundary.
                    self.errors.push(ParseError::StrayCharacter {
                        found: self.source[start..end].to_string(),
                        span: self.make_span(start, end),
                    });
                    let resume = self.next_whitespace_boundary(end);
                    self.restart_from(resume);
                    continue;
                }
            }
        }
    }

    /// Scan string content to find the closing quote, validating escapes.
    /// Uses memchr for fast delimiter scanning.
    fn scan_string_to_close(&mut self, quote_start: usize, start: usize) -> Result<usize, ParseError> {
        let bytes = self.source.as_bytes();
        let mut pos = start;

        while pos < bytes.len() {
            match memchr::memchr3(b'\\', b'"', b'\n', &bytes[pos..]) {
                None => break,
                Some(offset) => {
                    pos += offset;
                    match bytes[pos] {
                        b'\\' => {
                            if pos + 1 >= bytes.len() {
                                break;
                            }
                            if !VALID_ESCAPES.contains(&bytes[pos + 1]) {
                                let seq = self.source[pos..].chars().take(2).collect::<String>();
                                self.errors.push(ParseError::InvalidEscape {
                                    sequence: seq,
                                    span: self.make_span(pos, pos + 2),
                                });
                            }
                            pos += 2;
                        }
                        b'"' => return Ok(pos + 1),
                        // Strings do not span lines.
                        _ => break,
                    }
                }
            }
        }

        Err(ParseError::UnterminatedString {
            span: self.make_span(quote_start, pos.min(bytes.len())),
        })
    }

    /// Scan a block comment. Block comments do not nest.
    fn scan_block_comment(&self, open_start: usize, start: usize) -> Result<usize, ParseError> {
        let bytes = self.source.as_bytes();
        let mut pos = start;

        while pos + 1 < bytes.len() {
            match memchr::memchr(b'*', &bytes[pos..]) {
                None => break,
                Some(offset) => {
                    pos += offset;
                    if pos + 1 < bytes.len() && bytes[pos + 1] == b'/' {
                        return Ok(pos + 2);
                    }
                    pos += 1;
                }
            }
        }

        Err(ParseError::UnterminatedBlockComment {
            span: self.make_span(open_start, bytes.len()),
        })
    }

    /// Validate the escape inside a character literal like `'\q'`.
    fn check_char_escape(&self, start: usize, end: usize) -> Option<ParseError> {
        let inner = &self.source[start + 1..end - 1];
        let mut chars = inner.chars();
        if chars.next() == Some('\\') {
            let escaped = chars.next()?;
            let valid = escaped.is_ascii() && VALID_ESCAPES.contains(&(escaped as u8));
            if !valid {
                return Some(ParseError::InvalidEscape {
                    sequence: format!("\\{}", escaped),
                    span: self.make_span(start + 1, end - 1),
                });
            }
        }
        None
    }

    /// Byte offset of the next whitespace boundary at or after `pos`.
    fn next_whitespace_boundary(&self, pos: usize) -> usize {
        let bytes = self.source.as_bytes();
        let mut p = pos;
        while p < bytes.len() && !bytes[p].is_ascii_whitespace() {
            p += 1;
        }
        p
    }

    /// Restart the inner lexer from a new absolute position.
    fn restart_from(&mut self, pos: usize) {
        let logos_abs_pos = self.offset + self.inner.span().end;
        if pos > logos_abs_pos && pos <= self.source.len() {
            self.inner.bump(pos - logos_abs_pos);
        } else if pos < self.source.len() {
            self.inner = TokenKind::lexer(&self.source[pos..]);
            self.offset = pos;
        } else {
            self.inner = TokenKind::lexer("");
            self.offset = pos;
        }
    }

    /// Consume the whole source, returning tokens and collected errors.
    pub fn run(mut self) -> (Vec<Token>, Vec<ParseError>) {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        let eof_span = self.make_span(self.source.len(), self.source.len());
        tokens.push(Token::new(TokenKind::Eof, "", eof_span));
        (tokens, self.errors)
    }
}

/// Tokenize source code.
///
/// Lexical errors abort the pipeline: if any were recorded the token
/// stream is withheld and the errors are returned instead.
pub fn tokenize(source: &str) -> Result<Vec<Token>, Vec<ParseError>> {
    let (tokens, errors) = Lexer::new(source).run();
    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds("func foo(x:int) { return x + 1 }"),
            vec![
                TokenKind::KwFunc,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Ident,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::KwReturn,
                TokenKind::Ident,
                TokenKind::Plus,
                TokenKind::IntLit,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_number_literals() {
        assert_eq!(
            kinds("42 3.25 0xFF 0b1010"),
            vec![
                TokenKind::IntLit,
                TokenKind::FloatLit,
                TokenKind::HexLit,
                TokenKind::BinaryLit,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_literal() {
        let tokens = tokenize(r#"let s = "hi\n""#).unwrap();
        assert_eq!(tokens[3].kind, TokenKind::StrLit);
        assert_eq!(tokens[3].lexeme, r#""hi\n""#);
    }

    #[test]
    fn test_interpolated_string_literal() {
        let tokens = tokenize(r#""a ${x + 1} b""#).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::StrInterpLit);
        assert_eq!(tokens[0].lexeme, r#""a ${x + 1} b""#);
    }

    #[test]
    fn test_unterminated_string() {
        let errors = tokenize(r#"let s = "oops"#).unwrap_err();
        assert!(matches!(errors[0], ParseError::UnterminatedString { .. }));
    }

    #[test]
    fn test_invalid_escape() {
        let errors = tokenize(r#""bad \q escape""#).unwrap_err();
        assert!(matches!(errors[0], ParseError::InvalidEscape { .. }));
    }

    #[test]
    fn test_block_comment_skipped() {
        assert_eq!(
            kinds("1 /* comment */ 2"),
            vec![TokenKind::IntLit, TokenKind::IntLit, TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_block_comment() {
        let errors = tokenize("1 /* oops").unwrap_err();
        assert!(matches!(
            errors[0],
            ParseError::UnterminatedBlockComment { .. }
        ));
    }

    #[test]
    fn test_line_comment_skipped() {
        assert_eq!(
            kinds("1 // trailing\n2"),
            vec![TokenKind::IntLit, TokenKind::IntLit, TokenKind::Eof]
        );
    }

    #[test]
    fn test_stray_character_skips_to_whitespace() {
        let errors = tokenize("let ## = 1").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ParseError::StrayCharacter { .. }));
    }

    #[test]
    fn test_char_literal() {
        let tokens = tokenize(r"'a' '\n'").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::CharLit);
        assert_eq!(tokens[1].kind, TokenKind::CharLit);
    }

    #[test]
    fn test_non_ascii_identifier() {
        let tokens = tokenize("létal = 1").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].lexeme, "létal");
    }

    #[test]
    fn test_spans_are_monotonic_and_slice_back() {
        let source = "func add(a:int, b:int):int { return a + b }";
        let tokens = tokenize(source).unwrap();
        let mut prev_end = 0;
        for tok in &tokens {
            assert!(tok.span.start.offset <= tok.span.end.offset);
            assert!(tok.span.start.offset >= prev_end);
            assert_eq!(
                &source[tok.span.start.offset..tok.span.end.offset],
                tok.lexeme
            );
            prev_end = tok.span.end.offset;
        }
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn test_eof_is_zero_width() {
        let tokens = tokenize("x").unwrap();
        let eof = tokens.last().unwrap();
        assert_eq!(eof.span.start, eof.span.end);
    }
}
