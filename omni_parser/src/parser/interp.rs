//! String interpolation parsing
//!
//! The raw interpolation token is reparsed: `${expr}` segments are
//! isolated by brace matching (respecting nested `{}` and string
//! literals), each is lexed and parsed with the same pipeline, and the
//! result is an ordered list of literal-or-expression parts.

use crate::ast::{Expr, InterpPart};
use crate::error::{ParseError, ParseResult};
use crate::span::Position;
use crate::token::{rewrite_generics, Token};

use super::Parser;

impl Parser {
    /// Reparse an interpolated string token into its parts.
    pub(crate) fn parse_interpolation(&mut self, token: &Token) -> ParseResult<Expr> {
        let lexeme = &token.lexeme;
        // Drop the surrounding quotes.
        let content = &lexeme[1..lexeme.len() - 1];
        let bytes = content.as_bytes();

        let mut parts = Vec::new();
        let mut text = String::new();
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] == b'$' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
                if !text.is_empty() {
                    parts.push(InterpPart::Text(std::mem::take(&mut text)));
                }

                let seg_start = i + 2;
                let seg_end = match find_closing_brace(bytes, seg_start) {
                    Some(end) => end,
                    None => {
                        return Err(ParseError::UnterminatedInterpolation { span: token.span })
                    }
                };

                let segment = &content[seg_start..seg_end];
                // The segment sits `1 + seg_start` bytes past the opening
                // quote; string literals never span lines.
                let base = Position {
                    line: token.span.start.line,
                    column: token.span.start.column + 1 + seg_start,
                    offset: token.span.start.offset + 1 + seg_start,
                };
                parts.push(InterpPart::Expr(parse_segment(segment, base)?));
                i = seg_end + 1;
            } else {
                // Advance one whole character to keep UTF-8 intact.
                let ch_len = content[i..]
                    .chars()
                    .next()
                    .map(char::len_utf8)
                    .unwrap_or(1);
                text.push_str(&content[i..i + ch_len]);
                i += ch_len;
            }
        }

        if !text.is_empty() {
            parts.push(InterpPart::Text(text));
        }

        Ok(Expr::Interp {
            parts,
            span: token.span,
        })
    }
}

/// Find the `}` closing a `${` opened just before `start`. Returns the
/// byte index of the closing brace. Braces nested in the expression and
/// braces inside string literals do not close the segment.
fn find_closing_brace(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut in_string = false;
    let mut j = start;

    while j < bytes.len() {
        let b = bytes[j];
        if in_string {
            if b == b'\\' {
                j += 2;
                continue;
            }
            if b == b'"' {
                in_string = false;
            }
        } else {
            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(j);
                    }
                }
                _ => {}
            }
        }
        j += 1;
    }
    None
}

/// Lex and parse one `${…}` segment with the regular pipeline, rebasing
/// every span onto the segment's position in the enclosing source.
fn parse_segment(segment: &str, base: Position) -> ParseResult<Expr> {
    let tokens = match crate::lexer::tokenize(segment) {
        Ok(tokens) => tokens,
        Err(errors) => {
            let first = errors.into_iter().next().expect("non-empty on Err");
            return Err(rebase_error(first, base));
        }
    };
    let tokens: Vec<Token> = rewrite_generics(tokens)
        .into_iter()
        .map(|mut t| {
            t.span = t.span.rebased(base);
            t
        })
        .collect();

    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expression()?;
    if !parser.at_end() {
        return Err(ParseError::unexpected_token(
            parser.current().lexeme.clone(),
            "end of interpolation segment",
            parser.current_span(),
        ));
    }
    Ok(expr)
}

fn rebase_error(e: ParseError, base: Position) -> ParseError {
    match e {
        ParseError::UnexpectedToken {
            found,
            expected,
            span,
        } => ParseError::UnexpectedToken {
            found,
            expected,
            span: span.rebased(base),
        },
        ParseError::UnexpectedEof { expected, span } => ParseError::UnexpectedEof {
            expected,
            span: span.rebased(base),
        },
        ParseError::InvalidEscape { sequence, span } => ParseError::InvalidEscape {
            sequence,
            span: span.rebased(base),
        },
        ParseError::UnterminatedString { span } => ParseError::UnterminatedString {
            span: span.rebased(base),
        },
        ParseError::UnterminatedBlockComment { span } => ParseError::UnterminatedBlockComment {
            span: span.rebased(base),
        },
        ParseError::InvalidCharLiteral { span } => ParseError::InvalidCharLiteral {
            span: span.rebased(base),
        },
        ParseError::StrayCharacter { found, span } => ParseError::StrayCharacter {
            found,
            span: span.rebased(base),
        },
        ParseError::UnterminatedInterpolation { span } => ParseError::UnterminatedInterpolation {
            span: span.rebased(base),
        },
        ParseError::UnionInGenericArgs { span } => ParseError::UnionInGenericArgs {
            span: span.rebased(base),
        },
        ParseError::InvalidSyntax { message, span } => ParseError::InvalidSyntax {
            message,
            span: span.rebased(base),
        },
    }
}
