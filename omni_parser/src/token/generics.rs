//! Generics-context token rewriting.
//!
//! A single pass over the raw token stream tracks a `generic_depth`
//! counter and splits `>>` into two `>` tokens whenever it appears inside
//! a generic argument list. This is what lets a plain recursive-descent
//! parser accept `array<array<int>>`.

use crate::span::{Position, Span};

use super::{Token, TokenKind};

/// Rewrite the raw token stream for generics.
///
/// A `<` opens a generic level when it immediately follows an identifier
/// (or `]`, for the `[]<T>` array spelling) and the token after it can
/// begin a type expression; otherwise it stays a comparison operator.
/// A `>` closes one level. A `>>` seen at positive depth is split into
/// two adjacent `>` tokens.
pub fn rewrite_generics(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut depth: usize = 0;

    for (i, tok) in tokens.iter().enumerate() {
        match tok.kind {
            TokenKind::Lt => {
                let prev_opens = i > 0
                    && matches!(
                        tokens[i - 1].kind,
                        TokenKind::Ident | TokenKind::RBracket
                    );
                let next_opens = tokens
                    .get(i + 1)
                    .map(|t| {
                        matches!(
                            t.kind,
                            TokenKind::Ident
                                | TokenKind::Lt
                                | TokenKind::LBracket
                                | TokenKind::Star
                                | TokenKind::LParen
                        )
                    })
                    .unwrap_or(false);
                if prev_opens && next_opens {
                    depth += 1;
                }
                out.push(tok.clone());
            }
            TokenKind::Gt => {
                depth = depth.saturating_sub(1);
                out.push(tok.clone());
            }
            TokenKind::Shr if depth > 0 => {
                let (first, second) = split_shr(tok);
                out.push(first);
                out.push(second);
                depth = depth.saturating_sub(2);
            }
            _ => out.push(tok.clone()),
        }
    }

    out
}

/// Split a `>>` token into two `>` tokens with adjacent spans.
fn split_shr(tok: &Token) -> (Token, Token) {
    let start = tok.span.start;
    let mid = Position {
        line: start.line,
        column: start.column + 1,
        offset: start.offset + 1,
    };
    let end = tok.span.end;
    (
        Token::new(TokenKind::Gt, ">", Span::new(start, mid)),
        Token::new(TokenKind::Gt, ">", Span::new(mid, end)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let tokens = tokenize(src).expect("lex failed");
        rewrite_generics(tokens).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_nested_generic_shr_is_split() {
        let ks = kinds("array<array<int>>");
        assert_eq!(
            ks,
            vec![
                TokenKind::Ident,
                TokenKind::Lt,
                TokenKind::Ident,
                TokenKind::Lt,
                TokenKind::Ident,
                TokenKind::Gt,
                TokenKind::Gt,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_shift_outside_generics_is_kept() {
        let ks = kinds("x >> 2");
        assert_eq!(
            ks,
            vec![TokenKind::Ident, TokenKind::Shr, TokenKind::IntLit, TokenKind::Eof]
        );
    }

    #[test]
    fn test_comparison_lt_does_not_open_before_literal() {
        // `a < 3` — the token after `<` is a literal, not a type.
        let ks = kinds("a < 3");
        assert_eq!(
            ks,
            vec![TokenKind::Ident, TokenKind::Lt, TokenKind::IntLit, TokenKind::Eof]
        );
    }

    #[test]
    fn test_array_spelling_opens_generic() {
        let ks = kinds("[]<[]<int>>");
        assert!(ks.iter().filter(|k| **k == TokenKind::Gt).count() == 2);
        assert!(!ks.contains(&TokenKind::Shr));
    }

    #[test]
    fn test_split_spans_are_adjacent() {
        let tokens = rewrite_generics(tokenize("a<b<c>>").unwrap());
        let gts: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Gt)
            .collect();
        assert_eq!(gts.len(), 2);
        assert_eq!(gts[0].span.end.offset, gts[1].span.start.offset);
        assert_eq!(gts[0].span.len(), 1);
        assert_eq!(gts[1].span.len(), 1);
    }
}
