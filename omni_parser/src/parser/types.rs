//! Type expression parsing
//!
//! Grammar, loosest first: unions (`A | B`), optional suffix (`T?`),
//! then pointers (`*T`), function types (`(A, B) -> R`), the `[]<T>`
//! array spelling, and named types with generic arguments.

use crate::ast::TypeExpr;
use crate::error::{ParseError, ParseResult};
use crate::span::Span;
use crate::token::TokenKind;

use super::Parser;

impl Parser {
    /// Parse a full type expression, including unions.
    pub(crate) fn parse_type_expr(&mut self) -> ParseResult<TypeExpr> {
        let first = self.parse_optional_type()?;

        if !self.check(TokenKind::Pipe) {
            return Ok(first);
        }

        let mut members = vec![first];
        while self.check(TokenKind::Pipe) {
            self.advance();
            members.push(self.parse_optional_type()?);
        }
        let span = Span::between(
            members.first().map(|t| t.span()).unwrap_or_default(),
            members.last().map(|t| t.span()).unwrap_or_default(),
        );
        Ok(TypeExpr::Union { members, span })
    }

    /// A non-union type with any number of `?` suffixes.
    fn parse_optional_type(&mut self) -> ParseResult<TypeExpr> {
        let mut ty = self.parse_primary_type()?;
        while self.check(TokenKind::Question) {
            let q = self.advance();
            let span = Span::between(ty.span(), q.span);
            ty = TypeExpr::Optional {
                inner: Box::new(ty),
                span,
            };
        }
        Ok(ty)
    }

    fn parse_primary_type(&mut self) -> ParseResult<TypeExpr> {
        match self.kind() {
            // Pointer: `*T`, `**T`; one leading star per pointer level.
            TokenKind::Star => {
                let star = self.advance();
                let inner = self.parse_primary_type()?;
                match inner {
                    TypeExpr::Named { name, args, span } => Ok(TypeExpr::Named {
                        name: format!("*{}", name),
                        args,
                        span: Span::between(star.span, span),
                    }),
                    other => Err(ParseError::invalid_syntax(
                        "pointer types require a named base type",
                        other.span(),
                    )),
                }
            }

            // `[]<T>` array spelling.
            TokenKind::LBracket => {
                let open = self.advance();
                self.expect(TokenKind::RBracket)?;
                self.expect(TokenKind::Lt)?;
                let elem = self.parse_generic_arg()?;
                let close = self.expect(TokenKind::Gt)?;
                Ok(TypeExpr::Named {
                    name: "[]".to_string(),
                    args: vec![elem],
                    span: Span::between(open.span, close.span),
                })
            }

            // Function type `(A, B) -> R` or parenthesized type `(A | B)`.
            TokenKind::LParen => {
                let open = self.advance();
                let mut inner = Vec::new();
                while !self.check(TokenKind::RParen) && !self.at_end() {
                    inner.push(self.parse_type_expr()?);
                    if self.check(TokenKind::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
                self.expect(TokenKind::RParen)?;

                if self.check(TokenKind::Arrow) {
                    self.advance();
                    let ret = self.parse_optional_type()?;
                    let span = Span::between(open.span, ret.span());
                    return Ok(TypeExpr::Function {
                        params: inner,
                        ret: Box::new(ret),
                        span,
                    });
                }

                // Without `->` this must be a single parenthesized type.
                if inner.len() == 1 {
                    Ok(inner.into_iter().next().expect("len checked"))
                } else {
                    Err(ParseError::invalid_syntax(
                        "parenthesized type must contain exactly one type",
                        Span::between(open.span, self.current_span()),
                    ))
                }
            }

            // Named (possibly qualified, possibly generic) type.
            TokenKind::Ident => {
                let (first, first_span) = self.expect_ident()?;
                let mut name = first;
                let mut end_span = first_span;

                while self.check(TokenKind::Dot) {
                    self.advance();
                    let (seg, seg_span) = self.expect_ident()?;
                    name.push('.');
                    name.push_str(&seg);
                    end_span = seg_span;
                }

                let mut args = Vec::new();
                if self.check(TokenKind::Lt) {
                    self.advance();
                    loop {
                        args.push(self.parse_generic_arg()?);
                        if self.check(TokenKind::Comma) {
                            self.advance();
                            continue;
                        }
                        break;
                    }
                    let close = self.expect(TokenKind::Gt)?;
                    end_span = close.span;
                }

                Ok(TypeExpr::Named {
                    name,
                    args,
                    span: Span::between(first_span, end_span),
                })
            }

            TokenKind::Eof => Err(ParseError::unexpected_eof("type", self.current_span())),
            _ => Err(ParseError::unexpected_token(
                self.current().lexeme.clone(),
                "type",
                self.current_span(),
            )),
        }
    }

    /// A generic argument. A bare `|` is forbidden here; unions must be
    /// parenthesized or named.
    fn parse_generic_arg(&mut self) -> ParseResult<TypeExpr> {
        let arg = self.parse_optional_type()?;
        if self.check(TokenKind::Pipe) {
            return Err(ParseError::UnionInGenericArgs {
                span: self.current_span(),
            });
        }
        Ok(arg)
    }
}
