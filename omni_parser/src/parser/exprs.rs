//! Expression parsing (Pratt loop over the precedence ladder)
//!
//! Handles binary/unary expressions, postfix operations (call, index,
//! member access, increments), struct/array/map literals, lambdas, the
//! speculative cast disambiguation, and `new`/`delete`/`await`.

use crate::ast::{BinaryOp, Expr, LambdaParam, LiteralKind, TypeExpr, UnaryOp};
use crate::error::{ParseError, ParseResult};
use crate::span::Span;
use crate::token::{Associativity, Precedence, TokenKind};

use super::Parser;

impl Parser {
    /// Parse an expression (top-level entry point).
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_expression_with_precedence(Precedence::lowest())
    }

    /// Pratt parser core.
    fn parse_expression_with_precedence(&mut self, min_prec: Precedence) -> ParseResult<Expr> {
        let mut left = self.parse_prefix()?;

        loop {
            let Some((prec, assoc)) = self.kind().binary_precedence() else {
                break;
            };
            if prec < min_prec {
                break;
            }

            let op_token = self.advance();
            let next_prec = match assoc {
                Associativity::Left => prec.next(),
                Associativity::Right => prec,
            };
            let right = self.parse_expression_with_precedence(next_prec)?;
            let span = Span::between(left.span(), right.span());

            left = if op_token.kind == TokenKind::Eq {
                Expr::Assign {
                    target: Box::new(left),
                    value: Box::new(right),
                    span,
                }
            } else {
                Expr::Binary {
                    op: binary_op(op_token.kind),
                    lhs: Box::new(left),
                    rhs: Box::new(right),
                    span,
                }
            };
        }

        Ok(left)
    }

    /// Unary operators, `await`, `new`, `delete`, the speculative cast,
    /// then a primary with its postfix operations.
    fn parse_prefix(&mut self) -> ParseResult<Expr> {
        match self.kind() {
            TokenKind::Minus | TokenKind::Bang | TokenKind::Tilde => {
                let op_token = self.advance();
                let operand = self.parse_prefix()?;
                let span = Span::between(op_token.span, operand.span());
                Ok(Expr::Unary {
                    op: unary_op(op_token.kind),
                    operand: Box::new(operand),
                    span,
                })
            }
            TokenKind::KwAwait => {
                let kw = self.advance();
                let operand = self.parse_prefix()?;
                let span = Span::between(kw.span, operand.span());
                Ok(Expr::Await {
                    expr: Box::new(operand),
                    span,
                })
            }
            TokenKind::KwNew => {
                let kw = self.advance();
                let operand = self.parse_prefix()?;
                let span = Span::between(kw.span, operand.span());
                Ok(Expr::New {
                    expr: Box::new(operand),
                    span,
                })
            }
            TokenKind::KwDelete => {
                let kw = self.advance();
                let operand = self.parse_prefix()?;
                let span = Span::between(kw.span, operand.span());
                Ok(Expr::Delete {
                    expr: Box::new(operand),
                    span,
                })
            }
            TokenKind::LParen => {
                if let Some(cast) = self.try_parse_cast()? {
                    Ok(cast)
                } else {
                    // Parenthesized grouping.
                    self.advance();
                    let inner = self.parse_expression()?;
                    self.expect(TokenKind::RParen)?;
                    self.parse_postfix_ops(inner)
                }
            }
            _ => {
                let primary = self.parse_primary()?;
                self.parse_postfix_ops(primary)
            }
        }
    }

    /// Speculatively parse `(type) unary`. The cursor rewinds to the `(`
    /// when the parenthesized tokens are not a type followed by `)`, or
    /// when a bare name cast would swallow an ordinary grouping.
    fn try_parse_cast(&mut self) -> ParseResult<Option<Expr>> {
        let mark = self.mark();
        let open = self.advance(); // (

        let ty = match self.parse_type_expr() {
            Ok(ty) => ty,
            Err(_) => {
                self.rewind(mark);
                return Ok(None);
            }
        };
        if !self.check(TokenKind::RParen) {
            self.rewind(mark);
            return Ok(None);
        }
        self.advance(); // )

        if !self.cast_commits(&ty) {
            self.rewind(mark);
            return Ok(None);
        }

        let operand = self.parse_prefix()?;
        let span = Span::between(open.span, operand.span());
        Ok(Some(Expr::Cast {
            ty,
            expr: Box::new(operand),
            span,
        }))
    }

    /// Decide whether a successfully parsed `(type)` is really a cast.
    ///
    /// A structured type (generic, pointer, optional, union, function,
    /// `[]`) or a primitive name commits whenever the next token can start
    /// an expression. A bare non-primitive name only commits when the next
    /// token begins a fresh operand and could not continue `(name)` as a
    /// grouping — this keeps `(a) - 1` an ordinary subtraction.
    fn cast_commits(&self, ty: &TypeExpr) -> bool {
        let structured = match ty {
            TypeExpr::Named { name, args, .. } => {
                !args.is_empty() || name.starts_with('*') || name == "[]" || is_primitive_name(name)
            }
            _ => true,
        };
        if structured {
            return self.kind().starts_expression();
        }
        matches!(
            self.kind(),
            TokenKind::Ident
                | TokenKind::IntLit
                | TokenKind::FloatLit
                | TokenKind::HexLit
                | TokenKind::BinaryLit
                | TokenKind::CharLit
                | TokenKind::StrLit
                | TokenKind::StrInterpLit
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::Bang
                | TokenKind::Tilde
                | TokenKind::KwNew
                | TokenKind::KwAwait
        )
    }

    /// Apply postfix operations: calls, indexing, member access,
    /// struct literals, `++`/`--`.
    fn parse_postfix_ops(&mut self, mut left: Expr) -> ParseResult<Expr> {
        loop {
            match self.kind() {
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    while !self.check(TokenKind::RParen) && !self.at_end() {
                        args.push(self.parse_expression()?);
                        if self.check(TokenKind::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                    let close = self.expect(TokenKind::RParen)?;
                    let span = Span::between(left.span(), close.span);
                    left = Expr::Call {
                        callee: Box::new(left),
                        args,
                        span,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    let close = self.expect(TokenKind::RBracket)?;
                    let span = Span::between(left.span(), close.span);
                    left = Expr::Index {
                        target: Box::new(left),
                        index: Box::new(index),
                        span,
                    };
                }
                TokenKind::Dot | TokenKind::Arrow => {
                    let through_pointer = self.kind() == TokenKind::Arrow;
                    self.advance();
                    let (name, name_span) = self.expect_ident()?;
                    let span = Span::between(left.span(), name_span);
                    left = Expr::Member {
                        target: Box::new(left),
                        name,
                        through_pointer,
                        span,
                    };
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op = self.advance();
                    let span = Span::between(left.span(), op.span);
                    left = Expr::Increment {
                        target: Box::new(left),
                        is_increment: op.kind == TokenKind::PlusPlus,
                        span,
                    };
                }
                TokenKind::LBrace if self.struct_literal_ahead(&left) => {
                    left = self.parse_struct_literal(left)?;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    /// A `{` after an identifier or member chain is a struct literal only
    /// when the lookahead is `}` or `identifier ':'`. This avoids the
    /// ambiguity with `if cond { ... }`.
    fn struct_literal_ahead(&self, left: &Expr) -> bool {
        if left.dotted_name().is_none() {
            return false;
        }
        self.peek_kind(1) == TokenKind::RBrace
            || (self.peek_kind(1) == TokenKind::Ident && self.peek_kind(2) == TokenKind::Colon)
    }

    fn parse_struct_literal(&mut self, target: Expr) -> ParseResult<Expr> {
        let name = target
            .dotted_name()
            .expect("checked by struct_literal_ahead");
        self.expect(TokenKind::LBrace)?;

        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_end() {
            let (field, _) = self.expect_ident()?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expression()?;
            fields.push((field, value));
            if self.check(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        let close = self.expect(TokenKind::RBrace)?;
        let span = Span::between(target.span(), close.span);

        Ok(Expr::StructLit { name, fields, span })
    }

    /// Primary expressions: identifiers, literals, collection literals,
    /// lambdas, interpolated strings.
    fn parse_primary(&mut self) -> ParseResult<Expr> {
        match self.kind() {
            TokenKind::Ident => {
                let token = self.advance();
                Ok(Expr::Ident {
                    name: token.lexeme,
                    span: token.span,
                })
            }
            TokenKind::IntLit => self.literal(LiteralKind::Int),
            TokenKind::FloatLit => self.literal(LiteralKind::Float),
            TokenKind::HexLit => self.literal(LiteralKind::Hex),
            TokenKind::BinaryLit => self.literal(LiteralKind::Binary),
            TokenKind::CharLit => self.literal(LiteralKind::Char),
            TokenKind::StrLit => self.literal(LiteralKind::Str),
            TokenKind::True | TokenKind::False => self.literal(LiteralKind::Bool),
            TokenKind::Null => self.literal(LiteralKind::Null),
            TokenKind::StrInterpLit => {
                let token = self.advance();
                self.parse_interpolation(&token)
            }
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_map_literal(),
            TokenKind::Pipe | TokenKind::PipePipe => self.parse_lambda(),
            TokenKind::Eof => Err(ParseError::unexpected_eof(
                "expression",
                self.current_span(),
            )),
            _ => Err(ParseError::unexpected_token(
                self.current().lexeme.clone(),
                "expression",
                self.current_span(),
            )),
        }
    }

    fn literal(&mut self, kind: LiteralKind) -> ParseResult<Expr> {
        let token = self.advance();
        Ok(Expr::Literal {
            kind,
            text: token.lexeme,
            span: token.span,
        })
    }

    /// `[a, b, c]`
    fn parse_array_literal(&mut self) -> ParseResult<Expr> {
        let open = self.expect(TokenKind::LBracket)?;
        let mut elements = Vec::new();
        while !self.check(TokenKind::RBracket) && !self.at_end() {
            elements.push(self.parse_expression()?);
            if self.check(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        let close = self.expect(TokenKind::RBracket)?;
        Ok(Expr::ArrayLit {
            elements,
            span: Span::between(open.span, close.span),
        })
    }

    /// `{k: v, ...}`
    fn parse_map_literal(&mut self) -> ParseResult<Expr> {
        let open = self.expect(TokenKind::LBrace)?;
        let mut entries = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_end() {
            let key = self.parse_expression()?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expression()?;
            entries.push((key, value));
            if self.check(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        let close = self.expect(TokenKind::RBrace)?;
        Ok(Expr::MapLit {
            entries,
            span: Span::between(open.span, close.span),
        })
    }

    /// `|x, y: int| expr` — `||` begins a zero-parameter lambda.
    fn parse_lambda(&mut self) -> ParseResult<Expr> {
        let open = self.advance();
        let mut params = Vec::new();

        if open.kind == TokenKind::Pipe {
            while !self.check(TokenKind::Pipe) && !self.at_end() {
                let (name, name_span) = self.expect_ident()?;
                let ty = if self.check(TokenKind::Colon) {
                    self.advance();
                    Some(self.parse_type_expr()?)
                } else {
                    None
                };
                let span = ty
                    .as_ref()
                    .map(|t| Span::between(name_span, t.span()))
                    .unwrap_or(name_span);
                params.push(LambdaParam { name, ty, span });
                if self.check(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
            self.expect(TokenKind::Pipe)?;
        }

        let body = self.parse_expression()?;
        let span = Span::between(open.span, body.span());
        Ok(Expr::Lambda {
            params,
            body: Box::new(body),
            span,
        })
    }
}

fn binary_op(kind: TokenKind) -> BinaryOp {
    match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::BangEq => BinaryOp::Neq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::Lte,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::Gte,
        TokenKind::AmpAmp => BinaryOp::And,
        TokenKind::PipePipe => BinaryOp::Or,
        TokenKind::Amp => BinaryOp::BitAnd,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::Shl => BinaryOp::Shl,
        TokenKind::Shr => BinaryOp::Shr,
        other => unreachable!("not a binary operator: {:?}", other),
    }
}

fn unary_op(kind: TokenKind) -> UnaryOp {
    match kind {
        TokenKind::Minus => UnaryOp::Neg,
        TokenKind::Bang => UnaryOp::Not,
        TokenKind::Tilde => UnaryOp::BitNot,
        other => unreachable!("not a unary operator: {:?}", other),
    }
}

/// Primitive type names; shared with the cast heuristic.
pub(crate) fn is_primitive_name(name: &str) -> bool {
    matches!(
        name,
        "int" | "long" | "byte" | "float" | "double" | "bool" | "char" | "string" | "void"
    )
}
