//! Statement parsing

use crate::ast::{Block, CatchClause, Expr, ForStmt, Stmt};
use crate::error::{ParseError, ParseResult};
use crate::span::Span;
use crate::token::TokenKind;

use super::Parser;

impl Parser {
    /// Parse a brace-delimited block with statement-level error recovery.
    pub(crate) fn parse_block(&mut self) -> ParseResult<Block> {
        let open = self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();

        while !self.check(TokenKind::RBrace) && !self.at_end() {
            while self.check(TokenKind::Semicolon) {
                self.advance();
            }
            if self.check(TokenKind::RBrace) || self.at_end() {
                break;
            }
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => {
                    self.report(e);
                    self.synchronize_stmt();
                }
            }
        }

        let close = self.expect(TokenKind::RBrace)?;
        Ok(Block {
            stmts,
            span: Span::between(open.span, close.span),
        })
    }

    /// Parse one statement.
    pub(crate) fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        match self.kind() {
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::KwReturn => self.parse_return(),
            TokenKind::KwIf => self.parse_if(),
            TokenKind::KwWhile => self.parse_while(),
            TokenKind::KwFor => self.parse_for(),
            TokenKind::KwBreak => {
                let kw = self.advance();
                Ok(Stmt::Break { span: kw.span })
            }
            TokenKind::KwContinue => {
                let kw = self.advance();
                Ok(Stmt::Continue { span: kw.span })
            }
            TokenKind::KwLet | TokenKind::KwVar => {
                let decl = self.parse_binding_stmt()?;
                Ok(decl)
            }
            TokenKind::KwTry => self.parse_try(),
            TokenKind::KwThrow => {
                let kw = self.advance();
                let value = self.parse_expression()?;
                let span = Span::between(kw.span, value.span());
                Ok(Stmt::Throw { value, span })
            }
            _ => self.parse_simple_stmt(),
        }
    }

    /// A "simple" statement: short var decl, typed short decl,
    /// assignment, increment, or a bare expression. Also used as the
    /// init/post slots of a classic `for`.
    pub(crate) fn parse_simple_stmt(&mut self) -> ParseResult<Stmt> {
        // `name := expr`
        if self.check(TokenKind::Ident) && self.peek_kind(1) == TokenKind::ColonEq {
            let (name, name_span) = self.expect_ident()?;
            self.advance(); // :=
            let value = self.parse_expression()?;
            let span = Span::between(name_span, value.span());
            return Ok(Stmt::ShortVarDecl { name, value, span });
        }

        // `name : type = expr` (mutable binding without the keyword)
        if self.check(TokenKind::Ident)
            && self.peek_kind(1) == TokenKind::Colon
            && matches!(
                self.peek_kind(2),
                TokenKind::Ident | TokenKind::LBracket | TokenKind::Star | TokenKind::LParen
            )
        {
            let mark = self.mark();
            let (name, name_span) = self.expect_ident()?;
            self.advance(); // :
            match self.parse_type_expr() {
                Ok(ty) if self.check(TokenKind::Eq) => {
                    self.advance(); // =
                    let value = self.parse_expression()?;
                    let span = Span::between(name_span, value.span());
                    return Ok(Stmt::Binding {
                        name,
                        mutable: true,
                        ty: Some(ty),
                        value,
                        span,
                    });
                }
                _ => self.rewind(mark),
            }
        }

        let expr = self.parse_expression()?;
        Ok(match expr {
            Expr::Assign {
                target,
                value,
                span,
            } => Stmt::Assign {
                target: *target,
                value: *value,
                span,
            },
            Expr::Increment {
                target,
                is_increment,
                span,
            } => Stmt::Increment {
                target: *target,
                is_increment,
                span,
            },
            other => Stmt::Expr(other),
        })
    }

    /// `return [expr]`
    fn parse_return(&mut self) -> ParseResult<Stmt> {
        let kw = self.expect(TokenKind::KwReturn)?;
        if self.kind().starts_expression() {
            let value = self.parse_expression()?;
            let span = Span::between(kw.span, value.span());
            Ok(Stmt::Return {
                value: Some(value),
                span,
            })
        } else {
            Ok(Stmt::Return {
                value: None,
                span: kw.span,
            })
        }
    }

    /// `if cond { } [else if ... | else { }]`
    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let kw = self.expect(TokenKind::KwIf)?;
        let cond = self.parse_expression()?;
        let then_block = self.parse_block()?;
        let mut end_span = then_block.span;

        let else_branch = if self.check(TokenKind::KwElse) {
            self.advance();
            let stmt = if self.check(TokenKind::KwIf) {
                self.parse_if()?
            } else {
                Stmt::Block(self.parse_block()?)
            };
            end_span = stmt.span();
            Some(Box::new(stmt))
        } else {
            None
        };

        Ok(Stmt::If {
            cond,
            then_block,
            else_branch,
            span: Span::between(kw.span, end_span),
        })
    }

    /// `while cond { }`
    fn parse_while(&mut self) -> ParseResult<Stmt> {
        let kw = self.expect(TokenKind::KwWhile)?;
        let cond = self.parse_expression()?;
        let body = self.parse_block()?;
        let span = Span::between(kw.span, body.span);
        Ok(Stmt::While { cond, body, span })
    }

    /// Either `for x in expr { }` or `for init; cond; post { }`.
    fn parse_for(&mut self) -> ParseResult<Stmt> {
        let kw = self.expect(TokenKind::KwFor)?;

        // Range form: `for ident in ...`
        if self.check(TokenKind::Ident) && self.peek_kind(1) == TokenKind::KwIn {
            let (var, _) = self.expect_ident()?;
            self.advance(); // in
            let iter = self.parse_expression()?;
            let body = self.parse_block()?;
            let span = Span::between(kw.span, body.span);
            return Ok(Stmt::For(ForStmt::Range {
                var,
                iter,
                body,
                span,
            }));
        }

        // Classic form; each of init/cond/post may be empty.
        let init = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_simple_stmt()?))
        };
        self.expect(TokenKind::Semicolon)?;

        let cond = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semicolon)?;

        let post = if self.check(TokenKind::LBrace) {
            None
        } else {
            Some(Box::new(self.parse_simple_stmt()?))
        };

        let body = self.parse_block()?;
        let span = Span::between(kw.span, body.span);
        Ok(Stmt::For(ForStmt::Classic {
            init,
            cond,
            post,
            body,
            span,
        }))
    }

    /// `let`/`var` statement binding.
    fn parse_binding_stmt(&mut self) -> ParseResult<Stmt> {
        let kw = self.advance();
        let mutable = kw.kind == TokenKind::KwVar;
        let (name, _) = self.expect_ident()?;

        let ty = if self.check(TokenKind::Colon) {
            self.advance();
            Some(self.parse_type_expr()?)
        } else {
            None
        };

        self.expect(TokenKind::Eq)?;
        let value = self.parse_expression()?;
        let span = Span::between(kw.span, value.span());

        Ok(Stmt::Binding {
            name,
            mutable,
            ty,
            value,
            span,
        })
    }

    /// `try { } [catch [name] { }] [finally { }]`
    fn parse_try(&mut self) -> ParseResult<Stmt> {
        let kw = self.expect(TokenKind::KwTry)?;
        let body = self.parse_block()?;
        let mut end_span = body.span;

        let catch = if self.check(TokenKind::KwCatch) {
            let catch_kw = self.advance();
            let name = if self.check(TokenKind::Ident) {
                let (name, _) = self.expect_ident()?;
                Some(name)
            } else {
                None
            };
            let catch_body = self.parse_block()?;
            let span = Span::between(catch_kw.span, catch_body.span);
            end_span = catch_body.span;
            Some(CatchClause {
                name,
                body: catch_body,
                span,
            })
        } else {
            None
        };

        let finally = if self.check(TokenKind::KwFinally) {
            self.advance();
            let finally_body = self.parse_block()?;
            end_span = finally_body.span;
            Some(finally_body)
        } else {
            None
        };

        if catch.is_none() && finally.is_none() {
            return Err(ParseError::unexpected_token(
                self.current().lexeme.clone(),
                "'catch' or 'finally'",
                self.current_span(),
            ));
        }

        Ok(Stmt::Try {
            body,
            catch,
            finally,
            span: Span::between(kw.span, end_span),
        })
    }
}
