//! Top-level declaration parsing

use crate::ast::{
    BindingDecl, Decl, EnumDecl, EnumVariant, Field, FuncBody, FuncDecl, Import, Param,
    StructDecl, TypeAliasDecl, TypeParam,
};
use crate::error::{ParseError, ParseResult};
use crate::span::Span;
use crate::token::TokenKind;

use super::Parser;

impl Parser {
    /// Parse one top-level declaration.
    pub(crate) fn parse_decl(&mut self) -> ParseResult<Decl> {
        match self.kind() {
            TokenKind::KwImport => self.parse_import().map(Decl::Import),
            TokenKind::KwLet | TokenKind::KwVar => self.parse_binding_decl().map(Decl::Binding),
            TokenKind::KwStruct => self.parse_struct().map(Decl::Struct),
            TokenKind::KwEnum => self.parse_enum().map(Decl::Enum),
            TokenKind::KwType => self.parse_type_alias().map(Decl::TypeAlias),
            TokenKind::KwFunc | TokenKind::KwAsync => self.parse_func().map(Decl::Func),
            TokenKind::Eof => Err(ParseError::unexpected_eof(
                "declaration",
                self.current_span(),
            )),
            _ => Err(ParseError::unexpected_token(
                self.current().lexeme.clone(),
                "declaration",
                self.current_span(),
            )),
        }
    }

    /// `import a.b.c [as alias]`
    fn parse_import(&mut self) -> ParseResult<Import> {
        let kw = self.expect(TokenKind::KwImport)?;
        let (first, mut end_span) = self.expect_ident()?;
        let mut path = vec![first];

        while self.check(TokenKind::Dot) {
            self.advance();
            let (seg, seg_span) = self.expect_ident()?;
            path.push(seg);
            end_span = seg_span;
        }

        let alias = if self.check(TokenKind::KwAs) {
            self.advance();
            let (name, alias_span) = self.expect_ident()?;
            end_span = alias_span;
            Some(name)
        } else {
            None
        };

        Ok(Import {
            path,
            alias,
            span: Span::between(kw.span, end_span),
        })
    }

    /// Module-level `let name[:type] = expr` / `var ...`
    fn parse_binding_decl(&mut self) -> ParseResult<BindingDecl> {
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

        Ok(BindingDecl {
            name,
            mutable,
            ty,
            value,
            span,
        })
    }

    /// `struct Name[<T, U>] { field: type, ... }`
    fn parse_struct(&mut self) -> ParseResult<StructDecl> {
        let kw = self.expect(TokenKind::KwStruct)?;
        let (name, _) = self.expect_ident()?;
        let type_params = self.parse_type_params()?;

        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_end() {
            let (field_name, field_span) = self.expect_ident()?;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type_expr()?;
            let span = Span::between(field_span, ty.span());
            fields.push(Field {
                name: field_name,
                ty,
                span,
            });
            // Separators are optional; a comma or semicolon is consumed
            // when present.
            if self.check(TokenKind::Comma) || self.check(TokenKind::Semicolon) {
                self.advance();
            }
        }
        let close = self.expect(TokenKind::RBrace)?;

        Ok(StructDecl {
            name,
            type_params,
            fields,
            span: Span::between(kw.span, close.span),
        })
    }

    /// `enum Name { A, B, C }`
    fn parse_enum(&mut self) -> ParseResult<EnumDecl> {
        let kw = self.expect(TokenKind::KwEnum)?;
        let (name, _) = self.expect_ident()?;

        self.expect(TokenKind::LBrace)?;
        let mut variants = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_end() {
            let (variant, span) = self.expect_ident()?;
            variants.push(EnumVariant {
                name: variant,
                span,
            });
            if self.check(TokenKind::Comma) || self.check(TokenKind::Semicolon) {
                self.advance();
            }
        }
        let close = self.expect(TokenKind::RBrace)?;

        Ok(EnumDecl {
            name,
            variants,
            span: Span::between(kw.span, close.span),
        })
    }

    /// `type Name[<T>] = typeexpr`
    fn parse_type_alias(&mut self) -> ParseResult<TypeAliasDecl> {
        let kw = self.expect(TokenKind::KwType)?;
        let (name, _) = self.expect_ident()?;
        let type_params = self
            .parse_type_params()?
            .into_iter()
            .map(|p| p.name)
            .collect();
        self.expect(TokenKind::Eq)?;
        let ty = self.parse_type_expr()?;
        let span = Span::between(kw.span, ty.span());

        Ok(TypeAliasDecl {
            name,
            type_params,
            ty,
            span,
        })
    }

    /// `[async] func name[<T>](p: t, ...)[: ret] ({ ... } | => expr)`
    pub(crate) fn parse_func(&mut self) -> ParseResult<FuncDecl> {
        let start = self.current_span();
        let is_async = if self.check(TokenKind::KwAsync) {
            self.advance();
            true
        } else {
            false
        };

        self.expect(TokenKind::KwFunc)?;
        let (name, _) = self.expect_ident()?;
        let type_params = self.parse_type_params()?;
        let params = self.parse_params()?;

        let return_type = if self.check(TokenKind::Colon) {
            self.advance();
            Some(self.parse_type_expr()?)
        } else {
            None
        };

        let (body, end_span) = if self.check(TokenKind::FatArrow) {
            self.advance();
            let expr = self.parse_expression()?;
            let span = expr.span();
            (FuncBody::Expr(Box::new(expr)), span)
        } else {
            let block = self.parse_block()?;
            let span = block.span;
            (FuncBody::Block(block), span)
        };

        Ok(FuncDecl {
            name,
            is_async,
            type_params,
            params,
            return_type,
            body,
            span: Span::between(start, end_span),
        })
    }

    /// `<T, U>` — empty when the current token is not `<`.
    fn parse_type_params(&mut self) -> ParseResult<Vec<TypeParam>> {
        let mut params = Vec::new();
        if !self.check(TokenKind::Lt) {
            return Ok(params);
        }
        self.advance();
        loop {
            let (name, span) = self.expect_ident()?;
            params.push(TypeParam { name, span });
            if self.check(TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        self.expect(TokenKind::Gt)?;
        Ok(params)
    }

    /// `(name: type, ...)`
    fn parse_params(&mut self) -> ParseResult<Vec<Param>> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) && !self.at_end() {
            let (name, name_span) = self.expect_ident()?;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type_expr()?;
            let span = Span::between(name_span, ty.span());
            params.push(Param { name, ty, span });
            if self.check(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }
}
