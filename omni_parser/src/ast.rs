//! Abstract syntax tree for the Omni language.
//!
//! One sum type per syntactic category (`Decl`, `Stmt`, `Expr`,
//! `TypeExpr`); every node carries a span.

use serde::{Deserialize, Serialize};

use crate::span::Span;

/// A parsed source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub imports: Vec<Import>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

/// Import declaration: `import std.io` or `import util as u`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    /// Dotted path segments; never empty.
    pub path: Vec<String>,
    pub alias: Option<String>,
    pub span: Span,
}

impl Import {
    /// The dotted path as written: `std.io`.
    pub fn dotted(&self) -> String {
        self.path.join(".")
    }

    /// The name this import binds in scope: the alias if present,
    /// otherwise the last path segment.
    pub fn binding_name(&self) -> &str {
        self.alias
            .as_deref()
            .unwrap_or_else(|| self.path.last().map(String::as_str).unwrap_or(""))
    }

    /// True for `std` and `std.*` imports.
    pub fn is_std(&self) -> bool {
        self.path.first().map(String::as_str) == Some("std")
    }
}

/// Top-level declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decl {
    Import(Import),
    Binding(BindingDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    TypeAlias(TypeAliasDecl),
    Func(FuncDecl),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Import(d) => d.span,
            Decl::Binding(d) => d.span,
            Decl::Struct(d) => d.span,
            Decl::Enum(d) => d.span,
            Decl::TypeAlias(d) => d.span,
            Decl::Func(d) => d.span,
        }
    }
}

/// Module-level `let` or `var`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingDecl {
    pub name: String,
    pub mutable: bool,
    pub ty: Option<TypeExpr>,
    pub value: Expr,
    pub span: Span,
}

/// Generic type parameter introduced on a declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeParam {
    pub name: String,
    pub span: Span,
}

/// Struct declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDecl {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub fields: Vec<Field>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: TypeExpr,
    pub span: Span,
}

/// Enum declaration; variants are bare names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDecl {
    pub name: String,
    pub variants: Vec<EnumVariant>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumVariant {
    pub name: String,
    pub span: Span,
}

/// Type alias: `type Pair<T> = map<T, T>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeAliasDecl {
    pub name: String,
    pub type_params: Vec<String>,
    pub ty: TypeExpr,
    pub span: Span,
}

/// Function declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: String,
    pub is_async: bool,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub body: FuncBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeExpr,
    pub span: Span,
}

/// Exactly one body form per function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FuncBody {
    Block(Block),
    /// `=> expr` shorthand.
    Expr(Box<Expr>),
}

/// Brace-delimited statement list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// Statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Block(Block),
    Return {
        value: Option<Expr>,
        span: Span,
    },
    Expr(Expr),
    If {
        cond: Expr,
        then_block: Block,
        /// `else` branch; an `If` statement here encodes `else if`.
        else_branch: Option<Box<Stmt>>,
        span: Span,
    },
    While {
        cond: Expr,
        body: Block,
        span: Span,
    },
    For(ForStmt),
    Break {
        span: Span,
    },
    Continue {
        span: Span,
    },
    /// `let`/`var` binding.
    Binding {
        name: String,
        mutable: bool,
        ty: Option<TypeExpr>,
        value: Expr,
        span: Span,
    },
    /// `name := expr`.
    ShortVarDecl {
        name: String,
        value: Expr,
        span: Span,
    },
    Assign {
        target: Expr,
        value: Expr,
        span: Span,
    },
    Increment {
        target: Expr,
        is_increment: bool,
        span: Span,
    },
    Try {
        body: Block,
        catch: Option<CatchClause>,
        finally: Option<Block>,
        span: Span,
    },
    Throw {
        value: Expr,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Block(b) => b.span,
            Stmt::Return { span, .. } => *span,
            Stmt::Expr(e) => e.span(),
            Stmt::If { span, .. } => *span,
            Stmt::While { span, .. } => *span,
            Stmt::For(f) => f.span(),
            Stmt::Break { span } => *span,
            Stmt::Continue { span } => *span,
            Stmt::Binding { span, .. } => *span,
            Stmt::ShortVarDecl { span, .. } => *span,
            Stmt::Assign { span, .. } => *span,
            Stmt::Increment { span, .. } => *span,
            Stmt::Try { span, .. } => *span,
            Stmt::Throw { span, .. } => *span,
        }
    }
}

/// The two `for` forms; mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ForStmt {
    Classic {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Block,
        span: Span,
    },
    Range {
        var: String,
        iter: Expr,
        body: Block,
        span: Span,
    },
}

impl ForStmt {
    pub fn span(&self) -> Span {
        match self {
            ForStmt::Classic { span, .. } => *span,
            ForStmt::Range { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    pub name: Option<String>,
    pub body: Block,
    pub span: Span,
}

/// Literal kind tag; the raw lexeme is kept for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralKind {
    Int,
    Float,
    Hex,
    Binary,
    Str,
    Char,
    Bool,
    Null,
}

/// Unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

impl UnaryOp {
    pub fn lexeme(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

/// Binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    pub fn lexeme(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::Neq
                | BinaryOp::Lt
                | BinaryOp::Lte
                | BinaryOp::Gt
                | BinaryOp::Gte
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn is_bitwise(&self) -> bool {
        matches!(
            self,
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr
        )
    }
}

/// A literal chunk or an embedded expression of an interpolated string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InterpPart {
    Text(String),
    Expr(Expr),
}

/// Expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Ident {
        name: String,
        span: Span,
    },
    Literal {
        kind: LiteralKind,
        text: String,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    Member {
        target: Box<Expr>,
        name: String,
        /// True when written with `->` instead of `.`.
        through_pointer: bool,
        span: Span,
    },
    ArrayLit {
        elements: Vec<Expr>,
        span: Span,
    },
    MapLit {
        entries: Vec<(Expr, Expr)>,
        span: Span,
    },
    StructLit {
        name: String,
        fields: Vec<(String, Expr)>,
        span: Span,
    },
    Lambda {
        params: Vec<LambdaParam>,
        body: Box<Expr>,
        span: Span,
    },
    Cast {
        ty: TypeExpr,
        expr: Box<Expr>,
        span: Span,
    },
    Await {
        expr: Box<Expr>,
        span: Span,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
        span: Span,
    },
    Increment {
        target: Box<Expr>,
        is_increment: bool,
        span: Span,
    },
    New {
        expr: Box<Expr>,
        span: Span,
    },
    Delete {
        expr: Box<Expr>,
        span: Span,
    },
    Interp {
        parts: Vec<InterpPart>,
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LambdaParam {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub span: Span,
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Ident { span, .. } => *span,
            Expr::Literal { span, .. } => *span,
            Expr::Unary { span, .. } => *span,
            Expr::Binary { span, .. } => *span,
            Expr::Call { span, .. } => *span,
            Expr::Index { span, .. } => *span,
            Expr::Member { span, .. } => *span,
            Expr::ArrayLit { span, .. } => *span,
            Expr::MapLit { span, .. } => *span,
            Expr::StructLit { span, .. } => *span,
            Expr::Lambda { span, .. } => *span,
            Expr::Cast { span, .. } => *span,
            Expr::Await { span, .. } => *span,
            Expr::Assign { span, .. } => *span,
            Expr::Increment { span, .. } => *span,
            Expr::New { span, .. } => *span,
            Expr::Delete { span, .. } => *span,
            Expr::Interp { span, .. } => *span,
        }
    }

    /// Flatten an identifier or member chain into dotted text, if the
    /// expression is such a chain.
    pub fn dotted_name(&self) -> Option<String> {
        match self {
            Expr::Ident { name, .. } => Some(name.clone()),
            Expr::Member {
                target,
                name,
                through_pointer: false,
                ..
            } => {
                let prefix = target.dotted_name()?;
                Some(format!("{}.{}", prefix, name))
            }
            _ => None,
        }
    }
}

/// Type expression.
///
/// Pointer types are encoded by a `name` starting with `*` (one star per
/// pointer level) while keeping generic `args`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExpr {
    Named {
        name: String,
        args: Vec<TypeExpr>,
        span: Span,
    },
    Union {
        members: Vec<TypeExpr>,
        span: Span,
    },
    Optional {
        inner: Box<TypeExpr>,
        span: Span,
    },
    Function {
        params: Vec<TypeExpr>,
        ret: Box<TypeExpr>,
        span: Span,
    },
}

impl TypeExpr {
    pub fn named(name: impl Into<String>, span: Span) -> Self {
        TypeExpr::Named {
            name: name.into(),
            args: Vec::new(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Named { span, .. } => *span,
            TypeExpr::Union { span, .. } => *span,
            TypeExpr::Optional { span, .. } => *span,
            TypeExpr::Function { span, .. } => *span,
        }
    }

    /// The canonical spelling used for type equality.
    ///
    /// Union members are sorted alphabetically, `T??` collapses to `T?`,
    /// and an optional union folds into a union with a `null` member so
    /// the spelling stays unambiguous.
    pub fn canonical(&self) -> String {
        match self {
            TypeExpr::Named { name, args, .. } => {
                if args.is_empty() {
                    name.clone()
                } else {
                    let inner: Vec<String> = args.iter().map(TypeExpr::canonical).collect();
                    format!("{}<{}>", name, inner.join(","))
                }
            }
            TypeExpr::Union { members, .. } => {
                let mut spellings: Vec<String> =
                    members.iter().map(TypeExpr::canonical).collect();
                spellings.sort();
                spellings.dedup();
                spellings.join(" | ")
            }
            TypeExpr::Optional { inner, .. } => {
                let spelled = inner.canonical();
                if spelled.ends_with('?') {
                    spelled
                } else if spelled.contains(" | ") {
                    let mut members: Vec<&str> = spelled.split(" | ").collect();
                    if !members.contains(&"null") {
                        members.push("null");
                    }
                    members.sort();
                    members.join(" | ")
                } else {
                    format!("{}?", spelled)
                }
            }
            TypeExpr::Function { params, ret, .. } => {
                let inner: Vec<String> = params.iter().map(TypeExpr::canonical).collect();
                format!("({}) -> {}", inner.join(", "), ret.canonical())
            }
        }
    }
}
