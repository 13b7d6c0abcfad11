//! Token definitions for the Omni lexer

mod generics;
mod precedence;

pub use generics::rewrite_generics;
pub use precedence::{Associativity, Precedence};

use logos::Logos;
use serde::{Deserialize, Serialize};

use crate::span::Span;

/// Omni tokens
///
/// Keywords are recognized only as whole identifiers; `logos` picks the
/// longest match, so `funcs` lexes as an identifier.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum TokenKind {
    // ==================== Keywords ====================
    #[token("func")]
    KwFunc,
    #[token("let")]
    KwLet,
    #[token("var")]
    KwVar,
    #[token("return")]
    KwReturn,
    #[token("if")]
    KwIf,
    #[token("else")]
    KwElse,
    #[token("for")]
    KwFor,
    #[token("while")]
    KwWhile,
    #[token("break")]
    KwBreak,
    #[token("continue")]
    KwContinue,
    #[token("in")]
    KwIn,
    #[token("as")]
    KwAs,
    #[token("import")]
    KwImport,
    #[token("struct")]
    KwStruct,
    #[token("enum")]
    KwEnum,
    #[token("type")]
    KwType,
    #[token("async")]
    KwAsync,
    #[token("await")]
    KwAwait,
    #[token("try")]
    KwTry,
    #[token("catch")]
    KwCatch,
    #[token("finally")]
    KwFinally,
    #[token("throw")]
    KwThrow,
    #[token("new")]
    KwNew,
    #[token("delete")]
    KwDelete,

    // ==================== Literals ====================
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    /// Identifiers accept non-ASCII bytes byte-for-byte.
    #[regex(r"[A-Za-z_\u{0080}-\u{10FFFF}][A-Za-z0-9_\u{0080}-\u{10FFFF}]*")]
    Ident,

    #[regex(r"0[xX][0-9a-fA-F]+")]
    HexLit,
    #[regex(r"0[bB][01]+")]
    BinaryLit,
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
    FloatLit,
    #[regex(r"[0-9]+")]
    IntLit,
    #[regex(r"'(\\.|[^'\\])'")]
    CharLit,

    /// Opening quote of a string; the lexer scans the rest by hand.
    #[token("\"")]
    DoubleQuote,

    /// Produced by the lexer for a complete plain string literal.
    StrLit,
    /// Produced by the lexer for a string literal containing `${…}`.
    StrInterpLit,

    /// Start of a block comment; the lexer scans to the closing `*/`.
    #[token("/*")]
    BlockCommentStart,

    // ==================== Delimiters ====================
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // ==================== Punctuation ====================
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":=")]
    ColonEq,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("?")]
    Question,
    #[token("->")]
    Arrow,
    #[token("=>")]
    FatArrow,

    // ==================== Operators ====================
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("!")]
    Bang,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("=")]
    Eq,

    /// Sentinel appended after the last real token.
    Eof,
}

impl TokenKind {
    /// Human-readable description used in "expected X" messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Ident => "identifier",
            TokenKind::IntLit => "integer literal",
            TokenKind::FloatLit => "float literal",
            TokenKind::HexLit => "hex literal",
            TokenKind::BinaryLit => "binary literal",
            TokenKind::CharLit => "char literal",
            TokenKind::StrLit | TokenKind::DoubleQuote => "string literal",
            TokenKind::StrInterpLit => "interpolated string literal",
            TokenKind::True | TokenKind::False => "boolean literal",
            TokenKind::Null => "'null'",
            TokenKind::KwFunc => "'func'",
            TokenKind::KwLet => "'let'",
            TokenKind::KwVar => "'var'",
            TokenKind::KwReturn => "'return'",
            TokenKind::KwIf => "'if'",
            TokenKind::KwElse => "'else'",
            TokenKind::KwFor => "'for'",
            TokenKind::KwWhile => "'while'",
            TokenKind::KwBreak => "'break'",
            TokenKind::KwContinue => "'continue'",
            TokenKind::KwIn => "'in'",
            TokenKind::KwAs => "'as'",
            TokenKind::KwImport => "'import'",
            TokenKind::KwStruct => "'struct'",
            TokenKind::KwEnum => "'enum'",
            TokenKind::KwType => "'type'",
            TokenKind::KwAsync => "'async'",
            TokenKind::KwAwait => "'await'",
            TokenKind::KwTry => "'try'",
            TokenKind::KwCatch => "'catch'",
            TokenKind::KwFinally => "'finally'",
            TokenKind::KwThrow => "'throw'",
            TokenKind::KwNew => "'new'",
            TokenKind::KwDelete => "'delete'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::Colon => "':'",
            TokenKind::ColonEq => "':='",
            TokenKind::Dot => "'.'",
            TokenKind::Question => "'?'",
            TokenKind::Arrow => "'->'",
            TokenKind::FatArrow => "'=>'",
            TokenKind::Eq => "'='",
            TokenKind::Eof => "end of input",
            _ => "operator",
        }
    }

    /// True for tokens that can begin an expression.
    pub fn starts_expression(&self) -> bool {
        matches!(
            self,
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
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::Minus
                | TokenKind::Bang
                | TokenKind::Tilde
                | TokenKind::Pipe
                | TokenKind::PipePipe
                | TokenKind::KwAwait
                | TokenKind::KwNew
                | TokenKind::KwDelete
        )
    }
}

/// A token with its lexeme and span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}
