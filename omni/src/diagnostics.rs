//! Position-carrying diagnostics shared by all passes.
//!
//! A [`Diagnostic`] carries the file, message, span, the text of the
//! primary line, a context window of surrounding lines, a severity and a
//! category, plus an optional hint. Rendering is deterministic so the
//! output can be asserted against byte-for-byte.

use omni_parser::{ParseError, Span};
use std::fmt;

/// Diagnostic severity. Compilation fails iff any `Error` is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Which pass produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Lexical,
    Syntax,
    Import,
    TypeCheck,
    Mir,
    Verify,
    Suggestion,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Lexical => write!(f, "lexical"),
            Category::Syntax => write!(f, "syntax"),
            Category::Import => write!(f, "import"),
            Category::TypeCheck => write!(f, "type-check"),
            Category::Mir => write!(f, "mir"),
            Category::Verify => write!(f, "verify"),
            Category::Suggestion => write!(f, "suggestion"),
        }
    }
}

/// A single position-carrying diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub file: String,
    pub message: String,
    pub hint: Option<String>,
    pub span: Span,
    /// Text of the primary line.
    pub line: String,
    /// Surrounding lines, including the primary line.
    pub context: Vec<String>,
    /// 1-indexed number of the first context line.
    pub context_start_line: usize,
    pub severity: Severity,
    pub category: Category,
}

impl Diagnostic {
    /// Render the diagnostic: header, blank line, source excerpt with a
    /// caret range, then optional help.
    pub fn render(&self) -> String {
        let mut out = format!(
            "{}:{}:{}: {}: {}",
            self.file, self.span.start.line, self.span.start.column, self.severity, self.message
        );

        if !self.context.is_empty() {
            out.push('\n');
            let width = (self.context_start_line + self.context.len())
                .to_string()
                .len();
            for (i, text) in self.context.iter().enumerate() {
                let line_no = self.context_start_line + i;
                out.push_str(&format!("\n  {:>width$} | {}", line_no, text, width = width));
                if line_no == self.span.start.line {
                    let caret_count = if self.span.end.line == self.span.start.line {
                        (self.span.end.column.saturating_sub(self.span.start.column)).max(1)
                    } else {
                        1
                    };
                    let pad = " ".repeat(self.span.start.column.saturating_sub(1));
                    out.push_str(&format!(
                        "\n  {:>width$} | {}{}",
                        "",
                        pad,
                        "^".repeat(caret_count),
                        width = width
                    ));
                }
            }
        }

        if let Some(hint) = &self.hint {
            out.push_str(&format!("\n  help: {}", hint));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Context for building diagnostics with source excerpts attached.
#[derive(Debug)]
pub struct DiagnosticContext {
    pub file: String,
    /// Source lines with line endings normalized for excerpting.
    lines: Vec<String>,
}

/// Lines of context shown on each side of the primary line.
const CONTEXT_RADIUS: usize = 2;

impl DiagnosticContext {
    pub fn new(file: impl Into<String>, source: &str) -> Self {
        let lines = source
            .split('\n')
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect();
        Self {
            file: file.into(),
            lines,
        }
    }

    /// Build a diagnostic with its line excerpt and context window.
    pub fn diagnostic(
        &self,
        severity: Severity,
        category: Category,
        span: Span,
        message: impl Into<String>,
    ) -> Diagnostic {
        let line_idx = span.start.line.saturating_sub(1);
        let line = self.lines.get(line_idx).cloned().unwrap_or_default();

        let context_start = line_idx.saturating_sub(CONTEXT_RADIUS);
        let context_end = (line_idx + CONTEXT_RADIUS + 1).min(self.lines.len());
        let context = if context_start < context_end {
            self.lines[context_start..context_end].to_vec()
        } else {
            Vec::new()
        };

        Diagnostic {
            file: self.file.clone(),
            message: message.into(),
            hint: None,
            span,
            line,
            context,
            context_start_line: context_start + 1,
            severity,
            category,
        }
    }

    pub fn error(
        &self,
        category: Category,
        span: Span,
        message: impl Into<String>,
    ) -> Diagnostic {
        self.diagnostic(Severity::Error, category, span, message)
    }

    /// Convert a lex/parse error, attaching the conventional hints.
    pub fn from_parse_error(&self, e: &ParseError) -> Diagnostic {
        let category = if e.is_lexical() {
            Category::Lexical
        } else {
            Category::Syntax
        };
        let mut diag = self.error(category, e.span(), e.to_string());
        diag.hint = parse_error_hint(e);
        diag
    }
}

fn parse_error_hint(e: &ParseError) -> Option<String> {
    match e {
        ParseError::UnterminatedString { .. } => {
            Some("close the string with '\"' before the end of the line".to_string())
        }
        ParseError::UnterminatedBlockComment { .. } => {
            Some("close the comment with '*/'".to_string())
        }
        ParseError::InvalidEscape { .. } => {
            Some("valid escapes are \\n \\t \\r \\\\ \\\" \\0".to_string())
        }
        ParseError::UnterminatedInterpolation { .. } => {
            Some("close the '${' with a matching '}'".to_string())
        }
        ParseError::UnionInGenericArgs { .. } => {
            Some("wrap the union in parentheses or name it with a type alias".to_string())
        }
        _ => None,
    }
}

/// Ordered collection of diagnostics.
#[derive(Debug, Default)]
pub struct DiagnosticList {
    diags: Vec<Diagnostic>,
}

impl DiagnosticList {
    pub fn new() -> Self {
        Self { diags: Vec::new() }
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.diags.push(diag);
    }

    pub fn extend(&mut self, diags: impl IntoIterator<Item = Diagnostic>) {
        self.diags.extend(diags);
    }

    pub fn is_empty(&self) -> bool {
        self.diags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diags.len()
    }

    pub fn has_errors(&self) -> bool {
        self.diags.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diags
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diags
    }

    /// Join the rendered diagnostics in report order.
    pub fn render_all(&self) -> String {
        self.diags
            .iter()
            .map(Diagnostic::render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl fmt::Display for DiagnosticList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render_all())
    }
}

impl IntoIterator for DiagnosticList {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diags.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omni_parser::SourceMap;

    #[test]
    fn test_render_format() {
        let source = "func f() {\n    return x\n}\n";
        let map = SourceMap::new(source);
        let ctx = DiagnosticContext::new("main.omni", source);
        let diag = ctx.error(Category::TypeCheck, map.span(18, 19), "undefined identifier 'x'");

        let rendered = diag.render();
        assert!(rendered.starts_with("main.omni:2:12: error: undefined identifier 'x'"));
        assert!(rendered.contains("return x"));
        assert!(rendered.contains("^"));
    }

    #[test]
    fn test_hint_is_rendered_as_help() {
        let source = "let x = 1";
        let map = SourceMap::new(source);
        let ctx = DiagnosticContext::new("main.omni", source);
        let mut diag = ctx.error(Category::TypeCheck, map.span(4, 5), "oops");
        diag.hint = Some("try harder".to_string());

        assert!(diag.render().contains("help: try harder"));
    }

    #[test]
    fn test_list_orders_and_detects_errors() {
        let source = "let x = 1";
        let map = SourceMap::new(source);
        let ctx = DiagnosticContext::new("main.omni", source);

        let mut list = DiagnosticList::new();
        assert!(!list.has_errors());
        list.push(ctx.diagnostic(
            Severity::Warning,
            Category::TypeCheck,
            map.span(0, 3),
            "first",
        ));
        list.push(ctx.error(Category::TypeCheck, map.span(4, 5), "second"));

        assert!(list.has_errors());
        let rendered = list.render_all();
        let first = rendered.find("first").unwrap();
        let second = rendered.find("second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_crlf_lines_are_normalized_in_excerpts() {
        let source = "let a = 1\r\nlet b = x\r\n";
        let map = SourceMap::new(source);
        let ctx = DiagnosticContext::new("main.omni", source);
        let diag = ctx.error(Category::TypeCheck, map.span(19, 20), "undefined");

        assert_eq!(diag.line, "let b = x");
        assert!(!diag.render().contains('\r'));
    }
}
