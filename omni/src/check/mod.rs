//! Two-phase type checker.
//!
//! The checker first collects type declarations and top-level symbols,
//! processes imports, then checks each declaration. It produces no typed
//! tree; it emits diagnostics and hands its tables to the MIR builder.

mod collect;
mod expr;
mod scope;
mod stmt;

pub use scope::{ScopeStack, Symbol};

use std::collections::{HashMap, HashSet};

use omni_parser::ast::{Decl, FuncBody, Module, TypeExpr};
use omni_parser::Span;
use once_cell::sync::Lazy;

use crate::diagnostics::{Category, Diagnostic, DiagnosticContext, Severity};
use crate::loader::ModuleLoader;
use crate::types::{self, ERROR, INFER};

/// Standard-library shorthand aliases applied during member resolution.
pub static STD_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("io", "std.io");
    m.insert("math", "std.math");
    m.insert("str", "std.string");
    m.insert("string", "std.string");
    m
});

/// A registered function signature.
#[derive(Debug, Clone)]
pub struct FuncSig {
    pub name: String,
    pub type_params: Vec<String>,
    /// Parameter names and canonical type spellings.
    pub params: Vec<(String, String)>,
    /// Canonical return spelling; `Promise<T>` for async functions.
    pub ret: String,
    pub is_async: bool,
}

/// Checker context for the function currently being checked.
#[derive(Debug)]
struct FuncCtx {
    // Retained for diagnostics and future frame-aware messages.
    #[allow(dead_code)]
    name: String,
    /// The type the body must produce; for async functions this is the
    /// inner `T` of the `Promise<T>` recorded in the signature table.
    ret: String,
    is_async: bool,
}

/// Tables the MIR builder consumes.
#[derive(Debug, Default)]
pub struct CheckOutput {
    pub functions: HashMap<String, FuncSig>,
    /// Struct name → fields in declaration order (name, raw spelling).
    pub struct_fields: HashMap<String, Vec<(String, String)>>,
    /// Struct name → type parameter names.
    pub struct_params: HashMap<String, Vec<String>>,
    pub enums: HashMap<String, Vec<String>>,
    /// Module-level bindings: name → canonical type.
    pub globals: HashMap<String, String>,
    /// Import binding name → dotted module path.
    pub module_bindings: HashMap<String, String>,
}

/// The type checker.
pub struct Checker<'a> {
    ctx: &'a DiagnosticContext,
    loader: &'a mut ModuleLoader,

    known_types: HashSet<String>,
    aliases: HashMap<String, (Vec<String>, TypeExpr)>,
    /// Aliases currently being expanded, for cycle detection.
    alias_stack: Vec<String>,

    struct_fields: HashMap<String, Vec<(String, String)>>,
    struct_params: HashMap<String, Vec<String>>,
    enums: HashMap<String, Vec<String>>,
    functions: HashMap<String, FuncSig>,
    globals: HashMap<String, String>,
    module_bindings: HashMap<String, String>,
    loaded_std: HashSet<String>,

    scopes: ScopeStack,
    /// Active generic type-parameter names, one set per nesting level.
    type_param_scope: Vec<HashSet<String>>,
    func_stack: Vec<FuncCtx>,
    loop_depth: usize,

    diags: Vec<Diagnostic>,
}

impl<'a> std::fmt::Debug for Checker<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checker")
            .field("functions", &self.functions.len())
            .field("diags", &self.diags.len())
            .finish()
    }
}

/// Check a root module. Returns the tables for the MIR builder together
/// with the diagnostics, in source order.
pub fn check_module(
    module: &Module,
    ctx: &DiagnosticContext,
    loader: &mut ModuleLoader,
) -> (CheckOutput, Vec<Diagnostic>) {
    let mut checker = Checker {
        ctx,
        loader,
        known_types: HashSet::new(),
        aliases: HashMap::new(),
        alias_stack: Vec::new(),
        struct_fields: HashMap::new(),
        struct_params: HashMap::new(),
        enums: HashMap::new(),
        functions: HashMap::new(),
        globals: HashMap::new(),
        module_bindings: HashMap::new(),
        loaded_std: HashSet::new(),
        scopes: ScopeStack::new(),
        type_param_scope: Vec::new(),
        func_stack: Vec::new(),
        loop_depth: 0,
        diags: Vec::new(),
    };

    checker.register_builtins();
    checker.collect_type_decls(module);
    checker.register_top_level(module);
    checker.process_imports(module);
    checker.register_merged_functions(module);

    for decl in &module.decls {
        checker.check_decl(decl);
    }

    let output = CheckOutput {
        functions: checker.functions,
        struct_fields: checker.struct_fields,
        struct_params: checker.struct_params,
        enums: checker.enums,
        globals: checker.globals,
        module_bindings: checker.module_bindings,
    };
    (output, checker.diags)
}

impl<'a> Checker<'a> {
    // ==================== Diagnostics ====================

    pub(crate) fn error(&mut self, span: Span, message: impl Into<String>) {
        let diag = self.ctx.error(Category::TypeCheck, span, message);
        self.diags.push(diag);
    }

    pub(crate) fn error_with_hint(
        &mut self,
        span: Span,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) {
        let mut diag = self.ctx.error(Category::TypeCheck, span, message);
        diag.hint = Some(hint.into());
        self.diags.push(diag);
    }

    pub(crate) fn warning(&mut self, span: Span, message: impl Into<String>) {
        let diag = self
            .ctx
            .diagnostic(Severity::Warning, Category::TypeCheck, span, message);
        self.diags.push(diag);
    }

    // ==================== Type parameters ====================

    fn push_type_params(&mut self, params: impl IntoIterator<Item = String>) {
        self.type_param_scope.push(params.into_iter().collect());
    }

    fn pop_type_params(&mut self) {
        self.type_param_scope.pop();
    }

    /// Whether a name is an active generic type parameter.
    pub(crate) fn is_type_param(&self, name: &str) -> bool {
        self.type_param_scope.iter().any(|set| set.contains(name))
    }

    /// All active type parameters, flattened for the assignability rules.
    pub(crate) fn active_type_params(&self) -> HashSet<String> {
        self.type_param_scope
            .iter()
            .flat_map(|set| set.iter().cloned())
            .collect()
    }

    pub(crate) fn assignable(&self, from: &str, to: &str) -> bool {
        types::is_assignable(from, to, &self.active_type_params())
    }

    pub(crate) fn equal_types(&self, a: &str, b: &str) -> bool {
        types::types_equal(a, b, &self.active_type_params())
    }

    // ==================== Type resolution ====================

    /// Resolve a type expression to its canonical spelling, diagnosing
    /// unknown names and arity mismatches.
    pub(crate) fn resolve_type(&mut self, ty: &TypeExpr) -> String {
        match ty {
            TypeExpr::Named { name, args, span } => {
                let stars = "*".repeat(types::pointer_depth(name));
                let base = &name[stars.len()..];
                let resolved_args: Vec<String> =
                    args.iter().map(|a| self.resolve_type(a)).collect();
                let spelled = self.resolve_named(base, &resolved_args, *span);
                if spelled == ERROR {
                    return ERROR.to_string();
                }
                format!("{}{}", stars, spelled)
            }
            TypeExpr::Union { members, .. } => {
                let resolved: Vec<String> =
                    members.iter().map(|m| self.resolve_type(m)).collect();
                if resolved.iter().any(|t| t == ERROR) {
                    return ERROR.to_string();
                }
                types::make_union(resolved)
            }
            TypeExpr::Optional { inner, .. } => {
                let resolved = self.resolve_type(inner);
                if resolved == ERROR {
                    return ERROR.to_string();
                }
                types::make_optional(&resolved)
            }
            TypeExpr::Function { params, ret, .. } => {
                let params: Vec<String> = params.iter().map(|p| self.resolve_type(p)).collect();
                let ret = self.resolve_type(ret);
                types::function_spelling(&params, &ret)
            }
        }
    }

    fn resolve_named(&mut self, base: &str, args: &[String], span: Span) -> String {
        let spell = |base: &str, args: &[String]| {
            if args.is_empty() {
                base.to_string()
            } else {
                format!("{}<{}>", base, args.join(","))
            }
        };

        // Generic type parameters shadow the known-types table.
        if self.is_type_param(base) {
            if !args.is_empty() {
                self.error(span, format!("type parameter '{}' takes no arguments", base));
                return ERROR.to_string();
            }
            return base.to_string();
        }

        if types::is_primitive(base) {
            if !args.is_empty() {
                self.error(span, format!("type '{}' takes no arguments", base));
                return ERROR.to_string();
            }
            return base.to_string();
        }

        // Builtin generics.
        let builtin_arity = match base {
            "[]" | "array" | "Promise" => Some(1),
            "map" => Some(2),
            _ => None,
        };
        if let Some(arity) = builtin_arity {
            if args.len() != arity {
                self.error(
                    span,
                    format!("type '{}' expects {} argument(s), found {}", base, arity, args.len()),
                );
                return ERROR.to_string();
            }
            return spell(base, args);
        }

        // Type alias expansion.
        if let Some((params, target)) = self.aliases.get(base).cloned() {
            if params.len() != args.len() {
                self.error(
                    span,
                    format!(
                        "type alias '{}' expects {} argument(s), found {}",
                        base,
                        params.len(),
                        args.len()
                    ),
                );
                return ERROR.to_string();
            }
            if self.alias_stack.iter().any(|n| n == base) {
                self.error(span, format!("type alias '{}' is cyclic", base));
                return ERROR.to_string();
            }
            self.alias_stack.push(base.to_string());
            self.push_type_params(params.clone());
            let expanded = self.resolve_type(&target);
            self.pop_type_params();
            self.alias_stack.pop();

            let bindings: HashMap<String, String> = params
                .into_iter()
                .zip(args.iter().cloned())
                .collect();
            return types::substitute(&expanded, &bindings);
        }

        // Structs and enums.
        if let Some(params) = self.struct_params.get(base) {
            if params.len() != args.len() {
                self.error(
                    span,
                    format!(
                        "struct '{}' expects {} type argument(s), found {}",
                        base,
                        params.len(),
                        args.len()
                    ),
                );
                return ERROR.to_string();
            }
            return spell(base, args);
        }
        if self.enums.contains_key(base) {
            if !args.is_empty() {
                self.error(span, format!("enum '{}' takes no type arguments", base));
                return ERROR.to_string();
            }
            return base.to_string();
        }
        if self.known_types.contains(base) {
            return spell(base, args);
        }

        let hint = suggest_similar(base, self.known_types.iter().map(String::as_str))
            .map(|similar| format!("did you mean '{}'?", similar))
            .unwrap_or_else(|| {
                format!("declare it with 'struct {0} {{ ... }}' or 'type {0} = ...'", base)
            });
        self.error_with_hint(span, format!("unknown type '{}'", base), hint);
        ERROR.to_string()
    }

    // ==================== Declarations ====================

    fn check_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Import(_) => {}
            Decl::Binding(binding) => self.check_global_binding(binding),
            Decl::Struct(_) | Decl::Enum(_) | Decl::TypeAlias(_) => {
                // Fully handled during collection.
            }
            Decl::Func(func) => self.check_func(func),
        }
    }

    fn check_func(&mut self, func: &omni_parser::ast::FuncDecl) {
        self.push_type_params(func.type_params.iter().map(|p| p.name.clone()));

        let declared_ret = func
            .return_type
            .as_ref()
            .map(|t| self.resolve_type(t))
            .unwrap_or_else(|| INFER.to_string());

        self.func_stack.push(FuncCtx {
            name: func.name.clone(),
            ret: declared_ret,
            is_async: func.is_async,
        });
        self.scopes.enter_scope();

        for param in &func.params {
            let ty = self.resolve_type(&param.ty);
            if let Err(_existing) = self.scopes.declare(
                &param.name,
                Symbol {
                    ty,
                    mutable: false,
                },
            ) {
                self.error(
                    param.span,
                    format!("duplicate parameter '{}'", param.name),
                );
            }
        }

        match &func.body {
            FuncBody::Block(block) => self.check_block_stmts(block),
            FuncBody::Expr(expr) => {
                let vty = self.check_expr(expr, None);
                self.note_return(expr.span(), vty);
            }
        }

        self.scopes.leave_scope();
        let ctx = self.func_stack.pop().expect("pushed above");
        self.pop_type_params();

        // Settle the inferred return in the signature table.
        let inner = if ctx.ret == INFER {
            types::VOID.to_string()
        } else {
            ctx.ret
        };
        let final_ret = if func.is_async {
            types::make_promise(&inner)
        } else {
            inner
        };
        if let Some(sig) = self.functions.get_mut(&func.name) {
            sig.ret = final_ret;
        }
    }

    /// Record or check a returned type against the current function.
    pub(crate) fn note_return(&mut self, span: Span, vty: String) {
        let expected = match self.func_stack.last() {
            Some(ctx) => ctx.ret.clone(),
            None => {
                self.error(span, "'return' outside of a function");
                return;
            }
        };
        if expected == INFER {
            // First non-error returned type wins; later returns must agree.
            if vty != ERROR {
                if let Some(ctx) = self.func_stack.last_mut() {
                    ctx.ret = vty;
                }
            }
            return;
        }
        if !self.assignable(&vty, &expected) {
            let hint = if types::optional_inner(&vty).map(|i| i == expected).unwrap_or(false) {
                Some(format!(
                    "'{}' may be null; check it before returning",
                    vty
                ))
            } else {
                None
            };
            let message = format!("cannot return {} from function returning {}", vty, expected);
            match hint {
                Some(h) => self.error_with_hint(span, message, h),
                None => self.error(span, message),
            }
        }
    }

    fn check_global_binding(&mut self, binding: &omni_parser::ast::BindingDecl) {
        let annotated = binding.ty.as_ref().map(|t| self.resolve_type(t));
        let vty = self.check_expr(&binding.value, annotated.as_deref());
        let final_ty = match annotated {
            Some(ann) => {
                if !self.assignable(&vty, &ann) {
                    self.error_with_hint(
                        binding.value.span(),
                        format!("type mismatch: cannot assign '{}' to '{}'", vty, ann),
                        format!("convert the value or change the annotation to '{}'", vty),
                    );
                }
                ann
            }
            None => vty,
        };
        self.scopes.update(&binding.name, final_ty.clone());
        self.globals.insert(binding.name.clone(), final_ty);
    }

    // ==================== Loop context ====================

    pub(crate) fn enter_loop(&mut self) {
        self.loop_depth += 1;
    }

    pub(crate) fn leave_loop(&mut self) {
        self.loop_depth -= 1;
    }

    pub(crate) fn in_loop(&self) -> bool {
        self.loop_depth > 0
    }
}

/// Suggest a near-miss identifier: the closest candidate within a small
/// edit distance.
pub(crate) fn suggest_similar<'n>(
    name: &str,
    candidates: impl Iterator<Item = &'n str>,
) -> Option<String> {
    let mut best: Option<(usize, &str)> = None;
    for candidate in candidates {
        if candidate == name || candidate.contains('.') {
            continue;
        }
        let distance = levenshtein(name, candidate, 2);
        if distance <= 2 {
            match best {
                Some((d, _)) if d <= distance => {}
                _ => best = Some((distance, candidate)),
            }
        }
    }
    best.map(|(_, c)| c.to_string())
}

/// Bounded Levenshtein distance; returns `max + 1` once it exceeds `max`.
fn levenshtein(a: &str, b: &str, max: usize) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > max {
        return max + 1;
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
            row_min = row_min.min(curr[j + 1]);
        }
        if row_min > max {
            return max + 1;
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("abc", "abc", 2), 0);
        assert_eq!(levenshtein("abc", "abd", 2), 1);
        assert_eq!(levenshtein("count", "cuont", 2), 2);
        assert!(levenshtein("abc", "xyzzy", 2) > 2);
    }

    #[test]
    fn test_suggest_similar_picks_closest() {
        let candidates = ["println", "print", "length"];
        let suggestion = suggest_similar("pritnln", candidates.iter().copied());
        assert_eq!(suggestion.as_deref(), Some("println"));
    }

    #[test]
    fn test_suggest_similar_ignores_distant_names() {
        let candidates = ["alpha", "beta"];
        assert!(suggest_similar("gamma_ray", candidates.iter().copied()).is_none());
    }
}
