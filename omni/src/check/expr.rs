//! Expression checking and inference.

use std::collections::{HashMap, HashSet};

use omni_parser::ast::{BinaryOp, Expr, InterpPart, LiteralKind, UnaryOp};
use omni_parser::Span;

use super::{suggest_similar, Checker, FuncSig, STD_ALIASES};
use crate::types::{self, BindOutcome, ERROR, INFER, MODULE, NULL};

impl<'a> Checker<'a> {
    /// Check an expression and return its canonical type spelling.
    ///
    /// `expected` is a contextual hint used for empty collection
    /// literals and unannotated lambda parameters; it never relaxes the
    /// assignability checks done by the caller.
    pub(crate) fn check_expr(&mut self, expr: &Expr, expected: Option<&str>) -> String {
        match expr {
            Expr::Literal { kind, .. } => literal_type(*kind).to_string(),

            Expr::Ident { name, span } => self.check_ident(name, *span),

            Expr::Unary { op, operand, span } => {
                let ty = self.check_expr(operand, None);
                if ty == ERROR {
                    return ERROR.to_string();
                }
                match op {
                    UnaryOp::Neg => {
                        if !types::is_numeric(&ty) && !self.is_type_param(&ty) {
                            self.error(
                                *span,
                                format!("operator '-' requires a numeric operand, found '{}'", ty),
                            );
                            return ERROR.to_string();
                        }
                        ty
                    }
                    UnaryOp::Not => {
                        if ty != types::BOOL {
                            self.error(
                                *span,
                                format!("operator '!' requires a 'bool' operand, found '{}'", ty),
                            );
                            return ERROR.to_string();
                        }
                        ty
                    }
                    UnaryOp::BitNot => {
                        if !types::is_numeric(&ty) || types::is_float(&ty) {
                            self.error(
                                *span,
                                format!("operator '~' requires an integer operand, found '{}'", ty),
                            );
                            return ERROR.to_string();
                        }
                        ty
                    }
                }
            }

            Expr::Binary { op, lhs, rhs, span } => self.check_binary(*op, lhs, rhs, *span),

            Expr::Call { callee, args, span } => self.check_call(callee, args, *span),

            Expr::Index {
                target,
                index,
                span,
            } => self.check_index(target, index, *span),

            Expr::Member {
                target,
                name,
                through_pointer,
                span,
            } => self.check_member(target, name, *through_pointer, *span),

            Expr::ArrayLit { elements, span } => self.check_array_lit(elements, expected, *span),

            Expr::MapLit { entries, span } => self.check_map_lit(entries, expected, *span),

            Expr::StructLit { name, fields, span } => self.check_struct_lit(name, fields, *span),

            Expr::Lambda { params, body, .. } => {
                let expected_fn = expected.and_then(types::split_function);
                let mut param_tys = Vec::new();
                self.scopes.enter_scope();
                for (i, param) in params.iter().enumerate() {
                    let ty = match &param.ty {
                        Some(t) => self.resolve_type(t),
                        None => expected_fn
                            .as_ref()
                            .filter(|(ps, _)| ps.len() == params.len())
                            .and_then(|(ps, _)| ps.get(i).cloned())
                            .unwrap_or_else(|| INFER.to_string()),
                    };
                    let _ = self.scopes.declare(
                        &param.name,
                        super::Symbol {
                            ty: ty.clone(),
                            mutable: false,
                        },
                    );
                    param_tys.push(ty);
                }
                let ret_hint = expected_fn.as_ref().map(|(_, r)| r.clone());
                let ret = self.check_expr(body, ret_hint.as_deref());
                self.scopes.leave_scope();
                types::function_spelling(&param_tys, &ret)
            }

            Expr::Cast { ty, expr, span } => {
                let target = self.resolve_type(ty);
                let source = self.check_expr(expr, None);
                if target == ERROR || source == ERROR {
                    return ERROR.to_string();
                }
                if !cast_allowed(&source, &target) {
                    self.error_with_hint(
                        *span,
                        format!("cannot cast '{}' to '{}'", source, target),
                        "only numeric, char/int, string, union and optional casts are defined"
                            .to_string(),
                    );
                    return ERROR.to_string();
                }
                target
            }

            Expr::Await { expr, span } => {
                let in_async = self
                    .func_stack
                    .last()
                    .map(|ctx| ctx.is_async)
                    .unwrap_or(false);
                if !in_async {
                    self.error_with_hint(
                        *span,
                        "'await' outside of an async function",
                        "mark the enclosing function 'async'".to_string(),
                    );
                }
                let ty = self.check_expr(expr, None);
                if ty == ERROR {
                    return ERROR.to_string();
                }
                match types::promise_inner(&ty) {
                    Some(inner) => inner,
                    None => {
                        self.error(
                            *span,
                            format!("'await' requires a 'Promise' value, found '{}'", ty),
                        );
                        ERROR.to_string()
                    }
                }
            }

            Expr::Assign {
                target,
                value,
                span,
            } => self.check_assignment(target, value, *span),

            Expr::Increment {
                target,
                is_increment,
                span,
            } => self.check_increment(target, *is_increment, *span),

            Expr::New { expr, .. } => {
                let ty = self.check_expr(expr, None);
                if ty == ERROR {
                    return ERROR.to_string();
                }
                format!("*{}", ty)
            }

            Expr::Delete { expr, span } => {
                let ty = self.check_expr(expr, None);
                if ty != ERROR && types::pointer_depth(&ty) == 0 {
                    self.error(
                        *span,
                        format!("'delete' requires a pointer value, found '{}'", ty),
                    );
                }
                types::VOID.to_string()
            }

            Expr::Interp { parts, .. } => {
                for part in parts {
                    if let InterpPart::Expr(inner) = part {
                        let _ = self.check_expr(inner, None);
                    }
                }
                types::STRING.to_string()
            }
        }
    }

    fn check_ident(&mut self, name: &str, span: Span) -> String {
        if let Some(symbol) = self.scopes.lookup(name) {
            return symbol.ty.clone();
        }
        if let Some(sig) = self.functions.get(name) {
            let params: Vec<String> = sig.params.iter().map(|(_, t)| t.clone()).collect();
            return types::function_spelling(&params, &sig.ret);
        }
        if self.enums.contains_key(name) {
            self.error_with_hint(
                span,
                format!("enum '{}' used as a value", name),
                format!("select a variant, e.g. '{}.<variant>'", name),
            );
            return ERROR.to_string();
        }

        let candidates: Vec<String> = self
            .scopes
            .visible_names()
            .map(str::to_string)
            .chain(self.functions.keys().cloned())
            .collect();
        let hint = suggest_similar(name, candidates.iter().map(String::as_str))
            .map(|similar| format!("did you mean '{}'?", similar))
            .unwrap_or_else(|| format!("declare it with 'let {} = ...' before use", name));
        self.error_with_hint(span, format!("undefined identifier '{}'", name), hint);
        ERROR.to_string()
    }

    fn check_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr, span: Span) -> String {
        let lty = self.check_expr(lhs, None);
        let rty = self.check_expr(rhs, Some(&lty));
        if lty == ERROR || rty == ERROR {
            return ERROR.to_string();
        }

        if op.is_logical() {
            if lty != types::BOOL || rty != types::BOOL {
                self.error(
                    span,
                    format!(
                        "operator '{}' requires 'bool' operands, found '{}' and '{}'",
                        op.lexeme(),
                        lty,
                        rty
                    ),
                );
                return ERROR.to_string();
            }
            return types::BOOL.to_string();
        }

        if op.is_comparison() {
            let comparable = match op {
                // Equality additionally admits null against optionals.
                BinaryOp::Eq | BinaryOp::Neq => {
                    self.equal_types(&lty, &rty)
                        || self.assignable(&lty, &rty)
                        || self.assignable(&rty, &lty)
                }
                _ => self.equal_types(&lty, &rty),
            };
            if !comparable {
                self.error(
                    span,
                    format!(
                        "operator '{}' requires equal types, found '{}' and '{}'",
                        op.lexeme(),
                        lty,
                        rty
                    ),
                );
                return ERROR.to_string();
            }
            return types::BOOL.to_string();
        }

        if op == BinaryOp::Add && (lty == types::STRING || rty == types::STRING) {
            // `+` with a string side means concatenation.
            return types::STRING.to_string();
        }

        if op.is_bitwise() {
            if types::is_float(&lty) || types::is_float(&rty) {
                self.error(
                    span,
                    format!("bitwise operator '{}' does not accept '{}'", op.lexeme(), {
                        if types::is_float(&lty) {
                            &lty
                        } else {
                            &rty
                        }
                    }),
                );
                return ERROR.to_string();
            }
        }

        // Arithmetic and bitwise: both sides numeric and equal.
        let params_ok = self.is_type_param(&lty) || self.is_type_param(&rty);
        if !params_ok {
            if !types::is_numeric(&lty) || !types::is_numeric(&rty) {
                let offender = if types::is_numeric(&lty) { &rty } else { &lty };
                self.error_with_hint(
                    span,
                    format!(
                        "operator '{}' requires numeric operands, found '{}' and '{}'",
                        op.lexeme(),
                        lty,
                        rty
                    ),
                    format!("convert with '({}) value' if a cast is intended", offender),
                );
                return ERROR.to_string();
            }
            if !self.equal_types(&lty, &rty) {
                self.error_with_hint(
                    span,
                    format!(
                        "operator '{}' requires equal numeric types, found '{}' and '{}'",
                        op.lexeme(),
                        lty,
                        rty
                    ),
                    format!("cast one side, e.g. '({}) ...'", lty),
                );
                return ERROR.to_string();
            }
        }

        lty
    }

    // ==================== Calls ====================

    fn check_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> String {
        // Named call through an identifier that is not a local binding.
        if let Expr::Ident { name, .. } = callee {
            if self.scopes.lookup(name).is_none() && self.functions.contains_key(name) {
                return self.check_named_call(name.to_string(), args, span);
            }
        }

        // Module-qualified call: `io.println(...)`.
        if let Expr::Member {
            target,
            name: member,
            through_pointer: false,
            ..
        } = callee
        {
            if let Expr::Ident { name: alias, .. } = target.as_ref() {
                let is_module = self
                    .scopes
                    .lookup(alias)
                    .map(|s| s.ty == MODULE)
                    .unwrap_or(false)
                    || (self.scopes.lookup(alias).is_none() && STD_ALIASES.contains_key(alias.as_str()));
                if is_module {
                    if let Some(key) = self.module_function_key(alias, member) {
                        return self.check_named_call(key, args, span);
                    }
                    self.error(
                        span,
                        format!("module '{}' has no function '{}'", alias, member),
                    );
                    return ERROR.to_string();
                }
            }
        }

        // Indirect call through a function-typed value.
        let callee_ty = self.check_expr(callee, None);
        if callee_ty == ERROR {
            return ERROR.to_string();
        }
        match types::split_function(&callee_ty) {
            Some((params, ret)) => {
                if params.len() != args.len() {
                    self.error(
                        span,
                        format!(
                            "call expects {} argument(s), found {}",
                            params.len(),
                            args.len()
                        ),
                    );
                    return ERROR.to_string();
                }
                for (arg, param) in args.iter().zip(params.iter()) {
                    let aty = self.check_expr(arg, Some(param));
                    if !self.assignable(&aty, param) {
                        self.error(
                            arg.span(),
                            format!("argument type mismatch: expected '{}', found '{}'", param, aty),
                        );
                    }
                }
                ret
            }
            None => {
                self.error(span, format!("type '{}' is not callable", callee_ty));
                ERROR.to_string()
            }
        }
    }

    fn check_named_call(&mut self, name: String, args: &[Expr], span: Span) -> String {
        let Some(sig) = self.functions.get(&name).cloned() else {
            let hint = suggest_similar(&name, self.functions.keys().map(String::as_str))
                .map(|s| format!("did you mean '{}'?", s))
                .unwrap_or_else(|| format!("declare it with 'func {}(...) {{ ... }}'", name));
            self.error_with_hint(span, format!("undefined function '{}'", name), hint);
            return ERROR.to_string();
        };

        if args.len() != sig.params.len() {
            self.error(
                span,
                format!(
                    "function '{}' expects {} argument(s), found {}",
                    name,
                    sig.params.len(),
                    args.len()
                ),
            );
            return ERROR.to_string();
        }

        let arg_types: Vec<String> = args
            .iter()
            .zip(sig.params.iter())
            .map(|(arg, (_, pty))| self.check_expr(arg, Some(pty)))
            .collect();

        if sig.type_params.is_empty() {
            for ((arg, (pname, pty)), aty) in args.iter().zip(&sig.params).zip(&arg_types) {
                if !self.assignable(aty, pty) {
                    self.error_with_hint(
                        arg.span(),
                        format!(
                            "argument '{}' of '{}' expects '{}', found '{}'",
                            pname, name, pty, aty
                        ),
                        format!("convert the value with '({}) ...'", pty),
                    );
                }
            }
            return sig.ret.clone();
        }

        self.check_generic_call(&name, &sig, args, &arg_types, span)
    }

    /// Per-call generic substitution: walk parameter/argument pairs,
    /// bind type parameters, reject conflicts, substitute the return.
    fn check_generic_call(
        &mut self,
        name: &str,
        sig: &FuncSig,
        args: &[Expr],
        arg_types: &[String],
        span: Span,
    ) -> String {
        let param_set: HashSet<String> = sig.type_params.iter().cloned().collect();
        let mut bindings: HashMap<String, String> = HashMap::new();

        for ((_, pty), aty) in sig.params.iter().zip(arg_types.iter()) {
            match types::bind_type_params(pty, aty, &param_set, &mut bindings) {
                BindOutcome::Ok => {}
                BindOutcome::Conflict {
                    param,
                    first,
                    second,
                } => {
                    self.error_with_hint(
                        span,
                        format!(
                            "conflicting bindings for type parameter '{}' of '{}': '{}' vs '{}'",
                            param, name, first, second
                        ),
                        "make the argument types agree or cast one of them".to_string(),
                    );
                    return ERROR.to_string();
                }
            }
        }

        // Assignability against the substituted parameter spellings;
        // unbound parameters still unify through the combined set.
        let mut combined = self.active_type_params();
        combined.extend(param_set.iter().cloned());
        for ((arg, (pname, pty)), aty) in args.iter().zip(&sig.params).zip(arg_types) {
            let substituted = types::substitute(pty, &bindings);
            if !types::is_assignable(aty, &substituted, &combined) {
                self.error(
                    arg.span(),
                    format!(
                        "argument '{}' of '{}' expects '{}', found '{}'",
                        pname, name, substituted, aty
                    ),
                );
            }
        }

        types::substitute(&sig.ret, &bindings)
    }

    /// Resolve `alias.member` through the functions table, applying the
    /// standard-library shorthand normalization.
    fn module_function_key(&mut self, alias: &str, member: &str) -> Option<String> {
        let mut candidates = Vec::new();
        if let Some(dotted) = self.module_bindings.get(alias) {
            candidates.push(format!("{}.{}", dotted, member));
        }
        candidates.push(format!("{}.{}", alias, member));
        if let Some(normalized) = STD_ALIASES.get(alias) {
            candidates.push(format!("{}.{}", normalized, member));
        }
        candidates
            .into_iter()
            .find(|key| self.functions.contains_key(key))
    }

    // ==================== Member access ====================

    fn check_member(
        &mut self,
        target: &Expr,
        member: &str,
        through_pointer: bool,
        span: Span,
    ) -> String {
        // Enum variant: `Color.red`.
        if let Expr::Ident { name, .. } = target {
            if self.scopes.lookup(name).is_none() {
                if let Some(variants) = self.enums.get(name) {
                    if variants.iter().any(|v| v == member) {
                        return name.clone();
                    }
                    let hint = format!("variants are: {}", variants.join(", "));
                    self.error_with_hint(
                        span,
                        format!("enum '{}' has no variant '{}'", name, member),
                        hint,
                    );
                    return ERROR.to_string();
                }
            }

            // Imported module: `io.println` used as a value.
            let is_module = self
                .scopes
                .lookup(name)
                .map(|s| s.ty == MODULE)
                .unwrap_or(false);
            if is_module {
                if let Some(key) = self.module_function_key(name, member) {
                    let sig = &self.functions[&key];
                    let params: Vec<String> =
                        sig.params.iter().map(|(_, t)| t.clone()).collect();
                    return types::function_spelling(&params, &sig.ret);
                }
                self.error(
                    span,
                    format!("module '{}' has no function '{}'", name, member),
                );
                return ERROR.to_string();
            }
        }

        let mut tty = self.check_expr(target, None);
        if tty == ERROR {
            return ERROR.to_string();
        }

        if through_pointer {
            if types::pointer_depth(&tty) == 0 {
                self.error(
                    span,
                    format!("'->' requires a pointer value, found '{}'", tty),
                );
                return ERROR.to_string();
            }
            tty = tty[1..].to_string();
        } else if types::pointer_depth(&tty) > 0 {
            self.error_with_hint(
                span,
                format!("cannot use '.' on pointer type '{}'", tty),
                "access members through a pointer with '->'".to_string(),
            );
            return ERROR.to_string();
        }

        if types::optional_inner(&tty).is_some() {
            self.error_with_hint(
                span,
                format!("cannot access member of optional type '{}'", tty),
                "check the value against 'null' and assign the narrowed result first".to_string(),
            );
            return ERROR.to_string();
        }

        // Struct field, with per-instantiation substitution.
        let (base, args) = match types::split_generic(&tty) {
            Some((base, args)) => (base.to_string(), args),
            None => (tty.clone(), Vec::new()),
        };
        if let Some(fields) = self.struct_fields.get(&base) {
            if let Some((_, fty)) = fields.iter().find(|(n, _)| n == member) {
                let params = self.struct_params.get(&base).cloned().unwrap_or_default();
                if params.is_empty() || args.is_empty() {
                    return fty.clone();
                }
                let bindings: HashMap<String, String> =
                    params.into_iter().zip(args.into_iter()).collect();
                return types::substitute(fty, &bindings);
            }
            let available: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
            self.error_with_hint(
                span,
                format!("unknown field '{}' on struct '{}'", member, base),
                format!("available fields: {}", available.join(", ")),
            );
            return ERROR.to_string();
        }

        self.error(span, format!("type '{}' has no members", tty));
        ERROR.to_string()
    }

    // ==================== Indexing ====================

    fn check_index(&mut self, target: &Expr, index: &Expr, span: Span) -> String {
        let tty = self.check_expr(target, None);
        let ity = self.check_expr(index, None);
        if tty == ERROR {
            return ERROR.to_string();
        }

        if let Some(elem) = types::array_element(&tty) {
            if ity != ERROR && ity != types::INT {
                self.error(
                    index.span(),
                    format!("array index must be 'int', found '{}'", ity),
                );
            }
            return elem;
        }
        if let Some((key, value)) = types::map_entry_types(&tty) {
            if ity != ERROR && !self.assignable(&ity, &key) {
                self.error(
                    index.span(),
                    format!("map key must be '{}', found '{}'", key, ity),
                );
            }
            return value;
        }
        if tty == types::STRING {
            if ity != ERROR && ity != types::INT {
                self.error(
                    index.span(),
                    format!("string index must be 'int', found '{}'", ity),
                );
            }
            return "char".to_string();
        }

        self.error(span, format!("type '{}' cannot be indexed", tty));
        ERROR.to_string()
    }

    // ==================== Collection literals ====================

    fn check_array_lit(&mut self, elements: &[Expr], expected: Option<&str>, span: Span) -> String {
        if elements.is_empty() {
            if let Some(expected) = expected {
                if types::is_array(expected) {
                    return expected.to_string();
                }
            }
            self.error_with_hint(
                span,
                "cannot infer the element type of an empty array literal",
                "annotate the binding, e.g. 'let xs: []<int> = []'".to_string(),
            );
            return ERROR.to_string();
        }

        let elem_hint = expected.and_then(types::array_element);
        let first = self.check_expr(&elements[0], elem_hint.as_deref());
        for element in &elements[1..] {
            let ty = self.check_expr(element, Some(&first));
            if ty != ERROR && first != ERROR && !self.equal_types(&ty, &first) {
                self.error(
                    element.span(),
                    format!("mixed element types in array literal: '{}' and '{}'", first, ty),
                );
            }
        }
        if first == ERROR {
            return ERROR.to_string();
        }
        format!("[]<{}>", first)
    }

    fn check_map_lit(
        &mut self,
        entries: &[(Expr, Expr)],
        expected: Option<&str>,
        span: Span,
    ) -> String {
        if entries.is_empty() {
            if let Some(expected) = expected {
                if types::map_entry_types(expected).is_some() {
                    return expected.to_string();
                }
            }
            self.error_with_hint(
                span,
                "cannot infer the entry types of an empty map literal",
                "annotate the binding, e.g. 'let m: map<string,int> = {}'".to_string(),
            );
            return ERROR.to_string();
        }

        let hints = expected.and_then(types::map_entry_types);
        let (key_hint, value_hint) = match &hints {
            Some((k, v)) => (Some(k.as_str()), Some(v.as_str())),
            None => (None, None),
        };

        let (first_key, first_value) = {
            let (k, v) = &entries[0];
            (self.check_expr(k, key_hint), self.check_expr(v, value_hint))
        };
        for (k, v) in &entries[1..] {
            let kty = self.check_expr(k, Some(&first_key));
            let vty = self.check_expr(v, Some(&first_value));
            if kty != ERROR && !self.equal_types(&kty, &first_key) {
                self.error(
                    k.span(),
                    format!("mixed key types in map literal: '{}' and '{}'", first_key, kty),
                );
            }
            if vty != ERROR && !self.equal_types(&vty, &first_value) {
                self.error(
                    v.span(),
                    format!(
                        "mixed value types in map literal: '{}' and '{}'",
                        first_value, vty
                    ),
                );
            }
        }
        if first_key == ERROR || first_value == ERROR {
            return ERROR.to_string();
        }
        format!("map<{},{}>", first_key, first_value)
    }

    fn check_struct_lit(
        &mut self,
        name: &str,
        fields: &[(String, Expr)],
        span: Span,
    ) -> String {
        let Some(declared) = self.struct_fields.get(name).cloned() else {
            let hint = suggest_similar(name, self.struct_fields.keys().map(String::as_str))
                .map(|s| format!("did you mean '{}'?", s))
                .unwrap_or_else(|| format!("declare it with 'struct {} {{ ... }}'", name));
            self.error_with_hint(span, format!("unknown struct '{}'", name), hint);
            return ERROR.to_string();
        };
        let params = self.struct_params.get(name).cloned().unwrap_or_default();
        let param_set: HashSet<String> = params.iter().cloned().collect();
        let mut bindings: HashMap<String, String> = HashMap::new();

        for (field_name, value) in fields {
            let Some((_, fty)) = declared.iter().find(|(n, _)| n == field_name) else {
                let available: Vec<&str> = declared.iter().map(|(n, _)| n.as_str()).collect();
                self.error_with_hint(
                    span,
                    format!("unknown field '{}' on struct '{}'", field_name, name),
                    format!("available fields: {}", available.join(", ")),
                );
                let _ = self.check_expr(value, None);
                continue;
            };
            let vty = self.check_expr(value, Some(fty));
            if let BindOutcome::Conflict {
                param,
                first,
                second,
            } = types::bind_type_params(fty, &vty, &param_set, &mut bindings)
            {
                self.error(
                    value.span(),
                    format!(
                        "conflicting bindings for type parameter '{}' of '{}': '{}' vs '{}'",
                        param, name, first, second
                    ),
                );
                return ERROR.to_string();
            }
            let substituted = types::substitute(fty, &bindings);
            let mut combined = self.active_type_params();
            combined.extend(param_set.iter().cloned());
            if !types::is_assignable(&vty, &substituted, &combined) {
                self.error(
                    value.span(),
                    format!(
                        "field '{}' of '{}' expects '{}', found '{}'",
                        field_name, name, substituted, vty
                    ),
                );
            }
        }

        for (field_name, _) in &declared {
            if !fields.iter().any(|(n, _)| n == field_name) {
                self.error_with_hint(
                    span,
                    format!("missing field '{}' in literal of struct '{}'", field_name, name),
                    format!("add '{}: <value>'", field_name),
                );
            }
        }

        if params.is_empty() {
            return name.to_string();
        }
        let args: Vec<String> = params
            .iter()
            .map(|p| bindings.get(p).cloned().unwrap_or_else(|| INFER.to_string()))
            .collect();
        format!("{}<{}>", name, args.join(","))
    }

    // ==================== Assignment and increments ====================

    pub(crate) fn check_assignment(&mut self, target: &Expr, value: &Expr, span: Span) -> String {
        match target {
            Expr::Ident { name, span: tspan } => {
                let Some(symbol) = self.scopes.lookup(name).cloned() else {
                    return self.check_ident(name, *tspan);
                };
                if !symbol.mutable {
                    self.error_with_hint(
                        span,
                        format!("cannot assign to immutable binding '{}'", name),
                        format!("declare it with 'var {} = ...' to allow reassignment", name),
                    );
                }
                let vty = self.check_expr(value, Some(&symbol.ty));
                if symbol.ty == INFER {
                    self.scopes.update(name, vty.clone());
                    return vty;
                }
                if !self.assignable(&vty, &symbol.ty) {
                    self.error_with_hint(
                        value.span(),
                        format!("type mismatch: cannot assign '{}' to '{}'", vty, symbol.ty),
                        format!("convert the value with '({}) ...'", symbol.ty),
                    );
                }
                symbol.ty
            }
            Expr::Index { .. } | Expr::Member { .. } => {
                let tty = self.check_expr(target, None);
                let vty = self.check_expr(value, Some(&tty));
                if tty != ERROR && !self.assignable(&vty, &tty) {
                    self.error(
                        value.span(),
                        format!("type mismatch: cannot assign '{}' to '{}'", vty, tty),
                    );
                }
                tty
            }
            other => {
                self.error(other.span(), "invalid assignment target");
                let _ = self.check_expr(value, None);
                ERROR.to_string()
            }
        }
    }

    pub(crate) fn check_increment(
        &mut self,
        target: &Expr,
        is_increment: bool,
        span: Span,
    ) -> String {
        let op = if is_increment { "++" } else { "--" };
        if let Expr::Ident { name, span: tspan } = target {
            let Some(symbol) = self.scopes.lookup(name).cloned() else {
                return self.check_ident(name, *tspan);
            };
            if !symbol.mutable {
                self.error_with_hint(
                    span,
                    format!("cannot apply '{}' to immutable binding '{}'", op, name),
                    format!("declare it with 'var {} = ...'", name),
                );
            }
            if symbol.ty != ERROR
                && !types::is_numeric(&symbol.ty)
                && !self.is_type_param(&symbol.ty)
            {
                self.error(
                    span,
                    format!("'{}' requires a numeric operand, found '{}'", op, symbol.ty),
                );
                return ERROR.to_string();
            }
            return symbol.ty;
        }

        let tty = self.check_expr(target, None);
        if tty != ERROR && !types::is_numeric(&tty) {
            self.error(
                span,
                format!("'{}' requires a numeric operand, found '{}'", op, tty),
            );
            return ERROR.to_string();
        }
        tty
    }
}

fn literal_type(kind: LiteralKind) -> &'static str {
    match kind {
        LiteralKind::Int | LiteralKind::Hex | LiteralKind::Binary => "int",
        LiteralKind::Float => "float",
        LiteralKind::Str => "string",
        LiteralKind::Char => "char",
        LiteralKind::Bool => "bool",
        LiteralKind::Null => NULL,
    }
}

/// The explicit casts the language defines.
fn cast_allowed(from: &str, to: &str) -> bool {
    if from == to || from == INFER || to == INFER {
        return true;
    }
    if types::is_numeric(from) && types::is_numeric(to) {
        return true;
    }
    if (from == "char" && to == "int") || (from == "int" && to == "char") {
        return true;
    }
    if to == types::STRING {
        return true;
    }
    // Explicit narrowing out of an optional.
    if types::optional_inner(from).map(|inner| inner == to).unwrap_or(false) {
        return true;
    }
    // Union widening and explicit narrowing.
    let to_members = types::union_members(to);
    if to_members.len() > 1 && to_members.iter().any(|m| m == from) {
        return true;
    }
    let from_members = types::union_members(from);
    if from_members.len() > 1 && from_members.iter().any(|m| m == to) {
        return true;
    }
    false
}
