//! Expression lowering.

use std::collections::{HashMap, HashSet};

use omni_parser::ast::{BinaryOp, Expr, InterpPart, LiteralKind, UnaryOp};
use omni_parser::Span;

use crate::check::STD_ALIASES;
use crate::mir::Operand;
use crate::types::{self, ERROR};

use super::{FuncLower, Val};

impl<'a> FuncLower<'a> {
    /// Lower an expression, returning its SSA value and type. `None`
    /// means the value could not be produced (an error was reported, or
    /// the code is unreachable).
    pub(crate) fn lower_expr(&mut self, expr: &Expr, expected: Option<&str>) -> Option<Val> {
        match expr {
            Expr::Literal { kind, text, span } => self.lower_literal(*kind, text, *span),

            Expr::Ident { name, span } => self.lower_ident(name, *span),

            Expr::Unary { op, operand, .. } => {
                let (id, ty) = self.lower_expr(operand, None)?;
                let (mnemonic, result_ty) = match op {
                    UnaryOp::Neg => ("neg", ty.clone()),
                    UnaryOp::Not => ("not", types::BOOL.to_string()),
                    UnaryOp::BitNot => ("op.~", ty.clone()),
                };
                let out = self.emit(mnemonic, result_ty.clone(), vec![Operand::value(id, ty)])?;
                Some((out, result_ty))
            }

            Expr::Binary { op, lhs, rhs, .. } => self.lower_binary(*op, lhs, rhs),

            Expr::Call { callee, args, span } => self.lower_call(callee, args, *span),

            Expr::Index {
                target,
                index,
                span,
            } => {
                let (tid, tty) = self.lower_expr(target, None)?;
                let (iid, ity) = self.lower_expr(index, None)?;
                let elem = if let Some(elem) = types::array_element(&tty) {
                    elem
                } else if let Some((_, value)) = types::map_entry_types(&tty) {
                    value
                } else if tty == types::STRING {
                    "char".to_string()
                } else {
                    self.error(*span, format!("type '{}' cannot be indexed", tty));
                    return None;
                };
                let out = self.emit(
                    "index",
                    elem.clone(),
                    vec![Operand::value(tid, tty), Operand::value(iid, ity)],
                )?;
                Some((out, elem))
            }

            Expr::Member {
                target,
                name,
                through_pointer,
                span,
            } => self.lower_member(target, name, *through_pointer, *span),

            Expr::ArrayLit { elements, span } => self.lower_array_lit(elements, expected, *span),

            Expr::MapLit { entries, span } => self.lower_map_lit(entries, expected, *span),

            Expr::StructLit { name, fields, span } => self.lower_struct_lit(name, fields, *span),

            Expr::Lambda { span, .. } => {
                // Lambdas need closure support from the backend.
                self.error(
                    *span,
                    "lambdas are not lowered to MIR yet; bind the function by name instead",
                );
                None
            }

            Expr::Cast { ty, expr, .. } => {
                let (id, source_ty) = self.lower_expr(expr, None)?;
                let target = ty.canonical();
                let out = self.emit(
                    "cast",
                    target.clone(),
                    vec![Operand::value(id, source_ty)],
                )?;
                Some((out, target))
            }

            Expr::Await { expr, .. } => {
                let (id, ty) = self.lower_expr(expr, None)?;
                let inner = types::promise_inner(&ty).unwrap_or_else(|| ty.clone());
                let out = self.emit("await", inner.clone(), vec![Operand::value(id, ty)])?;
                Some((out, inner))
            }

            Expr::Assign {
                target,
                value,
                span,
            } => {
                let hint = self.target_type_hint(target);
                let val = self.lower_expr(value, hint.as_deref())?;
                self.lower_assign_to(target, val, *span)
            }

            Expr::Increment {
                target,
                is_increment,
                span,
            } => self.lower_increment(target, *is_increment, *span),

            Expr::New { expr, .. } => {
                let (id, ty) = self.lower_expr(expr, None)?;
                let pointer = format!("*{}", ty);
                let out = self.emit("new", pointer.clone(), vec![Operand::value(id, ty)])?;
                Some((out, pointer))
            }

            Expr::Delete { expr, .. } => {
                let (id, ty) = self.lower_expr(expr, None)?;
                let out = self.emit("delete", types::VOID, vec![Operand::value(id, ty)])?;
                Some((out, types::VOID.to_string()))
            }

            Expr::Interp { parts, span } => self.lower_interp(parts, *span),
        }
    }

    fn lower_literal(&mut self, kind: LiteralKind, text: &str, _span: Span) -> Option<Val> {
        let ty = match kind {
            LiteralKind::Int | LiteralKind::Hex | LiteralKind::Binary => "int",
            LiteralKind::Float => "float",
            LiteralKind::Str => "string",
            LiteralKind::Char => "char",
            LiteralKind::Bool => "bool",
            LiteralKind::Null => "null",
        };
        let id = self.emit(
            format!("const.{}", ty),
            ty,
            vec![Operand::literal(text, ty)],
        )?;
        Some((id, ty.to_string()))
    }

    fn lower_ident(&mut self, name: &str, span: Span) -> Option<Val> {
        if let Some(binding) = self.env.get(name) {
            return Some((binding.value, binding.ty.clone()));
        }
        // Module-level binding: materialize a read.
        if let Some(ty) = self.tables.globals.get(name).cloned() {
            let id = self.emit(
                "global",
                ty.clone(),
                vec![Operand::literal(name, ty.clone())],
            )?;
            return Some((id, ty));
        }
        // A function name out of scope yields a reference usable as a
        // call target.
        if let Some(sig) = self.tables.functions.get(name) {
            let params: Vec<String> = sig.params.iter().map(|(_, t)| t.clone()).collect();
            let fty = types::function_spelling(&params, &sig.ret);
            let id = self.emit(
                "func.ref",
                fty.clone(),
                vec![Operand::literal(name, fty.clone())],
            )?;
            return Some((id, fty));
        }
        self.error(span, format!("undefined identifier '{}'", name));
        None
    }

    fn lower_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Option<Val> {
        let (lid, lty) = self.lower_expr(lhs, None)?;
        let (rid, rty) = self.lower_expr(rhs, Some(&lty))?;

        // String concatenation when either side of `+` is a string.
        if op == BinaryOp::Add && (lty == types::STRING || rty == types::STRING) {
            let out = self.emit(
                "strcat",
                types::STRING,
                vec![Operand::value(lid, lty), Operand::value(rid, rty)],
            )?;
            return Some((out, types::STRING.to_string()));
        }

        let (mnemonic, result_ty) = match op {
            BinaryOp::Add => ("add".to_string(), lty.clone()),
            BinaryOp::Sub => ("sub".to_string(), lty.clone()),
            BinaryOp::Mul => ("mul".to_string(), lty.clone()),
            BinaryOp::Div => ("div".to_string(), lty.clone()),
            BinaryOp::Mod => ("mod".to_string(), lty.clone()),
            BinaryOp::Eq => ("cmp.eq".to_string(), types::BOOL.to_string()),
            BinaryOp::Neq => ("cmp.neq".to_string(), types::BOOL.to_string()),
            BinaryOp::Lt => ("cmp.lt".to_string(), types::BOOL.to_string()),
            BinaryOp::Lte => ("cmp.lte".to_string(), types::BOOL.to_string()),
            BinaryOp::Gt => ("cmp.gt".to_string(), types::BOOL.to_string()),
            BinaryOp::Gte => ("cmp.gte".to_string(), types::BOOL.to_string()),
            BinaryOp::And => ("and".to_string(), types::BOOL.to_string()),
            BinaryOp::Or => ("or".to_string(), types::BOOL.to_string()),
            // Operators without a dedicated mnemonic.
            BinaryOp::BitAnd
            | BinaryOp::BitOr
            | BinaryOp::BitXor
            | BinaryOp::Shl
            | BinaryOp::Shr => (format!("op.{}", op.lexeme()), lty.clone()),
        };

        let out = self.emit(
            mnemonic,
            result_ty.clone(),
            vec![Operand::value(lid, lty), Operand::value(rid, rty)],
        )?;
        Some((out, result_ty))
    }

    // ==================== Calls ====================

    fn lower_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> Option<Val> {
        // Named call through a bare function name.
        if let Expr::Ident { name, .. } = callee {
            if !self.env.contains_key(name) {
                return self.lower_named_call(name.clone(), args, span);
            }
        }

        // Module-qualified call: the callee name is resolved from the
        // member chain with std alias normalization applied.
        if let Expr::Member {
            target,
            name: member,
            through_pointer: false,
            ..
        } = callee
        {
            if let Expr::Ident { name: alias, .. } = target.as_ref() {
                if !self.env.contains_key(alias)
                    && (self.tables.module_bindings.contains_key(alias)
                        || STD_ALIASES.contains_key(alias.as_str()))
                {
                    let key = self
                        .module_function_key(alias, member)
                        .unwrap_or_else(|| {
                            let base = STD_ALIASES
                                .get(alias.as_str())
                                .map(|s| s.to_string())
                                .or_else(|| self.tables.module_bindings.get(alias).cloned())
                                .unwrap_or_else(|| alias.clone());
                            format!("{}.{}", base, member)
                        });
                    return self.lower_named_call(key, args, span);
                }
            }
        }

        // Indirect call through a function-typed value.
        let (cid, cty) = self.lower_expr(callee, None)?;
        let Some((params, ret)) = types::split_function(&cty) else {
            self.error(span, format!("type '{}' is not callable", cty));
            return None;
        };
        let mut operands = vec![Operand::value(cid, cty)];
        for (arg, param) in args.iter().zip(params.iter().map(String::as_str).chain(std::iter::repeat(""))) {
            let hint = if param.is_empty() { None } else { Some(param) };
            let (id, ty) = self.lower_expr(arg, hint)?;
            operands.push(Operand::value(id, ty));
        }
        let out = self.emit("call", ret.clone(), operands)?;
        Some((out, ret))
    }

    fn lower_named_call(&mut self, name: String, args: &[Expr], span: Span) -> Option<Val> {
        let sig = self.tables.functions.get(&name).cloned();

        let param_hints: Vec<Option<String>> = match &sig {
            Some(sig) if sig.params.len() == args.len() => sig
                .params
                .iter()
                .map(|(_, t)| Some(t.clone()))
                .collect(),
            _ => vec![None; args.len()],
        };

        let mut operands = vec![Operand::literal(name.clone(), "func")];
        let mut arg_types = Vec::new();
        for (arg, hint) in args.iter().zip(param_hints) {
            let (id, ty) = self.lower_expr(arg, hint.as_deref())?;
            arg_types.push(ty.clone());
            operands.push(Operand::value(id, ty));
        }

        let ret = match &sig {
            Some(sig) if sig.type_params.is_empty() => sig.ret.clone(),
            Some(sig) => {
                // Re-derive the per-call substitution from the argument
                // types, mirroring the checker.
                let set: HashSet<String> = sig.type_params.iter().cloned().collect();
                let mut bindings: HashMap<String, String> = HashMap::new();
                for ((_, pty), aty) in sig.params.iter().zip(arg_types.iter()) {
                    let _ = types::bind_type_params(pty, aty, &set, &mut bindings);
                }
                types::substitute(&sig.ret, &bindings)
            }
            None => std_return_heuristic(&name).unwrap_or_else(|| {
                self.error(span, format!("undefined function '{}'", name));
                ERROR.to_string()
            }),
        };
        if ret == ERROR {
            return None;
        }

        let out = self.emit("call", ret.clone(), operands)?;
        Some((out, ret))
    }

    /// Resolve `alias.member` against the signature table, applying
    /// std alias normalization.
    fn module_function_key(&self, alias: &str, member: &str) -> Option<String> {
        let mut candidates = Vec::new();
        if let Some(dotted) = self.tables.module_bindings.get(alias) {
            candidates.push(format!("{}.{}", dotted, member));
        }
        candidates.push(format!("{}.{}", alias, member));
        if let Some(normalized) = STD_ALIASES.get(alias) {
            candidates.push(format!("{}.{}", normalized, member));
        }
        candidates
            .into_iter()
            .find(|key| self.tables.functions.contains_key(key))
    }

    // ==================== Member access ====================

    fn lower_member(
        &mut self,
        target: &Expr,
        member: &str,
        through_pointer: bool,
        span: Span,
    ) -> Option<Val> {
        if let Expr::Ident { name, .. } = target {
            if !self.env.contains_key(name) {
                // Enum variant selection.
                if let Some(variants) = self.tables.enums.get(name) {
                    if variants.iter().any(|v| v == member) {
                        let id = self.emit(
                            "member",
                            name.clone(),
                            vec![
                                Operand::literal(name, "type"),
                                Operand::literal(member, types::STRING),
                            ],
                        )?;
                        return Some((id, name.clone()));
                    }
                }
                // Module member used as a value.
                if self.tables.module_bindings.contains_key(name)
                    || STD_ALIASES.contains_key(name.as_str())
                {
                    if let Some(key) = self.module_function_key(name, member) {
                        let sig = &self.tables.functions[&key];
                        let params: Vec<String> =
                            sig.params.iter().map(|(_, t)| t.clone()).collect();
                        let fty = types::function_spelling(&params, &sig.ret);
                        let id = self.emit(
                            "func.ref",
                            fty.clone(),
                            vec![Operand::literal(key, fty.clone())],
                        )?;
                        return Some((id, fty));
                    }
                }
            }
        }

        let (tid, mut tty) = self.lower_expr(target, None)?;
        if through_pointer && types::pointer_depth(&tty) > 0 {
            tty = tty[1..].to_string();
        }
        let Some(field_ty) = self.field_type(&tty, member) else {
            self.error(
                span,
                format!("unknown field '{}' on type '{}'", member, tty),
            );
            return None;
        };
        let id = self.emit(
            "member",
            field_ty.clone(),
            vec![
                Operand::value(tid, tty),
                Operand::literal(member, types::STRING),
            ],
        )?;
        Some((id, field_ty))
    }

    /// The declared field type, with per-instantiation substitution.
    fn field_type(&self, target_ty: &str, member: &str) -> Option<String> {
        let (base, args) = match types::split_generic(target_ty) {
            Some((base, args)) => (base.to_string(), args),
            None => (target_ty.to_string(), Vec::new()),
        };
        let fields = self.tables.struct_fields.get(&base)?;
        let (_, fty) = fields.iter().find(|(n, _)| n == member)?;
        let params = self.tables.struct_params.get(&base).cloned().unwrap_or_default();
        if params.is_empty() || args.is_empty() {
            return Some(fty.clone());
        }
        let bindings: HashMap<String, String> = params.into_iter().zip(args).collect();
        Some(types::substitute(fty, &bindings))
    }

    // ==================== Collection and struct literals ====================

    fn lower_array_lit(
        &mut self,
        elements: &[Expr],
        expected: Option<&str>,
        _span: Span,
    ) -> Option<Val> {
        let mut operands = Vec::new();
        let mut elem_ty: Option<String> = None;
        let elem_hint = expected.and_then(types::array_element);
        for element in elements {
            let (id, ty) = self.lower_expr(element, elem_hint.as_deref())?;
            elem_ty.get_or_insert_with(|| ty.clone());
            operands.push(Operand::value(id, ty));
        }
        let ty = match elem_ty {
            Some(elem) => format!("[]<{}>", elem),
            None => expected
                .filter(|t| types::is_array(t))
                .map(str::to_string)
                .unwrap_or_else(|| format!("[]<{}>", ERROR)),
        };
        let id = self.emit("array.init", ty.clone(), operands)?;
        Some((id, ty))
    }

    fn lower_map_lit(
        &mut self,
        entries: &[(Expr, Expr)],
        expected: Option<&str>,
        _span: Span,
    ) -> Option<Val> {
        let mut operands = Vec::new();
        let mut entry_ty: Option<(String, String)> = None;
        let hints = expected.and_then(types::map_entry_types);
        for (key, value) in entries {
            let (kid, kty) = self.lower_expr(key, hints.as_ref().map(|(k, _)| k.as_str()))?;
            let (vid, vty) = self.lower_expr(value, hints.as_ref().map(|(_, v)| v.as_str()))?;
            entry_ty.get_or_insert_with(|| (kty.clone(), vty.clone()));
            operands.push(Operand::value(kid, kty));
            operands.push(Operand::value(vid, vty));
        }
        let ty = match entry_ty {
            Some((k, v)) => format!("map<{},{}>", k, v),
            None => expected
                .filter(|t| types::map_entry_types(t).is_some())
                .map(str::to_string)
                .unwrap_or_else(|| format!("map<{0},{0}>", ERROR)),
        };
        let id = self.emit("map.init", ty.clone(), operands)?;
        Some((id, ty))
    }

    fn lower_struct_lit(
        &mut self,
        name: &str,
        fields: &[(String, Expr)],
        span: Span,
    ) -> Option<Val> {
        let Some(declared) = self.tables.struct_fields.get(name).cloned() else {
            self.error(span, format!("unknown struct '{}'", name));
            return None;
        };
        let params = self
            .tables
            .struct_params
            .get(name)
            .cloned()
            .unwrap_or_default();
        let param_set: HashSet<String> = params.iter().cloned().collect();
        let mut bindings: HashMap<String, String> = HashMap::new();

        // Operands follow the declared field order.
        let mut operands = Vec::new();
        for (field_name, field_ty) in &declared {
            let Some((_, value)) = fields.iter().find(|(n, _)| n == field_name) else {
                self.error(
                    span,
                    format!("missing field '{}' in literal of struct '{}'", field_name, name),
                );
                return None;
            };
            let (id, ty) = self.lower_expr(value, Some(field_ty))?;
            let _ = types::bind_type_params(field_ty, &ty, &param_set, &mut bindings);
            operands.push(Operand::value(id, ty));
        }

        let ty = if params.is_empty() {
            name.to_string()
        } else {
            let args: Vec<String> = params
                .iter()
                .map(|p| bindings.get(p).cloned().unwrap_or_else(|| ERROR.to_string()))
                .collect();
            format!("{}<{}>", name, args.join(","))
        };
        let id = self.emit("struct.init", ty.clone(), operands)?;
        Some((id, ty))
    }

    // ==================== Mutation ====================

    /// Assignment to an identifier re-binds the environment entry to the
    /// `assign` instruction's id, preserving SSA.
    pub(crate) fn lower_assign_to(&mut self, target: &Expr, val: Val, span: Span) -> Option<Val> {
        let (vid, vty) = val;
        match target {
            Expr::Ident { name, .. } => {
                if let Some(binding) = self.env.get(name).cloned() {
                    if !binding.mutable {
                        self.error(
                            span,
                            format!("cannot assign to immutable variable '{}'", name),
                        );
                        return None;
                    }
                    let id = self.emit(
                        "assign",
                        binding.ty.clone(),
                        vec![
                            Operand::value(binding.value, binding.ty.clone()),
                            Operand::value(vid, vty),
                        ],
                    )?;
                    if let Some(binding) = self.env.get_mut(name) {
                        binding.value = id;
                    }
                    let ty = self.env[name].ty.clone();
                    return Some((id, ty));
                }
                if let Some(ty) = self.tables.globals.get(name).cloned() {
                    let id = self.emit(
                        "global.set",
                        ty.clone(),
                        vec![Operand::literal(name, ty.clone()), Operand::value(vid, vty)],
                    )?;
                    return Some((id, ty));
                }
                self.error(span, format!("undefined identifier '{}'", name));
                None
            }
            _ => {
                self.error(span, "assignment target must be an identifier");
                None
            }
        }
    }

    /// `++`/`--` lower to `const 1`, `add`/`sub`, then an `assign` that
    /// updates the environment.
    pub(crate) fn lower_increment(
        &mut self,
        target: &Expr,
        is_increment: bool,
        span: Span,
    ) -> Option<Val> {
        let Expr::Ident { name, .. } = target else {
            self.error(span, "increment target must be an identifier");
            return None;
        };
        let Some(binding) = self.env.get(name).cloned() else {
            self.error(span, format!("undefined identifier '{}'", name));
            return None;
        };
        if !binding.mutable {
            self.error(
                span,
                format!("cannot increment immutable variable '{}'", name),
            );
            return None;
        }

        let one = self.emit(
            "const.int",
            types::INT,
            vec![Operand::literal("1", types::INT)],
        )?;
        let op = if is_increment { "add" } else { "sub" };
        let updated = self.emit(
            op,
            binding.ty.clone(),
            vec![
                Operand::value(binding.value, binding.ty.clone()),
                Operand::value(one, types::INT),
            ],
        )?;
        let id = self.emit(
            "assign",
            binding.ty.clone(),
            vec![
                Operand::value(binding.value, binding.ty.clone()),
                Operand::value(updated, binding.ty.clone()),
            ],
        )?;
        if let Some(binding) = self.env.get_mut(name) {
            binding.value = id;
        }
        Some((id, binding.ty))
    }

    // ==================== Interpolation ====================

    /// Interpolated strings lower to a `strcat` chain over their parts.
    fn lower_interp(&mut self, parts: &[InterpPart], _span: Span) -> Option<Val> {
        let mut acc: Option<Val> = None;
        for part in parts {
            let val = match part {
                InterpPart::Text(text) => {
                    let lexeme = format!("\"{}\"", text);
                    let id = self.emit(
                        "const.string",
                        types::STRING,
                        vec![Operand::literal(lexeme, types::STRING)],
                    )?;
                    (id, types::STRING.to_string())
                }
                InterpPart::Expr(expr) => self.lower_expr(expr, None)?,
            };
            acc = Some(match acc {
                None => val,
                Some((aid, aty)) => {
                    let id = self.emit(
                        "strcat",
                        types::STRING,
                        vec![Operand::value(aid, aty), Operand::value(val.0, val.1)],
                    )?;
                    (id, types::STRING.to_string())
                }
            });
        }
        match acc {
            Some(val) => Some(val),
            None => {
                let id = self.emit(
                    "const.string",
                    types::STRING,
                    vec![Operand::literal("\"\"", types::STRING)],
                )?;
                Some((id, types::STRING.to_string()))
            }
        }
    }

}

/// Return-type heuristics for `std.*` callees missing from the table.
fn std_return_heuristic(name: &str) -> Option<String> {
    if name.starts_with("std.io.") {
        Some(types::VOID.to_string())
    } else if name.starts_with("std.math.") {
        Some("double".to_string())
    } else if name.starts_with("std.string.") {
        Some(types::STRING.to_string())
    } else {
        None
    }
}
