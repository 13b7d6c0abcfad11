//! Canonical type spellings.
//!
//! Types are compared as strings in a canonical form: primitives by
//! name, generics as `Name<A,B>` (commas, no spaces), arrays as `[]<T>`
//! (with `array<T>` accepted as equivalent), maps as `map<K,V>`,
//! pointers as `*T`, optionals as `T?` (with `T??` normalizing to
//! `T?`), unions joined by ` | ` after sorting, and function types as
//! `(P1, P2) -> R`.

#[cfg(test)]
mod tests;

use std::collections::{HashMap, HashSet};

/// Placeholder for a type still to be inferred.
pub const INFER: &str = "<infer>";
/// Poisoned type; propagates without further complaints.
pub const ERROR: &str = "<error>";
/// Type of an imported module binding.
pub const MODULE: &str = "module";
/// Spelling of the null literal's type.
pub const NULL: &str = "null";
pub const VOID: &str = "void";
pub const BOOL: &str = "bool";
pub const INT: &str = "int";
pub const STRING: &str = "string";

/// True for the primitive type names.
pub fn is_primitive(name: &str) -> bool {
    matches!(
        name,
        "int" | "long" | "byte" | "float" | "double" | "bool" | "char" | "string" | "void"
    )
}

/// True for the numeric primitives.
pub fn is_numeric(name: &str) -> bool {
    matches!(name, "int" | "long" | "byte" | "float" | "double")
}

/// True for the floating-point primitives (rejected by bitwise ops).
pub fn is_float(name: &str) -> bool {
    matches!(name, "float" | "double")
}

/// True when the spelling is one of the two array spellings.
pub fn is_array(ty: &str) -> bool {
    match split_generic(ty) {
        Some((base, args)) => (base == "[]" || base == "array") && args.len() == 1,
        None => false,
    }
}

/// Element type of an array spelling.
pub fn array_element(ty: &str) -> Option<String> {
    match split_generic(ty) {
        Some((base, args)) if (base == "[]" || base == "array") && args.len() == 1 => {
            Some(args.into_iter().next().expect("len checked"))
        }
        _ => None,
    }
}

/// Key/value types of a map spelling.
pub fn map_entry_types(ty: &str) -> Option<(String, String)> {
    match split_generic(ty) {
        Some((base, args)) if base == "map" && args.len() == 2 => {
            let mut it = args.into_iter();
            Some((it.next().expect("len"), it.next().expect("len")))
        }
        _ => None,
    }
}

/// Split `Name<A,B>` into `("Name", ["A", "B"])`, respecting nesting.
/// Returns `None` for spellings without a generic argument list, and for
/// unions/optionals/functions (whose structure is not base-generic).
pub fn split_generic(ty: &str) -> Option<(&str, Vec<String>)> {
    if is_union(ty) || is_function(ty) || ty.ends_with('?') {
        return None;
    }
    let open = ty.find('<')?;
    if !ty.ends_with('>') {
        return None;
    }
    let base = &ty[..open];
    let inner = &ty[open + 1..ty.len() - 1];
    Some((base, split_top_level(inner, ',')))
}

/// Split on a separator at nesting depth zero (angle brackets, parens).
fn split_top_level(s: &str, sep: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth -= 1,
            c if c == sep && depth == 0 => {
                out.push(s[start..i].trim().to_string());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if start <= s.len() && !s[start..].trim().is_empty() {
        out.push(s[start..].trim().to_string());
    }
    out
}

/// True when the spelling is a union (a top-level ` | `).
pub fn is_union(ty: &str) -> bool {
    union_members(ty).len() > 1
}

/// Members of a union spelling; a single-element vec for non-unions.
pub fn union_members(ty: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let bytes = ty.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' | b'(' => depth += 1,
            b'>' | b')' => {
                // `->` in function types does not close a bracket.
                if i == 0 || bytes[i - 1] != b'-' {
                    depth -= 1;
                }
            }
            b'|' if depth == 0 => {
                out.push(ty[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    out.push(ty[start..].trim().to_string());
    out
}

/// True when the spelling is a function type `(..) -> R`.
pub fn is_function(ty: &str) -> bool {
    ty.starts_with('(') && find_arrow(ty).is_some()
}

/// Split a function spelling into parameter types and return type.
pub fn split_function(ty: &str) -> Option<(Vec<String>, String)> {
    if !ty.starts_with('(') {
        return None;
    }
    let arrow = find_arrow(ty)?;
    let params_text = ty[1..].split_at(arrow - 1).0;
    // params_text still carries the closing paren.
    let params_text = params_text.trim_end().trim_end_matches(')');
    let ret = ty[arrow + 2..].trim().to_string();
    let params = split_top_level(params_text, ',');
    Some((params, ret))
}

/// Byte index of the top-level `->` in a function spelling.
fn find_arrow(ty: &str) -> Option<usize> {
    let bytes = ty.as_bytes();
    let mut depth = 0i32;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'<' => depth += 1,
            b')' | b'>' => depth -= 1,
            b'-' if depth == 0 && i + 1 < bytes.len() && bytes[i + 1] == b'>' => {
                return Some(i);
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Pointer depth of a spelling (number of leading `*`s).
pub fn pointer_depth(ty: &str) -> usize {
    ty.bytes().take_while(|b| *b == b'*').count()
}

/// Strip one optional level; `None` for non-optional spellings.
pub fn optional_inner(ty: &str) -> Option<&str> {
    ty.strip_suffix('?')
}

/// Wrap a spelling in an optional, collapsing `T??` to `T?`.
pub fn make_optional(ty: &str) -> String {
    if ty.ends_with('?') {
        ty.to_string()
    } else if is_union(ty) {
        let mut members = union_members(ty);
        if !members.iter().any(|m| m == NULL) {
            members.push(NULL.to_string());
        }
        make_union(members)
    } else {
        format!("{}?", ty)
    }
}

/// Join union members in canonical (sorted, deduplicated) order.
pub fn make_union(members: Vec<String>) -> String {
    let mut members = members;
    members.sort();
    members.dedup();
    members.join(" | ")
}

/// Canonicalize a spelling: sorts union members, collapses doubled
/// optionals. Idempotent.
pub fn canonicalize(ty: &str) -> String {
    let members = union_members(ty);
    if members.len() > 1 {
        return make_union(members.into_iter().map(|m| canonicalize(&m)).collect());
    }
    let ty = members.into_iter().next().expect("at least one member");
    if let Some(inner) = ty.strip_suffix('?') {
        let mut inner = inner;
        while let Some(stripped) = inner.strip_suffix('?') {
            inner = stripped;
        }
        return format!("{}?", canonicalize(inner));
    }
    if let Some((base, args)) = split_generic(&ty) {
        let args: Vec<String> = args.iter().map(|a| canonicalize(a)).collect();
        return format!("{}<{}>", base, args.join(","));
    }
    ty
}

/// Substitute type-parameter bindings into a spelling.
///
/// Identifier-boundary aware: substituting `T → X` in `Matrix<T>` yields
/// `Matrix<X>`, never `Maxrix<X>`.
pub fn substitute(ty: &str, bindings: &HashMap<String, String>) -> String {
    if bindings.is_empty() {
        return ty.to_string();
    }
    let mut out = String::with_capacity(ty.len());
    let bytes = ty.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_alphabetic() || c == b'_' || c >= 0x80 {
            let start = i;
            while i < bytes.len() {
                let b = bytes[i];
                if b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80 {
                    i += 1;
                } else {
                    break;
                }
            }
            let ident = &ty[start..i];
            match bindings.get(ident) {
                Some(replacement) => out.push_str(replacement),
                None => out.push_str(ident),
            }
        } else {
            out.push(c as char);
            i += 1;
        }
    }
    out
}

/// Result of walking a generic parameter against an argument type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    Ok,
    /// The same parameter was bound to two different types.
    Conflict {
        param: String,
        first: String,
        second: String,
    },
}

/// Walk a parameter spelling against an argument spelling, binding each
/// bare type parameter it mentions. Generic-shaped parameters
/// (`array<T>`, `map<K,V>`, `Result<T>`) match on the base name and
/// recurse into the argument positions.
pub fn bind_type_params(
    param_ty: &str,
    arg_ty: &str,
    type_params: &HashSet<String>,
    bindings: &mut HashMap<String, String>,
) -> BindOutcome {
    if arg_ty == ERROR || arg_ty == INFER {
        return BindOutcome::Ok;
    }

    // Bare type parameter: bind it.
    if type_params.contains(param_ty) {
        if let Some(existing) = bindings.get(param_ty) {
            if existing != arg_ty {
                return BindOutcome::Conflict {
                    param: param_ty.to_string(),
                    first: existing.clone(),
                    second: arg_ty.to_string(),
                };
            }
            return BindOutcome::Ok;
        }
        bindings.insert(param_ty.to_string(), arg_ty.to_string());
        return BindOutcome::Ok;
    }

    // Optional: walk the inner types.
    if let (Some(p), Some(a)) = (optional_inner(param_ty), optional_inner(arg_ty)) {
        return bind_type_params(p, a, type_params, bindings);
    }

    // Generic-shaped parameter: match base, recurse positionally. The
    // two array spellings interchange.
    if let (Some((pb, pargs)), Some((ab, aargs))) =
        (split_generic(param_ty), split_generic(arg_ty))
    {
        let base_matches =
            pb == ab || (matches!(pb, "[]" | "array") && matches!(ab, "[]" | "array"));
        if base_matches && pargs.len() == aargs.len() {
            for (p, a) in pargs.iter().zip(aargs.iter()) {
                match bind_type_params(p, a, type_params, bindings) {
                    BindOutcome::Ok => {}
                    conflict => return conflict,
                }
            }
            return BindOutcome::Ok;
        }
    }

    // Function-shaped parameter.
    if let (Some((pp, pr)), Some((ap, ar))) = (split_function(param_ty), split_function(arg_ty)) {
        if pp.len() == ap.len() {
            for (p, a) in pp.iter().zip(ap.iter()) {
                match bind_type_params(p, a, type_params, bindings) {
                    BindOutcome::Ok => {}
                    conflict => return conflict,
                }
            }
            return bind_type_params(&pr, &ar, type_params, bindings);
        }
    }

    BindOutcome::Ok
}

/// Assignability of `from` into `to`.
///
/// Widening to optional is allowed; narrowing from optional is not.
pub fn is_assignable(from: &str, to: &str, type_params: &HashSet<String>) -> bool {
    // Placeholders unify with anything.
    if from == ERROR || to == ERROR || from == INFER || to == INFER {
        return true;
    }
    if from == to {
        return true;
    }

    // Active type parameters unify with anything (resolved per call).
    if type_params.contains(from) || type_params.contains(to) {
        return true;
    }

    // `[]<T>` and `array<T>` interchange element-wise.
    if let (Some(fe), Some(te)) = (array_element(from), array_element(to)) {
        return is_assignable(&fe, &te, type_params) && is_assignable(&te, &fe, type_params);
    }

    // Union membership: every member of `from` must be a member of `to`.
    let to_members = union_members(to);
    if to_members.len() > 1 {
        let from_members = union_members(from);
        return from_members
            .iter()
            .all(|m| to_members.iter().any(|t| t == m));
    }

    // Widening to optional; null inhabits every optional.
    if let Some(inner) = optional_inner(to) {
        if from == NULL {
            return true;
        }
        return is_assignable(from, inner, type_params);
    }

    false
}

/// Equality up to canonical form and array-spelling interchange.
pub fn types_equal(a: &str, b: &str, type_params: &HashSet<String>) -> bool {
    if a == ERROR || b == ERROR || a == INFER || b == INFER {
        return true;
    }
    if canonicalize(a) == canonicalize(b) {
        return true;
    }
    if type_params.contains(a) || type_params.contains(b) {
        return true;
    }
    if let (Some(ae), Some(be)) = (array_element(a), array_element(b)) {
        return types_equal(&ae, &be, type_params);
    }
    false
}

/// Spelling of a function signature as a value type.
pub fn function_spelling(params: &[String], ret: &str) -> String {
    format!("({}) -> {}", params.join(", "), ret)
}

/// Wrap a spelling in `Promise<…>` unless it already is one.
pub fn make_promise(ty: &str) -> String {
    if split_generic(ty).map(|(b, _)| b == "Promise").unwrap_or(false) {
        ty.to_string()
    } else {
        format!("Promise<{}>", ty)
    }
}

/// Inner type of a `Promise<T>` spelling.
pub fn promise_inner(ty: &str) -> Option<String> {
    match split_generic(ty) {
        Some((base, args)) if base == "Promise" && args.len() == 1 => {
            Some(args.into_iter().next().expect("len checked"))
        }
        _ => None,
    }
}
