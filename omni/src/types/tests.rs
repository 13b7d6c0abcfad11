use super::*;

use std::collections::{HashMap, HashSet};

fn no_params() -> HashSet<String> {
    HashSet::new()
}

#[test]
fn test_canonicalize_sorts_unions() {
    assert_eq!(canonicalize("string | int"), "int | string");
    assert_eq!(canonicalize("int | string"), "int | string");
}

#[test]
fn test_canonicalize_is_idempotent() {
    let once = canonicalize("string | int | bool");
    assert_eq!(canonicalize(&once), once);
}

#[test]
fn test_double_optional_normalizes() {
    assert_eq!(canonicalize("int??"), "int?");
    assert_eq!(canonicalize("int?"), "int?");
}

#[test]
fn test_split_generic_nested() {
    let (base, args) = split_generic("map<string,array<int>>").unwrap();
    assert_eq!(base, "map");
    assert_eq!(args, vec!["string", "array<int>"]);
}

#[test]
fn test_split_generic_rejects_unions_and_functions() {
    assert!(split_generic("int | array<int>").is_none());
    assert!(split_generic("(int) -> int").is_none());
    assert!(split_generic("array<int>?").is_none());
}

#[test]
fn test_split_function() {
    let (params, ret) = split_function("(int, string) -> bool").unwrap();
    assert_eq!(params, vec!["int", "string"]);
    assert_eq!(ret, "bool");

    let (params, ret) = split_function("() -> void").unwrap();
    assert!(params.is_empty());
    assert_eq!(ret, "void");
}

#[test]
fn test_split_function_nested() {
    let (params, ret) = split_function("((int) -> int) -> bool").unwrap();
    assert_eq!(params, vec!["(int) -> int"]);
    assert_eq!(ret, "bool");
}

#[test]
fn test_pointer_depth() {
    assert_eq!(pointer_depth("int"), 0);
    assert_eq!(pointer_depth("*int"), 1);
    assert_eq!(pointer_depth("**Box<int>"), 2);
}

#[test]
fn test_substitution_is_identifier_safe() {
    let mut bindings = HashMap::new();
    bindings.insert("T".to_string(), "X".to_string());
    assert_eq!(substitute("Matrix<T>", &bindings), "Matrix<X>");
    assert_eq!(substitute("T", &bindings), "X");
    assert_eq!(substitute("MatrixT", &bindings), "MatrixT");
    assert_eq!(substitute("map<T,TT>", &bindings), "map<X,TT>");
}

#[test]
fn test_bind_bare_param() {
    let params: HashSet<String> = ["T".to_string()].into_iter().collect();
    let mut bindings = HashMap::new();
    assert_eq!(
        bind_type_params("T", "int", &params, &mut bindings),
        BindOutcome::Ok
    );
    assert_eq!(bindings.get("T").map(String::as_str), Some("int"));
}

#[test]
fn test_bind_generic_shape() {
    let params: HashSet<String> = ["K".to_string(), "V".to_string()].into_iter().collect();
    let mut bindings = HashMap::new();
    assert_eq!(
        bind_type_params("map<K,V>", "map<string,int>", &params, &mut bindings),
        BindOutcome::Ok
    );
    assert_eq!(bindings.get("K").map(String::as_str), Some("string"));
    assert_eq!(bindings.get("V").map(String::as_str), Some("int"));
}

#[test]
fn test_bind_array_spellings_interchange() {
    let params: HashSet<String> = ["T".to_string()].into_iter().collect();
    let mut bindings = HashMap::new();
    assert_eq!(
        bind_type_params("array<T>", "[]<int>", &params, &mut bindings),
        BindOutcome::Ok
    );
    assert_eq!(bindings.get("T").map(String::as_str), Some("int"));
}

#[test]
fn test_bind_conflict_is_reported() {
    let params: HashSet<String> = ["T".to_string()].into_iter().collect();
    let mut bindings = HashMap::new();
    bindings.insert("T".to_string(), "int".to_string());
    let outcome = bind_type_params("T", "string", &params, &mut bindings);
    assert!(matches!(outcome, BindOutcome::Conflict { .. }));
}

#[test]
fn test_optional_widening_only() {
    let p = no_params();
    assert!(is_assignable("int", "int?", &p));
    assert!(is_assignable("null", "int?", &p));
    assert!(!is_assignable("int?", "int", &p));
}

#[test]
fn test_union_membership() {
    let p = no_params();
    assert!(is_assignable("int", "int | string", &p));
    assert!(is_assignable("string", "int | string", &p));
    assert!(!is_assignable("bool", "int | string", &p));
    // Union equality is order-insensitive once canonicalized.
    assert!(is_assignable(
        &canonicalize("string | int"),
        &canonicalize("int | string"),
        &p
    ));
}

#[test]
fn test_array_spellings_are_equivalent() {
    let p = no_params();
    assert!(is_assignable("[]<int>", "array<int>", &p));
    assert!(is_assignable("array<int>", "[]<int>", &p));
    assert!(!is_assignable("[]<int>", "array<string>", &p));
}

#[test]
fn test_error_and_infer_unify() {
    let p = no_params();
    assert!(is_assignable(ERROR, "int", &p));
    assert!(is_assignable("int", ERROR, &p));
    assert!(is_assignable(INFER, "string", &p));
}

#[test]
fn test_pointer_types_compare_by_spelling() {
    let p = no_params();
    assert!(is_assignable("*int", "*int", &p));
    assert!(!is_assignable("*int", "**int", &p));
    assert!(!is_assignable("*int", "*string", &p));
}

#[test]
fn test_promise_helpers() {
    assert_eq!(make_promise("int"), "Promise<int>");
    assert_eq!(make_promise("Promise<int>"), "Promise<int>");
    assert_eq!(promise_inner("Promise<int>").unwrap(), "int");
    assert!(promise_inner("int").is_none());
}

#[test]
fn test_union_members_respects_function_arrows() {
    let members = union_members("(int) -> int | string");
    assert_eq!(members, vec!["(int) -> int", "string"]);
}
