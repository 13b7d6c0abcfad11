//! Type checker tests, driven through the front half of the pipeline
//! (parse + check) so MIR-stage behavior stays out of the picture.

use std::path::PathBuf;

use omni::check::{check_module, CheckOutput};
use omni::diagnostics::{Diagnostic, DiagnosticContext, Severity};
use omni::loader::ModuleLoader;
use omni_parser::parse_source;

fn check(source: &str) -> (CheckOutput, Vec<Diagnostic>) {
    let (module, errors) = parse_source(source).expect("lex failed");
    assert!(
        errors.is_empty(),
        "unexpected parse errors: {:?}",
        errors.errors()
    );
    let ctx = DiagnosticContext::new("test.omni", source);
    let mut loader = ModuleLoader::new(vec![PathBuf::from(".")]);
    check_module(&module, &ctx, &mut loader)
}

fn check_ok(source: &str) -> CheckOutput {
    let (output, diags) = check(source);
    let errors: Vec<String> = diags
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .map(|d| d.message.clone())
        .collect();
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    output
}

fn check_err(source: &str) -> Vec<Diagnostic> {
    let (_, diags) = check(source);
    assert!(
        diags.iter().any(|d| d.severity == Severity::Error),
        "expected at least one error"
    );
    diags
}

fn has_error(diags: &[Diagnostic], needle: &str) -> bool {
    diags.iter().any(|d| d.message.contains(needle))
}

// ==================== Null safety ====================

#[test]
fn test_narrowing_from_optional_is_rejected() {
    let diags = check_err("func f(x:int?):int { return x }");
    assert!(has_error(
        &diags,
        "cannot return int? from function returning int"
    ));
}

#[test]
fn test_widening_to_optional_is_allowed() {
    check_ok("func f(x:int):int? { return x }");
}

#[test]
fn test_null_inhabits_optionals() {
    check_ok("func f():int? => null");
    check_ok("func g(x:int?):bool => x == null");
}

#[test]
fn test_optional_assignment_is_widening_only() {
    check_ok("func f(x:int) { var y:int? = null y = x }");
    let diags = check_err("func f(x:int?) { var y:int = 0 y = x }");
    assert!(has_error(&diags, "cannot assign 'int?' to 'int'"));
}

// ==================== Inference ====================

#[test]
fn test_binding_without_annotation_takes_rhs_type() {
    let output = check_ok("func f():string { let s = \"x\" return s }");
    assert_eq!(output.functions["f"].ret, "string");
}

#[test]
fn test_annotated_binding_rejects_mismatched_rhs() {
    let diags = check_err("func f() { let x:int = \"s\" }");
    assert!(has_error(&diags, "cannot assign 'string' to 'int'"));
}

#[test]
fn test_unannotated_return_uses_first_returned_type() {
    let output = check_ok("func f(c:bool) { if c { return 1 } return 2 }");
    assert_eq!(output.functions["f"].ret, "int");
}

#[test]
fn test_inconsistent_returns_are_rejected() {
    let diags = check_err("func f(c:bool) { if c { return 1 } return \"two\" }");
    assert!(has_error(
        &diags,
        "cannot return string from function returning int"
    ));
}

#[test]
fn test_empty_array_without_annotation_is_a_hard_error() {
    let diags = check_err("func f() { let xs = [] }");
    assert!(has_error(&diags, "empty array literal"));
}

#[test]
fn test_empty_array_with_annotation_is_accepted() {
    check_ok("func f() { let xs: []<int> = [] }");
}

#[test]
fn test_lambda_params_take_types_from_binding_annotation() {
    check_ok("func f():int { let g: (int) -> int = |x| x * 2 return g(3) }");
}

// ==================== Generics ====================

#[test]
fn test_generic_identity_with_inference() {
    let output = check_ok("func id<T>(x:T):T => x\nfunc main():int => id(7)");
    assert_eq!(output.functions["main"].ret, "int");
}

#[test]
fn test_generic_binding_through_array_shape() {
    check_ok("func head<T>(xs: []<T>):T => xs[0]\nfunc main():int => head([1, 2, 3])");
}

#[test]
fn test_generic_binding_through_map_shape() {
    check_ok(
        "func keys<K, V>(m: map<K, V>):K => \"\"\nfunc main():string { m := {\"a\": 1} return keys(m) }",
    );
}

#[test]
fn test_conflicting_generic_bindings_are_rejected() {
    let diags = check_err("func pair<T>(a:T, b:T):T => a\nfunc main():int => pair(1, \"s\")");
    assert!(has_error(&diags, "conflicting bindings for type parameter 'T'"));
}

#[test]
fn test_generic_struct_instantiation_and_field_access() {
    check_ok(
        "struct Box<T> { value: T }\nfunc unwrap(b: Box<int>):int => b.value\nfunc main():int => unwrap(Box{value: 7})",
    );
}

#[test]
fn test_array_spellings_interchange_in_calls() {
    check_ok("func f(xs: array<int>):int => len(xs)\nfunc main():int => f([1, 2])");
}

// ==================== Operators ====================

#[test]
fn test_string_concatenation_with_plus() {
    check_ok("func f(n:int):string => \"n = \" + n");
}

#[test]
fn test_arithmetic_requires_equal_numeric_types() {
    let diags = check_err("func f(a:int, b:float):int => a + b");
    assert!(has_error(&diags, "equal numeric types"));
}

#[test]
fn test_bitwise_rejects_floats() {
    let diags = check_err("func f(a:float):float => a & a");
    assert!(has_error(&diags, "bitwise operator '&'"));
}

#[test]
fn test_logical_operators_require_bool() {
    let diags = check_err("func f(a:int):bool => a && true");
    assert!(has_error(&diags, "requires 'bool' operands"));
}

#[test]
fn test_condition_must_be_bool() {
    let diags = check_err("func f():int { if 1 { return 1 } return 0 }");
    assert!(has_error(&diags, "condition must be 'bool'"));
}

#[test]
fn test_equality_on_equal_types_is_bool() {
    check_ok("func f(a:string, b:string):bool => a == b");
}

// ==================== Scoping ====================

#[test]
fn test_redeclaration_in_same_scope_is_rejected() {
    let diags = check_err("func f() { let x = 1 let x = 2 }");
    assert!(has_error(&diags, "redeclaration of 'x'"));
}

#[test]
fn test_shadowing_in_inner_scope_is_allowed() {
    check_ok("func f():string { let x = 1 { let x = \"s\" return x } }");
}

#[test]
fn test_undefined_identifier_suggests_similar_name() {
    let diags = check_err("func f():int { let count = 1 return cuont }");
    assert!(has_error(&diags, "undefined identifier 'cuont'"));
    assert!(diags
        .iter()
        .any(|d| d.hint.as_deref() == Some("did you mean 'count'?")));
}

#[test]
fn test_assignment_to_immutable_is_rejected() {
    let diags = check_err("func f() { let x = 1 x = 2 }");
    assert!(has_error(&diags, "cannot assign to immutable binding 'x'"));
}

#[test]
fn test_increment_requires_mutable_numeric() {
    let diags = check_err("func f() { let x = 1 x++ }");
    assert!(has_error(&diags, "cannot apply '++' to immutable binding 'x'"));

    let diags = check_err("func f() { var s = \"x\" s++ }");
    assert!(has_error(&diags, "'++' requires a numeric operand"));
}

// ==================== Control-flow context ====================

#[test]
fn test_break_outside_loop_is_rejected() {
    let diags = check_err("func f() { break }");
    assert!(has_error(&diags, "'break' outside of a loop"));
}

#[test]
fn test_continue_outside_loop_is_rejected() {
    let diags = check_err("func f() { continue }");
    assert!(has_error(&diags, "'continue' outside of a loop"));
}

#[test]
fn test_break_inside_loop_is_accepted() {
    check_ok("func f() { while true { break } }");
}

#[test]
fn test_await_outside_async_is_rejected() {
    let diags = check_err("async func g():int => 1\nfunc f():int => await g()");
    assert!(has_error(&diags, "'await' outside of an async function"));
}

#[test]
fn test_async_functions_are_promises_at_call_sites() {
    let output = check_ok("async func g():int => 1\nasync func f():int => await g()");
    assert_eq!(output.functions["g"].ret, "Promise<int>");
    assert_eq!(output.functions["f"].ret, "Promise<int>");
}

#[test]
fn test_range_for_over_array() {
    check_ok("func sum(xs: []<int>):int { var total:int = 0 for x in xs { total = total + x } return total }");
}

#[test]
fn test_range_for_over_non_array_is_rejected() {
    let diags = check_err("func f(n:int) { for x in n { } }");
    assert!(has_error(&diags, "range-for requires an array"));
}

// ==================== Structs, enums, unions ====================

#[test]
fn test_unknown_field_is_rejected_with_hint() {
    let diags = check_err(
        "struct Point { x: int, y: int }\nfunc f(p: Point):int => p.z",
    );
    assert!(has_error(&diags, "unknown field 'z' on struct 'Point'"));
    assert!(diags
        .iter()
        .any(|d| d.hint.as_deref() == Some("available fields: x, y")));
}

#[test]
fn test_struct_literal_missing_field() {
    let diags = check_err("struct Point { x: int, y: int }\nfunc f():Point => Point{x: 1}");
    assert!(has_error(&diags, "missing field 'y'"));
}

#[test]
fn test_enum_variant_access() {
    check_ok("enum Color { red, green }\nfunc f():Color => Color.red");
    let diags = check_err("enum Color { red, green }\nfunc f():Color => Color.blue");
    assert!(has_error(&diags, "enum 'Color' has no variant 'blue'"));
}

#[test]
fn test_union_membership() {
    check_ok("func f(x: int | string):int => 0\nfunc main():int => f(7)");
    let diags =
        check_err("func f(x: int | string):int => 0\nfunc main():int => f(true)");
    assert!(has_error(&diags, "expects 'int | string'"));
}

#[test]
fn test_union_order_does_not_matter() {
    check_ok(
        "func f(x: int | string):int => 0\nfunc g(y: string | int):int => f(y)",
    );
}

#[test]
fn test_type_alias_expansion() {
    check_ok("type Num = int\nfunc f(x: Num):int => x");
    check_ok("type Pair<T> = map<T, T>\nfunc f(p: Pair<string>):map<string,string> => p");
}

#[test]
fn test_unknown_type_is_rejected() {
    let diags = check_err("func f(x: Pont):int => 0");
    assert!(has_error(&diags, "unknown type 'Pont'"));
}

#[test]
fn test_arity_mismatch() {
    let diags = check_err("func f(a:int, b:int):int => a\nfunc main():int => f(1)");
    assert!(has_error(&diags, "expects 2 argument(s), found 1"));
}

#[test]
fn test_pointer_member_access_requires_arrow() {
    check_ok("struct Point { x: int }\nfunc f(p: *Point):int => p->x");
    let diags = check_err("struct Point { x: int }\nfunc f(p: *Point):int => p.x");
    assert!(has_error(&diags, "cannot use '.' on pointer type"));
}

#[test]
fn test_member_access_on_optional_is_rejected() {
    let diags = check_err("struct Point { x: int }\nfunc f(p: Point?):int => p.x");
    assert!(has_error(&diags, "optional type"));
}

#[test]
fn test_interpolation_checks_embedded_expressions() {
    let diags = check_err("func f():string => \"v=${missing}\"");
    assert!(has_error(&diags, "undefined identifier 'missing'"));
    check_ok("func f(x:int):string => \"v=${x + 1}\"");
}

#[test]
fn test_cast_rules() {
    check_ok("func f(x:int):double => (double) x");
    check_ok("func f2(x:int?):int => (int) x");
    let diags = check_err("func g(x: []<int>):int => (int) x");
    assert!(has_error(&diags, "cannot cast"));
}

#[test]
fn test_module_symbol_for_local_import_binds() {
    // Local import binding resolves as a module symbol even though the
    // module itself fails to load from the test directory.
    let (_, diags) = check("import util\nfunc main():int => 0");
    // The loader error is reported, but the binding is still declared.
    assert!(diags.iter().any(|d| d.message.contains("not found")) || diags.is_empty());
}
