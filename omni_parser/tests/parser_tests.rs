//! Parser corpus tests: declarations, statements, expressions, types,
//! interpolation, and error recovery.

use omni_parser::ast::{
    BinaryOp, Decl, Expr, ForStmt, FuncBody, InterpPart, LiteralKind, Stmt, TypeExpr, UnaryOp,
};
use omni_parser::{parse_source, ParseError};
use pretty_assertions::assert_eq;

fn parse_ok(source: &str) -> omni_parser::ast::Module {
    let (module, errors) = parse_source(source).expect("lex failed");
    assert!(
        errors.is_empty(),
        "unexpected parse errors: {:?}",
        errors.errors()
    );
    module
}

fn parse_err(source: &str) -> Vec<ParseError> {
    let (_, errors) = parse_source(source).expect("lex failed");
    assert!(!errors.is_empty(), "expected parse errors for {:?}", source);
    errors.take()
}

fn first_func(module: &omni_parser::ast::Module) -> &omni_parser::ast::FuncDecl {
    module
        .decls
        .iter()
        .find_map(|d| match d {
            Decl::Func(f) => Some(f),
            _ => None,
        })
        .expect("no function declaration")
}

fn func_body_stmts(func: &omni_parser::ast::FuncDecl) -> &[Stmt] {
    match &func.body {
        FuncBody::Block(block) => &block.stmts,
        FuncBody::Expr(_) => panic!("expected a block body"),
    }
}

// ==================== Declarations ====================

#[test]
fn test_expression_bodied_function() {
    let module = parse_ok("func fortyTwo():int => 42");
    let func = first_func(&module);
    assert_eq!(func.name, "fortyTwo");
    assert!(!func.is_async);
    assert_eq!(func.return_type.as_ref().unwrap().canonical(), "int");
    assert!(matches!(func.body, FuncBody::Expr(_)));
}

#[test]
fn test_function_params_and_block_body() {
    let module = parse_ok("func add(a:int, b:int):int { return a + b }");
    let func = first_func(&module);
    assert_eq!(func.params.len(), 2);
    assert_eq!(func.params[0].name, "a");
    assert_eq!(func.params[1].ty.canonical(), "int");
    assert_eq!(func_body_stmts(func).len(), 1);
}

#[test]
fn test_async_function_with_type_params() {
    let module = parse_ok("async func fetch<T>(url:string):T => await go(url)");
    let func = first_func(&module);
    assert!(func.is_async);
    assert_eq!(func.type_params.len(), 1);
    assert_eq!(func.type_params[0].name, "T");
}

#[test]
fn test_struct_declaration() {
    let module = parse_ok("struct Point { x: int, y: int }");
    let Decl::Struct(s) = &module.decls[0] else {
        panic!("expected struct");
    };
    assert_eq!(s.name, "Point");
    assert_eq!(s.fields.len(), 2);
    assert_eq!(s.fields[1].name, "y");
}

#[test]
fn test_generic_struct_declaration() {
    let module = parse_ok("struct Box<T> { value: T }");
    let Decl::Struct(s) = &module.decls[0] else {
        panic!("expected struct");
    };
    assert_eq!(s.type_params.len(), 1);
    assert_eq!(s.fields[0].ty.canonical(), "T");
}

#[test]
fn test_enum_declaration() {
    let module = parse_ok("enum Color { red, green, blue }");
    let Decl::Enum(e) = &module.decls[0] else {
        panic!("expected enum");
    };
    assert_eq!(e.name, "Color");
    let names: Vec<&str> = e.variants.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["red", "green", "blue"]);
}

#[test]
fn test_type_alias() {
    let module = parse_ok("type Pair<T> = map<T, T>");
    let Decl::TypeAlias(a) = &module.decls[0] else {
        panic!("expected alias");
    };
    assert_eq!(a.name, "Pair");
    assert_eq!(a.type_params, vec!["T".to_string()]);
    assert_eq!(a.ty.canonical(), "map<T,T>");
}

#[test]
fn test_imports_with_alias() {
    let module = parse_ok("import std.io\nimport foo.util as u\nfunc main():int => 0");
    assert_eq!(module.imports.len(), 2);
    assert_eq!(module.imports[0].dotted(), "std.io");
    assert_eq!(module.imports[0].binding_name(), "io");
    assert!(module.imports[0].is_std());
    assert_eq!(module.imports[1].binding_name(), "u");
    assert!(!module.imports[1].is_std());
}

#[test]
fn test_global_bindings() {
    let module = parse_ok("let limit:int = 10\nvar counter = 0");
    let Decl::Binding(first) = &module.decls[0] else {
        panic!("expected binding");
    };
    assert!(!first.mutable);
    assert_eq!(first.ty.as_ref().unwrap().canonical(), "int");
    let Decl::Binding(second) = &module.decls[1] else {
        panic!("expected binding");
    };
    assert!(second.mutable);
    assert!(second.ty.is_none());
}

// ==================== Statements ====================

#[test]
fn test_if_else_if_chain() {
    let module = parse_ok(
        "func sign(x:int):int { if x > 0 { return 1 } else if x < 0 { return -1 } else { return 0 } }",
    );
    let stmts = func_body_stmts(first_func(&module));
    let Stmt::If { else_branch, .. } = &stmts[0] else {
        panic!("expected if");
    };
    let Some(else_stmt) = else_branch else {
        panic!("expected else");
    };
    assert!(matches!(**else_stmt, Stmt::If { .. }));
}

#[test]
fn test_while_and_jumps() {
    let module = parse_ok(
        "func spin():int { while true { if done() { break } continue } return 0 }",
    );
    let stmts = func_body_stmts(first_func(&module));
    assert!(matches!(stmts[0], Stmt::While { .. }));
}

#[test]
fn test_classic_for() {
    let module = parse_ok("func f():int { for i:int = 0; i < 3; i++ { } return 0 }");
    let stmts = func_body_stmts(first_func(&module));
    let Stmt::For(ForStmt::Classic {
        init, cond, post, ..
    }) = &stmts[0]
    else {
        panic!("expected classic for");
    };
    assert!(matches!(init.as_deref(), Some(Stmt::Binding { .. })));
    assert!(cond.is_some());
    assert!(matches!(post.as_deref(), Some(Stmt::Increment { .. })));
}

#[test]
fn test_classic_for_with_empty_slots() {
    let module = parse_ok("func f():int { for ;; { break } return 0 }");
    let stmts = func_body_stmts(first_func(&module));
    let Stmt::For(ForStmt::Classic {
        init, cond, post, ..
    }) = &stmts[0]
    else {
        panic!("expected classic for");
    };
    assert!(init.is_none());
    assert!(cond.is_none());
    assert!(post.is_none());
}

#[test]
fn test_range_for() {
    let module = parse_ok("func sum(xs: []<int>):int { for x in xs { } return 0 }");
    let stmts = func_body_stmts(first_func(&module));
    let Stmt::For(ForStmt::Range { var, .. }) = &stmts[0] else {
        panic!("expected range for");
    };
    assert_eq!(var, "x");
}

#[test]
fn test_short_var_decl_and_assignment() {
    let module = parse_ok("func f():int { x := 1 x = 2 return x }");
    let stmts = func_body_stmts(first_func(&module));
    assert!(matches!(stmts[0], Stmt::ShortVarDecl { .. }));
    assert!(matches!(stmts[1], Stmt::Assign { .. }));
}

#[test]
fn test_try_catch_finally() {
    let module = parse_ok(
        "func f():int { try { risky() } catch e { log(e) } finally { cleanup() } return 0 }",
    );
    let stmts = func_body_stmts(first_func(&module));
    let Stmt::Try { catch, finally, .. } = &stmts[0] else {
        panic!("expected try");
    };
    assert_eq!(catch.as_ref().unwrap().name.as_deref(), Some("e"));
    assert!(finally.is_some());
}

#[test]
fn test_throw_statement() {
    let module = parse_ok("func f():int { throw \"boom\" }");
    let stmts = func_body_stmts(first_func(&module));
    assert!(matches!(stmts[0], Stmt::Throw { .. }));
}

#[test]
fn test_bare_return() {
    let module = parse_ok("func f() { return }");
    let stmts = func_body_stmts(first_func(&module));
    assert!(matches!(stmts[0], Stmt::Return { value: None, .. }));
}

// ==================== Expressions ====================

fn parse_expr_body(source: &str) -> Expr {
    let module = parse_ok(source);
    match &first_func(&module).body {
        FuncBody::Expr(expr) => (**expr).clone(),
        FuncBody::Block(_) => panic!("expected expression body"),
    }
}

#[test]
fn test_factor_binds_tighter_than_term() {
    let expr = parse_expr_body("func f():int => 1 + 2 * 3");
    let Expr::Binary { op, rhs, .. } = expr else {
        panic!("expected binary");
    };
    assert_eq!(op, BinaryOp::Add);
    assert!(matches!(
        *rhs,
        Expr::Binary {
            op: BinaryOp::Mul,
            ..
        }
    ));
}

#[test]
fn test_comparison_binds_tighter_than_logical() {
    let expr = parse_expr_body("func f():bool => a < b && c > d");
    let Expr::Binary { op, lhs, rhs, .. } = expr else {
        panic!("expected binary");
    };
    assert_eq!(op, BinaryOp::And);
    assert!(matches!(*lhs, Expr::Binary { op: BinaryOp::Lt, .. }));
    assert!(matches!(*rhs, Expr::Binary { op: BinaryOp::Gt, .. }));
}

#[test]
fn test_assignment_is_right_associative() {
    let module = parse_ok("func f():int { a = b = c return a }");
    let stmts = func_body_stmts(first_func(&module));
    let Stmt::Assign { value, .. } = &stmts[0] else {
        panic!("expected assignment");
    };
    assert!(matches!(value, Expr::Assign { .. }));
}

#[test]
fn test_unary_and_postfix_interaction() {
    // -abs(x) must parse as -(abs(x)).
    let expr = parse_expr_body("func f():int => -abs(x)");
    let Expr::Unary { op, operand, .. } = expr else {
        panic!("expected unary");
    };
    assert_eq!(op, UnaryOp::Neg);
    assert!(matches!(*operand, Expr::Call { .. }));
}

#[test]
fn test_member_chain_and_index() {
    let expr = parse_expr_body("func f():int => a.b.c[0]");
    let Expr::Index { target, .. } = expr else {
        panic!("expected index");
    };
    assert_eq!(target.dotted_name().as_deref(), Some("a.b.c"));
}

#[test]
fn test_pointer_member_access() {
    let expr = parse_expr_body("func f(p: *Point):int => p->x");
    let Expr::Member {
        through_pointer, ..
    } = expr
    else {
        panic!("expected member");
    };
    assert!(through_pointer);
}

#[test]
fn test_cast_of_primitive_type() {
    let expr = parse_expr_body("func f():int => (int) -x");
    let Expr::Cast { ty, expr, .. } = expr else {
        panic!("expected cast");
    };
    assert_eq!(ty.canonical(), "int");
    assert!(matches!(*expr, Expr::Unary { op: UnaryOp::Neg, .. }));
}

#[test]
fn test_parenthesized_identifier_is_not_a_cast() {
    let expr = parse_expr_body("func f():int => (a) - 1");
    assert!(matches!(
        expr,
        Expr::Binary {
            op: BinaryOp::Sub,
            ..
        }
    ));
}

#[test]
fn test_cast_of_named_type_before_identifier() {
    let expr = parse_expr_body("func f():Point => (Point) value");
    assert!(matches!(expr, Expr::Cast { .. }));
}

#[test]
fn test_struct_literal_lookahead() {
    let expr = parse_expr_body("func f():Point => Point{x: 1, y: 2}");
    let Expr::StructLit { name, fields, .. } = expr else {
        panic!("expected struct literal");
    };
    assert_eq!(name, "Point");
    assert_eq!(fields.len(), 2);
}

#[test]
fn test_empty_struct_literal() {
    let expr = parse_expr_body("func f():Unit => Unit{}");
    assert!(matches!(expr, Expr::StructLit { .. }));
}

#[test]
fn test_if_condition_is_not_a_struct_literal() {
    let module = parse_ok("func f(x:bool):int { if x { return 1 } return 0 }");
    let stmts = func_body_stmts(first_func(&module));
    let Stmt::If { cond, .. } = &stmts[0] else {
        panic!("expected if");
    };
    assert!(matches!(cond, Expr::Ident { .. }));
}

#[test]
fn test_array_and_map_literals() {
    let expr = parse_expr_body("func f():int => [1, 2, 3][0]");
    assert!(matches!(expr, Expr::Index { .. }));

    let module = parse_ok("func g():int { m := {\"a\": 1, \"b\": 2} return 0 }");
    let stmts = func_body_stmts(first_func(&module));
    let Stmt::ShortVarDecl { value, .. } = &stmts[0] else {
        panic!("expected short var decl");
    };
    let Expr::MapLit { entries, .. } = value else {
        panic!("expected map literal");
    };
    assert_eq!(entries.len(), 2);
}

#[test]
fn test_lambda_with_and_without_params() {
    let module = parse_ok("let double = |x: int| x * 2\nlet unit = || 1");
    let Decl::Binding(first) = &module.decls[0] else {
        panic!("expected binding");
    };
    let Expr::Lambda { params, .. } = &first.value else {
        panic!("expected lambda");
    };
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].ty.as_ref().unwrap().canonical(), "int");

    let Decl::Binding(second) = &module.decls[1] else {
        panic!("expected binding");
    };
    let Expr::Lambda { params, .. } = &second.value else {
        panic!("expected lambda");
    };
    assert!(params.is_empty());
}

#[test]
fn test_new_and_delete() {
    let expr = parse_expr_body("func f():*Point => new Point{x: 1, y: 2}");
    assert!(matches!(expr, Expr::New { .. }));

    let module = parse_ok("func g(p: *Point) { delete p }");
    let stmts = func_body_stmts(first_func(&module));
    let Stmt::Expr(Expr::Delete { .. }) = &stmts[0] else {
        panic!("expected delete expression statement");
    };
}

#[test]
fn test_await_expression() {
    let expr = parse_expr_body("async func f():int => await g()");
    assert!(matches!(expr, Expr::Await { .. }));
}

#[test]
fn test_increment_statement() {
    let module = parse_ok("func f():int { var i:int = 0 i++ i-- return i }");
    let stmts = func_body_stmts(first_func(&module));
    assert!(matches!(
        stmts[1],
        Stmt::Increment {
            is_increment: true,
            ..
        }
    ));
    assert!(matches!(
        stmts[2],
        Stmt::Increment {
            is_increment: false,
            ..
        }
    ));
}

// ==================== Types ====================

fn parse_param_type(source: &str) -> TypeExpr {
    let module = parse_ok(source);
    first_func(&module).params[0].ty.clone()
}

#[test]
fn test_nested_generic_type() {
    let ty = parse_param_type("func f(x: array<array<int>>):int => 0");
    assert_eq!(ty.canonical(), "array<array<int>>");
}

#[test]
fn test_array_spelling_type() {
    let ty = parse_param_type("func f(x: []<[]<int>>):int => 0");
    assert_eq!(ty.canonical(), "[]<[]<int>>");
}

#[test]
fn test_union_type_is_sorted() {
    let ty = parse_param_type("func f(x: string | int):int => 0");
    assert_eq!(ty.canonical(), "int | string");
}

#[test]
fn test_optional_type() {
    let ty = parse_param_type("func f(x: int?):int => 0");
    assert_eq!(ty.canonical(), "int?");
    let ty = parse_param_type("func f(x: int??):int => 0");
    assert_eq!(ty.canonical(), "int?");
}

#[test]
fn test_pointer_types() {
    let ty = parse_param_type("func f(x: **Point):int => 0");
    assert_eq!(ty.canonical(), "**Point");
    let ty = parse_param_type("func f(x: *array<int>):int => 0");
    assert_eq!(ty.canonical(), "*array<int>");
}

#[test]
fn test_function_type() {
    let ty = parse_param_type("func f(cb: (int, string) -> bool):int => 0");
    assert_eq!(ty.canonical(), "(int, string) -> bool");
    let ty = parse_param_type("func f(cb: () -> void):int => 0");
    assert_eq!(ty.canonical(), "() -> void");
}

#[test]
fn test_qualified_type() {
    let ty = parse_param_type("func f(x: util.Config):int => 0");
    assert_eq!(ty.canonical(), "util.Config");
}

#[test]
fn test_parenthesized_union_in_generic_args() {
    let ty = parse_param_type("func f(x: array<(int | string)>):int => 0");
    assert_eq!(ty.canonical(), "array<int | string>");
}

#[test]
fn test_bare_union_in_generic_args_is_rejected() {
    let errors = parse_err("func f(x: array<int | string>):int => 0");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ParseError::UnionInGenericArgs { .. })));
}

// ==================== String interpolation ====================

#[test]
fn test_interpolation_parts() {
    let expr = parse_expr_body(r#"func f(x:int):string => "a ${x} b""#);
    let Expr::Interp { parts, .. } = expr else {
        panic!("expected interpolation");
    };
    assert_eq!(parts.len(), 3);
    assert!(matches!(&parts[0], InterpPart::Text(t) if t == "a "));
    assert!(matches!(&parts[1], InterpPart::Expr(Expr::Ident { .. })));
    assert!(matches!(&parts[2], InterpPart::Text(t) if t == " b"));
}

#[test]
fn test_interpolation_with_nested_braces() {
    let expr = parse_expr_body(r#"func f():string => "v=${Point{x: 1, y: 2}.x}""#);
    let Expr::Interp { parts, .. } = expr else {
        panic!("expected interpolation");
    };
    assert_eq!(parts.len(), 2);
    assert!(matches!(&parts[1], InterpPart::Expr(Expr::Member { .. })));
}

#[test]
fn test_interpolation_expression_spans_point_into_source() {
    let source = r#"func f(x:int):string => "a ${x} b""#;
    let expr = parse_expr_body(source);
    let Expr::Interp { parts, .. } = expr else {
        panic!("expected interpolation");
    };
    let InterpPart::Expr(inner) = &parts[1] else {
        panic!("expected expression part");
    };
    let span = inner.span();
    assert_eq!(&source[span.start.offset..span.end.offset], "x");
}

#[test]
fn test_unterminated_interpolation_is_an_error() {
    let errors = parse_err(r#"func f():string => "a ${x""#);
    assert!(errors
        .iter()
        .any(|e| matches!(e, ParseError::UnterminatedInterpolation { .. })));
}

#[test]
fn test_interpolated_arithmetic() {
    let expr = parse_expr_body(r#"func f(a:int, b:int):string => "${a + b}""#);
    let Expr::Interp { parts, .. } = expr else {
        panic!("expected interpolation");
    };
    assert_eq!(parts.len(), 1);
    assert!(matches!(
        &parts[0],
        InterpPart::Expr(Expr::Binary {
            op: BinaryOp::Add,
            ..
        })
    ));
}

// ==================== Literals ====================

#[test]
fn test_literal_kinds() {
    let module = parse_ok(
        "func f():int { a := 1 b := 2.5 c := 0xFF d := 0b11 e := \"s\" g := 'c' h := true i := null return 0 }",
    );
    let stmts = func_body_stmts(first_func(&module));
    let kinds: Vec<LiteralKind> = stmts
        .iter()
        .filter_map(|s| match s {
            Stmt::ShortVarDecl {
                value: Expr::Literal { kind, .. },
                ..
            } => Some(*kind),
            _ => None,
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            LiteralKind::Int,
            LiteralKind::Float,
            LiteralKind::Hex,
            LiteralKind::Binary,
            LiteralKind::Str,
            LiteralKind::Char,
            LiteralKind::Bool,
            LiteralKind::Null,
        ]
    );
}

// ==================== Error recovery ====================

#[test]
fn test_recovery_at_declaration_boundary() {
    let (module, errors) = parse_source("func () {}\nfunc ok():int => 1").expect("lex failed");
    assert!(!errors.is_empty());
    assert_eq!(module.decls.len(), 1);
    let Decl::Func(func) = &module.decls[0] else {
        panic!("expected function");
    };
    assert_eq!(func.name, "ok");
}

#[test]
fn test_recovery_inside_block() {
    let source = "func f():int { let = 3 return 7 }";
    let (module, errors) = parse_source(source).expect("lex failed");
    assert!(!errors.is_empty());
    // The parser recovers at `return` and keeps the rest of the body.
    let func = first_func(&module);
    let stmts = func_body_stmts(func);
    assert!(stmts.iter().any(|s| matches!(s, Stmt::Return { .. })));
}

#[test]
fn test_partial_module_is_returned_on_trailing_garbage() {
    // Trailing tokens that cannot start a declaration are reported, but
    // the declarations before them survive.
    let (module, errors) = parse_source("func ok():int => 1\n= = =").expect("lex failed");
    assert!(!errors.is_empty());
    assert_eq!(module.decls.len(), 1);
}

#[test]
fn test_stray_character_aborts_lexing() {
    assert!(parse_source("func ok():int => 1\n@@@").is_err());
}

#[test]
fn test_no_crash_on_arbitrary_inputs() {
    for source in [
        "",
        ";;;",
        "func",
        "func f(",
        "struct S {",
        "let x =",
        "func f():int => ",
        "import",
        "type T =",
        "func f():int { if }",
        "((((((((((",
        "> > > >> <<",
    ] {
        // Either lex errors or parse errors; never a panic.
        let _ = parse_source(source);
    }
}

#[test]
fn test_declaration_count_matches_source() {
    let module = parse_ok(
        "import std.io\nlet a = 1\nstruct S { x: int }\nenum E { a }\ntype T = int\nfunc f():int => 0",
    );
    assert_eq!(module.imports.len(), 1);
    assert_eq!(module.decls.len(), 5);
}
