mod common;

use trellis_core::config::LoweringOptions;
use trellis_core::lower::lower_program;
use trellis_core::tree::builder::{assign, decl_ref, expr, int, stmt};
use trellis_core::tree::{
    Expr, ExprKind, FunctionKind, NominalKind, ProgramBuilder, Stmt, StmtKind, Type,
};

#[test]
fn struct_keeps_storage_behind_accessors() {
    let mut b = ProgramBuilder::new("App");
    let (int_ty, _) = common::swift_int(&mut b);
    let point = b.nominal(None, "Point", NominalKind::Struct);
    b.property(Some(point), "x", int_ty.clone(), false, Some(int(0, int_ty.clone())));
    b.function_in(
        "App",
        Some(point),
        "init",
        FunctionKind::Initializer { memberwise: true, failable: false },
        vec![(Some("x"), "x", int_ty.clone())],
        Type::nominal(point),
    );
    let program = b.finish();
    let text = common::lower(&program).text;

    assert!(text.contains("class Point{\nstatic readonly $struct = true\nstatic readonly $infoAddress = '"), "{}", text);
    assert!(text.contains("\nx$internal\n"), "storage field missing:\n{}", text);
    assert!(text.contains("get x() { return this.x$get() }"));
    assert!(text.contains("set x($newValue) { this.x$set($newValue) }"));
    assert!(text.contains("this.x = x"), "memberwise body missing:\n{}", text);

    let vars = common::position(&text, "init$vars() {");
    assert!(
        text[vars..].contains("this.x$internal = 0"),
        "initial value belongs in init$vars:\n{}",
        text
    );
}

#[test]
fn protocol_defaults_live_in_implementation_class() {
    let mut b = ProgramBuilder::new("App");
    let (int_ty, _) = common::swift_int(&mut b);

    let shape = b.nominal(None, "Shape", NominalKind::Protocol);
    let area = b.function(Some(shape), "area", vec![], int_ty.clone());
    let ext = b.extension(Type::nominal(shape));
    let describe = b.function(Some(ext), "describe", vec![], int_ty.clone());
    b.set_body(describe, Stmt::brace(vec![stmt(StmtKind::Return(Some(int(1, int_ty.clone()))))]));

    let square = b.nominal(None, "Square", NominalKind::Struct);
    b.conform(square, Type::nominal(shape));
    let square_area = b.function(Some(square), "area", vec![], int_ty.clone());
    b.set_body(square_area, Stmt::brace(vec![stmt(StmtKind::Return(Some(int(4, int_ty.clone()))))]));
    b.add_requirement(square_area, area);

    let program = b.finish();
    let text = common::lower(&program).text;

    let interface = common::position(&text, "interface Shape{");
    let implementation = common::position(&text, "class Shape$implementation{");
    let defaults = common::position(&text, "describe($info");
    assert!(interface < implementation && implementation < defaults, "{}", text);

    let class = common::position(&text, "class Square implements Shape{");
    let link = common::position(
        &text,
        "if(typeof Shape$implementation != 'undefined') _mixin(Square, Shape$implementation, false)",
    );
    assert!(class < link, "linkage must follow the declarations:\n{}", text);
    assert!(text.contains("return 4;"));
}

#[test]
fn enum_cases_are_static_factories() {
    let mut b = ProgramBuilder::new("App");
    let direction = b.nominal(None, "Direction", NominalKind::Enum);
    b.enum_case(direction, "north", None, vec![]);
    b.enum_case(direction, "south", None, vec![]);
    let program = b.finish();
    let text = common::lower(&program).text;

    assert!(text.contains(
        "static get north() {return Object.assign(new Direction(), {rawValue: \"north\", ...Array.from(arguments).slice(1)})}"
    ));
    assert!(text.contains("static get south()"));
    assert!(text.contains("static infix_61_61($info, a, b){return (a && a.rawValue) == (b && b.rawValue)}"));
    assert!(text.contains("static infix_33_61($info, a, b)"));
}

#[test]
fn inout_parameters_write_back_after_the_body() {
    let mut b = ProgramBuilder::new("App");
    let (int_ty, _) = common::swift_int(&mut b);
    let bump = b.function(None, "bump", vec![(None, "n", int_ty.clone())], Type::void());
    let n = b.param_of(bump, 0).expect("parameter");
    b.set_inout(n);
    b.set_body(bump, Stmt::brace(vec![expr(assign(decl_ref(n, int_ty.clone()), int(5, int_ty.clone())))]));
    let program = b.finish();
    let text = common::lower(&program).text;

    assert!(text.contains(&format!("function bump($info{}, n$inout){{", bump)), "{}", text);
    let read = common::position(&text, "let n = n$inout.get()");
    let body = common::position(&text, "n = 5;");
    let write = common::position(&text, "n$inout.set(n)");
    assert!(read < body && body < write, "{}", text);
    assert!(text.contains("return $result"));
}

#[test]
fn failing_declaration_is_skipped_with_a_diagnostic() {
    let mut b = ProgramBuilder::new("App");
    b.top_level_code(Stmt::brace(vec![expr(Expr::new(
        ExprKind::Unsupported("key paths".to_string()),
        Type::void(),
    ))]));
    let ok = b.function(None, "ok", vec![], Type::void());
    b.set_body(ok, Stmt::brace(vec![]));
    let program = b.finish();

    let module = lower_program(&program, LoweringOptions::default());
    assert!(module.diagnostics.has_errors(), "the unsupported expression must be reported");
    let diagnostic = &module.diagnostics.diagnostics[0];
    assert!(diagnostic.message.contains("key paths"), "{}", diagnostic.message);
    assert!(diagnostic.declaration.is_some());
    assert!(module.text.contains("was not lowered"), "{}", module.text);
    assert!(module.text.contains("function ok("), "later declarations still lower:\n{}", module.text);
}

#[test]
fn prelude_is_emitted_on_request() {
    let mut b = ProgramBuilder::new("App");
    b.nominal(None, "Empty", NominalKind::Class);
    let program = b.finish();

    let options = LoweringOptions { emit_prelude: true, ..LoweringOptions::default() };
    let module = lower_program(&program, options);
    let create = common::position(&module.text, "function _create(");
    let class = common::position(&module.text, "class Empty{");
    assert!(create < class);
}

#[test]
fn second_requirement_gets_a_forwarding_alias() {
    let mut b = ProgramBuilder::new("App");
    let (int_ty, _) = common::swift_int(&mut b);
    let p = b.nominal(None, "P", NominalKind::Protocol);
    let p_f = b.function(Some(p), "f", vec![], int_ty.clone());
    let q = b.nominal(None, "Q", NominalKind::Protocol);
    let q_f = b.function(Some(q), "f", vec![], int_ty.clone());

    let both = b.nominal(None, "S", NominalKind::Class);
    b.conform(both, Type::nominal(p));
    b.conform(both, Type::nominal(q));
    let both_f = b.function(Some(both), "f", vec![], int_ty.clone());
    b.set_body(both_f, Stmt::brace(vec![stmt(StmtKind::Return(Some(int(1, int_ty.clone()))))]));
    b.add_requirement(both_f, p_f);
    b.add_requirement(both_f, q_f);

    let single = b.nominal(None, "Single", NominalKind::Class);
    b.conform(single, Type::nominal(p));
    let single_f = b.function(Some(single), "f", vec![], int_ty.clone());
    b.set_body(single_f, Stmt::brace(vec![stmt(StmtKind::Return(Some(int(2, int_ty))))]));
    b.add_requirement(single_f, p_f);
    let program = b.finish();
    let text = common::lower(&program).text;

    assert!(text.contains("class S implements P, Q{"), "{}", text);
    let body = common::position(&text, &format!("f($info{}){{", both_f));
    let alias = common::position(
        &text,
        &format!("f1($info{}){{\nreturn this.f.apply(this,arguments)\n}}", both_f),
    );
    assert!(body < alias, "{}", text);
    assert_eq!(
        text.matches("apply(this,arguments)").count(),
        1,
        "a single requirement needs no alias:\n{}",
        text
    );
}

fn forward_protocol() -> trellis_core::tree::Program {
    let mut b = ProgramBuilder::new("App");
    let sprite = b.nominal(None, "Sprite", NominalKind::Struct);
    let drawable = b.nominal(None, "Drawable", NominalKind::Protocol);
    b.conform(sprite, Type::nominal(drawable));
    let ext = b.extension(Type::nominal(drawable));
    let describe = b.function(Some(ext), "describe", vec![], Type::void());
    b.set_body(describe, Stmt::brace(vec![]));
    b.finish()
}

#[test]
fn mixin_of_a_later_protocol_is_guarded() {
    let program = forward_protocol();
    let guard = "if(typeof Drawable$implementation != 'undefined') _mixin(Sprite, Drawable$implementation, false)";

    let text = common::lower(&program).text;
    let class = common::position(&text, "class Sprite implements Drawable{");
    let implementation = common::position(&text, "class Drawable$implementation{");
    let link = common::position(&text, guard);
    assert!(class < implementation && implementation < link, "linkage is deferred to the end:\n{}", text);

    let options = LoweringOptions { defer_linkage: false, ..LoweringOptions::default() };
    let module = lower_program(&program, options);
    assert!(module.is_clean(), "{:?}", module.diagnostics.diagnostics);
    let link = common::position(&module.text, guard);
    let interface = common::position(&module.text, "interface Drawable{");
    assert!(
        link < interface,
        "inline linkage runs before the protocol exists, so the guard matters:\n{}",
        module.text
    );
}
