mod common;

use trellis_core::config::{LoweringOptions, StructuralTypes};
use trellis_core::lower::{Session, lower_program, lower_with};
use trellis_core::reports::{E_TEMPLATE, E_UNSUPPORTED};
use trellis_core::tree::builder::{
    arg, assign, call, constructor, decl_ref, expr, int, member, method, nil, specialized_ref, stmt,
};
use trellis_core::tree::{
    ClosureBody, DeclKind, Expr, ExprKind, FunctionKind, NominalKind, ParamDecl, ProgramBuilder, Stmt, StmtKind,
    Substitution, TupleTypeElement, Type,
};

#[test]
fn library_operator_uses_its_template() {
    let mut b = ProgramBuilder::new("App");
    let (int_ty, plus) = common::swift_int(&mut b);
    let sum = call(
        decl_ref(plus, Type::void()),
        vec![arg(int(1, int_ty.clone())), arg(int(2, int_ty.clone()))],
        int_ty.clone(),
    );
    b.property(None, "total", int_ty, true, Some(sum));
    let program = b.finish();
    let text = common::lower(&program).text;
    assert!(text.contains("const total = (1 + 2)"), "{}", text);
}

#[test]
fn constructor_goes_through_create() {
    let mut b = ProgramBuilder::new("App");
    let (int_ty, _) = common::swift_int(&mut b);
    let class = b.nominal(None, "Box", NominalKind::Class);
    let init = b.initializer(class, vec![(Some("value"), "value", int_ty.clone())]);
    b.set_body(init, Stmt::brace(vec![]));
    let made = call(constructor(Type::nominal(class), init), vec![arg(int(3, int_ty))], Type::nominal(class));
    b.property(None, "box", Type::nominal(class), true, Some(made));
    let program = b.finish();
    let text = common::lower(&program).text;

    assert!(text.contains(&format!("init($info{}, value){{", init)), "{}", text);
    assert!(text.contains("const box = _create(Box, 'init', {}, 3)"), "{}", text);
}

#[test]
fn optional_chain_evaluates_its_base_once() {
    let mut b = ProgramBuilder::new("App");
    let (int_ty, _) = common::swift_int(&mut b);
    let class = b.nominal(None, "Box", NominalKind::Class);
    let (value, _) = b.property(Some(class), "value", int_ty.clone(), false, None);
    let optional_box = Type::Optional(Box::new(Type::nominal(class)));
    let (maybe, _) = b.property(None, "maybe", optional_box.clone(), false, Some(nil(optional_box.clone())));

    let bound = Expr::new(ExprKind::BindOptional(Box::new(decl_ref(maybe, optional_box))), Type::nominal(class));
    let chain = Expr::new(
        ExprKind::OptionalEvaluation(Box::new(member(bound, value, int_ty.clone()))),
        Type::Optional(Box::new(int_ty.clone())),
    );
    b.property(None, "read", Type::Optional(Box::new(int_ty)), true, Some(chain));
    let program = b.finish();
    let text = common::lower(&program).text;

    assert!(text.contains("let maybe = null"), "{}", text);
    assert!(text.contains("(_.tmp0 = maybe) != null"), "{}", text);
    assert!(text.contains("? (_.tmp0.value) : null)"), "{}", text);
    assert_eq!(text.matches("= maybe)").count(), 1, "base read once:\n{}", text);
}

#[test]
fn array_literal_builds_through_the_buffer_initializer() {
    let mut b = ProgramBuilder::new("App");
    let (int_ty, _) = common::swift_int(&mut b);
    let array_ty = Type::Array(Box::new(int_ty.clone()));
    let literal = Expr::new(
        ExprKind::Array(vec![int(1, int_ty.clone()), int(2, int_ty)]),
        array_ty.clone(),
    );
    b.property(None, "xs", array_ty, true, Some(literal));
    let program = b.finish();
    let text = common::lower(&program).text;
    assert!(
        text.contains("const xs = _create(Array, 'initBuffer', {Element: Number}, [1, 2])"),
        "{}",
        text
    );
}

#[test]
fn struct_values_are_copied_on_binding() {
    let mut b = ProgramBuilder::new("App");
    let point = b.nominal(None, "Point", NominalKind::Struct);
    let point_ty = Type::nominal(point);
    let (p, _) = b.property(None, "p", point_ty.clone(), false, None);
    b.property(None, "q", point_ty.clone(), true, Some(decl_ref(p, point_ty)));
    let program = b.finish();
    let text = common::lower(&program).text;
    assert!(text.contains("const q = _cloneStruct(p)"), "{}", text);
}

#[test]
fn value_arguments_and_literal_elements_are_copied() {
    let mut b = ProgramBuilder::new("App");
    let point = b.nominal(None, "Point", NominalKind::Struct);
    let point_ty = Type::nominal(point);
    let array = b.nominal_in("Swift", None, "Array", NominalKind::Struct);
    let element = b.generic_param(array, "Element");
    let append = b.function_in(
        "Swift",
        Some(array),
        "append",
        FunctionKind::Func,
        vec![(None, "newElement", Type::GenericParam { decl: element })],
        Type::void(),
    );
    b.set_mutating(append);

    let (p, _) = b.property(None, "p", point_ty.clone(), false, None);
    let list_ty = Type::Array(Box::new(point_ty.clone()));
    let literal = Expr::new(ExprKind::Array(vec![decl_ref(p, point_ty.clone())]), list_ty.clone());
    let (list, _) = b.property(None, "list", list_ty.clone(), false, Some(literal));
    let keep = b.function(None, "keep", vec![(None, "value", point_ty.clone())], Type::void());
    b.set_body(keep, Stmt::brace(vec![]));
    b.top_level_code(Stmt::brace(vec![
        expr(call(decl_ref(keep, Type::void()), vec![arg(decl_ref(p, point_ty.clone()))], Type::void())),
        expr(call(method(decl_ref(list, list_ty), append), vec![arg(decl_ref(p, point_ty))], Type::void())),
    ]));
    let program = b.finish();
    let text = common::lower(&program).text;

    assert!(
        text.contains("let list = _create(Array, 'initBuffer', {Element: Point}, [_cloneStruct(p)])"),
        "{}",
        text
    );
    assert!(text.contains("keep({}, _cloneStruct(p))"), "{}", text);
    assert!(text.contains("list.push(_cloneStruct(p))"), "{}", text);
}

#[test]
fn class_instances_are_shared() {
    let mut b = ProgramBuilder::new("App");
    let node = b.nominal(None, "Node", NominalKind::Class);
    let node_ty = Type::nominal(node);
    let (a, _) = b.property(None, "a", node_ty.clone(), false, None);
    let (shared, _) = b.property(None, "shared", node_ty.clone(), true, Some(decl_ref(a, node_ty.clone())));
    let take = b.function(None, "take", vec![(None, "value", node_ty.clone())], Type::void());
    b.set_body(take, Stmt::brace(vec![]));
    b.top_level_code(Stmt::brace(vec![
        expr(assign(decl_ref(a, node_ty.clone()), decl_ref(shared, node_ty.clone()))),
        expr(call(decl_ref(take, Type::void()), vec![arg(decl_ref(a, node_ty))], Type::void())),
    ]));
    let program = b.finish();
    let text = common::lower(&program).text;

    assert!(text.contains("const shared = a"), "{}", text);
    assert!(text.contains("a = shared;"), "{}", text);
    assert!(text.contains("take({}, a)"), "{}", text);
    assert!(!text.contains("_cloneStruct"), "reference types are never copied:\n{}", text);
}

#[test]
fn inout_arguments_pass_an_accessor_pair() {
    let mut b = ProgramBuilder::new("App");
    let point = b.nominal(None, "Point", NominalKind::Struct);
    let point_ty = Type::nominal(point);
    let shift = b.function(None, "shift", vec![(None, "target", point_ty.clone())], Type::void());
    let target = b.param_of(shift, 0).expect("parameter");
    b.set_inout(target);
    b.set_body(shift, Stmt::brace(vec![]));
    let (origin, _) = b.property(None, "origin", point_ty.clone(), false, None);
    let inout = Expr::new(
        ExprKind::InOut(Box::new(decl_ref(origin, point_ty.clone()))),
        Type::InOut(Box::new(point_ty)),
    );
    b.top_level_code(Stmt::brace(vec![expr(call(decl_ref(shift, Type::void()), vec![arg(inout)], Type::void()))]));
    let program = b.finish();
    let text = common::lower(&program).text;

    assert!(text.contains(&format!("function shift($info{}, target$inout){{", shift)), "{}", text);
    assert!(
        text.contains("shift({}, {get: () => origin, set: $val => origin = _cloneStruct($val)})"),
        "{}",
        text
    );
}

#[test]
fn closures_take_the_info_parameter_first() {
    let mut b = ProgramBuilder::new("App");
    let (int_ty, plus) = common::swift_int(&mut b);
    let n = b.insert(
        "App",
        None,
        "n",
        DeclKind::Param(ParamDecl {
            label: None,
            ty: int_ty.clone(),
            is_inout: false,
            is_variadic: false,
            is_autoclosure: false,
            default: None,
        }),
    );
    let sum = call(
        decl_ref(plus, Type::void()),
        vec![arg(decl_ref(n, int_ty.clone())), arg(decl_ref(n, int_ty.clone()))],
        int_ty.clone(),
    );
    let unary = Type::Function { params: vec![int_ty.clone()], result: Box::new(int_ty.clone()), throws: false };
    let closure = Expr::new(ExprKind::Closure { params: vec![n], body: ClosureBody::Expr(Box::new(sum)) }, unary.clone());
    let (twice, _) = b.property(None, "twice", unary.clone(), true, Some(closure));
    let applied = call(decl_ref(twice, unary), vec![arg(int(21, int_ty.clone()))], int_ty.clone());
    b.property(None, "answer", int_ty.clone(), true, Some(applied));

    let nullary = Type::Function { params: vec![], result: Box::new(int_ty.clone()), throws: false };
    let block = ClosureBody::Block(Box::new(Stmt::brace(vec![stmt(StmtKind::Return(Some(int(1, int_ty))))])));
    b.property(None, "one", nullary.clone(), true, Some(Expr::new(ExprKind::Closure { params: vec![], body: block }, nullary)));
    let program = b.finish();
    let text = common::lower(&program).text;

    assert!(text.contains("const twice = (($info, n) => (n + n))"), "{}", text);
    assert!(text.contains("const answer = twice(null, 21)"), "{}", text);
    assert!(text.contains("const one = (($info) => {\nreturn 1;\n})"), "{}", text);
}

#[test]
fn three_level_chain_tests_every_link_once() {
    let mut b = ProgramBuilder::new("App");
    let (int_ty, _) = common::swift_int(&mut b);
    let node = b.nominal(None, "Node", NominalKind::Class);
    let node_ty = Type::nominal(node);
    let optional_node = Type::Optional(Box::new(node_ty.clone()));
    let (successor, _) = b.property(Some(node), "successor", optional_node.clone(), false, None);
    let (value, _) = b.property(Some(node), "value", int_ty.clone(), false, None);
    let (head, _) = b.property(None, "head", optional_node.clone(), false, None);

    let unwrap = |e: Expr| Expr::new(ExprKind::BindOptional(Box::new(e)), node_ty.clone());
    let first = member(unwrap(decl_ref(head, optional_node.clone())), successor, optional_node.clone());
    let second = member(unwrap(first), successor, optional_node.clone());
    let leaf = member(unwrap(second), value, int_ty.clone());
    let optional_int = Type::Optional(Box::new(int_ty));
    let chain = Expr::new(ExprKind::OptionalEvaluation(Box::new(leaf)), optional_int.clone());
    b.property(None, "deep", optional_int, true, Some(chain));
    let program = b.finish();
    let text = common::lower(&program).text;

    assert!(
        text.contains(
            "const deep = ((((_.tmp0 = head) != null) && ((_.tmp1 = _.tmp0.successor) != null) && ((_.tmp2 = _.tmp1.successor) != null)) ? (_.tmp2.value) : null)"
        ),
        "{}",
        text
    );
    assert_eq!(text.matches("= head)").count(), 1, "base read once:\n{}", text);
}

#[test]
fn super_properties_use_explicit_accessors() {
    let mut b = ProgramBuilder::new("App");
    let (int_ty, _) = common::swift_int(&mut b);
    let base = b.nominal(None, "Base", NominalKind::Class);
    let (value, _) = b.property(Some(base), "value", int_ty.clone(), false, Some(int(0, int_ty.clone())));
    let derived = b.nominal(None, "Derived", NominalKind::Class);
    b.set_superclass(derived, Type::nominal(base));
    let sink = b.function(None, "sink", vec![(None, "v", int_ty.clone())], Type::void());
    b.set_body(sink, Stmt::brace(vec![]));

    let restart = b.function(Some(derived), "restart", vec![], Type::void());
    let parent = || Expr::new(ExprKind::SuperRef, Type::nominal(base));
    b.set_body(
        restart,
        Stmt::brace(vec![
            expr(assign(member(parent(), value, int_ty.clone()), int(1, int_ty.clone()))),
            expr(call(
                decl_ref(sink, Type::void()),
                vec![arg(member(parent(), value, int_ty.clone()))],
                Type::void(),
            )),
        ]),
    );
    let program = b.finish();
    let text = common::lower(&program).text;

    assert!(text.contains("class Derived extends Base{"), "{}", text);
    assert!(text.contains("super.value$set(1);"), "{}", text);
    assert!(text.contains("sink({}, super.value$get());"), "{}", text);
}

fn tuple_specialization() -> (trellis_core::tree::Program, trellis_core::tree::DeclId) {
    let mut b = ProgramBuilder::new("App");
    let (int_ty, _) = common::swift_int(&mut b);
    let empty = b.function(None, "empty", vec![], Type::void());
    let t = b.generic_param(empty, "T");
    b.set_body(empty, Stmt::brace(vec![]));
    let pair = Type::Tuple(vec![
        TupleTypeElement { label: None, ty: int_ty.clone() },
        TupleTypeElement { label: None, ty: int_ty },
    ]);
    let callee = specialized_ref(empty, vec![Substitution { param: t, ty: pair }], Type::void());
    b.top_level_code(Stmt::brace(vec![expr(call(callee, vec![], Type::void()))]));
    (b.finish(), empty)
}

#[test]
fn structural_types_are_rejected_by_default() {
    let (program, empty) = tuple_specialization();
    let module = lower_program(&program, LoweringOptions::default());

    assert!(module.diagnostics.has_errors());
    let diagnostic = &module.diagnostics.diagnostics[0];
    assert_eq!(diagnostic.code, Some(E_UNSUPPORTED));
    assert!(diagnostic.message.contains("structural type `(Int, Int)`"), "{}", diagnostic.message);
    assert!(
        module.text.contains(&format!("function empty<T>($info{}){{", empty)),
        "the generic function itself still lowers:\n{}",
        module.text
    );

    let options = LoweringOptions { structural_types: StructuralTypes::Typescript, ..LoweringOptions::default() };
    let module = lower_program(&program, options);
    assert!(module.is_clean(), "{:?}", module.diagnostics.diagnostics);
    assert!(module.text.contains("empty({T: [Number, Number]})"), "{}", module.text);
}

#[test]
fn broken_library_template_is_a_lowering_error() {
    let mut b = ProgramBuilder::new("App");
    let (int_ty, _) = common::swift_int(&mut b);
    let twice = b.function_in(
        "Swift",
        None,
        "twice",
        FunctionKind::Func,
        vec![(None, "value", int_ty.clone())],
        int_ty.clone(),
    );
    b.top_level_code(Stmt::brace(vec![expr(call(
        decl_ref(twice, Type::void()),
        vec![arg(int(2, int_ty.clone()))],
        int_ty,
    ))]));
    let program = b.finish();

    let mut s = Session::new(&program, LoweringOptions::default());
    let key = s.key(twice);
    assert!(s.library.insert(&key, "#Q").is_err(), "a misspelled placeholder does not parse");
    s.library.insert(&key, "(#A0 + #A1)").expect("template parses");
    let module = lower_with(&mut s);

    assert!(module.diagnostics.has_errors());
    let diagnostic = &module.diagnostics.diagnostics[0];
    assert_eq!(diagnostic.code, Some(E_TEMPLATE));
    assert!(diagnostic.message.contains("#A1"), "{}", diagnostic.message);
    assert!(module.text.contains("was not lowered"), "{}", module.text);
}
