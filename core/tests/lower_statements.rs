mod common;

use trellis_core::tree::builder::{arg, boolean, call, decl_ref, expr, int, nil, stmt};
use trellis_core::tree::{
    CaseLabel, CatchClause, Condition, DeclId, FunctionKind, NominalKind, Pattern, PatternKind, ProgramBuilder,
    Stmt, StmtKind, SwitchCase, Type,
};

/// Declare `name()` at module scope with an empty body.
fn noop(b: &mut ProgramBuilder, name: &str) -> DeclId {
    let f = b.function(None, name, vec![], Type::void());
    b.set_body(f, Stmt::brace(vec![]));
    f
}

fn call_stmt(f: DeclId) -> trellis_core::tree::BraceElement {
    expr(call(decl_ref(f, Type::void()), vec![], Type::void()))
}

#[test]
fn defers_run_in_reverse_order() {
    let mut b = ProgramBuilder::new("App");
    let first = noop(&mut b, "first");
    let second = noop(&mut b, "second");
    let work = noop(&mut b, "work");
    let f = b.function(None, "run", vec![], Type::void());
    b.set_body(
        f,
        Stmt::brace(vec![
            stmt(StmtKind::Defer(Box::new(Stmt::brace(vec![call_stmt(first)])))),
            stmt(StmtKind::Defer(Box::new(Stmt::brace(vec![call_stmt(second)])))),
            call_stmt(work),
        ]),
    );
    let program = b.finish();
    let text = common::lower(&program).text;

    let body = common::position(&text, "work({})");
    let inner = common::position(&text, "}finally{$defer1()}");
    let outer = common::position(&text, "}finally{$defer0()}");
    assert!(body < inner && inner < outer, "second defer must run first:\n{}", text);
}

#[test]
fn defer_runs_when_the_block_returns_early() {
    let mut b = ProgramBuilder::new("App");
    let (int_ty, _) = common::swift_int(&mut b);
    let cleanup = noop(&mut b, "cleanup");
    let f = b.function(None, "run", vec![], int_ty.clone());
    b.set_body(
        f,
        Stmt::brace(vec![
            stmt(StmtKind::Defer(Box::new(Stmt::brace(vec![call_stmt(cleanup)])))),
            stmt(StmtKind::Return(Some(int(1, int_ty)))),
        ]),
    );
    let program = b.finish();
    let text = common::lower(&program).text;

    assert!(text.contains("let $defer0 = () => {\ncleanup({});\n}\ntry {"), "{}", text);
    assert!(
        text.contains("try {;\nreturn 1;}finally{$defer0()}"),
        "the return must stay inside the guarded region:\n{}",
        text
    );
    assert!(!text.contains("catch($error)"), "{}", text);
}

#[test]
fn fallthrough_chains_share_one_outer_test() {
    let mut b = ProgramBuilder::new("App");
    let bool_ty = Type::nominal(b.nominal_in("Swift", None, "Bool", NominalKind::Struct));
    let first = noop(&mut b, "first");
    let second = noop(&mut b, "second");
    let third = noop(&mut b, "third");
    let case = |pattern: Pattern, body: Vec<trellis_core::tree::BraceElement>| SwitchCase {
        labels: vec![CaseLabel { pattern, guard_expr: None }],
        body: Stmt::brace(body),
    };
    let switch = StmtKind::Switch {
        subject: boolean(true, bool_ty),
        cases: vec![
            case(Pattern::new(PatternKind::Bool(true)), vec![call_stmt(first), stmt(StmtKind::Fallthrough)]),
            case(Pattern::new(PatternKind::Bool(false)), vec![call_stmt(second), stmt(StmtKind::Fallthrough)]),
            case(Pattern::any(), vec![call_stmt(third)]),
        ],
    };
    b.top_level_code(Stmt::brace(vec![stmt(switch)]));
    let program = b.finish();
    let text = common::lower(&program).text;

    assert!(text.contains("$switch0: {\nconst $match = true"), "{}", text);
    let outer = common::position(&text, "if((($match == true)) || (($match == false)) || ((true))) {");
    let first_test = common::position(&text, "if((($match == true))) {");
    let first_at = common::position(&text, "first({})");
    let second_test = common::position(&text, "if((($match == true)) || (($match == false))) {");
    let second_at = common::position(&text, "second({})");
    let third_at = common::position(&text, "third({})");
    assert!(outer < first_test && first_test < first_at, "{}", text);
    assert!(first_at < second_test && second_test < second_at, "{}", text);
    assert!(second_at < third_at, "a match on any case reaches the last body:\n{}", text);
    assert!(
        text[second_at..third_at].contains("\n}"),
        "the last body sits outside the nested tests:\n{}",
        text
    );
    assert!(!text.contains("else if"), "one chain, no else branch:\n{}", text);
}

#[test]
fn guard_bindings_stay_in_scope() {
    let mut b = ProgramBuilder::new("App");
    let (int_ty, _) = common::swift_int(&mut b);
    let opt = Type::Optional(Box::new(int_ty.clone()));
    let source = b.function(None, "source", vec![], opt.clone());
    b.set_body(source, Stmt::brace(vec![stmt(StmtKind::Return(Some(nil(opt.clone()))))]));
    let sink = b.function(None, "sink", vec![(None, "value", int_ty.clone())], Type::void());
    b.set_body(sink, Stmt::brace(vec![]));

    let f = b.function(None, "check", vec![], Type::void());
    let value = b.var(Some(f), "value", int_ty.clone(), true);
    let guard = StmtKind::Guard {
        conditions: vec![Condition::OptionalBinding {
            pattern: Pattern::named(value),
            init: call(decl_ref(source, Type::void()), vec![], opt),
        }],
        body: Box::new(Stmt::brace(vec![stmt(StmtKind::Return(None))])),
    };
    b.set_body(
        f,
        Stmt::brace(vec![
            stmt(guard),
            expr(call(decl_ref(sink, Type::void()), vec![arg(decl_ref(value, int_ty.clone()))], Type::void())),
        ]),
    );
    let program = b.finish();
    let text = common::lower(&program).text;

    let binding = common::position(&text, "const value = source({})");
    let test = common::position(&text, "if(!((value != null))) {");
    let usage = common::position(&text, "sink({}, value)");
    assert!(binding < test && test < usage, "{}", text);
}

#[test]
fn catch_clauses_test_the_thrown_value() {
    let mut b = ProgramBuilder::new("App");
    let parse_error = b.nominal(None, "ParseError", NominalKind::Class);
    let work = noop(&mut b, "work");
    let handle = noop(&mut b, "handle");
    let f = b.function(None, "attempt", vec![], Type::void());
    let clause = CatchClause {
        pattern: Pattern::new(PatternKind::Is { ty: Type::nominal(parse_error), sub: None }),
        guard_expr: None,
        body: Stmt::brace(vec![call_stmt(handle)]),
    };
    b.set_body(
        f,
        Stmt::brace(vec![stmt(StmtKind::DoCatch {
            body: Box::new(Stmt::brace(vec![call_stmt(work)])),
            catches: vec![clause],
        })]),
    );
    let program = b.finish();
    let text = common::lower(&program).text;

    assert!(text.contains("try {\nwork({});\n} catch(error) {"), "{}", text);
    assert!(
        text.contains("if((error instanceof ParseError)) {\nhandle({});\n}\nelse throw error\n}"),
        "unmatched errors are rethrown:\n{}",
        text
    );
}

#[test]
fn for_in_drives_the_sequence_iterator() {
    let mut b = ProgramBuilder::new("App");
    let (int_ty, _) = common::swift_int(&mut b);
    let array = b.nominal_in("Swift", None, "Array", NominalKind::Struct);
    let make_iterator = b.function_in("Swift", Some(array), "makeIterator", FunctionKind::Func, vec![], Type::void());
    let iterator_protocol = b.nominal_in("Swift", None, "IteratorProtocol", NominalKind::Protocol);
    let next = b.function_in("Swift", Some(iterator_protocol), "next", FunctionKind::Func, vec![], Type::void());

    let array_ty = Type::Array(Box::new(int_ty.clone()));
    let (xs, _) = b.property(None, "xs", array_ty.clone(), false, None);
    let consume = b.function(None, "consume", vec![(None, "value", int_ty.clone())], Type::void());
    b.set_body(consume, Stmt::brace(vec![]));

    let item = b.var(None, "item", int_ty.clone(), true);
    let body = Stmt::brace(vec![expr(call(
        decl_ref(consume, Type::void()),
        vec![arg(decl_ref(item, int_ty))],
        Type::void(),
    ))]);
    let each = StmtKind::ForEach {
        pattern: Pattern::named(item),
        sequence: decl_ref(xs, array_ty),
        make_iterator,
        next,
        where_expr: None,
        body: Box::new(body),
    };
    b.top_level_code(Stmt::brace(vec![stmt(each)]));
    let program = b.finish();
    let text = common::lower(&program).text;

    let make = common::position(
        &text,
        "const $iterator0 = (($seq) => new SwiftIterator((current) => $seq[current]))(xs)",
    );
    let step = common::position(&text, "const item = $iterator0.next();\nif(!((item != null))) break;");
    let usage = common::position(&text, "consume({}, item);");
    assert!(make < step && step < usage, "{}", text);
    assert!(text[make..].contains("while(true) {"), "{}", text);
}

#[test]
fn case_conditions_bind_the_subject_once() {
    let mut b = ProgramBuilder::new("App");
    let direction = b.nominal(None, "Direction", NominalKind::Enum);
    let north = b.enum_case(direction, "north", None, vec![]);
    let (heading, _) = b.property(None, "heading", Type::nominal(direction), false, None);
    let go = noop(&mut b, "go");
    let turn = noop(&mut b, "turn");

    let is_north = || Pattern::new(PatternKind::EnumElement { ty: Type::nominal(direction), element: north, payload: None });
    let f = b.function(None, "steer", vec![], Type::void());
    b.set_body(
        f,
        Stmt::brace(vec![
            stmt(StmtKind::If {
                conditions: vec![Condition::PatternMatch {
                    pattern: is_north(),
                    init: decl_ref(heading, Type::nominal(direction)),
                }],
                then: Box::new(Stmt::brace(vec![call_stmt(go)])),
                otherwise: None,
            }),
            stmt(StmtKind::While {
                conditions: vec![Condition::PatternMatch {
                    pattern: is_north(),
                    init: decl_ref(heading, Type::nominal(direction)),
                }],
                body: Box::new(Stmt::brace(vec![call_stmt(turn)])),
            }),
        ]),
    );
    let program = b.finish();
    let text = common::lower(&program).text;

    assert!(
        text.contains(
            "\n{\nconst $case0 = heading\nif(($case0.rawValue == Direction.north.rawValue)) {\ngo({});\n}\n}"
        ),
        "{}",
        text
    );
    assert!(
        text.contains(
            "while(true){\nconst $case1 = heading\nif(!(($case1.rawValue == Direction.north.rawValue))) break;\nturn({});\n}"
        ),
        "the subject is re-read on every iteration:\n{}",
        text
    );
}

#[test]
fn while_let_and_repeat_loops() {
    let mut b = ProgramBuilder::new("App");
    let (int_ty, _) = common::swift_int(&mut b);
    let bool_ty = Type::nominal(b.nominal_in("Swift", None, "Bool", NominalKind::Struct));
    let opt = Type::Optional(Box::new(int_ty.clone()));
    let pull = b.function(None, "pull", vec![], opt.clone());
    b.set_body(pull, Stmt::brace(vec![stmt(StmtKind::Return(Some(nil(opt.clone()))))]));
    let consume = b.function(None, "consume", vec![(None, "value", int_ty.clone())], Type::void());
    b.set_body(consume, Stmt::brace(vec![]));
    let tick = noop(&mut b, "tick");
    let (running, _) = b.property(None, "running", bool_ty.clone(), false, Some(boolean(true, bool_ty.clone())));

    let f = b.function(None, "drain", vec![], Type::void());
    let x = b.var(Some(f), "x", int_ty.clone(), true);
    b.set_body(
        f,
        Stmt::brace(vec![
            stmt(StmtKind::While {
                conditions: vec![Condition::OptionalBinding {
                    pattern: Pattern::named(x),
                    init: call(decl_ref(pull, Type::void()), vec![], opt),
                }],
                body: Box::new(Stmt::brace(vec![expr(call(
                    decl_ref(consume, Type::void()),
                    vec![arg(decl_ref(x, int_ty))],
                    Type::void(),
                ))])),
            }),
            stmt(StmtKind::RepeatWhile {
                body: Box::new(Stmt::brace(vec![call_stmt(tick)])),
                cond: decl_ref(running, bool_ty),
            }),
        ]),
    );
    let program = b.finish();
    let text = common::lower(&program).text;

    assert!(
        text.contains("while(true){\nconst x = pull({})\nif(!((x != null))) break;\nconsume({}, x);\n}"),
        "{}",
        text
    );
    assert!(text.contains("do {\ntick({});\n} while(running)"), "{}", text);
}
