mod common;

use trellis_core::config::LoweringOptions;
use trellis_core::lower::{Session, lower_program};
use trellis_core::reports::E_NAMING;
use trellis_core::tree::builder::int;
use trellis_core::tree::{FunctionKind, NominalKind, ProgramBuilder, Stmt, Type};
use trellis_core::{Level, Location};

#[test]
fn overrides_share_the_overridden_name() {
    let mut b = ProgramBuilder::new("App");
    let (int_ty, _) = common::swift_int(&mut b);
    let base = b.nominal(None, "Base", NominalKind::Class);
    let derived = b.nominal(None, "Derived", NominalKind::Class);
    b.set_superclass(derived, Type::nominal(base));

    let run = b.function(None, "step", vec![], Type::void());
    let base_step = b.function(Some(base), "step", vec![(None, "n", int_ty.clone())], Type::void());
    let derived_step = b.function(Some(derived), "step", vec![(None, "n", int_ty)], Type::void());
    b.set_overridden(derived_step, base_step);
    let program = b.finish();

    let mut s = Session::new(&program, LoweringOptions::default());
    let first = s.name(run).expect("name");
    let base_name = s.name(base_step).expect("name");
    let derived_name = s.name(derived_step).expect("name");
    assert_eq!(first, "step");
    assert_eq!(base_name, "step1", "a second `step` in the module gets the next ordinal");
    assert_eq!(derived_name, base_name, "an override answers to the name it overrides");
    assert_eq!(s.name(base_step).expect("name"), base_name, "names are stable");
}

#[test]
fn reserved_words_are_escaped_in_output() {
    let mut b = ProgramBuilder::new("App");
    let f = b.function(None, "delete", vec![], Type::void());
    b.set_body(f, Stmt::brace(vec![]));
    let program = b.finish();
    let text = common::lower(&program).text;
    assert!(text.contains(&format!("function _delete($info{}){{", f)), "{}", text);
}

#[test]
fn library_members_skip_underscore_labels() {
    let mut b = ProgramBuilder::new("App");
    let (int_ty, _) = common::swift_int(&mut b);
    let array = b.nominal_in("Swift", None, "Array", NominalKind::Struct);
    let insert = b.function_in(
        "Swift",
        Some(array),
        "insert",
        FunctionKind::Func,
        vec![(Some("_"), "value", int_ty.clone()), (Some("at"), "index", int_ty)],
        Type::void(),
    );
    let program = b.finish();

    let mut s = Session::new(&program, LoweringOptions::default());
    assert_eq!(s.name(insert).expect("name"), "insertAt");
}

#[test]
fn same_name_in_one_scope_is_a_collision() {
    let mut b = ProgramBuilder::new("App");
    let (int_ty, _) = common::swift_int(&mut b);
    let (first, _) = b.property(None, "count", int_ty.clone(), false, Some(int(1, int_ty.clone())));
    b.set_location(first, Location::new("main.swift", 1, 5));
    let (second, _) = b.property(None, "count", int_ty.clone(), false, Some(int(2, int_ty)));
    b.set_location(second, Location::new("main.swift", 2, 5));
    let program = b.finish();

    let module = lower_program(&program, LoweringOptions::default());
    let collision = module
        .diagnostics
        .diagnostics
        .iter()
        .find(|d| d.code == Some(E_NAMING))
        .expect("collision reported");
    assert_eq!(collision.level, Level::Critical);
    assert!(collision.message.contains("count"), "{}", collision.message);
    assert!(module.text.contains("let count = 1"), "{}", module.text);
}
