use trellis_core::analyzers::{analyze_acyclic_rules, analyze_integrity_rules, analyze_tree};
use trellis_core::config::LoweringOptions;
use trellis_core::lower::lower_program;
use trellis_core::reports::E_TREE;
use trellis_core::tree::{DeclId, NominalKind, ProgramBuilder, Type};
use trellis_core::TrellisErrorExt;

#[test]
fn well_formed_tree_passes() {
    let mut b = ProgramBuilder::new("App");
    let base = b.nominal(None, "Base", NominalKind::Class);
    let derived = b.nominal(None, "Derived", NominalKind::Class);
    b.set_superclass(derived, Type::nominal(base));
    let program = b.finish();
    assert!(analyze_tree(&program).is_ok());
}

#[test]
fn dangling_member_is_reported() {
    let mut b = ProgramBuilder::new("App");
    let holder = b.nominal(None, "Holder", NominalKind::Struct);
    let f = b.function(Some(holder), "f", vec![], Type::void());
    b.set_overridden(f, DeclId(404));
    let program = b.finish();

    let errors = analyze_integrity_rules(&program).expect_err("dangling override must fail");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message().contains("404"), "{}", errors[0].message());
}

#[test]
fn superclass_cycle_is_reported_once() {
    let mut b = ProgramBuilder::new("App");
    let a = b.nominal(None, "A", NominalKind::Class);
    let c = b.nominal(None, "C", NominalKind::Class);
    b.set_superclass(a, Type::nominal(c));
    b.set_superclass(c, Type::nominal(a));
    let program = b.finish();

    let errors = analyze_acyclic_rules(&program).expect_err("cycle must fail");
    assert_eq!(errors.len(), 1, "one cycle, one error");
    let message = errors[0].message();
    assert!(message.contains("inheritance"), "{}", message);
    assert!(message.contains("A -> C -> A"), "{}", message);
}

#[test]
fn rejected_tree_produces_no_text() {
    let mut b = ProgramBuilder::new("App");
    b.nominal(None, "Fine", NominalKind::Class);
    let mut program = b.finish();
    program.top_level.push(DeclId(77));

    let module = lower_program(&program, LoweringOptions::default());
    assert!(module.text.is_empty(), "nothing is emitted for a broken tree:\n{}", module.text);
    assert!(module.diagnostics.has_errors());
    assert!(module.diagnostics.iter().all(|d| d.code == Some(E_TREE)));
}
