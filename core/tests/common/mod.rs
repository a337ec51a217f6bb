#![allow(dead_code)]

use trellis_core::config::LoweringOptions;
use trellis_core::lower::{LoweredModule, lower_program};
use trellis_core::tree::{Fixity, NominalKind, Program, ProgramBuilder, Type};

/// Declare the library `Int` and its `+` operator. Returns `(Int, +)`.
pub fn swift_int(b: &mut ProgramBuilder) -> (Type, trellis_core::tree::DeclId) {
    let int_decl = b.nominal_in("Swift", None, "Int", NominalKind::Struct);
    let int = Type::nominal(int_decl);
    let plus = b.operator(
        Some(int_decl),
        "+",
        Fixity::Infix,
        vec![(None, "lhs", int.clone()), (None, "rhs", int.clone())],
        int.clone(),
    );
    (int, plus)
}

pub fn lower(program: &Program) -> LoweredModule {
    let module = lower_program(program, LoweringOptions::default());
    assert!(
        module.is_clean(),
        "unexpected diagnostics: {:?}\noutput:\n{}",
        module.diagnostics.diagnostics,
        module.text
    );
    module
}

/// Byte offset of `needle`, failing the test with the whole text.
pub fn position(text: &str, needle: &str) -> usize {
    match text.find(needle) {
        Some(at) => at,
        None => panic!("`{}` not found in:\n{}", needle, text),
    }
}
