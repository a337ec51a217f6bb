//! Arena integrity checks.
//!
//! Every id a declaration stores must name a declaration of the arena,
//! and `decls[i]` must carry `DeclId(i)`. Lowering trusts both, so they
//! are checked once up front.

use crate::error::Level;
use crate::tree::{Decl, DeclId, DeclKind, Program};

use super::err::TreeError;

/// Ids a declaration refers to, paired with what the reference is.
fn references(decl: &Decl) -> Vec<(&'static str, DeclId)> {
    let mut out: Vec<(&'static str, DeclId)> = Vec::new();
    out.extend(decl.parent.map(|p| ("parent", p)));
    out.extend(decl.overridden.map(|o| ("overridden member", o)));
    out.extend(decl.requirements.iter().map(|r| ("requirement", *r)));
    match &decl.kind {
        DeclKind::Nominal(n) => {
            out.extend(n.members.iter().map(|m| ("member", *m)));
            out.extend(n.generic_params.iter().map(|g| ("generic parameter", *g)));
            out.extend(n.superclass.iter().filter_map(|t| t.nominal_decl()).map(|s| ("superclass", s)));
            out.extend(n.protocols.iter().filter_map(|t| t.nominal_decl()).map(|p| ("protocol", p)));
        }
        DeclKind::Extension(e) => {
            out.extend(e.members.iter().map(|m| ("member", *m)));
            out.extend(e.extended.nominal_decl().map(|n| ("extended type", n)));
            out.extend(e.protocols.iter().filter_map(|t| t.nominal_decl()).map(|p| ("protocol", p)));
        }
        DeclKind::Function(f) => {
            out.extend(f.params.iter().map(|p| ("parameter", *p)));
            out.extend(f.generic_params.iter().map(|g| ("generic parameter", *g)));
            if let crate::tree::FunctionKind::Accessor { storage, .. } = f.kind {
                out.push(("accessor storage", storage));
            }
        }
        DeclKind::Var(v) => out.extend(v.accessors.iter().map(|a| ("accessor", *a))),
        DeclKind::Subscript(s) => {
            out.extend(s.params.iter().map(|p| ("parameter", *p)));
            out.extend(s.accessors.iter().map(|a| ("accessor", *a)));
        }
        DeclKind::EnumElement(e) => out.extend(e.payload.iter().map(|p| ("payload parameter", *p))),
        DeclKind::PatternBinding(pb) => {
            for entry in &pb.entries {
                out.extend(entry.pattern.bound_vars().into_iter().map(|v| ("bound variable", v)));
            }
        }
        DeclKind::TypeAlias { .. }
        | DeclKind::AssociatedType
        | DeclKind::GenericParam
        | DeclKind::TopLevelCode { .. }
        | DeclKind::Param(_)
        | DeclKind::Destructor => {}
    }
    out
}

pub fn analyze_integrity_rules(program: &Program) -> Result<(), Vec<TreeError>> {
    let issuer = "trellis.analyzers.integrity";
    let mut errors = Vec::new();

    for (index, decl) in program.decls.iter().enumerate() {
        if decl.id.index() != index {
            errors.push(TreeError::with(
                Level::Error,
                format!("declaration `{}` at arena slot {} carries id {}", decl.name, index, decl.id),
                issuer,
                decl.location.clone(),
                decl.span.clone(),
            ));
        }
        for (what, id) in references(decl) {
            if program.get_decl(id).is_none() {
                errors.push(TreeError::with(
                    Level::Error,
                    format!("{} {} of `{}` is not in the program", what, id, decl.name),
                    issuer,
                    decl.location.clone(),
                    decl.span.clone(),
                ));
            }
        }
    }
    for id in &program.top_level {
        if program.get_decl(*id).is_none() {
            errors.push(TreeError::with(
                Level::Error,
                format!("top-level declaration {} is not in the program", id),
                issuer,
                None,
                None,
            ));
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
