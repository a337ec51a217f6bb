//! file: core/src/tree/mod.rs
//! description: typed program tree consumed by the lowering engine.
//!
//! The tree is produced by an external front end after parsing, name
//! resolution and type checking. Declarations live in a flat arena indexed
//! by `DeclId`; expressions, statements and patterns are owned inline and
//! refer back into the arena for every resolved declaration.

pub mod builder;
pub mod decl;
pub mod expr;
pub mod pattern;
pub mod stmt;
pub mod types;

use serde::{Deserialize, Serialize};

pub use builder::ProgramBuilder;
pub use decl::{
    AccessorKind, Decl, DeclId, DeclKind, EnumElementDecl, ExtensionDecl, Fixity, FunctionDecl,
    FunctionKind, NominalDecl, NominalKind, ParamDecl, PatternBindingDecl, PatternEntry,
    SubscriptDecl, VarDecl, Visibility,
};
pub use expr::{Argument, CastKind, ClosureBody, Expr, ExprKind, Substitution};
pub use pattern::{Pattern, PatternKind};
pub use stmt::{BraceElement, CaseLabel, CatchClause, Condition, Stmt, StmtKind, SwitchCase};
pub use types::{TupleTypeElement, Type};

/// A whole module ready for lowering.
///
/// `decls` holds every declaration reachable from the module, including the
/// library declarations it references (those carry a native module name and
/// are never emitted). `top_level` lists, in source order, the declarations
/// that produce output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    /// Name of the module being lowered, used as the root of qualified keys.
    pub module: String,
    /// Arena of declarations; `decls[i].id == DeclId(i)`.
    #[serde(default)]
    pub decls: Vec<Decl>,
    /// Declarations emitted at module scope, in source order.
    #[serde(default)]
    pub top_level: Vec<DeclId>,
}

impl Program {
    pub fn new(module: impl Into<String>) -> Self {
        Program { module: module.into(), decls: Vec::new(), top_level: Vec::new() }
    }

    /// Load a program tree from its JSON serialization.
    pub fn from_json(raw: &str) -> Result<Program, String> {
        serde_json::from_str(raw).map_err(|e| format!("parse program: {}", e))
    }

    pub fn get_decl(&self, id: DeclId) -> Option<&Decl> {
        self.decls.get(id.index())
    }

    /// Enclosing declaration of `id`, if any.
    pub fn parent_of(&self, id: DeclId) -> Option<&Decl> {
        self.get_decl(id).and_then(|d| d.parent).and_then(|p| self.get_decl(p))
    }

    /// Walk outwards from `id` and return the first enclosing nominal type or
    /// extension, skipping functions and bindings in between.
    pub fn enclosing_type(&self, id: DeclId) -> Option<&Decl> {
        let mut cur = self.parent_of(id);
        while let Some(d) = cur {
            match d.kind {
                DeclKind::Nominal(_) | DeclKind::Extension(_) => return Some(d),
                _ => cur = d.parent.and_then(|p| self.get_decl(p)),
            }
        }
        None
    }

    /// Resolve an extension to the nominal it extends. Nominals resolve to
    /// themselves; anything else resolves to `None`.
    pub fn extended_nominal(&self, id: DeclId) -> Option<&Decl> {
        let d = self.get_decl(id)?;
        match &d.kind {
            DeclKind::Nominal(_) => Some(d),
            DeclKind::Extension(ext) => ext.extended.nominal_decl().and_then(|n| self.get_decl(n)),
            _ => None,
        }
    }

    /// True when the declaration sits directly inside a nominal type or an
    /// extension (as opposed to a function body or module scope).
    pub fn is_type_member(&self, id: DeclId) -> bool {
        matches!(
            self.parent_of(id).map(|p| &p.kind),
            Some(DeclKind::Nominal(_)) | Some(DeclKind::Extension(_))
        )
    }
}
