//! file: core/src/tree/pattern.rs
//! description: typed patterns used by bindings, `switch`, `catch` and
//! `for`-`in`.

use serde::{Deserialize, Serialize};

use super::decl::DeclId;
use super::expr::Expr;
use super::types::Type;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PatternKind {
    /// Binds the matched value to the variable `DeclId`.
    Named(DeclId),
    Any,
    Tuple(Vec<Pattern>),
    Paren(Box<Pattern>),
    Typed(Box<Pattern>, Type),
    Var(Box<Pattern>),
    OptionalSome(Box<Pattern>),
    EnumElement {
        ty: Type,
        element: DeclId,
        #[serde(default)]
        payload: Option<Box<Pattern>>,
    },
    Is {
        ty: Type,
        #[serde(default)]
        sub: Option<Box<Pattern>>,
    },
    /// Expression pattern. `match_expr` is the resolved `~=` call and
    /// refers to the matched value through the synthesized `match_var`.
    Expr { match_expr: Box<Expr>, match_var: DeclId },
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub kind: PatternKind,
}

impl Pattern {
    pub fn new(kind: PatternKind) -> Self {
        Pattern { kind }
    }

    pub fn named(decl: DeclId) -> Self {
        Pattern::new(PatternKind::Named(decl))
    }

    pub fn any() -> Self {
        Pattern::new(PatternKind::Any)
    }

    pub fn tuple(elements: Vec<Pattern>) -> Self {
        Pattern::new(PatternKind::Tuple(elements))
    }

    /// Variables bound anywhere inside the pattern, in source order.
    pub fn bound_vars(&self) -> Vec<DeclId> {
        let mut out = Vec::new();
        self.collect_vars(&mut out);
        out
    }

    fn collect_vars(&self, out: &mut Vec<DeclId>) {
        match &self.kind {
            PatternKind::Named(id) => out.push(*id),
            PatternKind::Tuple(elements) => elements.iter().for_each(|e| e.collect_vars(out)),
            PatternKind::Paren(p) | PatternKind::Typed(p, _) | PatternKind::Var(p) | PatternKind::OptionalSome(p) => {
                p.collect_vars(out)
            }
            PatternKind::EnumElement { payload: Some(p), .. } | PatternKind::Is { sub: Some(p), .. } => {
                p.collect_vars(out)
            }
            _ => {}
        }
    }
}
