//! file: core/src/tree/stmt.rs
//! description: statement nodes.

use serde::{Deserialize, Serialize};

use crate::location::Location;

use super::decl::DeclId;
use super::expr::Expr;
use super::pattern::Pattern;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BraceElement {
    Stmt(Stmt),
    Expr(Expr),
    /// Local declaration (binding, function, nested type).
    Decl(DeclId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Boolean(Expr),
    /// `let x = optional`; a pattern with no names only tests for a value.
    OptionalBinding { pattern: Pattern, init: Expr },
    /// `case <pattern> = value`.
    PatternMatch { pattern: Pattern, init: Expr },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseLabel {
    pub pattern: Pattern,
    #[serde(default)]
    pub guard_expr: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    pub labels: Vec<CaseLabel>,
    pub body: Stmt,
}

impl SwitchCase {
    /// A case falls through when its body ends in `fallthrough`.
    pub fn falls_through(&self) -> bool {
        match &self.body.kind {
            StmtKind::Brace(elements) => matches!(
                elements.last(),
                Some(BraceElement::Stmt(Stmt { kind: StmtKind::Fallthrough, .. }))
            ),
            StmtKind::Fallthrough => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    pub pattern: Pattern,
    #[serde(default)]
    pub guard_expr: Option<Expr>,
    pub body: Stmt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    Brace(Vec<BraceElement>),
    Return(Option<Expr>),
    Throw(Expr),
    /// `break`; `true` when it leaves a `switch` rather than a loop.
    Break {
        #[serde(default)]
        from_switch: bool,
    },
    Continue,
    Fallthrough,
    Fail,
    Defer(Box<Stmt>),
    If {
        conditions: Vec<Condition>,
        then: Box<Stmt>,
        #[serde(default)]
        otherwise: Option<Box<Stmt>>,
    },
    Guard { conditions: Vec<Condition>, body: Box<Stmt> },
    While { conditions: Vec<Condition>, body: Box<Stmt> },
    RepeatWhile { body: Box<Stmt>, cond: Expr },
    /// `for pattern in sequence where ... { body }`. `make_iterator` and
    /// `next` are the witnesses the type checker picked for the sequence.
    ForEach {
        pattern: Pattern,
        sequence: Expr,
        make_iterator: DeclId,
        next: DeclId,
        #[serde(default)]
        where_expr: Option<Expr>,
        body: Box<Stmt>,
    },
    Switch { subject: Expr, cases: Vec<SwitchCase> },
    DoCatch { body: Box<Stmt>, catches: Vec<CatchClause> },
    Do(Box<Stmt>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    #[serde(default)]
    pub location: Option<Location>,
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Stmt { kind, location: None }
    }

    pub fn brace(elements: Vec<BraceElement>) -> Self {
        Stmt::new(StmtKind::Brace(elements))
    }

    pub fn get_kind(&self) -> &StmtKind {
        &self.kind
    }
}
