//! file: core/src/tree/expr.rs
//! description: typed expression nodes.
//!
//! Expressions carry their resolved type and refer to declarations by
//! `DeclId`. Calls keep the front end's distinction between free function
//! references, dot-syntax method references and constructor references so
//! lowering can pick the right call shape without re-resolving anything.

use serde::{Deserialize, Serialize};

use crate::location::Location;

use super::decl::DeclId;
use super::stmt::Stmt;
use super::types::Type;

/// Binding of one generic parameter at a specialized reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substitution {
    pub param: DeclId,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Argument {
    Value {
        #[serde(default)]
        label: Option<String>,
        expr: Expr,
    },
    /// Argument omitted at the call site; filled from parameter `index` of
    /// `owner`.
    Default { owner: DeclId, index: usize },
    /// Values collected into a variadic parameter.
    Variadic(Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastKind {
    Coerce,
    Forced,
    Conditional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClosureBody {
    Expr(Box<Expr>),
    Block(Box<Stmt>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    IntegerLiteral(String),
    FloatLiteral(String),
    BooleanLiteral(bool),
    StringLiteral(String),
    NilLiteral,
    /// Segments of an interpolated string, literal and expression alike.
    Interpolation(Vec<Expr>),
    DiscardAssignment,
    DeclRef {
        decl: DeclId,
        #[serde(default)]
        substitutions: Vec<Substitution>,
    },
    /// `self`; assignable inside mutating members and initializers.
    SelfRef,
    SuperRef,
    TypeRef(Type),
    /// Property access `base.member`.
    MemberRef {
        base: Box<Expr>,
        decl: DeclId,
        #[serde(default)]
        substitutions: Vec<Substitution>,
    },
    /// Method reference `base.method`, only valid as a call callee.
    MethodRef {
        base: Box<Expr>,
        decl: DeclId,
        #[serde(default)]
        substitutions: Vec<Substitution>,
    },
    /// Reference to an initializer of `ty`, only valid as a call callee.
    ConstructorRef {
        ty: Type,
        decl: DeclId,
        #[serde(default)]
        substitutions: Vec<Substitution>,
    },
    Subscript {
        base: Box<Expr>,
        decl: DeclId,
        args: Vec<Argument>,
        #[serde(default)]
        substitutions: Vec<Substitution>,
    },
    Tuple(Vec<Expr>),
    Paren(Box<Expr>),
    TupleElement { base: Box<Expr>, index: usize },
    Array(Vec<Expr>),
    Dictionary(Vec<(Expr, Expr)>),
    Call { callee: Box<Expr>, args: Vec<Argument> },
    Assign { dest: Box<Expr>, source: Box<Expr> },
    InOut(Box<Expr>),
    Closure {
        #[serde(default)]
        params: Vec<DeclId>,
        body: ClosureBody,
    },
    AutoClosure(Box<Expr>),
    BindOptional(Box<Expr>),
    OptionalEvaluation(Box<Expr>),
    ForceValue(Box<Expr>),
    OptionalTry(Box<Expr>),
    Try(Box<Expr>),
    ForceTry(Box<Expr>),
    Ternary { cond: Box<Expr>, then: Box<Expr>, otherwise: Box<Expr> },
    TypeCheck { expr: Box<Expr>, ty: Type },
    Cast { expr: Box<Expr>, ty: Type, kind: CastKind },
    /// Implicit conversion inserted by the type checker (load, erasure,
    /// function conversion); lowers to its operand.
    Conversion(Box<Expr>),
    OpenExistential { existential: Box<Expr>, opaque: u32, sub: Box<Expr> },
    OpaqueValue(u32),
    DynamicType(Box<Expr>),
    RebindSelf(Box<Expr>),
    /// A construct the front end kept but that has no lowering rule.
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
    #[serde(default)]
    pub location: Option<Location>,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: Type) -> Self {
        Expr { kind, ty, location: None }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn get_kind(&self) -> &ExprKind {
        &self.kind
    }

    /// Skip parens and implicit conversions.
    pub fn semantics_provider(&self) -> &Expr {
        match &self.kind {
            ExprKind::Paren(inner) | ExprKind::Conversion(inner) => inner.semantics_provider(),
            _ => self,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self.semantics_provider().kind,
            ExprKind::IntegerLiteral(_) | ExprKind::FloatLiteral(_) | ExprKind::BooleanLiteral(_)
        )
    }
}
