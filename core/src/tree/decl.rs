//! file: core/src/tree/decl.rs
//! description: declaration nodes of the typed program tree.
//!
//! Every declaration is stored once in `Program::decls` and addressed by a
//! `DeclId`. Override and protocol-requirement relations are explicit edge
//! lists so the name table can resolve a declaration to its canonical root
//! without re-running any semantic analysis.

use serde::{Deserialize, Serialize};

use crate::location::{Location, Span};

use super::expr::Expr;
use super::pattern::Pattern;
use super::stmt::Stmt;
use super::types::Type;

/// Index of a declaration inside `Program::decls`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeclId(pub usize);

impl DeclId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for DeclId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Visibility {
    Private,
    FilePrivate,
    #[default]
    Internal,
    Public,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decl {
    pub id: DeclId,
    /// Base name as written in source; empty for unnamed declarations.
    pub name: String,
    /// Module the declaration belongs to.
    pub module: String,
    /// Enclosing declaration (type, extension, function or binding).
    #[serde(default)]
    pub parent: Option<DeclId>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub span: Option<Span>,
    /// The member this declaration directly overrides.
    #[serde(default)]
    pub overridden: Option<DeclId>,
    /// Protocol requirements this declaration satisfies, in conformance order.
    #[serde(default)]
    pub requirements: Vec<DeclId>,
    #[serde(default)]
    pub is_static: bool,
    /// Compiler-synthesized (memberwise initializers, implicit accessors).
    #[serde(default)]
    pub is_implicit: bool,
    #[serde(default)]
    pub visibility: Visibility,
    pub kind: DeclKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeclKind {
    Nominal(NominalDecl),
    Extension(ExtensionDecl),
    Function(FunctionDecl),
    Param(ParamDecl),
    Var(VarDecl),
    Subscript(SubscriptDecl),
    EnumElement(EnumElementDecl),
    TypeAlias { underlying: Type },
    AssociatedType,
    GenericParam,
    PatternBinding(PatternBindingDecl),
    TopLevelCode { body: Stmt },
    Destructor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NominalKind {
    Struct,
    Class,
    Enum,
    Protocol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NominalDecl {
    pub kind: NominalKind,
    #[serde(default)]
    pub generic_params: Vec<DeclId>,
    #[serde(default)]
    pub superclass: Option<Type>,
    /// Directly inherited protocols (conformances for concrete types).
    #[serde(default)]
    pub protocols: Vec<Type>,
    #[serde(default)]
    pub members: Vec<DeclId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionDecl {
    pub extended: Type,
    #[serde(default)]
    pub protocols: Vec<Type>,
    #[serde(default)]
    pub members: Vec<DeclId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fixity {
    Prefix,
    Postfix,
    Infix,
}

impl Fixity {
    pub fn tag(self) -> &'static str {
        match self {
            Fixity::Prefix => "prefix",
            Fixity::Postfix => "postfix",
            Fixity::Infix => "infix",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessorKind {
    Get,
    Set,
    WillSet,
    DidSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FunctionKind {
    Func,
    Initializer {
        #[serde(default)]
        memberwise: bool,
        #[serde(default)]
        failable: bool,
    },
    Accessor { kind: AccessorKind, storage: DeclId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub kind: FunctionKind,
    #[serde(default)]
    pub operator: Option<Fixity>,
    #[serde(default)]
    pub generic_params: Vec<DeclId>,
    #[serde(default)]
    pub params: Vec<DeclId>,
    pub result: Type,
    #[serde(default)]
    pub body: Option<Stmt>,
    #[serde(default)]
    pub is_mutating: bool,
    #[serde(default)]
    pub throws: bool,
}

impl FunctionDecl {
    pub fn is_initializer(&self) -> bool {
        matches!(self.kind, FunctionKind::Initializer { .. })
    }

    pub fn accessor_kind(&self) -> Option<AccessorKind> {
        match self.kind {
            FunctionKind::Accessor { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    /// Argument label; `None` for `_`.
    #[serde(default)]
    pub label: Option<String>,
    pub ty: Type,
    #[serde(default)]
    pub is_inout: bool,
    #[serde(default)]
    pub is_variadic: bool,
    #[serde(default)]
    pub is_autoclosure: bool,
    #[serde(default)]
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub ty: Type,
    #[serde(default)]
    pub is_let: bool,
    /// Explicit accessors and observers, in source order.
    #[serde(default)]
    pub accessors: Vec<DeclId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptDecl {
    #[serde(default)]
    pub params: Vec<DeclId>,
    pub result: Type,
    #[serde(default)]
    pub accessors: Vec<DeclId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumElementDecl {
    #[serde(default)]
    pub raw_value: Option<Expr>,
    /// Associated-value parameters.
    #[serde(default)]
    pub payload: Vec<DeclId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternEntry {
    pub pattern: Pattern,
    #[serde(default)]
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternBindingDecl {
    pub entries: Vec<PatternEntry>,
}

impl Decl {
    pub fn get_kind(&self) -> &DeclKind {
        &self.kind
    }

    pub fn as_function(&self) -> Option<&FunctionDecl> {
        match &self.kind {
            DeclKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_nominal(&self) -> Option<&NominalDecl> {
        match &self.kind {
            DeclKind::Nominal(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_param(&self) -> Option<&ParamDecl> {
        match &self.kind {
            DeclKind::Param(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_var(&self) -> Option<&VarDecl> {
        match &self.kind {
            DeclKind::Var(v) => Some(v),
            _ => None,
        }
    }

    pub fn nominal_kind(&self) -> Option<NominalKind> {
        self.as_nominal().map(|n| n.kind)
    }

    pub fn is_protocol(&self) -> bool {
        self.nominal_kind() == Some(NominalKind::Protocol)
    }

    /// Functions, initializers, accessors and subscripts carry a signature
    /// in their qualified key and take part in overload numbering.
    pub fn is_callable(&self) -> bool {
        matches!(self.kind, DeclKind::Function(_) | DeclKind::Subscript(_))
    }

    /// Parameters of a function, subscript or enum payload.
    pub fn params(&self) -> &[DeclId] {
        match &self.kind {
            DeclKind::Function(f) => &f.params,
            DeclKind::Subscript(s) => &s.params,
            DeclKind::EnumElement(e) => &e.payload,
            _ => &[],
        }
    }

    /// Members declared directly inside a nominal or an extension.
    pub fn members(&self) -> &[DeclId] {
        match &self.kind {
            DeclKind::Nominal(n) => &n.members,
            DeclKind::Extension(e) => &e.members,
            _ => &[],
        }
    }
}
