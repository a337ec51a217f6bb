//! file: core/src/tree/types.rs
//! description: resolved types attached to declarations and expressions.
//!
//! Types come out of the front end fully resolved. Sugared forms (`T?`,
//! `[T]`, `[K: V]`) are kept so keys can be spelled the way the source
//! library spells its signatures.

use serde::{Deserialize, Serialize};

use super::decl::DeclId;
use super::Program;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleTypeElement {
    #[serde(default)]
    pub label: Option<String>,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    /// A struct, class, enum or protocol, optionally nested and specialized.
    Nominal {
        decl: DeclId,
        #[serde(default)]
        parent: Option<Box<Type>>,
        #[serde(default)]
        args: Vec<Type>,
    },
    /// Reference to a type alias.
    Alias {
        decl: DeclId,
        #[serde(default)]
        parent: Option<Box<Type>>,
    },
    Optional(Box<Type>),
    Array(Box<Type>),
    Dictionary(Box<Type>, Box<Type>),
    /// A generic parameter (or archetype) declared by `decl`.
    GenericParam { decl: DeclId },
    /// `Base.Name` for associated types reached through a generic parameter.
    DependentMember { base: Box<Type>, name: String },
    /// The concrete type hidden behind an opened existential value.
    Opened { id: u32, existential: Box<Type> },
    Tuple(Vec<TupleTypeElement>),
    Function {
        params: Vec<Type>,
        result: Box<Type>,
        #[serde(default)]
        throws: bool,
    },
    Metatype(Box<Type>),
    LValue(Box<Type>),
    InOut(Box<Type>),
    Paren(Box<Type>),
    DynamicSelf(Box<Type>),
    Composition(Vec<Type>),
}

impl Type {
    pub fn nominal(decl: DeclId) -> Type {
        Type::Nominal { decl, parent: None, args: Vec::new() }
    }

    pub fn void() -> Type {
        Type::Tuple(Vec::new())
    }

    pub fn is_void(&self) -> bool {
        matches!(self.strip(), Type::Tuple(elements) if elements.is_empty())
    }

    /// Peel l-value, in-out and paren wrappers.
    pub fn strip(&self) -> &Type {
        match self {
            Type::LValue(inner) | Type::InOut(inner) | Type::Paren(inner) => inner.strip(),
            other => other,
        }
    }

    /// The nominal declaration behind this type, seen through wrappers and
    /// dynamic `Self`. Sugared library types have no declaration.
    pub fn nominal_decl(&self) -> Option<DeclId> {
        match self.strip() {
            Type::Nominal { decl, .. } => Some(*decl),
            Type::DynamicSelf(inner) | Type::Metatype(inner) => inner.nominal_decl(),
            _ => None,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self.strip(), Type::Optional(_))
    }

    /// Spell the type the way the source language writes it. This is the
    /// spelling used inside qualified keys, never in emitted code.
    pub fn source_spelling(&self, program: &Program) -> String {
        let decl_name = |id: &DeclId| {
            program.get_decl(*id).map(|d| d.name.clone()).unwrap_or_else(|| format!("<decl {}>", id))
        };
        match self {
            Type::Nominal { decl, parent, args } => {
                let mut out = String::new();
                if let Some(p) = parent {
                    out.push_str(&p.source_spelling(program));
                    out.push('.');
                }
                out.push_str(&decl_name(decl));
                if !args.is_empty() {
                    let inner: Vec<String> = args.iter().map(|a| a.source_spelling(program)).collect();
                    out.push_str(&format!("<{}>", inner.join(", ")));
                }
                out
            }
            Type::Alias { decl, parent } => match parent {
                Some(p) => format!("{}.{}", p.source_spelling(program), decl_name(decl)),
                None => decl_name(decl),
            },
            Type::Optional(inner) => format!("{}?", inner.source_spelling(program)),
            Type::Array(inner) => format!("[{}]", inner.source_spelling(program)),
            Type::Dictionary(k, v) => format!("[{}: {}]", k.source_spelling(program), v.source_spelling(program)),
            Type::GenericParam { decl } => decl_name(decl),
            Type::DependentMember { base, name } => format!("{}.{}", base.source_spelling(program), name),
            Type::Opened { existential, .. } => existential.source_spelling(program),
            Type::Tuple(elements) => {
                let inner: Vec<String> = elements
                    .iter()
                    .map(|e| match &e.label {
                        Some(l) => format!("{}: {}", l, e.ty.source_spelling(program)),
                        None => e.ty.source_spelling(program),
                    })
                    .collect();
                format!("({})", inner.join(", "))
            }
            Type::Function { params, result, throws } => {
                let inner: Vec<String> = params.iter().map(|p| p.source_spelling(program)).collect();
                format!(
                    "({}){} -> {}",
                    inner.join(", "),
                    if *throws { " throws" } else { "" },
                    result.source_spelling(program)
                )
            }
            Type::Metatype(inner) => format!("{}.Type", inner.source_spelling(program)),
            Type::LValue(inner) | Type::InOut(inner) => inner.source_spelling(program),
            Type::Paren(inner) => format!("({})", inner.source_spelling(program)),
            Type::DynamicSelf(_) => "Self".to_string(),
            Type::Composition(members) => {
                if members.is_empty() {
                    "Any".to_string()
                } else {
                    let inner: Vec<String> = members.iter().map(|m| m.source_spelling(program)).collect();
                    inner.join(" & ")
                }
            }
        }
    }
}
