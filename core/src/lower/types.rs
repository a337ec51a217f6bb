//! file: core/src/lower/types.rs
//! description: type printer.
//!
//! Types are spelled as target-language expressions: library types map to
//! the target's built-in constructors, user types print their path through
//! enclosing types, and generic parameters print as an access into the
//! runtime witness info of the declaration that owns them.

use crate::config::StructuralTypes;
use crate::tree::{Decl, DeclId, DeclKind, NominalKind, Type};

use super::err::{LowerResult, LoweringError};
use super::library;
use super::session::Session;

/// Spell `ty` as a target-language expression.
pub fn spell(s: &mut Session<'_>, ty: &Type) -> LowerResult<String> {
    let issuer = "trellis.lower.types.spell";
    match ty {
        Type::Nominal { decl, parent, .. } => spell_nominal(s, *decl, parent.as_deref()),
        Type::Alias { decl, parent } => {
            let alias = s.decl(*decl)?;
            if s.is_native(alias) {
                if let DeclKind::TypeAlias { underlying } = &alias.kind {
                    return spell(s, underlying);
                }
            }
            spell_nominal(s, *decl, parent.as_deref())
        }
        Type::Optional(inner)
        | Type::Metatype(inner)
        | Type::LValue(inner)
        | Type::InOut(inner)
        | Type::Paren(inner)
        | Type::DynamicSelf(inner) => spell(s, inner),
        Type::Array(_) => Ok("Array".to_string()),
        Type::Dictionary(_, _) => Ok("Map".to_string()),
        Type::GenericParam { decl } => spell_generic_param(s, *decl),
        Type::DependentMember { base, name } => Ok(format!("{}.{}", spell(s, base)?, name)),
        Type::Opened { id, existential } => match s.opaque(*id) {
            Some(value) => Ok(format!("{}.constructor", value)),
            None => Err(LoweringError::invalid_tree(
                format!(
                    "opened existential {} of `{}` used outside its scope",
                    id,
                    existential.source_spelling(s.program)
                ),
                issuer,
            )),
        },
        Type::Tuple(elements) if elements.is_empty() => Ok("undefined".to_string()),
        Type::Tuple(elements) => match s.options.structural_types {
            StructuralTypes::Reject => Err(structural(s, ty)),
            StructuralTypes::Typescript => {
                let mut parts = Vec::with_capacity(elements.len());
                for e in elements {
                    parts.push(spell(s, &e.ty)?);
                }
                Ok(format!("[{}]", parts.join(", ")))
            }
        },
        Type::Function { params, result, .. } => match s.options.structural_types {
            StructuralTypes::Reject => Err(structural(s, ty)),
            StructuralTypes::Typescript => {
                let mut parts = vec!["$info".to_string()];
                for (i, p) in params.iter().enumerate() {
                    parts.push(format!("a{}: {}", i, spell(s, p)?));
                }
                Ok(format!("({}) => {}", parts.join(", "), spell(s, result)?))
            }
        },
        Type::Composition(members) if members.is_empty() => Ok("Object".to_string()),
        Type::Composition(_) => Err(LoweringError::unsupported(
            &format!("protocol composition `{}`", ty.source_spelling(s.program)),
            issuer,
            None,
        )),
    }
}

fn structural(s: &Session<'_>, ty: &Type) -> LoweringError {
    LoweringError::unsupported(
        &format!("structural type `{}`", ty.source_spelling(s.program)),
        "trellis.lower.types.spell",
        None,
    )
}

fn spell_nominal(s: &mut Session<'_>, id: DeclId, parent: Option<&Type>) -> LowerResult<String> {
    let decl = s.decl(id)?;
    if s.is_native(decl) {
        let key = s.key(id);
        if let Some(native) = library::native_type_for_key(&key) {
            return Ok(native.to_string());
        }
    }
    let leaf = s.name(id)?;
    let prefix = match parent {
        Some(p) => Some(spell(s, p)?),
        None => enclosing_path(s, decl)?,
    };
    Ok(match prefix {
        Some(p) => format!("{}.{}", p, leaf),
        None => leaf,
    })
}

/// Path of the nominal types enclosing `decl`, for nested declarations
/// reached without an explicit parent type.
fn enclosing_path(s: &mut Session<'_>, decl: &Decl) -> LowerResult<Option<String>> {
    let program = s.program;
    let Some(parent) = decl.parent.and_then(|p| program.get_decl(p)) else {
        return Ok(None);
    };
    match program.extended_nominal(parent.id) {
        Some(nominal) => Ok(Some(spell_nominal(s, nominal.id, None)?)),
        None => Ok(None),
    }
}

/// Access path of a generic parameter (or a protocol's `Self`) from the
/// current lowering context.
fn spell_generic_param(s: &mut Session<'_>, id: DeclId) -> LowerResult<String> {
    let program = s.program;
    let param = s.decl(id)?;
    let owner = param.parent.and_then(|p| program.get_decl(p)).ok_or_else(|| {
        LoweringError::invalid_tree(
            format!("generic parameter `{}` has no owner", param.name),
            "trellis.lower.types.spell_generic_param",
        )
    })?;
    let static_context = s.current_function().map(|f| f.is_static).unwrap_or(false);

    if owner.is_protocol() && param.name == "Self" {
        return Ok(if static_context { "this".to_string() } else { "this.constructor".to_string() });
    }

    match &owner.kind {
        DeclKind::Function(_) => Ok(format!("{}.{}", s.info_tag(owner.id), param.name)),
        _ => {
            let nominal = program.extended_nominal(owner.id).unwrap_or(owner);
            match s.current_function() {
                Some(f) if static_context => Ok(format!("{}.{}", s.info_tag(f.id), param.name)),
                _ => Ok(format!("this.{}.{}", s.info_tag(nominal.id), param.name)),
            }
        }
    }
}

/// True when values of `ty` have value semantics and must be copied on
/// assignment: existentials and structs that are not target primitives.
pub fn needs_clone(s: &Session<'_>, ty: &Type) -> bool {
    match ty.strip() {
        Type::Composition(_) => true,
        Type::Array(_) | Type::Dictionary(_, _) => true,
        Type::Nominal { decl, .. } => {
            let Some(d) = s.program.get_decl(*decl) else { return false };
            match d.nominal_kind() {
                Some(NominalKind::Protocol) => true,
                Some(NominalKind::Struct) => !library::is_js_literal_key(&s.key(*decl)),
                _ => false,
            }
        }
        _ => false,
    }
}
