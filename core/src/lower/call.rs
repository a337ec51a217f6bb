//! file: core/src/lower/call.rs
//! description: calls, member access and subscripts.
//!
//! Every reference to a library declaration goes through its substitution
//! template first. Without one, calls pass the witness info object as the
//! first argument, constructors go through `_create`, and properties and
//! subscripts on `super` become explicit accessor calls.

use log::debug;

use crate::tree::{Argument, Decl, DeclId, DeclKind, Expr, ExprKind, Substitution};

use super::err::{LowerResult, LoweringError};
use super::expr::{self, strip_inout};
use super::session::Session;
use super::template::{Assigned, Bindings, Fragment, Template, TemplateArg};
use super::types;

pub const OPTIONAL_NONE_KEY: &str = "Swift.(file).Optional.none";
pub const NIL_COMPARISON_INIT_KEY: &str = "Swift.(file)._OptionalNilComparisonType.init(nilLiteral:())";

fn template_for(s: &Session<'_>, decl: DeclId, is_assignment: bool) -> Option<Template> {
    s.library.body_or_expression_for(s.program, &s.options, decl, is_assignment).cloned()
}

/// Witness info for a template, built only when the template reads it.
fn template_info(
    s: &mut Session<'_>,
    template: &Template,
    substitutions: &[Substitution],
    set_this: Option<&Expr>,
) -> LowerResult<Option<String>> {
    if template.uses_info() { Ok(Some(info_object(s, substitutions, set_this)?)) } else { Ok(None) }
}

/// In assignment mode the `#ASS` entry wins; the plain entry is the
/// fallback and gets ` = <value>` appended by the caller.
fn lookup(s: &Session<'_>, decl: DeclId, lvalue: bool) -> Option<Template> {
    if lvalue {
        template_for(s, decl, true).or_else(|| template_for(s, decl, false))
    } else {
        template_for(s, decl, false)
    }
}

fn render(s: &Session<'_>, template: &Template, bindings: &Bindings<'_>) -> LowerResult<Fragment> {
    debug!("rendering template `{}`", template.source());
    template.render(bindings, s.options.strict_templates)
}

/// `{$setThis: ..., T: Spelled}`. `set_this` is the receiver a mutating
/// member writes back into.
pub fn info_object(s: &mut Session<'_>, substitutions: &[Substitution], set_this: Option<&Expr>) -> LowerResult<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(receiver) = set_this {
        let value = expr::clone_of_type(s, &receiver.ty, "$val");
        parts.push(format!("$setThis: $val => {}", expr::assign_to(s, receiver, &value)?));
    }
    for sub in substitutions {
        let name = s.decl(sub.param)?.name.clone();
        parts.push(format!("{}: {}", name, types::spell(s, &sub.ty)?));
    }
    Ok(format!("{{{}}}", parts.join(", ")))
}

/// `{get: () => x, set: $val => x = $val}` for an in-out argument.
pub fn inout_pair(s: &mut Session<'_>, inner: &Expr) -> LowerResult<String> {
    let get = expr::lower(s, inner)?;
    let value = expr::clone_of_type(s, &inner.ty, "$val");
    let set = expr::assign_to(s, inner, &value)?;
    Ok(format!("{{get: () => {}, set: $val => {}}}", get, set))
}

/// Lower call arguments against the callee's parameter list. Templates
/// receive the plain value of in-out arguments; by-value arguments are
/// copied when they carry a value type.
fn arguments(s: &mut Session<'_>, args: &[Argument], for_template: bool) -> LowerResult<Vec<TemplateArg>> {
    let issuer = "trellis.lower.call.arguments";
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Argument::Value { expr: e, .. } => {
                let text = match &e.semantics_provider().kind {
                    ExprKind::InOut(inner) if for_template => expr::lower(s, inner)?,
                    ExprKind::InOut(inner) => inout_pair(s, inner)?,
                    _ => {
                        let text = expr::lower(s, e)?;
                        expr::clone_value(s, e, text)
                    }
                };
                out.push(TemplateArg::explicit(text));
            }
            Argument::Default { owner, index } => {
                let program = s.program;
                let owner_decl = s.decl(*owner)?;
                let param = owner_decl
                    .params()
                    .get(*index)
                    .and_then(|p| program.get_decl(*p))
                    .and_then(|p| p.as_param())
                    .ok_or_else(|| {
                        LoweringError::invalid_tree(
                            format!("`{}` has no parameter {}", owner_decl.name, index),
                            issuer,
                        )
                    })?;
                let default = param.default.as_ref().ok_or_else(|| {
                    LoweringError::invalid_tree(
                        format!("parameter {} of `{}` has no default value", index, owner_decl.name),
                        issuer,
                    )
                })?;
                let text = expr::lower(s, default)?;
                let text = expr::clone_value(s, default, text);
                let text = if param.is_autoclosure { format!("(() => {})", text) } else { text };
                out.push(TemplateArg::defaulted(text));
            }
            Argument::Variadic(values) => {
                let mut parts = Vec::with_capacity(values.len());
                for v in values {
                    let text = expr::lower(s, v)?;
                    parts.push(expr::clone_value(s, v, text));
                }
                out.push(TemplateArg::explicit(format!("[{}]", parts.join(", "))));
            }
        }
    }
    Ok(out)
}

fn joined(info: &str, args: &[TemplateArg]) -> String {
    let mut parts: Vec<&str> = vec![info];
    parts.extend(args.iter().map(|a| a.text.as_str()));
    parts.join(", ")
}

fn is_type_ref(e: &Expr) -> bool {
    matches!(e.semantics_provider().kind, ExprKind::TypeRef(_))
}

fn is_super(e: &Expr) -> bool {
    matches!(e.semantics_provider().kind, ExprKind::SuperRef)
}

fn is_mutating(decl: &Decl) -> bool {
    decl.as_function().map(|f| f.is_mutating).unwrap_or(false)
}

/// Lower a call expression.
pub fn call(s: &mut Session<'_>, e: &Expr, callee: &Expr, args: &[Argument]) -> LowerResult<String> {
    let issuer = "trellis.lower.call.call";
    match &callee.semantics_provider().kind {
        ExprKind::ConstructorRef { ty, decl, substitutions } => {
            // Literal initializers of library types (`Double(5)`).
            if let [Argument::Value { expr: only, .. }] = args {
                let ctor = s.decl(*decl)?;
                if only.is_literal() && s.is_native(ctor) {
                    return expr::lower(s, only);
                }
            }
            if s.key(*decl) == NIL_COMPARISON_INIT_KEY {
                return Ok("null".to_string());
            }
            if let Some(template) = template_for(s, *decl, false) {
                let rendered = arguments(s, args, true)?;
                let info = template_info(s, &template, substitutions, None)?;
                let bindings = Bindings { receiver: None, args: &rendered, info: info.as_deref(), assigned: None };
                return render(s, &template, &bindings)?.into_text(issuer);
            }
            let spelled = types::spell(s, ty)?;
            let name = s.name(*decl)?;
            let info = info_object(s, substitutions, None)?;
            let rendered = arguments(s, args, false)?;
            Ok(format!("_create({}, '{}', {})", spelled, name, joined(&info, &rendered)))
        }
        ExprKind::MethodRef { base, decl, substitutions } => {
            let base = strip_inout(base);
            let method = s.decl(*decl)?;
            let set_this = if is_mutating(method) && !is_type_ref(base) { Some(base) } else { None };
            if let Some(template) = template_for(s, *decl, false) {
                let receiver =
                    if is_type_ref(base) && !template.uses_receiver() { None } else { Some(expr::lower(s, base)?) };
                let rendered = arguments(s, args, true)?;
                let info = template_info(s, &template, substitutions, set_this)?;
                let bindings =
                    Bindings { receiver: receiver.as_deref(), args: &rendered, info: info.as_deref(), assigned: None };
                return render(s, &template, &bindings)?.into_text(issuer);
            }
            let receiver = expr::lower(s, base)?;
            let name = s.name(*decl)?;
            let info = info_object(s, substitutions, set_this)?;
            let rendered = arguments(s, args, false)?;
            Ok(format!("{}.{}({})", receiver, name, joined(&info, &rendered)))
        }
        ExprKind::DeclRef { decl, substitutions } => {
            let target = s.decl(*decl)?;
            if !matches!(target.kind, DeclKind::Function(_)) {
                let callee_text = expr::lower(s, callee)?;
                let rendered = arguments(s, args, false)?;
                return Ok(format!("{}({})", callee_text, joined("null", &rendered)));
            }
            if let Some(template) = template_for(s, *decl, false) {
                let rendered = arguments(s, args, true)?;
                let info = template_info(s, &template, substitutions, None)?;
                let bindings = Bindings { receiver: None, args: &rendered, info: info.as_deref(), assigned: None };
                return render(s, &template, &bindings)?.into_text(issuer);
            }
            let name = s.name(*decl)?;
            let info = info_object(s, substitutions, None)?;
            let rendered = arguments(s, args, false)?;
            Ok(format!("{}({})", name, joined(&info, &rendered)))
        }
        ExprKind::MemberRef { .. } | ExprKind::Subscript { .. } => {
            let callee_text = expr::lower(s, callee)?;
            let rendered = arguments(s, args, false)?;
            Ok(format!("{}({})", callee_text, joined("null", &rendered)))
        }
        _ => {
            let callee_text = expr::lower(s, callee)?;
            let rendered = arguments(s, args, false)?;
            debug!("indirect call of type `{}`", e.ty.source_spelling(s.program));
            Ok(format!("({})({})", callee_text, joined("null", &rendered)))
        }
    }
}

/// Property access. In assignment mode the result carries a hole for the
/// assigned value.
pub fn member(
    s: &mut Session<'_>,
    base: &Expr,
    decl: DeclId,
    substitutions: &[Substitution],
    lvalue: bool,
) -> LowerResult<Fragment> {
    let base = strip_inout(base);
    if s.key(decl) == OPTIONAL_NONE_KEY {
        return Ok(Fragment::text("null"));
    }

    let template = lookup(s, decl, lvalue);
    if let Some(template) = template {
        let receiver = if is_type_ref(base) && !template.uses_receiver() { None } else { Some(expr::lower(s, base)?) };
        let info = template_info(s, &template, substitutions, None)?;
        let assigned = if lvalue && template.uses_assigned() { Some(Assigned::Hole) } else { None };
        let bindings = Bindings { receiver: receiver.as_deref(), args: &[], info: info.as_deref(), assigned };
        return render(s, &template, &bindings);
    }

    let name = s.name(decl)?;
    if is_super(base) {
        let mut f = Fragment::text("super.");
        f.push_str(&name);
        if lvalue {
            f.push_str("$set(");
            f.push_hole();
            f.push_str(")");
        } else {
            f.push_str("$get()");
        }
        return Ok(f);
    }
    let receiver = expr::lower(s, base)?;
    Ok(Fragment::text(format!("{}.{}", receiver, name)))
}

/// Subscript access: `subscript$get(info, args)` or, in assignment mode,
/// `subscript$set(info, <hole>, args)`.
pub fn subscript(
    s: &mut Session<'_>,
    base: &Expr,
    decl: DeclId,
    args: &[Argument],
    substitutions: &[Substitution],
    lvalue: bool,
) -> LowerResult<Fragment> {
    let base = strip_inout(base);
    let template = lookup(s, decl, lvalue);
    if let Some(template) = template {
        let receiver = if is_type_ref(base) && !template.uses_receiver() { None } else { Some(expr::lower(s, base)?) };
        let rendered = arguments(s, args, true)?;
        let set_this = if lvalue && !is_type_ref(base) { Some(base) } else { None };
        let info = template_info(s, &template, substitutions, set_this)?;
        let assigned = if lvalue && template.uses_assigned() { Some(Assigned::Hole) } else { None };
        let bindings = Bindings { receiver: receiver.as_deref(), args: &rendered, info: info.as_deref(), assigned };
        return render(s, &template, &bindings);
    }

    let receiver = expr::lower(s, base)?;
    let name = s.name(decl)?;
    let rendered = arguments(s, args, false)?;
    if lvalue {
        let set_this = if is_type_ref(base) { None } else { Some(base) };
        let info = info_object(s, substitutions, set_this)?;
        let mut f = Fragment::text(format!("{}.{}$set({}, ", receiver, name, info));
        f.push_hole();
        for a in &rendered {
            f.push_str(", ");
            f.push_str(&a.text);
        }
        f.push_str(")");
        Ok(f)
    } else {
        let info = info_object(s, substitutions, None)?;
        Ok(Fragment::text(format!("{}.{}$get({})", receiver, name, joined(&info, &rendered))))
    }
}

/// Call the zero-argument member `decl` on an already lowered receiver.
/// Used for the iterator protocol witnesses of `for`-`in`.
pub fn invoke(s: &mut Session<'_>, decl: DeclId, receiver: &str) -> LowerResult<String> {
    let issuer = "trellis.lower.call.invoke";
    if let Some(template) = template_for(s, decl, false) {
        let info = if template.uses_info() { Some("{}") } else { None };
        let bindings = Bindings { receiver: Some(receiver), args: &[], info, assigned: None };
        return render(s, &template, &bindings)?.into_text(issuer);
    }
    Ok(format!("{}.{}({{}})", receiver, s.name(decl)?))
}
