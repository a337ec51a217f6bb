//! file: core/src/lower/expr.rs
//! description: expression lowerer.
//!
//! `lower` turns an expression into target text. The only side effects are
//! on the session's optional-condition accumulator and temporary counter.
//! Assignment targets go through `lower_lvalue`, which returns a
//! `Fragment` whose hole receives the assigned value once it is known;
//! that is how setters rewrite themselves into method calls.

use crate::tree::{CastKind, ClosureBody, DeclId, DeclKind, Expr, ExprKind, Type};

use super::call;
use super::err::{LowerResult, LoweringError};
use super::optional;
use super::session::Session;
use super::stmt;
use super::template::Fragment;
use super::types;

/// Lower an expression in value position.
pub fn lower(s: &mut Session<'_>, e: &Expr) -> LowerResult<String> {
    lower_kind(s, e).map_err(|err| err.at(e.location.as_ref()))
}

fn lower_kind(s: &mut Session<'_>, e: &Expr) -> LowerResult<String> {
    let issuer = "trellis.lower.expr.lower";
    match &e.kind {
        ExprKind::IntegerLiteral(v) | ExprKind::FloatLiteral(v) => Ok(v.replace('_', "")),
        ExprKind::BooleanLiteral(b) => Ok(if *b { "true" } else { "false" }.to_string()),
        ExprKind::StringLiteral(v) => Ok(quote(v)),
        ExprKind::NilLiteral => Ok("null".to_string()),
        ExprKind::Interpolation(segments) => {
            if segments.is_empty() {
                return Ok("\"\"".to_string());
            }
            let mut parts = Vec::with_capacity(segments.len());
            for seg in segments {
                parts.push(lower(s, seg)?);
            }
            Ok(format!("(({}))", parts.join(") + (")))
        }
        ExprKind::DiscardAssignment => Ok("_.discardAssignment".to_string()),
        ExprKind::DeclRef { decl, substitutions: _ } => decl_ref(s, *decl),
        ExprKind::SelfRef => Ok("this".to_string()),
        ExprKind::SuperRef => Ok("super".to_string()),
        ExprKind::TypeRef(ty) => types::spell(s, ty),
        ExprKind::MemberRef { base, decl, substitutions } => {
            call::member(s, base, *decl, substitutions, false)?.into_text(issuer)
        }
        ExprKind::MethodRef { base, decl, .. } => {
            let receiver = lower(s, strip_inout(base))?;
            Ok(format!("{}.{}", receiver, s.name(*decl)?))
        }
        ExprKind::ConstructorRef { .. } => {
            Err(LoweringError::unsupported("a constructor reference outside a call", issuer, e.location.clone()))
        }
        ExprKind::Subscript { base, decl, args, substitutions } => {
            call::subscript(s, base, *decl, args, substitutions, false)?.into_text(issuer)
        }
        ExprKind::Tuple(elements) => {
            let mut parts = Vec::with_capacity(elements.len());
            for (i, el) in elements.iter().enumerate() {
                parts.push(format!("{}: {}", i, lower(s, el)?));
            }
            Ok(format!("{{{}}}", parts.join(", ")))
        }
        ExprKind::Paren(inner) => Ok(format!("({})", lower(s, inner)?)),
        ExprKind::TupleElement { base, index } => Ok(format!("{}[\"{}\"]", lower(s, base)?, index)),
        ExprKind::Array(elements) => array_literal(s, e, elements),
        ExprKind::Dictionary(pairs) => {
            let mut parts = Vec::with_capacity(pairs.len());
            for (k, v) in pairs {
                let key = lower(s, k)?;
                let value = lower(s, v)?;
                parts.push(format!("[{}, {}]", clone_value(s, k, key), clone_value(s, v, value)));
            }
            Ok(format!("new Map([{}])", parts.join(", ")))
        }
        ExprKind::Call { callee, args } => call::call(s, e, callee, args),
        ExprKind::Assign { dest, source } => assign(s, dest, source),
        ExprKind::InOut(inner) => call::inout_pair(s, inner),
        ExprKind::Closure { params, body } => closure(s, params, body),
        ExprKind::AutoClosure(inner) => Ok(format!("() => {}", lower(s, inner)?)),
        ExprKind::BindOptional(inner) => optional::bind(s, inner),
        ExprKind::OptionalEvaluation(inner) => optional::evaluate(s, inner),
        ExprKind::OptionalTry(inner) => optional::optional_try(s, inner),
        ExprKind::ForceValue(inner)
        | ExprKind::Try(inner)
        | ExprKind::ForceTry(inner)
        | ExprKind::Conversion(inner)
        | ExprKind::RebindSelf(inner) => lower(s, inner),
        ExprKind::Ternary { cond, then, otherwise } => Ok(format!(
            "({} ? {} : {})",
            lower(s, cond)?,
            lower(s, then)?,
            lower(s, otherwise)?
        )),
        ExprKind::TypeCheck { expr, ty } => Ok(format!("({} instanceof {})", lower(s, expr)?, types::spell(s, ty)?)),
        ExprKind::Cast { expr, ty, kind } => match kind {
            CastKind::Coerce | CastKind::Forced => lower(s, expr),
            CastKind::Conditional => {
                let value = lower(s, expr)?;
                let spelled = types::spell(s, ty)?;
                let tmp = s.next_temp();
                Ok(format!("(({} = {}) instanceof {} ? {} : null)", tmp, value, spelled, tmp))
            }
        },
        ExprKind::OpenExistential { existential, opaque, sub } => {
            let value = lower(s, existential)?;
            let previous = s.bind_opaque(*opaque, value);
            let result = lower(s, sub);
            s.unbind_opaque(*opaque, previous);
            result
        }
        ExprKind::OpaqueValue(id) => s.opaque(*id).cloned().ok_or_else(|| {
            LoweringError::invalid_tree(format!("opaque value {} used outside its existential", id), issuer)
        }),
        ExprKind::DynamicType(inner) => Ok(format!("{}.constructor", lower(s, inner)?)),
        ExprKind::Unsupported(what) => Err(LoweringError::unsupported(what, issuer, e.location.clone())),
    }
}

/// Lower an assignment target. Member, subscript and `self` targets render
/// their own hole; plain names get ` = <hole>` appended by the caller.
pub fn lower_lvalue(s: &mut Session<'_>, e: &Expr) -> LowerResult<Fragment> {
    let issuer = "trellis.lower.expr.lower_lvalue";
    match &e.kind {
        ExprKind::SelfRef => {
            let function = s.current_function().ok_or_else(|| {
                LoweringError::invalid_tree("assignment to self outside a function".to_string(), issuer)
            })?;
            let mut f = Fragment::text(format!("{}.$setThis(_cloneStruct(", s.info_tag(function.id)));
            f.push_hole();
            f.push_str("))");
            Ok(f)
        }
        ExprKind::MemberRef { base, decl, substitutions } => call::member(s, base, *decl, substitutions, true),
        ExprKind::Subscript { base, decl, args, substitutions } => {
            call::subscript(s, base, *decl, args, substitutions, true)
        }
        ExprKind::DeclRef { .. } | ExprKind::OpaqueValue(_) | ExprKind::DiscardAssignment => {
            Ok(Fragment::text(lower(s, e)?))
        }
        // An optional receiver written back through `$setThis` is written
        // to the optional itself.
        ExprKind::Paren(inner)
        | ExprKind::Conversion(inner)
        | ExprKind::InOut(inner)
        | ExprKind::ForceValue(inner)
        | ExprKind::BindOptional(inner) => lower_lvalue(s, inner),
        ExprKind::TupleElement { base, index } => Ok(Fragment::text(format!("{}[\"{}\"]", lower(s, base)?, index))),
        _ => Err(LoweringError::unsupported("this assignment target", issuer, e.location.clone())),
    }
}

/// `dest = value`, with `value` already lowered (and cloned if needed).
pub fn assign_to(s: &mut Session<'_>, dest: &Expr, value: &str) -> LowerResult<String> {
    let mut target = lower_lvalue(s, dest)?;
    if !target.has_hole() {
        target.push_str(" = ");
        target.push_hole();
    }
    Ok(target.fill(value))
}

fn assign(s: &mut Session<'_>, dest: &Expr, source: &Expr) -> LowerResult<String> {
    let value = lower(s, source)?;
    let value = clone_value(s, source, value);
    if let ExprKind::Tuple(elements) = &dest.semantics_provider().kind {
        let root = s.fresh("$tuple");
        let mut out = format!("let {} = {}", root, value);
        for (i, element) in elements.iter().enumerate() {
            out.push('\n');
            out.push_str(&assign_to(s, element, &format!("{}[{}]", root, i))?);
        }
        return Ok(out);
    }
    assign_to(s, dest, &value)
}

/// Wrap `text` in `_cloneStruct(...)` when `source` yields a value-type
/// instance that is not freshly constructed.
pub fn clone_value(s: &Session<'_>, source: &Expr, text: String) -> String {
    if !types::needs_clone(s, &source.ty) || is_fresh(source) {
        return text;
    }
    format!("_cloneStruct({})", text)
}

/// Clone for a value of type `ty` that comes from somewhere else (a
/// setter argument, a caught value).
pub fn clone_of_type(s: &Session<'_>, ty: &Type, text: &str) -> String {
    if types::needs_clone(s, ty) {
        format!("_cloneStruct({})", text)
    } else {
        text.to_string()
    }
}

/// Constructor calls and collection literals; literal elements are
/// copied as they are lowered.
fn is_fresh(e: &Expr) -> bool {
    match &e.semantics_provider().kind {
        ExprKind::Call { callee, .. } => matches!(callee.semantics_provider().kind, ExprKind::ConstructorRef { .. }),
        ExprKind::Array(_) | ExprKind::Dictionary(_) => true,
        _ => false,
    }
}

pub(super) fn strip_inout(e: &Expr) -> &Expr {
    match &e.kind {
        ExprKind::InOut(inner) => strip_inout(inner),
        _ => e,
    }
}

pub(super) fn quote(v: &str) -> String {
    serde_json::Value::String(v.to_string()).to_string()
}

fn decl_ref(s: &mut Session<'_>, id: DeclId) -> LowerResult<String> {
    let key = s.key(id);
    if key == call::OPTIONAL_NONE_KEY {
        return Ok("null".to_string());
    }
    let decl = s.decl(id)?;
    match &decl.kind {
        DeclKind::Nominal(_) | DeclKind::TypeAlias { .. } => types::spell(s, &Type::nominal(id)),
        DeclKind::Var(_) if decl.is_static => {
            // A static property read without a base from inside its type.
            let program = s.program;
            match program.enclosing_type(id).and_then(|t| program.extended_nominal(t.id)) {
                Some(owner) => Ok(format!("{}.{}", types::spell(s, &Type::nominal(owner.id))?, s.name(id)?)),
                None => s.name(id),
            }
        }
        _ => {
            let template = s.library.body_or_expression_for(s.program, &s.options, id, false).cloned();
            match template {
                Some(t) if !decl.is_callable() => {
                    let strict = s.options.strict_templates;
                    t.render(&Default::default(), strict)?.into_text("trellis.lower.expr.decl_ref")
                }
                _ => s.name(id),
            }
        }
    }
}

fn array_literal(s: &mut Session<'_>, e: &Expr, elements: &[Expr]) -> LowerResult<String> {
    let issuer = "trellis.lower.expr.array_literal";
    let (is_set, element_ty) = match e.ty.strip() {
        Type::Array(el) => (false, el.as_ref().clone()),
        Type::Nominal { decl, args, .. } if !args.is_empty() => (s.key(*decl) == "Swift.(file).Set", args[0].clone()),
        other => {
            return Err(LoweringError::unsupported(
                &format!("array literal of type `{}`", other.source_spelling(s.program)),
                issuer,
                e.location.clone(),
            ));
        }
    };
    let spelled = types::spell(s, &element_ty)?;
    let mut parts = Vec::with_capacity(elements.len());
    for el in elements {
        let text = lower(s, el)?;
        parts.push(clone_value(s, el, text));
    }
    Ok(format!(
        "_create({}, {{Element: {}}}, [{}])",
        if is_set { "Set, 'initSource'" } else { "Array, 'initBuffer'" },
        spelled,
        parts.join(", ")
    ))
}

/// Parameter list shared by closures and function declarations: the info
/// binding first, then each parameter (`p$inout` for in-out ones).
pub fn param_list(s: &mut Session<'_>, info: Option<&str>, params: &[DeclId]) -> LowerResult<String> {
    let mut parts: Vec<String> = Vec::with_capacity(params.len() + 1);
    if let Some(info) = info {
        parts.push(info.to_string());
    }
    for p in params {
        let decl = s.decl(*p)?;
        let mut name = s.name(*p)?;
        if decl.as_param().map(|pd| pd.is_inout).unwrap_or(false) {
            name.push_str("$inout");
        }
        parts.push(name);
    }
    Ok(parts.join(", "))
}

fn closure(s: &mut Session<'_>, params: &[DeclId], body: &ClosureBody) -> LowerResult<String> {
    let list = param_list(s, Some("$info"), params)?;
    match body {
        ClosureBody::Expr(e) => Ok(format!("(({}) => {})", list, lower(s, e)?)),
        ClosureBody::Block(b) => Ok(format!("(({}) => {{{}\n}})", list, stmt::lower_block(s, b)?)),
    }
}
