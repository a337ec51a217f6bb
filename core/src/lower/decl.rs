//! file: core/src/lower/decl.rs
//! description: declaration lowerer.
//!
//! Nominal types become classes (protocols become an interface plus a
//! `P$implementation` class holding their default members). Extensions of
//! types declared in the module are folded into the type itself; extensions
//! of library types are mixed into the native constructor at load time.

use std::collections::HashSet;

use log::debug;

use crate::config::StructuralTypes;
use crate::tree::{
    Decl, DeclId, DeclKind, EnumElementDecl, Expr, ExprKind, ExtensionDecl, FunctionDecl, FunctionKind,
    NominalDecl, NominalKind, Type,
};

use super::err::{LowerResult, LoweringError};
use super::expr;
use super::library;
use super::mixin::{self, Link};
use super::session::Session;
use super::stmt;
use super::storage;
use super::types;

/// Lower a declaration in module or type scope.
pub fn lower_decl(s: &mut Session<'_>, id: DeclId) -> LowerResult<String> {
    let decl = s.decl(id)?;
    lower(s, decl).map_err(|err| err.at(decl.location.as_ref()))
}

/// Lower a declaration that appears inside a function body.
pub fn lower_local(s: &mut Session<'_>, id: DeclId) -> LowerResult<String> {
    lower_decl(s, id)
}

fn lower(s: &mut Session<'_>, decl: &Decl) -> LowerResult<String> {
    match &decl.kind {
        DeclKind::Nominal(n) => nominal(s, decl, n),
        DeclKind::Extension(ext) => extension(s, decl, ext),
        // Accessors are printed by the storage that owns them.
        DeclKind::Function(f) if f.accessor_kind().is_some() => Ok(String::new()),
        DeclKind::Function(_) => function(s, decl, decl.id, ""),
        DeclKind::PatternBinding(_) => storage::binding(s, decl),
        DeclKind::Subscript(_) => storage::subscript(s, decl),
        DeclKind::EnumElement(e) => enum_element(s, decl, e),
        DeclKind::TypeAlias { underlying } => type_alias(s, decl, underlying),
        DeclKind::TopLevelCode { body } => stmt::lower_block(s, body),
        DeclKind::Var(_)
        | DeclKind::Param(_)
        | DeclKind::GenericParam
        | DeclKind::AssociatedType
        | DeclKind::Destructor => Ok(String::new()),
    }
}

// ------- Functions -------

fn as_function<'p>(decl: &'p Decl) -> LowerResult<&'p FunctionDecl> {
    decl.as_function().ok_or_else(|| {
        LoweringError::invalid_tree(format!("`{}` is not a function", decl.name), "trellis.lower.decl.as_function")
    })
}

/// Parameters as they appear in the output. Subscript accessors take the
/// accessor's own parameters (`newValue`) before the subscript's.
fn output_params(s: &Session<'_>, func: &Decl, f: &FunctionDecl) -> LowerResult<Vec<DeclId>> {
    let mut params = f.params.clone();
    if let FunctionKind::Accessor { storage, .. } = f.kind {
        if let DeclKind::Subscript(sub) = &s.decl(storage)?.kind {
            params.extend(sub.params.iter().copied());
        }
    }
    debug!("{} takes {} parameter(s)", func.name, params.len());
    Ok(params)
}

fn generic_list(s: &mut Session<'_>, params: &[DeclId]) -> LowerResult<String> {
    if params.is_empty() {
        return Ok(String::new());
    }
    let mut names = Vec::with_capacity(params.len());
    for p in params {
        names.push(s.name(*p)?);
    }
    Ok(format!("<{}>", names.join(", ")))
}

/// `<T>($info3, a, b)`
fn signature(s: &mut Session<'_>, func: &Decl, with_info: bool) -> LowerResult<String> {
    let f = as_function(func)?;
    let params = output_params(s, func, f)?;
    let info = if with_info { Some(s.info_tag(func.id)) } else { None };
    Ok(format!("{}({})", generic_list(s, &f.generic_params)?, expr::param_list(s, info.as_deref(), &params)?))
}

/// `{ ... }`, or nothing for a requirement without a body.
fn body(s: &mut Session<'_>, func: &Decl) -> LowerResult<String> {
    let f = as_function(func)?;
    if let FunctionKind::Initializer { memberwise: true, .. } = f.kind {
        return memberwise_body(s, func, f);
    }
    let Some(block) = &f.body else {
        return Ok(String::new());
    };
    let (prefix, suffix) = inout_wrappers(s, &f.params)?;
    s.push_function(func.id);
    let text = stmt::lower_block(s, block);
    s.pop_function();
    Ok(format!("{{\n{}{}{}\n}}", prefix, text?, suffix))
}

/// In-out parameters are read into locals on entry and written back
/// through their accessor pair once the body has produced its result.
fn inout_wrappers(s: &mut Session<'_>, params: &[DeclId]) -> LowerResult<(String, String)> {
    let mut names = Vec::new();
    for p in params {
        if s.decl(*p)?.as_param().map(|pd| pd.is_inout).unwrap_or(false) {
            names.push(s.name(*p)?);
        }
    }
    if names.is_empty() {
        return Ok((String::new(), String::new()));
    }
    let mut prefix = String::new();
    let mut suffix = String::from("})()");
    for name in &names {
        prefix.push_str(&format!("\nlet {0} = {0}$inout.get()", name));
        suffix.push_str(&format!("\n{0}$inout.set({0})", name));
    }
    prefix.push_str("\nconst $result = (() => {");
    suffix.push_str("\nreturn $result");
    Ok((prefix, suffix))
}

/// A synthesized memberwise initializer assigns each parameter to the
/// stored property of the same name.
fn memberwise_body(s: &mut Session<'_>, func: &Decl, f: &FunctionDecl) -> LowerResult<String> {
    let issuer = "trellis.lower.decl.memberwise_body";
    let program = s.program;
    let owner = program
        .enclosing_type(func.id)
        .and_then(|t| program.extended_nominal(t.id))
        .ok_or_else(|| LoweringError::invalid_tree("memberwise initializer outside a type".to_string(), issuer))?;
    let self_ty = Type::nominal(owner.id);

    s.push_function(func.id);
    let mut out = String::from("{");
    for p in &f.params {
        let param = s.decl(*p)?;
        // Variables are not listed as members; their bindings are.
        let stored = program
            .decls
            .iter()
            .find(|d| d.parent == Some(owner.id) && d.name == param.name && !d.is_static && d.as_var().is_some())
            .map(|d| d.id);
        let Some(stored) = stored else {
            s.pop_function();
            return Err(LoweringError::invalid_tree(
                format!("no stored property `{}` for memberwise initializer of `{}`", param.name, owner.name),
                issuer,
            ));
        };
        let ty = s.decl(stored)?.as_var().map(|v| v.ty.clone()).unwrap_or_else(Type::void);
        let target = Expr::new(
            ExprKind::MemberRef {
                base: Box::new(Expr::new(ExprKind::SelfRef, self_ty.clone())),
                decl: stored,
                substitutions: Vec::new(),
            },
            ty,
        );
        let value = s.name(*p)?;
        let assigned = expr::assign_to(s, &target, &value);
        match assigned {
            Ok(text) => {
                out.push('\n');
                out.push_str(&text);
            }
            Err(err) => {
                s.pop_function();
                return Err(err);
            }
        }
    }
    s.pop_function();
    out.push_str("\n}");
    Ok(out)
}

/// Signature and body without the leading name, as used for property
/// accessors (`() {...}`, `(newValue) {...}`).
pub(super) fn signature_and_body(s: &mut Session<'_>, func: &Decl, with_info: bool) -> LowerResult<String> {
    let sig = signature(s, func, with_info)?;
    Ok(format!("{}{}", sig, body(s, func)?))
}

/// Print a function under the name of `name_decl` (itself, or the
/// subscript owning an accessor) followed by `suffix`. Every further name
/// the declaration answers to as a protocol requirement gets a forwarding
/// alias.
pub fn function(s: &mut Session<'_>, func: &Decl, name_decl: DeclId, suffix: &str) -> LowerResult<String> {
    let program = s.program;
    let prefix = if !program.is_type_member(func.id) {
        "function "
    } else if func.is_static {
        "static "
    } else {
        ""
    };
    let name = format!("{}{}", s.name(name_decl)?, suffix);
    let sig = signature(s, func, true)?;
    let mut out = format!("{}{}{}{}", prefix, name, sig, body(s, func)?);

    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(name.clone());
    let mut requirement = 1;
    while let Some(alias) = s.name_for(name_decl, requirement)? {
        let alias = format!("{}{}", alias, suffix);
        if seen.insert(alias.clone()) {
            out.push_str(&format!(
                "\n{}{}{}{{\nreturn this.{}.apply(this,arguments)\n}}",
                prefix, alias, sig, name
            ));
        }
        requirement += 1;
    }
    Ok(out)
}

// ------- Types -------

fn type_head(definition: &str, name: &str, nested: bool) -> String {
    if nested {
        format!("static {} = {}", name, definition)
    } else {
        format!("{} {}", definition, name)
    }
}

/// Lower the members in order, each on its own line.
fn members_text(s: &mut Session<'_>, members: &[DeclId]) -> LowerResult<String> {
    let mut out = String::new();
    for m in members {
        out.push('\n');
        out.push_str(&lower_decl(s, *m)?);
    }
    Ok(out)
}

fn spelled_protocols(s: &mut Session<'_>, protocols: &[&Type]) -> LowerResult<Vec<String>> {
    let mut out = Vec::with_capacity(protocols.len());
    for p in protocols {
        let spelled = types::spell(s, p)?;
        if !out.contains(&spelled) {
            out.push(spelled);
        }
    }
    Ok(out)
}

fn nominal(s: &mut Session<'_>, decl: &Decl, n: &NominalDecl) -> LowerResult<String> {
    let program = s.program;
    let is_protocol = n.kind == NominalKind::Protocol;

    // Extensions declared in this module are folded into the type.
    let mut members: Vec<DeclId> = n.members.clone();
    let mut protocols: Vec<&Type> = n.protocols.iter().collect();
    for ext in &program.decls {
        if let DeclKind::Extension(e) = &ext.kind {
            if ext.module == program.module && e.extended.nominal_decl() == Some(decl.id) {
                members.extend(e.members.iter().copied());
                protocols.extend(e.protocols.iter());
            }
        }
    }
    let last_own = n.members.last().copied();

    let name = s.name(decl.id)?;
    let nested = program.is_type_member(decl.id);
    let spelled = types::spell(s, &Type::nominal(decl.id))?;
    let native = if s.options.library_mode { library::native_type_for_key(&s.key(decl.id)) } else { None };

    let mut out = type_head(if is_protocol { "interface" } else { "class" }, &name, nested);
    if is_protocol {
        let mut associated = Vec::new();
        for m in &n.members {
            if matches!(s.decl(*m)?.kind, DeclKind::AssociatedType) {
                associated.push(s.name(*m)?);
            }
        }
        if !associated.is_empty() {
            out.push_str(&format!("<{}>", associated.join(", ")));
        }
    } else {
        out.push_str(&generic_list(s, &n.generic_params)?);
    }
    if let Some(superclass) = &n.superclass {
        out.push_str(&format!(" extends {}", types::spell(s, superclass)?));
    }
    let conformances = spelled_protocols(s, &protocols)?;
    if !conformances.is_empty() {
        out.push_str(if is_protocol { " extends " } else { " implements " });
        out.push_str(&conformances.join(", "));
    }
    out.push('{');

    if n.kind == NominalKind::Struct {
        out.push_str("\nstatic readonly $struct = true");
    }
    if native.is_some() {
        out.push_str("\nstatic readonly $mixin = true");
    }
    if !is_protocol {
        out.push_str(&format!("\nstatic readonly $infoAddress = '{}'", decl.id));
    }

    s.push_type(decl.id);
    let lowered = nominal_members(s, &members, is_protocol, last_own, &name, nested);
    let initializers = s.pop_type();
    let (body, has_implementation) = lowered?;
    out.push_str(&body);

    if n.kind == NominalKind::Enum {
        out.push_str("\nstatic infix_61_61($info, a, b){return (a && a.rawValue) == (b && b.rawValue)}");
        out.push_str("\nstatic infix_33_61($info, a, b){return (a && a.rawValue) != (b && b.rawValue)}");
    }
    if !is_protocol {
        out.push_str("\ninit$vars() {");
        if n.superclass.is_some() {
            out.push_str("\nif(super.init$vars)super.init$vars()");
        }
        for init in initializers {
            out.push('\n');
            out.push_str(&init);
        }
        out.push_str("\n}");
    }
    out.push_str("\n}");

    if !is_protocol || has_implementation {
        let (target, protocol_depth) = if is_protocol {
            (format!("{}$implementation", spelled), Some(mixin::protocol_depth(program, decl.id)))
        } else {
            (spelled.clone(), None)
        };
        for protocol in conformances {
            s.push_linkage(Link::Conformance { target: target.clone(), protocol, protocol_depth });
        }
    }
    if let Some(native) = native {
        s.push_linkage(Link::Data { native: native.to_string(), source: name });
    }
    Ok(out)
}

/// Member text of a type. A protocol closes its interface after its own
/// members and opens `P$implementation` for the members its extensions
/// contribute; the flag reports whether that class was opened.
fn nominal_members(
    s: &mut Session<'_>,
    members: &[DeclId],
    is_protocol: bool,
    last_own: Option<DeclId>,
    name: &str,
    nested: bool,
) -> LowerResult<(String, bool)> {
    let mut out = String::new();
    let mut implementation = false;
    for m in members {
        let split = is_protocol && !implementation && (last_own.is_none() || last_own == Some(*m));
        let split_before = split && last_own.is_none();
        let open = format!("\n}}\n{}{{", type_head("class", &format!("{}$implementation", name), nested));
        if split_before {
            out.push_str(&open);
            implementation = true;
        }
        out.push('\n');
        out.push_str(&lower_decl(s, *m)?);
        if split && !split_before {
            out.push_str(&open);
            implementation = true;
        }
    }
    // Nothing followed the last own member: no default implementations.
    if implementation && out.ends_with('{') {
        if let Some(at) = out.rfind("\n}\n") {
            out.truncate(at);
            implementation = false;
        }
    }
    Ok((out, implementation))
}

fn extension(s: &mut Session<'_>, decl: &Decl, ext: &ExtensionDecl) -> LowerResult<String> {
    let program = s.program;
    let target = ext.extended.nominal_decl().and_then(|id| program.get_decl(id)).ok_or_else(|| {
        LoweringError::unsupported(
            &format!("extension of `{}`", ext.extended.source_spelling(program)),
            "trellis.lower.decl.extension",
            decl.location.clone(),
        )
    })?;
    if target.module == program.module {
        return Ok(String::new());
    }

    let spelled = types::spell(s, &ext.extended)?;
    let target_text = if target.is_protocol() { format!("{}$implementation", spelled) } else { spelled };

    s.push_type(decl.id);
    let body = members_text(s, &ext.members);
    s.pop_type();
    let body = body?;

    let protocols: Vec<&Type> = ext.protocols.iter().collect();
    for protocol in spelled_protocols(s, &protocols)? {
        s.push_linkage(Link::Conformance { target: target_text.clone(), protocol, protocol_depth: None });
    }
    Ok(format!("_mixin({}, class {{{}\n}}, true)", target_text, body))
}

fn enum_element(s: &mut Session<'_>, decl: &Decl, e: &EnumElementDecl) -> LowerResult<String> {
    let program = s.program;
    let owner = program
        .enclosing_type(decl.id)
        .and_then(|t| program.extended_nominal(t.id))
        .ok_or_else(|| {
            LoweringError::invalid_tree(
                format!("enum case `{}` outside an enum", decl.name),
                "trellis.lower.decl.enum_element",
            )
        })?;
    let owner_text = types::spell(s, &Type::nominal(owner.id))?;
    let raw = match &e.raw_value {
        Some(v) => expr::lower(s, v)?,
        None => expr::quote(&decl.name),
    };
    let getter = if e.payload.is_empty() { "get " } else { "" };
    Ok(format!(
        "static {}{}() {{return Object.assign(new {}(), {{rawValue: {}, ...Array.from(arguments).slice(1)}})}}",
        getter,
        s.name(decl.id)?,
        owner_text,
        raw
    ))
}

fn is_structural(ty: &Type) -> bool {
    match ty.strip() {
        Type::Tuple(elements) => !elements.is_empty(),
        Type::Function { .. } => true,
        _ => false,
    }
}

fn type_alias(s: &mut Session<'_>, decl: &Decl, underlying: &Type) -> LowerResult<String> {
    if s.options.structural_types == StructuralTypes::Reject && is_structural(underlying) {
        debug!("alias `{}` names a structural type, nothing to emit", decl.name);
        return Ok(String::new());
    }
    let spelled = types::spell(s, underlying)?;
    let prefix = if s.program.is_type_member(decl.id) { "static readonly " } else { "const " };
    Ok(format!("{}{} = {}", prefix, s.name(decl.id)?, spelled))
}
