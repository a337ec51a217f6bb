//! file: core/src/lower/storage.rs
//! description: stored and computed properties, subscripts.
//!
//! A property declared in a class or struct keeps its value in
//! `x$internal` and is reached through a `get x`/`set x` pair that
//! forwards to `x$get`/`x$set`. Subclasses override those two methods
//! (and observers wrap the setter) without touching the storage.

use crate::tree::{AccessorKind, Decl, DeclKind, PatternEntry};

use super::decl;
use super::err::{LowerResult, LoweringError};
use super::expr;
use super::pattern::{self, flatten, Binding};
use super::session::Session;

/// Lower every entry of a pattern binding declaration.
pub fn binding(s: &mut Session<'_>, decl: &Decl) -> LowerResult<String> {
    let DeclKind::PatternBinding(pb) = &decl.kind else {
        return Err(LoweringError::invalid_tree(
            format!("`{}` is not a pattern binding", decl.name),
            "trellis.lower.storage.binding",
        ));
    };
    let mut out = String::new();
    for entry in &pb.entries {
        out.push_str(&entry_text(s, entry)?);
    }
    Ok(out)
}

fn entry_text(s: &mut Session<'_>, entry: &PatternEntry) -> LowerResult<String> {
    let program = s.program;
    let init = match &entry.init {
        Some(e) => {
            let text = expr::lower(s, e)?;
            Some(expr::clone_value(s, e, text))
        }
        None => None,
    };
    let flat = flatten(&entry.pattern);
    let info = pattern::bind(s, &flat, init.as_deref())?;

    let Some(var_id) = info.primary else {
        // `_ = f()` still evaluates its initializer.
        return Ok(init.map(|i| format!("\n{}", i)).unwrap_or_default());
    };
    let var = s.decl(var_id)?;
    let within_type = program.is_type_member(var_id);
    let in_protocol = program.enclosing_type(var_id).map(|t| t.is_protocol()).unwrap_or(false);
    let stored = within_type && !in_protocol;
    let overridden = within_type && var.overridden.is_some();
    let prefix = if within_type {
        if var.is_static { "static " } else { "" }
    } else {
        info.prefix.as_str()
    };

    let mut out = String::new();
    if !overridden || init.is_some() {
        let mut declared = info.name.clone();
        if stored {
            declared.push_str("$internal");
        }
        out.push('\n');
        out.push_str(prefix);
        out.push_str(&declared);
        if let Some(init) = &init {
            if stored && !var.is_static {
                s.add_struct_initializer(format!("this.{} = {}", declared, init));
            } else {
                out.push_str(&format!(" = {}", init));
            }
        }
    }
    if stored {
        out.push_str(&accessors(&info, prefix, overridden));
    }
    out.push_str(&info.tuple_init);
    Ok(out)
}

/// `x$get`/`get x` and, unless the property is read-only, `x$set`/`set x`.
fn accessors(info: &Binding, prefix: &str, overridden: bool) -> String {
    let n = &info.name;
    let (get_internal, set_internal) = if overridden {
        (format!("super.{}$get()", n), format!("super.{}$set($newValue)", n))
    } else {
        (format!("this.{}$internal", n), format!("this.{}$internal = $newValue", n))
    };
    let explicit = |kind: AccessorKind| info.accessors.get(&kind);

    let mut out = format!("\n{}{}$get", prefix, n);
    match explicit(AccessorKind::Get) {
        Some(get) => out.push_str(get),
        None => out.push_str(&format!("() {{ return {} }}", get_internal)),
    }
    out.push_str(&format!("\n{0}get {1}() {{ return this.{1}$get() }}", prefix, n));

    if explicit(AccessorKind::Set).is_none() && explicit(AccessorKind::Get).is_some() {
        return out;
    }
    out.push_str(&format!("\n{}{}$set", prefix, n));
    match explicit(AccessorKind::Set) {
        Some(set) => out.push_str(set),
        None => {
            let will_set = explicit(AccessorKind::WillSet);
            let did_set = explicit(AccessorKind::DidSet);
            out.push_str("($newValue) {");
            if let Some(body) = will_set {
                out.push_str(&format!("\nfunction $willSet{}", body));
            }
            if let Some(body) = did_set {
                out.push_str(&format!("\nfunction $didSet{}", body));
            }
            if did_set.is_some() {
                out.push_str(&format!("\nlet $oldValue = {}", get_internal));
            }
            if will_set.is_some() {
                out.push_str("\nif(this.$initialized) $willSet.call(this, $newValue)");
            }
            out.push_str(&format!("\n{}", set_internal));
            if did_set.is_some() {
                out.push_str("\nif(this.$initialized) $didSet.call(this, $oldValue)");
            }
            out.push_str("\n}");
        }
    }
    out.push_str(&format!("\n{0}set {1}($newValue) {{ this.{1}$set($newValue) }}", prefix, n));
    out
}

/// Subscripts print one method per explicit accessor: `subscript$get`
/// and `subscript$set`.
pub fn subscript(s: &mut Session<'_>, decl: &Decl) -> LowerResult<String> {
    let DeclKind::Subscript(sub) = &decl.kind else {
        return Err(LoweringError::invalid_tree(
            format!("`{}` is not a subscript", decl.name),
            "trellis.lower.storage.subscript",
        ));
    };
    let mut out = String::new();
    for accessor_id in &sub.accessors {
        let accessor = s.decl(*accessor_id)?;
        if accessor.is_implicit {
            continue;
        }
        let suffix = match accessor.as_function().and_then(|f| f.accessor_kind()) {
            Some(AccessorKind::Get) => "$get",
            Some(AccessorKind::Set) => "$set",
            _ => continue,
        };
        out.push('\n');
        out.push_str(&decl::function(s, accessor, decl.id, suffix)?);
    }
    Ok(out)
}
