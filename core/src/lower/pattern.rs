//! file: core/src/lower/pattern.rs
//! description: pattern flattener.
//!
//! A pattern is flattened into `(index path, leaf)` pairs: the index path
//! says where inside the matched value the leaf applies. Bindings, `if
//! let`, `switch` cases and `catch` clauses all consume the flat form.

use std::collections::HashMap;

use crate::tree::{AccessorKind, DeclKind, Pattern, PatternKind};

use super::decl;
use super::err::LowerResult;
use super::session::Session;

pub type IndexPath = Vec<usize>;

/// Flatten `pattern` in source order.
///
/// Paren, typed, `var`/`let` and optional-some wrappers add no path
/// segment. Enum-case and type-test patterns are leaves themselves and are
/// also descended into; a single-value enum payload gets the synthetic
/// index `0` so it addresses the payload the same way a tuple payload does.
pub fn flatten(pattern: &Pattern) -> Vec<(IndexPath, &Pattern)> {
    let mut out = Vec::new();
    walk(pattern, &[], &mut out);
    out
}

fn walk<'a>(pattern: &'a Pattern, access: &[usize], out: &mut Vec<(IndexPath, &'a Pattern)>) {
    match &pattern.kind {
        PatternKind::Tuple(elements) => {
            for (i, element) in elements.iter().enumerate() {
                let mut path = access.to_vec();
                path.push(i);
                walk(element, &path, out);
            }
        }
        PatternKind::Is { sub, .. } => {
            out.push((access.to_vec(), pattern));
            if let Some(sub) = sub {
                walk(sub, access, out);
            }
        }
        PatternKind::Paren(sub) | PatternKind::Typed(sub, _) | PatternKind::Var(sub) | PatternKind::OptionalSome(sub) => {
            walk(sub, access, out)
        }
        PatternKind::EnumElement { payload, .. } => {
            out.push((access.to_vec(), pattern));
            if let Some(sub) = payload {
                let mut path = access.to_vec();
                if !matches!(skip_wrappers(sub).kind, PatternKind::Tuple(_)) {
                    path.push(0);
                }
                walk(sub, &path, out);
            }
        }
        _ => out.push((access.to_vec(), pattern)),
    }
}

fn skip_wrappers(pattern: &Pattern) -> &Pattern {
    match &pattern.kind {
        PatternKind::Paren(sub) | PatternKind::Typed(sub, _) | PatternKind::Var(sub) => skip_wrappers(sub),
        _ => pattern,
    }
}

/// `root[0][1]` for the path `[0, 1]`.
pub fn path(root: &str, indexes: &[usize]) -> String {
    let mut out = root.to_string();
    for i in indexes {
        out.push_str(&format!("[{}]", i));
    }
    out
}

/// A flattened binding pattern, ready to be printed as a declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Binding {
    /// `const `, `let `, `static `, `readonly ` or a combination.
    pub prefix: String,
    /// The first bound variable.
    pub primary: Option<crate::tree::DeclId>,
    /// Name the declaration binds: the primary variable's name, or a
    /// synthetic tuple root when the pattern destructures.
    pub name: String,
    /// Lowered explicit accessors of the primary variable (signature and
    /// body).
    pub accessors: HashMap<AccessorKind, String>,
    /// `, x = $tuple0 && $tuple0[0]` for each name bound inside a tuple.
    pub tuple_init: String,
    /// Output names of every bound variable.
    pub bound: Vec<String>,
}

/// True when `text` uses `name` as a whole identifier.
fn mentions(text: &str, name: &str) -> bool {
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '$';
    let mut start = 0;
    while let Some(pos) = text[start..].find(name) {
        let begin = start + pos;
        let end = begin + name.len();
        let before = text[..begin].chars().next_back();
        let after = text[end..].chars().next();
        let preceded_by_dot = before == Some('.');
        if !before.map(is_ident).unwrap_or(false) && !preceded_by_dot && !after.map(is_ident).unwrap_or(false) {
            return true;
        }
        start = end;
    }
    false
}

/// Aggregate a flattened binding pattern. `init_text` is the lowered
/// initializer, used to detect a variable shadowing a name it reads.
pub fn bind(s: &mut Session<'_>, flattened: &[(IndexPath, &Pattern)], init_text: Option<&str>) -> LowerResult<Binding> {
    let program = s.program;
    let mut binding = Binding::default();

    for (indexes, leaf) in flattened {
        let PatternKind::Named(var_id) = leaf.kind else { continue };
        let var = s.decl(var_id)?;
        let mut var_name = s.name(var_id)?;

        if init_text.map(|t| mentions(t, &var_name)).unwrap_or(false) {
            var_name.push_str("_dupl");
            let key = s.key(var_id);
            s.names.rename_by_key(&key, &var_name);
        }

        if binding.primary.is_none() {
            binding.primary = Some(var_id);
            let is_let = var.as_var().map(|v| v.is_let).unwrap_or(false);
            if !program.is_type_member(var_id) {
                binding.prefix.push_str(if is_let { "const " } else { "let " });
            } else {
                if var.is_static {
                    binding.prefix.push_str("static ");
                }
                if is_let {
                    binding.prefix.push_str("readonly ");
                }
            }
            binding.name = if indexes.is_empty() { var_name.clone() } else { s.fresh("$tuple") };

            let in_protocol = program.enclosing_type(var_id).map(|t| t.is_protocol()).unwrap_or(false);
            if !in_protocol {
                if let DeclKind::Var(v) = &var.kind {
                    for accessor_id in &v.accessors {
                        let accessor = s.decl(*accessor_id)?;
                        if accessor.is_implicit {
                            continue;
                        }
                        let Some(kind) = accessor.as_function().and_then(|f| f.accessor_kind()) else { continue };
                        let text = decl::signature_and_body(s, accessor, false)?;
                        binding.accessors.insert(kind, text);
                    }
                }
            }
        }

        if !indexes.is_empty() {
            binding.tuple_init.push_str(&format!(", {} = {}", var_name, binding.name));
            for depth in 1..=indexes.len() {
                binding.tuple_init.push_str(&format!(" && {}", path(&binding.name, &indexes[..depth])));
            }
        }
        binding.bound.push(var_name);
    }
    Ok(binding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{DeclId, Type};

    fn named(i: usize) -> Pattern {
        Pattern::named(DeclId(i))
    }

    #[test]
    fn tuple_paths_follow_positions() {
        let p = Pattern::tuple(vec![named(1), Pattern::tuple(vec![Pattern::any(), named(2)])]);
        let flat = flatten(&p);
        let paths: Vec<IndexPath> = flat.iter().map(|(ix, _)| ix.clone()).collect();
        assert_eq!(paths, vec![vec![0], vec![1, 0], vec![1, 1]]);
    }

    #[test]
    fn single_payload_gets_synthetic_index() {
        let p = Pattern::new(PatternKind::EnumElement {
            ty: Type::nominal(DeclId(0)),
            element: DeclId(3),
            payload: Some(Box::new(Pattern::new(PatternKind::Paren(Box::new(named(4)))))),
        });
        let flat = flatten(&p);
        assert_eq!(flat.len(), 2, "enum leaf plus its payload binding");
        assert!(flat[0].0.is_empty());
        assert_eq!(flat[1].0, vec![0]);
    }

    #[test]
    fn tuple_payload_uses_its_own_indexes() {
        let p = Pattern::new(PatternKind::EnumElement {
            ty: Type::nominal(DeclId(0)),
            element: DeclId(3),
            payload: Some(Box::new(Pattern::tuple(vec![named(4), named(5)]))),
        });
        let paths: Vec<IndexPath> = flatten(&p).iter().map(|(ix, _)| ix.clone()).collect();
        assert_eq!(paths, vec![vec![], vec![0], vec![1]]);
    }

    #[test]
    fn identifier_mentions_respect_boundaries() {
        assert!(mentions("x + 1", "x"));
        assert!(mentions("f(null, x)", "x"));
        assert!(!mentions("max", "x"));
        assert!(!mentions("this.x", "x"));
        assert!(!mentions("x1", "x"));
    }

    #[test]
    fn path_indexes_root() {
        assert_eq!(path("$match", &[0, 2]), "$match[0][2]");
        assert_eq!(path("$match", &[]), "$match");
    }
}
