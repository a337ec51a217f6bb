//! file: core/src/lower/names.rs
//! description: identifier and name table.
//!
//! Every declaration that reaches the output gets a stable target name.
//! Names are derived from the declaration's canonical root: the top of its
//! override chain, then the protocol requirement it satisfies. A qualified
//! key (module, enclosing types, base name, signature, location) identifies
//! each root; the table memoizes function names by key so overloads keep
//! the suffix they were first given.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use log::debug;

use crate::config::LoweringOptions;
use crate::tree::{Decl, DeclId, DeclKind, FunctionKind, Program, Visibility};

use super::err::{LowerResult, LoweringError};

/// Rendered in logs where a duplicate-name request has no requirement to
/// alias.
pub const NO_DUPLICATE: &str = "!NO_DUPLICATE";

/// Prefix given to library types when lowering the library itself.
pub const MIXIN_PREFIX: &str = "MIO_Mixin_";

lazy_static! {
    static ref RESERVED_WORDS: HashSet<&'static str> = [
        "abstract", "else", "instanceof", "super", "switch", "break", "export", "interface",
        "synchronized", "byte", "extends", "let", "this", "case", "false", "throw", "catch",
        "final", "native", "throws", "finally", "new", "class", "null", "true", "const", "for",
        "package", "try", "continue", "function", "private", "typeof", "debugger", "goto",
        "protected", "var", "default", "if", "public", "delete", "implements", "return",
        "volatile", "do", "import", "while", "in", "of", "static", "with", "alert", "frames",
        "outerHeight", "all", "frameRate", "outerWidth", "anchor", "packages", "anchors",
        "getClass", "pageXOffset", "area", "hasOwnProperty", "pageYOffset", "hidden", "parent",
        "assign", "history", "parseFloat", "blur", "image", "parseInt", "button", "images",
        "password", "checkbox", "Infinity", "pkcs11", "clearInterval", "isFinite", "plugin",
        "clearTimeout", "isNaN", "prompt", "clientInformation", "isPrototypeOf",
        "propertyIsEnum", "close", "java", "prototype", "closed", "radio", "confirm", "reset",
        "constructor", "screenX", "crypto", "screenY", "Date", "innerHeight", "scroll",
        "decodeURI", "innerWidth", "secure", "decodeURIComponent", "layer", "select",
        "defaultStatus", "layers", "self", "document", "length", "setInterval", "element",
        "link", "setTimeout", "elements", "location", "status", "embed", "Math", "embeds",
        "mimeTypes", "submit", "encodeURI", "name", "taint", "encodeURIComponent", "NaN", "text",
        "escape", "navigate", "textarea", "eval", "navigator", "top", "event", "Number",
        "toString", "fileUpload", "Object", "undefined", "focus", "offscreenBuffering",
        "unescape", "form", "open", "untaint", "forms", "opener", "valueOf", "frame", "option",
        "window", "onbeforeunload", "ondragdrop", "onkeyup", "onmouseover", "onblur", "onerror",
        "onload", "onmouseup", "onfocus", "onmousedown", "onreset", "onclick", "onkeydown",
        "onmousemove", "onsubmit", "oncontextmenu", "onkeypress", "onmouseout", "onunload",
        "arguments",
    ]
    .into_iter()
    .collect();

    /// Library names that would shadow built-in prototype methods of the
    /// target's arrays and strings.
    static ref BUILTIN_PROTOTYPE_METHODS: HashSet<&'static str> =
        ["reduce", "indexOf", "lastIndexOf", "map", "filter", "sort", "forEach"].into_iter().collect();

    /// Fixed names for library members whose label-derived name would be
    /// ambiguous.
    static ref SEEDED_NAMES: Vec<(&'static str, &'static str)> = vec![
        ("Swift.(file).RandomAccessCollection.subscript(_:Range<Self.Index>)", "subscriptRange"),
        ("Swift.(file).MutableCollection.subscript(_:Range<Self.Index>)", "subscriptRange"),
        ("Swift.(file).BidirectionalCollection.subscript(_:Range<Self.Index>)", "subscriptRange"),
        ("Swift.(file).Collection.subscript(_:Range<Self.Index>)", "subscriptRange"),
        ("Swift.(file).RangeReplaceableCollection.subscript(_:Range<Self.Index>)", "subscriptRange"),
        ("Swift.(file).RangeReplaceableCollection.init(_:S)", "initBuffer"),
        ("Swift.(file)._ArrayProtocol.init(_:Self._Buffer)", "initBuffer"),
        ("Swift.(file).SetAlgebra.init(_:S)", "initSource"),
        ("Swift.(file).Set.insert(_:ConcreteElement)", "insertConcreteElement"),
        ("Swift.(file).RangeReplaceableCollection.removeLast(_:Int)", "removeLastMultiple"),
        ("Swift.(file).RangeReplaceableCollection.removeFirst(_:Int)", "removeFirstMultiple"),
    ];
}

pub fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS.contains(name)
}

/// `==` with infix fixity becomes `infix_61_61`.
pub fn operator_name(fixity: crate::tree::Fixity, symbol: &str) -> String {
    let mut out = fixity.tag().to_string();
    for c in symbol.chars() {
        out.push_str(&format!("_{}", c as u32));
    }
    out
}

/// Whether the declaration is provided by a runtime library module.
pub fn is_native(options: &LoweringOptions, decl: &Decl) -> bool {
    options.is_native_module(&decl.module)
}

/// Names of the contexts enclosing `decl`, outermost first. Extensions
/// contribute the path of the nominal they extend.
pub fn context_path(program: &Program, decl: &Decl) -> Vec<String> {
    let mut path: Vec<String> = Vec::new();
    let mut cur = decl.parent.and_then(|p| program.get_decl(p));
    let mut guard = program.decls.len() + 1;
    while let Some(d) = cur {
        guard = guard.saturating_sub(1);
        if guard == 0 {
            break;
        }
        match &d.kind {
            DeclKind::Extension(ext) => {
                if let Some(n) = ext.extended.nominal_decl().and_then(|n| program.get_decl(n)) {
                    path.push(n.name.clone());
                    let mut outer = context_path(program, n);
                    outer.reverse();
                    path.extend(outer);
                }
                break;
            }
            DeclKind::PatternBinding(_) => {}
            _ => {
                if !d.name.is_empty() {
                    path.push(d.name.clone());
                }
            }
        }
        cur = d.parent.and_then(|p| program.get_decl(p));
    }
    path.reverse();
    path
}

fn key_base_name(program: &Program, decl: &Decl) -> String {
    match &decl.kind {
        DeclKind::Function(f) => match &f.kind {
            FunctionKind::Accessor { kind, storage } => {
                let storage_name = program.get_decl(*storage).map(|s| s.name.as_str()).unwrap_or("_");
                format!("{}${:?}", storage_name, kind)
            }
            _ => match f.operator {
                Some(fixity) => format!("{}{}", decl.name, fixity.tag()),
                None => decl.name.clone(),
            },
        },
        _ => decl.name.clone(),
    }
}

/// The qualified origin key of a declaration, e.g.
/// `Swift.(file).Array.append(_:Element)`.
pub fn qualified_key(program: &Program, options: &LoweringOptions, id: DeclId) -> String {
    let decl = match program.get_decl(id) {
        Some(d) => d,
        None => return format!("<missing {}>", id),
    };
    let mut key = format!("{}.(file)", decl.module);
    for segment in context_path(program, decl) {
        key.push('.');
        key.push_str(&segment);
    }
    key.push('.');
    key.push_str(&key_base_name(program, decl));

    if decl.is_callable() {
        let params: Vec<String> = decl
            .params()
            .iter()
            .filter_map(|p| program.get_decl(*p))
            .map(|p| {
                let label = p.as_param().and_then(|pd| pd.label.clone()).unwrap_or_else(|| "_".to_string());
                let ty = p.as_param().map(|pd| pd.ty.source_spelling(program)).unwrap_or_default();
                format!("{}:{}", label, ty)
            })
            .collect();
        key.push_str(&format!("({})", params.join(",")));
    }

    if options.locations_in_keys {
        if let Some(loc) = &decl.location {
            key.push_str(&format!("@{}:{}:{}", loc.file, loc.line, loc.column));
        }
    }
    key
}

/// Follow `overridden` edges to the top of the chain.
pub fn override_top(program: &Program, id: DeclId) -> DeclId {
    let mut cur = id;
    let mut guard = program.decls.len() + 1;
    while let Some(next) = program.get_decl(cur).and_then(|d| d.overridden) {
        guard = guard.saturating_sub(1);
        if guard == 0 {
            break;
        }
        cur = next;
    }
    cur
}

/// Canonical root of `id`: the top of its override chain, then its
/// `requirement`-th satisfied protocol requirement. `None` when a
/// requirement past the first is asked for and does not exist.
pub fn resolve_root(program: &Program, id: DeclId, requirement: usize) -> Option<DeclId> {
    let root = override_top(program, id);
    let requirements = program.get_decl(root).map(|d| d.requirements.as_slice()).unwrap_or(&[]);
    if requirement > 0 && requirement >= requirements.len() {
        return None;
    }
    match requirements.get(requirement) {
        Some(req) => Some(override_top(program, *req)),
        None => Some(root),
    }
}

/// Number of protocol requirements the root of `id` satisfies.
pub fn requirement_count(program: &Program, id: DeclId) -> usize {
    let top = override_top(program, id);
    program.get_decl(top).map(|d| d.requirements.len()).unwrap_or(0)
}

fn inherits_from_test_case(program: &Program, options: &LoweringOptions, nominal: &Decl) -> bool {
    let mut cur = Some(nominal);
    let mut guard = program.decls.len() + 1;
    while let Some(d) = cur {
        guard = guard.saturating_sub(1);
        if guard == 0 {
            return false;
        }
        if qualified_key(program, options, d.id) == "XCTest.(file).XCTestCase" {
            return true;
        }
        cur = d
            .as_nominal()
            .and_then(|n| n.superclass.as_ref())
            .and_then(|s| s.nominal_decl())
            .and_then(|s| program.get_decl(s));
    }
    false
}

#[derive(Debug, Clone, Default)]
pub struct NameTable {
    /// Function and subscript names by qualified key. Write-once.
    function_names: HashMap<String, String>,
    /// Overload counters per base name, module-wide.
    overload_counts: HashMap<String, usize>,
    /// `(emission scope, name)` -> key of the root that owns it.
    claims: HashMap<(String, String), String>,
    /// Transient overlay by output name (pattern paths while lowering a
    /// match arm).
    replacements: HashMap<String, String>,
    /// Renames by qualified key (shadowed pattern variables).
    replacements_by_key: HashMap<String, String>,
}

impl NameTable {
    pub fn new() -> Self {
        let mut table = NameTable::default();
        for (key, name) in SEEDED_NAMES.iter() {
            table.function_names.insert(key.to_string(), name.to_string());
        }
        table
    }

    /// Output name for `id` as the `requirement`-th alias of its root, or
    /// `None` when that requirement does not exist.
    pub fn name_for(
        &mut self,
        program: &Program,
        options: &LoweringOptions,
        id: DeclId,
        requirement: usize,
    ) -> LowerResult<Option<String>> {
        let issuer = "trellis.lower.names.name_for";
        let root_id = match resolve_root(program, id, requirement) {
            Some(r) => r,
            None => {
                debug!("{} has no requirement {} ({})", id, requirement, NO_DUPLICATE);
                return Ok(None);
            }
        };
        let root = program
            .get_decl(root_id)
            .ok_or_else(|| LoweringError::invalid_tree(format!("declaration {} is not in the program", root_id), issuer))?;
        let key = qualified_key(program, options, root_id);

        let mut name = if root.is_callable() {
            self.function_name(program, options, root, &key)
        } else if root.name.is_empty() {
            "_".to_string()
        } else {
            root.name.clone()
        };

        if options.library_mode && super::library::native_type_for_key(&key).is_some() {
            name = format!("{}{}", MIXIN_PREFIX, name);
        }

        if let Some(r) = self.replacements.get(&name) {
            return Ok(Some(r.clone()));
        }
        if let Some(r) = self.replacements_by_key.get(&key) {
            return Ok(Some(r.clone()));
        }

        if is_reserved(&name) {
            name = format!("_{}", name);
        }

        if requirement == 0 {
            if let Some(decl) = program.get_decl(id) {
                self.claim(program, options, decl, &name, &key)?;
            }
        }
        Ok(Some(name))
    }

    /// Shorthand for the primary name of a declaration.
    pub fn name(&mut self, program: &Program, options: &LoweringOptions, id: DeclId) -> LowerResult<String> {
        Ok(self.name_for(program, options, id, 0)?.unwrap_or_else(|| "_".to_string()))
    }

    fn function_name(&mut self, program: &Program, options: &LoweringOptions, decl: &Decl, key: &str) -> String {
        if let Some(n) = self.function_names.get(key) {
            return n.clone();
        }

        let mut name = match decl.as_function().and_then(|f| f.operator) {
            Some(fixity) => operator_name(fixity, &decl.name),
            None => decl.name.clone(),
        };

        if matches!(decl.visibility, Visibility::FilePrivate | Visibility::Private) {
            let in_test_case = program
                .enclosing_type(decl.id)
                .and_then(|t| program.extended_nominal(t.id))
                .map(|n| inherits_from_test_case(program, options, n))
                .unwrap_or(false);
            if in_test_case {
                name.push_str("$filePrivate");
            }
        }

        if !is_native(options, decl) {
            let count = self.overload_counts.entry(name.clone()).or_insert(0);
            let ordinal = *count;
            *count += 1;
            if ordinal > 0 {
                name = format!("{}{}", name, ordinal);
            }
        } else {
            let is_init = name == "init";
            for p in decl.params().iter().filter_map(|p| program.get_decl(*p)) {
                let Some(param) = p.as_param() else { continue };
                if let Some(label) = param.label.as_deref().filter(|l| *l != "_") {
                    let mut chars = label.chars();
                    if let Some(first) = chars.next() {
                        name.push_str(&first.to_uppercase().to_string());
                        name.push_str(chars.as_str());
                    }
                }
                if is_init {
                    let spelled: String = param
                        .ty
                        .source_spelling(program)
                        .chars()
                        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
                        .collect();
                    name.push_str(&spelled.replace(MIXIN_PREFIX, ""));
                }
            }
            if BUILTIN_PROTOTYPE_METHODS.contains(name.as_str()) {
                name.push_str("Swift");
            }
        }

        debug!("function name {} -> {}", key, name);
        self.function_names.insert(key.to_string(), name.clone());
        name
    }

    /// Record that `decl` emits `name` in its scope. A different root
    /// already owning the name there is an invariant failure.
    fn claim(&mut self, program: &Program, options: &LoweringOptions, decl: &Decl, name: &str, key: &str) -> LowerResult<()> {
        if is_native(options, decl) {
            return Ok(());
        }
        let scope = match decl.parent.and_then(|p| program.get_decl(p)) {
            None => decl.module.clone(),
            Some(p) => match &p.kind {
                DeclKind::Nominal(_) | DeclKind::Extension(_) => match program.extended_nominal(p.id) {
                    Some(n) => qualified_key(program, options, n.id),
                    None => return Ok(()),
                },
                _ => return Ok(()),
            },
        };
        if matches!(decl.kind, DeclKind::Param(_) | DeclKind::GenericParam | DeclKind::PatternBinding(_)) {
            return Ok(());
        }
        if let DeclKind::Function(f) = &decl.kind {
            if matches!(f.kind, FunctionKind::Accessor { .. }) {
                return Ok(());
            }
        }
        let slot = (scope.clone(), name.to_string());
        match self.claims.get(&slot) {
            Some(owner) if owner != key => Err(LoweringError::collision(
                format!("name `{}` in `{}` is claimed by both `{}` and `{}`", name, scope, owner, key),
                "trellis.lower.names.claim",
                decl.location.clone(),
            )),
            Some(_) => Ok(()),
            None => {
                self.claims.insert(slot, key.to_string());
                Ok(())
            }
        }
    }

    // ------- Overlay helpers -------

    /// Map an output name to replacement text; returns the previous mapping
    /// so callers can restore it.
    pub fn push_replacement(&mut self, name: &str, replacement: &str) -> Option<String> {
        self.replacements.insert(name.to_string(), replacement.to_string())
    }

    pub fn pop_replacement(&mut self, name: &str, previous: Option<String>) {
        match previous {
            Some(p) => {
                self.replacements.insert(name.to_string(), p);
            }
            None => {
                self.replacements.remove(name);
            }
        }
    }

    pub fn clear_replacements(&mut self) {
        self.replacements.clear();
    }

    pub fn rename_by_key(&mut self, key: &str, name: &str) {
        self.replacements_by_key.insert(key.to_string(), name.to_string());
    }

    /// Function names assigned so far, by key.
    pub fn assigned_function_names(&self) -> &HashMap<String, String> {
        &self.function_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Fixity;

    #[test]
    fn operator_names_use_char_codes() {
        assert_eq!(operator_name(Fixity::Infix, "=="), "infix_61_61");
        assert_eq!(operator_name(Fixity::Prefix, "-"), "prefix_45");
        assert_eq!(operator_name(Fixity::Postfix, "!"), "postfix_33");
    }

    #[test]
    fn reserved_words_include_browser_globals() {
        assert!(is_reserved("delete"));
        assert!(is_reserved("onmouseover"));
        assert!(is_reserved("arguments"));
        assert!(!is_reserved("count"));
    }
}
