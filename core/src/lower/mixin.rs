//! file: core/src/lower/mixin.rs
//! description: conformance linkage.
//!
//! A type picks up the default implementations of the protocols it
//! conforms to by copying the members of `P$implementation` onto itself
//! once every declaration of the module exists. Each copy is guarded by
//! `typeof` checks on every dotted prefix of the protocol path, so a
//! protocol that was never emitted (a pure requirement list, or a library
//! protocol without defaults) is skipped instead of throwing.

use std::collections::HashSet;

use crate::tree::{DeclId, Program};

/// One statement of linkage, emitted after the declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Link {
    /// Copy `protocol$implementation` onto `target` without replacing
    /// members `target` already defines.
    Conformance {
        target: String,
        protocol: String,
        /// Inheritance depth of the target when it is itself a protocol
        /// implementation; those link first, shallowest first.
        protocol_depth: Option<usize>,
    },
    /// Copy every member of `source` onto the built-in `native`.
    Data { native: String, source: String },
}

impl Link {
    pub fn render(&self) -> String {
        match self {
            Link::Conformance { target, protocol, .. } => guarded_mixin(target, protocol),
            Link::Data { native, source } => format!("_mixin({}, {}, true)", native, source),
        }
    }

    fn order(&self) -> (usize, usize) {
        match self {
            Link::Conformance { protocol_depth: Some(depth), .. } => (0, *depth),
            Link::Conformance { protocol_depth: None, .. } => (1, 0),
            Link::Data { .. } => (2, 0),
        }
    }
}

/// `if(typeof A != 'undefined' && typeof A.P$implementation != 'undefined') _mixin(T, A.P$implementation, false)`
pub fn guarded_mixin(target: &str, protocol: &str) -> String {
    let mut guards: Vec<String> = Vec::new();
    for (i, c) in protocol.char_indices() {
        if c == '.' && i > 0 {
            guards.push(format!("typeof {} != 'undefined'", &protocol[..i]));
        }
    }
    guards.push(format!("typeof {}$implementation != 'undefined'", protocol));
    format!("if({}) _mixin({}, {}$implementation, false)", guards.join(" && "), target, protocol)
}

/// Number of protocol inheritance levels above `protocol`.
pub fn protocol_depth(program: &Program, protocol: DeclId) -> usize {
    fn walk(program: &Program, id: DeclId, visiting: &mut HashSet<DeclId>) -> usize {
        if !visiting.insert(id) {
            return 0;
        }
        let parents: Vec<DeclId> = program
            .get_decl(id)
            .and_then(|d| d.as_nominal())
            .map(|n| n.protocols.iter().filter_map(|p| p.nominal_decl()).collect())
            .unwrap_or_default();
        let depth = parents.iter().map(|p| walk(program, *p, visiting) + 1).max().unwrap_or(0);
        visiting.remove(&id);
        depth
    }
    walk(program, protocol, &mut HashSet::new())
}

/// Render buffered linkage. Protocol implementations are linked to their
/// own parents before anything copies from them.
pub fn flush(mut links: Vec<Link>) -> String {
    links.sort_by_key(|l| l.order());
    let mut out = String::new();
    for link in links {
        out.push('\n');
        out.push_str(&link.render());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_dotted_prefix_is_guarded() {
        assert_eq!(
            guarded_mixin("T", "A.B.P"),
            "if(typeof A != 'undefined' && typeof A.B != 'undefined' && typeof A.B.P$implementation != 'undefined') _mixin(T, A.B.P$implementation, false)"
        );
        assert_eq!(
            guarded_mixin("T", "P"),
            "if(typeof P$implementation != 'undefined') _mixin(T, P$implementation, false)"
        );
    }

    #[test]
    fn protocol_links_flush_first() {
        let links = vec![
            Link::Conformance { target: "S".into(), protocol: "P".into(), protocol_depth: None },
            Link::Conformance { target: "P$implementation".into(), protocol: "Q".into(), protocol_depth: Some(2) },
            Link::Conformance { target: "Q$implementation".into(), protocol: "R".into(), protocol_depth: Some(1) },
        ];
        let text = flush(links);
        let q = text.find("_mixin(Q$implementation").expect("Q linked");
        let p = text.find("_mixin(P$implementation").expect("P linked");
        let s = text.find("_mixin(S,").expect("S linked");
        assert!(q < p && p < s, "linkage order was:\n{}", text);
    }
}
