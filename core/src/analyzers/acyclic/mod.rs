use crate::error::Level;
use crate::tree::{DeclId, DeclKind, Program};

use std::collections::HashMap;

use super::err::TreeError;

/// The chains the lowering passes walk to a fixed point: superclasses,
/// protocol inheritance, overrides and the parent links between
/// declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chain {
    Inheritance,
    Override,
    Parent,
}

impl Chain {
    fn describe(self) -> &'static str {
        match self {
            Chain::Inheritance => "inheritance",
            Chain::Override => "override",
            Chain::Parent => "parent",
        }
    }
}

fn edges(program: &Program, chain: Chain) -> HashMap<DeclId, Vec<DeclId>> {
    let mut edges: HashMap<DeclId, Vec<DeclId>> = HashMap::new();
    for decl in &program.decls {
        let targets: Vec<DeclId> = match chain {
            Chain::Inheritance => match &decl.kind {
                DeclKind::Nominal(n) => n
                    .superclass
                    .iter()
                    .chain(n.protocols.iter())
                    .filter_map(|t| t.nominal_decl())
                    .collect(),
                _ => Vec::new(),
            },
            Chain::Override => decl.overridden.into_iter().collect(),
            Chain::Parent => decl.parent.into_iter().collect(),
        };
        edges.insert(decl.id, targets);
    }
    edges
}

/// Find every cycle along `chain`. Each cycle is reported once, as the
/// path from its first visited declaration back to itself.
pub fn find_cycles(program: &Program, chain: Chain) -> Vec<Vec<DeclId>> {
    let edges = edges(program, chain);

    #[derive(PartialEq, Eq, Clone, Copy)]
    enum VisitState {
        Unseen,
        Visiting,
        Done,
    }

    fn dfs(
        node: DeclId,
        edges: &HashMap<DeclId, Vec<DeclId>>,
        state: &mut HashMap<DeclId, VisitState>,
        stack: &mut Vec<DeclId>,
        found_cycles: &mut Vec<Vec<DeclId>>,
    ) {
        state.insert(node, VisitState::Visiting);
        stack.push(node);

        if let Some(targets) = edges.get(&node) {
            for next in targets {
                match state.get(next).copied().unwrap_or(VisitState::Unseen) {
                    VisitState::Unseen => dfs(*next, edges, state, stack, found_cycles),
                    VisitState::Visiting => {
                        if let Some(pos) = stack.iter().position(|x| x == next) {
                            let mut cycle = stack[pos..].to_vec();
                            cycle.push(*next);
                            found_cycles.push(cycle);
                        }
                    }
                    VisitState::Done => {}
                }
            }
        }

        stack.pop();
        state.insert(node, VisitState::Done);
    }

    let mut state: HashMap<DeclId, VisitState> = HashMap::new();
    let mut stack: Vec<DeclId> = Vec::new();
    let mut found_cycles: Vec<Vec<DeclId>> = Vec::new();
    for decl in &program.decls {
        if state.get(&decl.id).copied().unwrap_or(VisitState::Unseen) == VisitState::Unseen {
            dfs(decl.id, &edges, &mut state, &mut stack, &mut found_cycles);
        }
    }
    found_cycles
}

/// Reject trees whose inheritance, override or parent chains loop.
pub fn analyze_acyclic_rules(program: &Program) -> Result<(), Vec<TreeError>> {
    let mut errors = Vec::new();
    for chain in [Chain::Inheritance, Chain::Override, Chain::Parent] {
        for cycle in find_cycles(program, chain) {
            let human: Vec<String> = cycle
                .iter()
                .map(|id| match program.get_decl(*id) {
                    Some(d) if !d.name.is_empty() => d.name.clone(),
                    _ => format!("#{}", id),
                })
                .collect();
            let location = cycle.first().and_then(|id| program.get_decl(*id)).and_then(|d| d.location.clone());
            errors.push(TreeError::with(
                Level::Error,
                format!("cycle in {} chain: {}", chain.describe(), human.join(" -> ")),
                "trellis.analyzers.acyclic",
                location,
                None,
            ));
        }
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
