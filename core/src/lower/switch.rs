//! file: core/src/lower/switch.rs
//! description: `switch` and `catch` lowering.
//!
//! The subject is stored once in `$match`. Consecutive cases chained by
//! `fallthrough` form one group: the group's outer `if` tests the
//! disjunction of every case in it, and each body past the first sits in
//! a nested `if` over the conditions of the cases up to it, so a match on
//! an earlier case runs every later body of the chain.

use crate::tree::{CaseLabel, CatchClause, Expr, Pattern, PatternKind, SwitchCase};

use super::call::OPTIONAL_NONE_KEY;
use super::err::LowerResult;
use super::expr;
use super::pattern::{self, flatten};
use super::session::Session;
use super::stmt;
use super::types;

pub const MATCH_ROOT: &str = "$match";

/// Condition text for one pattern against `root`, or `None` when the
/// pattern always matches.
pub fn pattern_condition(s: &mut Session<'_>, root: &str, p: &Pattern) -> LowerResult<Option<String>> {
    let mut tests: Vec<String> = Vec::new();
    for (indexes, leaf) in flatten(p) {
        let at = pattern::path(root, &indexes);
        match &leaf.kind {
            PatternKind::Expr { match_expr, match_var } => {
                let name = s.name(*match_var)?;
                let previous = s.names.push_replacement(&name, &at);
                let text = expr::lower(s, match_expr);
                s.names.pop_replacement(&name, previous);
                tests.push(format!("({})", text?));
            }
            PatternKind::EnumElement { ty, element, .. } => {
                if s.key(*element) == OPTIONAL_NONE_KEY {
                    tests.push(format!("{} == null", at));
                    continue;
                }
                let case = s.decl(*element)?;
                let call = if case.params().is_empty() { "" } else { "()" };
                let owner = types::spell(s, ty)?;
                let case_name = s.name(*element)?;
                tests.push(format!("{}.rawValue == {}.{}{}.rawValue", at, owner, case_name, call));
            }
            PatternKind::Is { ty, .. } => {
                tests.push(format!("{} instanceof {}", at, types::spell(s, ty)?));
            }
            PatternKind::Bool(b) => tests.push(format!("{} == {}", at, b)),
            _ => {}
        }
    }
    Ok(if tests.is_empty() { None } else { Some(tests.join(" && ")) })
}

/// `(pattern && (guard))` for one case label. Inside the guard every name
/// the pattern binds reads straight from its path under `root`.
pub fn label_condition(s: &mut Session<'_>, root: &str, p: &Pattern, guard: Option<&Expr>) -> LowerResult<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(c) = pattern_condition(s, root, p)? {
        parts.push(c);
    }
    if let Some(guard) = guard {
        let mut restore: Vec<(String, Option<String>)> = Vec::new();
        for (indexes, leaf) in flatten(p) {
            if let PatternKind::Named(var) = leaf.kind {
                let name = s.name(var)?;
                let previous = s.names.push_replacement(&name, &pattern::path(root, &indexes));
                restore.push((name, previous));
            }
        }
        let text = expr::lower(s, guard);
        for (name, previous) in restore.into_iter().rev() {
            s.names.pop_replacement(&name, previous);
        }
        parts.push(format!("({})", text?));
    }
    Ok(format!("({})", if parts.is_empty() { "true".to_string() } else { parts.join(" && ") }))
}

/// `\nconst x = $match[0]` for every name the pattern binds.
pub fn pattern_declarations(s: &mut Session<'_>, root: &str, p: &Pattern) -> LowerResult<String> {
    let mut out = String::new();
    for (indexes, leaf) in flatten(p) {
        if let PatternKind::Named(var) = leaf.kind {
            let declared = s.name(var)?;
            let init = pattern::path(root, &indexes);
            if declared == init {
                continue;
            }
            out.push_str(&format!("\nconst {} = {}", declared, init));
        }
    }
    Ok(out)
}

fn case_conditions(s: &mut Session<'_>, labels: &[CaseLabel]) -> LowerResult<String> {
    let mut parts = Vec::with_capacity(labels.len());
    for label in labels {
        parts.push(label_condition(s, MATCH_ROOT, &label.pattern, label.guard_expr.as_ref())?);
    }
    Ok(parts.join(" || "))
}

fn case_declarations(s: &mut Session<'_>, labels: &[CaseLabel]) -> LowerResult<String> {
    let mut out = String::new();
    for label in labels {
        out.push_str(&pattern_declarations(s, MATCH_ROOT, &label.pattern)?);
    }
    Ok(out)
}

/// Disjunction of the conditions of `cases[from..=to]`.
fn chain_condition(s: &mut Session<'_>, cases: &[SwitchCase], from: usize, to: usize) -> LowerResult<String> {
    let mut parts = Vec::with_capacity(to - from + 1);
    for case in &cases[from..=to] {
        parts.push(case_conditions(s, &case.labels)?);
    }
    Ok(format!("(({}))", parts.join(") || (")))
}

pub fn lower_switch(s: &mut Session<'_>, subject: &Expr, cases: &[SwitchCase]) -> LowerResult<String> {
    let label = s.fresh("$switch");
    let subject = expr::lower(s, subject)?;
    s.push_switch_label(label.clone());
    let body = lower_cases(s, cases);
    s.pop_switch_label();
    Ok(format!("\n{}: {{\nconst {} = {}{}\n}}", label, MATCH_ROOT, subject, body?))
}

fn lower_cases(s: &mut Session<'_>, cases: &[SwitchCase]) -> LowerResult<String> {
    let mut out = String::new();
    let n = cases.len();
    let mut i = 0;
    while i < n {
        out.push('\n');
        if i > 0 {
            out.push_str("else ");
        }
        // Length of the fallthrough chain starting at `i`.
        let mut j = 0;
        while i + j + 1 < n && cases[i + j].falls_through() {
            j += 1;
        }
        out.push_str(&format!("if{} {{", chain_condition(s, cases, i, i + j)?));
        for k in i..=i + j {
            if k < i + j {
                out.push_str(&format!("if{} {{", chain_condition(s, cases, i, k)?));
            }
            out.push_str(&case_declarations(s, &cases[k].labels)?);
            out.push_str(&stmt::lower_block(s, &cases[k].body)?);
            if k < i + j {
                out.push_str("\n}");
            }
        }
        out.push_str("\n}");
        i += j + 1;
    }
    Ok(out)
}

/// `try {..} catch(error) {if(..) {..} else throw error}`.
pub fn lower_do_catch(s: &mut Session<'_>, body: &crate::tree::Stmt, catches: &[CatchClause]) -> LowerResult<String> {
    let root = "error";
    let mut out = format!("try {{{}\n}} catch({}) {{", stmt::lower_block(s, body)?, root);
    for (i, clause) in catches.iter().enumerate() {
        out.push('\n');
        if i > 0 {
            out.push_str("else ");
        }
        let cond = label_condition(s, root, &clause.pattern, clause.guard_expr.as_ref())?;
        out.push_str(&format!("if({}) {{", cond));
        out.push_str(&pattern_declarations(s, root, &clause.pattern)?);
        out.push_str(&stmt::lower_block(s, &clause.body)?);
        out.push_str("\n}");
    }
    if catches.is_empty() {
        out.push_str(&format!("\nthrow {}", root));
    } else {
        out.push_str(&format!("\nelse throw {}", root));
    }
    out.push_str("\n}");
    Ok(out)
}
