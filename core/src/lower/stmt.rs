//! file: core/src/lower/stmt.rs
//! description: statement lowerer.
//!
//! Statements lower to newline-separated target statements. Blocks own
//! their `defer` cleanups: each `defer` opens a `try` that the enclosing
//! block closes with a `finally`, innermost first, so cleanups run in
//! reverse order of registration on every exit from the block.

use log::trace;

use crate::tree::{BraceElement, Condition, PatternKind, Stmt, StmtKind};

use super::call;
use super::decl;
use super::err::LowerResult;
use super::expr;
use super::pattern::{self, flatten};
use super::session::Session;
use super::switch;

/// Lower one statement.
pub fn lower_stmt(s: &mut Session<'_>, st: &Stmt) -> LowerResult<String> {
    lower_kind(s, st).map_err(|err| err.at(st.location.as_ref()))
}

/// Lower the contents of a block (without the surrounding braces). A body
/// that is a single statement is treated as a block of one.
pub fn lower_block(s: &mut Session<'_>, st: &Stmt) -> LowerResult<String> {
    match &st.kind {
        StmtKind::Brace(elements) => lower_brace(s, elements),
        _ => {
            let block = s.open_block();
            let text = lower_stmt(s, st);
            let cleanups = close(s, block);
            Ok(format!("\n{};{}", text?, cleanups))
        }
    }
}

fn lower_brace(s: &mut Session<'_>, elements: &[BraceElement]) -> LowerResult<String> {
    let block = s.open_block();
    let mut out = String::new();
    for element in elements {
        let text = match element {
            BraceElement::Stmt(st) => lower_stmt(s, st),
            BraceElement::Expr(e) => expr::lower(s, e),
            BraceElement::Decl(id) => decl::lower_local(s, *id),
        };
        match text {
            Ok(text) => {
                out.push('\n');
                out.push_str(&text);
                out.push(';');
            }
            Err(err) => {
                close(s, block);
                return Err(err);
            }
        }
    }
    out.push_str(&close(s, block));
    Ok(out)
}

/// Close `block`, returning the `finally` that ends the `try` of each of
/// its deferred cleanups.
fn close(s: &mut Session<'_>, block: usize) -> String {
    let mut out = String::new();
    for cleanup in s.close_block(block) {
        trace!("closing cleanup {} of block {}", cleanup.name, block);
        out.push_str(&format!("}}finally{{{}()}}", cleanup.name));
    }
    out
}

fn lower_kind(s: &mut Session<'_>, st: &Stmt) -> LowerResult<String> {
    match &st.kind {
        StmtKind::Brace(elements) => Ok(format!("{{{}\n}}", lower_brace(s, elements)?)),
        StmtKind::Return(None) => Ok("return".to_string()),
        StmtKind::Return(Some(e)) => Ok(format!("return {}", expr::lower(s, e)?)),
        StmtKind::Throw(e) => Ok(format!("throw {}", expr::lower(s, e)?)),
        StmtKind::Break { from_switch } => match s.current_switch_label() {
            Some(label) if *from_switch => Ok(format!("break {}", label)),
            _ => Ok("break".to_string()),
        },
        StmtKind::Continue => Ok("continue".to_string()),
        // Chained cases are already grouped by the switch.
        StmtKind::Fallthrough => Ok(String::new()),
        StmtKind::Fail => Ok("return (this.$failed = true)".to_string()),
        StmtKind::Defer(body) => {
            let name = s.fresh("$defer");
            let body = lower_block(s, body)?;
            s.register_cleanup(name.clone())?;
            Ok(format!("let {} = () => {{{}\n}}\ntry {{", name, body))
        }
        StmtKind::If { conditions, then, otherwise } => {
            let (cond, inits) = lower_conditions(s, conditions)?;
            let mut out = format!("\n{{{}\nif({}) {{{}\n}}", inits, cond, lower_block(s, then)?);
            if let Some(otherwise) = otherwise {
                out.push_str(&format!("\nelse {{{}\n}}", lower_block(s, otherwise)?));
            }
            out.push_str("\n}");
            Ok(out)
        }
        // Names bound by `guard` stay visible after it, so no block here.
        StmtKind::Guard { conditions, body } => {
            let (cond, inits) = lower_conditions(s, conditions)?;
            Ok(format!("{}\nif(!({})) {{{}\n}}", inits, cond, lower_block(s, body)?))
        }
        StmtKind::While { conditions, body } => {
            let (cond, inits) = lower_conditions(s, conditions)?;
            Ok(format!("while(true){{{}\nif(!({})) break;{}\n}}", inits, cond, lower_block(s, body)?))
        }
        StmtKind::RepeatWhile { body, cond } => {
            let body = lower_block(s, body)?;
            Ok(format!("do {{{}\n}} while({})", body, expr::lower(s, cond)?))
        }
        StmtKind::ForEach { pattern, sequence, make_iterator, next, where_expr, body } => {
            let sequence = expr::lower(s, sequence)?;
            let iterator = s.fresh("$iterator");
            let make = call::invoke(s, *make_iterator, &sequence)?;
            let next = call::invoke(s, *next, &iterator)?;

            let flat = flatten(pattern);
            let binding = pattern::bind(s, &flat, None)?;
            let mut out = format!("\n{{\nconst {} = {}\nwhile(true) {{\n", iterator, make);
            if binding.bound.is_empty() {
                out.push_str(&format!("if({} == null) break;\n", next));
            } else {
                let value = match (binding.primary, binding.tuple_init.is_empty()) {
                    (Some(var), true) => {
                        let ty = s.decl(var)?.as_var().map(|v| v.ty.clone());
                        match ty {
                            Some(ty) => expr::clone_of_type(s, &ty, &next),
                            None => next,
                        }
                    }
                    _ => next,
                };
                out.push_str(&format!(
                    "{}{} = {}{};\nif(!({})) break;\n",
                    binding.prefix,
                    binding.name,
                    value,
                    binding.tuple_init,
                    non_null(&binding.bound)
                ));
            }
            if let Some(where_expr) = where_expr {
                out.push_str(&format!("\nif(!({})) continue;", expr::lower(s, where_expr)?));
            }
            out.push_str(&lower_block(s, body)?);
            out.push_str("\n}\n}");
            Ok(out)
        }
        StmtKind::Switch { subject, cases } => switch::lower_switch(s, subject, cases),
        StmtKind::DoCatch { body, catches } => switch::lower_do_catch(s, body, catches),
        StmtKind::Do(body) => Ok(format!("{{{}\n}}", lower_block(s, body)?)),
    }
}

fn non_null(names: &[String]) -> String {
    names.iter().map(|n| format!("({} != null)", n)).collect::<Vec<_>>().join(" && ")
}

/// Lower a condition list into `(condition, hoisted initializers)`. The
/// initializers of binding conditions run before the combined test, so an
/// initializer with side effects runs even when an earlier condition fails.
pub fn lower_conditions(s: &mut Session<'_>, conditions: &[Condition]) -> LowerResult<(String, String)> {
    let mut tests: Vec<String> = Vec::with_capacity(conditions.len());
    let mut inits = String::new();
    for condition in conditions {
        match condition {
            Condition::Boolean(e) => tests.push(format!("({})", expr::lower(s, e)?)),
            Condition::OptionalBinding { pattern, init } => {
                let value = expr::lower(s, init)?;
                let value = expr::clone_value(s, init, value);
                let flat = flatten(pattern);
                let binding = pattern::bind(s, &flat, Some(&value))?;
                if binding.bound.is_empty() {
                    tests.push(format!("{} != null", value));
                } else {
                    inits.push_str(&format!("\n{}{} = {}{}", binding.prefix, binding.name, value, binding.tuple_init));
                    tests.push(non_null(&binding.bound));
                }
            }
            Condition::PatternMatch { pattern, init } => {
                let value = expr::lower(s, init)?;
                let root = s.fresh("$case");
                inits.push_str(&format!("\nconst {} = {}", root, value));
                for (indexes, leaf) in flatten(pattern) {
                    if let PatternKind::Named(var) = leaf.kind {
                        let name = s.name(var)?;
                        let mut guarded = root.clone();
                        for depth in 1..=indexes.len() {
                            guarded.push_str(&format!(" && {}", pattern::path(&root, &indexes[..depth])));
                        }
                        inits.push_str(&format!("\nconst {} = {}", name, guarded));
                    }
                }
                let test = switch::pattern_condition(s, &root, pattern)?;
                tests.push(format!("({})", test.unwrap_or_else(|| "true".to_string())));
            }
        }
    }
    if tests.is_empty() {
        return Ok(("true".to_string(), inits));
    }
    Ok((tests.join(" && "), inits))
}
