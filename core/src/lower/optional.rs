//! file: core/src/lower/optional.rs
//! description: optional chaining and `try?`.
//!
//! Each unwrap site stores its operand in a fresh `_.tmpN` exactly once
//! and registers a non-null test with the innermost optional-evaluation
//! region. The region wraps its body in a conditional over all tests it
//! collected, so `a?.b?.c` evaluates `a` a single time however deep the
//! chain goes.

use crate::tree::Expr;

use super::err::{LowerResult, LoweringError};
use super::expr;
use super::session::Session;

/// Lower an unwrap site (`x?`), yielding the temporary that holds `x`.
pub fn bind(s: &mut Session<'_>, inner: &Expr) -> LowerResult<String> {
    let value = expr::lower(s, inner)?;
    let tmp = s.next_temp();
    let condition = format!("({} = {}) != null", tmp, value);
    if !s.add_optional_condition(condition) {
        return Err(LoweringError::invalid_tree(
            "optional unwrap outside an optional-evaluation region".to_string(),
            "trellis.lower.optional.bind",
        ));
    }
    Ok(tmp)
}

/// Lower an optional-evaluation region. Without any unwrap inside, the
/// body is emitted unconditionally.
pub fn evaluate(s: &mut Session<'_>, inner: &Expr) -> LowerResult<String> {
    s.push_optional_region();
    let body = expr::lower(s, inner);
    let conditions = s.pop_optional_region();
    let body = body?;
    if conditions.is_empty() {
        return Ok(body);
    }
    let tests: Vec<String> = conditions.iter().map(|c| format!("({})", c)).collect();
    Ok(format!("(({}) ? ({}) : null)", tests.join(" && "), body))
}

/// `try? e` evaluates to null when `e` throws.
pub fn optional_try(s: &mut Session<'_>, inner: &Expr) -> LowerResult<String> {
    Ok(format!("_optionalTry(() => {})", expr::lower(s, inner)?))
}
