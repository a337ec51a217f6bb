pub mod acyclic;
pub mod err;
pub mod integrity;

pub use acyclic::analyze_acyclic_rules;
pub use err::TreeError;
pub use integrity::analyze_integrity_rules;

use crate::tree::Program;

/// Run every tree check. Cycle detection only runs on a tree whose ids
/// all resolve.
pub fn analyze_tree(program: &Program) -> Result<(), Vec<TreeError>> {
    analyze_integrity_rules(program)?;
    analyze_acyclic_rules(program)
}
