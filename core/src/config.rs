//! file: core/src/config.rs
//! description: lowering options and their on-disk JSON form.
//!
//! `LoweringOptions` controls the few behaviours that vary between
//! embeddings of the lowering engine. Every field has a default so an empty
//! JSON object is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// How tuple and function types are spelled when they appear in emitted
/// code (generic witness info, type aliases).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructuralTypes {
    /// Report an unsupported-construct error.
    #[default]
    Reject,
    /// Spell them with TypeScript syntax (`[A, B]`, `($info, a0: A) => R`).
    Typescript,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoweringOptions {
    /// Modules whose declarations are provided by the runtime library and
    /// are never emitted.
    #[serde(default = "default_native_modules")]
    pub native_modules: Vec<String>,
    /// Treat template bindings that nothing consumes as errors instead of
    /// warnings.
    #[serde(default)]
    pub strict_templates: bool,
    #[serde(default)]
    pub structural_types: StructuralTypes,
    /// Append `@file:line:col` to qualified keys of located declarations.
    #[serde(default = "default_true")]
    pub locations_in_keys: bool,
    /// Lower the standard library itself: native types are emitted as
    /// `MIO_Mixin_` classes and mixed into the target built-ins.
    #[serde(default)]
    pub library_mode: bool,
    /// Emit the runtime helper prelude before the module text.
    #[serde(default)]
    pub emit_prelude: bool,
    /// Buffer conformance linkage and flush it after every declaration of
    /// the module has been emitted.
    #[serde(default = "default_true")]
    pub defer_linkage: bool,
}

fn default_native_modules() -> Vec<String> {
    ["Swift", "XCTest", "Foundation", "Darwin", "ObjectiveC"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

impl Default for LoweringOptions {
    fn default() -> Self {
        LoweringOptions {
            native_modules: default_native_modules(),
            strict_templates: false,
            structural_types: StructuralTypes::default(),
            locations_in_keys: true,
            library_mode: false,
            emit_prelude: false,
            defer_linkage: true,
        }
    }
}

impl LoweringOptions {
    /// Load options from a JSON file path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<LoweringOptions, String> {
        let raw = std::fs::read_to_string(&path).map_err(|e| format!("read options: {}", e))?;
        let options: LoweringOptions = serde_json::from_str(&raw).map_err(|e| format!("parse options: {}", e))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for m in &self.native_modules {
            if m.trim().is_empty() {
                return Err("native module name is empty".to_string());
            }
            if !seen.insert(m.as_str()) {
                return Err(format!("duplicate native module '{}'", m));
            }
        }
        Ok(())
    }

    pub fn is_native_module(&self, module: &str) -> bool {
        self.native_modules.iter().any(|m| m == module)
    }
}
