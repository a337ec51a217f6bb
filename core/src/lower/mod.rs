//! file: core/src/lower/mod.rs
//! description: lowering entry point.
//!
//! `lower_program` walks the top-level declarations in source order and
//! concatenates their output. A declaration that fails is reported as a
//! diagnostic and replaced by a marker comment; the rest of the module is
//! still lowered.

pub mod call;
pub mod decl;
pub mod err;
pub mod expr;
pub mod library;
pub mod mixin;
pub mod names;
pub mod optional;
pub mod pattern;
pub mod runtime;
pub mod session;
pub mod stmt;
pub mod storage;
pub mod switch;
pub mod template;
pub mod types;

use log::{info, warn};

use crate::analyzers;
use crate::config::LoweringOptions;
use crate::reports::{Diagnostic, DiagnosticCollector, E_TREE};
use crate::tree::{DeclId, Program};

pub use err::{LowerResult, LoweringError, LoweringErrorKind};
pub use session::Session;

/// Output of lowering one module.
#[derive(Debug, Clone)]
pub struct LoweredModule {
    pub text: String,
    pub diagnostics: DiagnosticCollector,
}

impl LoweredModule {
    pub fn is_clean(&self) -> bool {
        !self.diagnostics.has_errors()
    }
}

/// Lower a whole program with a fresh session.
pub fn lower_program(program: &Program, options: LoweringOptions) -> LoweredModule {
    let mut session = Session::new(program, options);
    lower_with(&mut session)
}

/// Lower the session's program. Names assigned by earlier calls on the
/// same session stay assigned.
pub fn lower_with(s: &mut Session<'_>) -> LoweredModule {
    let program = s.program;
    info!("lowering module `{}` ({} top-level declarations)", program.module, program.top_level.len());

    if let Err(errors) = analyzers::analyze_tree(program) {
        for err in &errors {
            s.diagnostics.push(Diagnostic::from_error(err, Some(E_TREE)));
        }
        warn!("module `{}` rejected: {} tree error(s)", program.module, errors.len());
        return LoweredModule { text: String::new(), diagnostics: std::mem::take(&mut s.diagnostics) };
    }

    let mut text = String::new();
    if s.options.emit_prelude {
        text.push_str(runtime::PRELUDE);
    }
    for id in &program.top_level {
        let mark = s.linkage_mark();
        match decl::lower_decl(s, *id) {
            Ok(lowered) => {
                if !lowered.is_empty() {
                    text.push('\n');
                    text.push_str(&lowered);
                }
            }
            Err(err) => {
                let name = describe(program, *id);
                warn!("`{}` was not lowered: {}", name, err);
                s.diagnostics
                    .push(Diagnostic::from_error(&err, Some(err.kind().code())).with_declaration(&name));
                s.reset_transient();
                s.truncate_linkage(mark);
                text.push_str(&format!(
                    "\n/* `{}` was not lowered: {} */",
                    name,
                    err.to_string().replace("*/", "* /")
                ));
            }
        }
        if !s.options.defer_linkage {
            text.push_str(&mixin::flush(s.take_linkage()));
        }
    }
    text.push_str(&mixin::flush(s.take_linkage()));
    text.push('\n');

    LoweredModule { text, diagnostics: std::mem::take(&mut s.diagnostics) }
}

fn describe(program: &Program, id: DeclId) -> String {
    match program.get_decl(id) {
        Some(d) if !d.name.is_empty() => d.name.clone(),
        Some(_) => format!("<unnamed #{}>", id),
        None => format!("<missing #{}>", id),
    }
}
