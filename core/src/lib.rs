pub mod analyzers;
pub mod config;
pub mod error;
pub mod location;
pub mod lower;
pub mod reports;
pub mod tree;

pub use config::{LoweringOptions, StructuralTypes};
pub use error::{Level, TrellisErrorExt};
pub use location::{Location, Span};
pub use lower::{LoweredModule, LoweringError, lower_program};
pub use reports::{Diagnostic, DiagnosticCollector};
pub use tree::{Program, ProgramBuilder};

/// One-line report for any pipeline error.
pub fn generate_error_report<E: TrellisErrorExt>(error: &E) -> String {
    let level = error.level();
    let location = match error.location() {
        Some(loc) => loc.to_string(),
        None => "unknown location".to_string(),
    };
    let message = error.message();

    format!("TRELLIS | {} | {} | {}", level, location, message)
}

/// Parse a JSON program tree and lower it.
pub fn lower_json(raw: &str, options: LoweringOptions) -> Result<LoweredModule, String> {
    let program = Program::from_json(raw)?;
    options.validate()?;
    Ok(lower_program(&program, options))
}
