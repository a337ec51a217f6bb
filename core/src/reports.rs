// Diagnostics collected while lowering a module.
// Each declaration that fails to lower leaves one diagnostic behind; the
// collector deduplicates them and serializes the lot for tooling.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{Level, TrellisErrorExt};
use crate::location::Location;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u32);

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ErrorCode {
    pub fn new(code: u32) -> Self {
        ErrorCode(code)
    }
    pub fn as_str(&self) -> String {
        format!("E_{}", self.0)
    }
}

pub const E_NONE: ErrorCode = ErrorCode(0);
pub const E_TREE: ErrorCode = ErrorCode(1);
pub const E_UNSUPPORTED: ErrorCode = ErrorCode(4);
pub const E_TEMPLATE: ErrorCode = ErrorCode(5);
pub const E_NAMING: ErrorCode = ErrorCode(999);

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    pub level: Level,
    pub issuer: String,
    pub location: Option<Location>,
    pub code: Option<ErrorCode>,
    /// Name of the top-level declaration whose emission was abandoned.
    pub declaration: Option<String>,
}

impl Diagnostic {
    pub fn new(message: &str, level: Level, issuer: &str, location: Option<Location>, code: Option<ErrorCode>) -> Self {
        Diagnostic {
            message: message.to_string(),
            level,
            issuer: issuer.to_string(),
            location,
            code,
            declaration: None,
        }
    }

    /// Capture any pipeline error as a diagnostic.
    pub fn from_error(err: &dyn TrellisErrorExt, code: Option<ErrorCode>) -> Self {
        Diagnostic::new(&err.message(), err.level(), &err.issuer(), err.location(), code)
    }

    pub fn with_declaration(mut self, declaration: &str) -> Self {
        self.declaration = Some(declaration.to_string());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loc = if let Some(l) = &self.location {
            format!(" at {}:{}:{}", l.file, l.line, l.column)
        } else {
            "".to_string()
        };
        if let Some(code) = &self.code {
            write!(f, "[{}]{} ({}): {}", self.level, loc, code, self.message)
        } else {
            write!(f, "[{}]{}: {}", self.level, loc, self.message)
        }
    }
}

impl std::error::Error for Diagnostic {}

#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollector {
    pub diagnostics: Vec<Diagnostic>,
    seen: HashSet<(String, Option<String>)>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic unless an identical message and declaration pair
    /// was already recorded.
    pub fn push(&mut self, d: Diagnostic) {
        let key = (d.message.clone(), d.declaration.clone());
        if self.seen.insert(key) {
            self.diagnostics.push(d);
        }
    }

    pub fn extend(&mut self, others: impl IntoIterator<Item = Diagnostic>) {
        for d in others {
            self.push(d);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level >= Level::Error)
    }

    pub fn has_critical(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level == Level::Critical)
    }

    /// `(critical, error, warning, info)` counts.
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        let mut c = 0;
        let mut e = 0;
        let mut w = 0;
        let mut i = 0;
        for d in &self.diagnostics {
            match d.level {
                Level::Critical => c += 1,
                Level::Error => e += 1,
                Level::Warning => w += 1,
                Level::Info => i += 1,
            }
        }
        (c, e, w, i)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.diagnostics)
    }
}
