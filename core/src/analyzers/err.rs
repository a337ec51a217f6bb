//! Error type for the tree analyzers.
//!
//! `TreeError` is returned when a program tree cannot be lowered as a
//! whole: an id points outside the arena, or an inheritance or override
//! chain loops back on itself.

use crate::error::{Level, TrellisErrorExt};
use crate::location::{Location, Span};

#[derive(Debug, Clone)]
pub struct TreeError {
    level: Level,
    message: String,
    issuer: String,
    location: Option<Location>,
    span: Option<Span>,
}

impl TreeError {
    pub fn with(level: Level, message: String, issuer: &str, location: Option<Location>, span: Option<Span>) -> Self {
        TreeError {
            level,
            message,
            issuer: issuer.to_string(),
            location,
            span,
        }
    }
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let loc_str = match &self.location {
            Some(loc) => format!("{}:{}:{}", loc.file, loc.line, loc.column),
            None => "unknown".to_string(),
        };
        write!(f, "TRELLIS | {} | {} | {} | {}", self.level, loc_str, self.issuer, self.message)
    }
}

impl std::error::Error for TreeError {}

impl TrellisErrorExt for TreeError {
    fn level(&self) -> Level {
        self.level
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn issuer(&self) -> String {
        self.issuer.clone()
    }

    fn span(&self) -> Option<Span> {
        self.span.clone()
    }

    fn location(&self) -> Option<Location> {
        self.location.clone()
    }
}
