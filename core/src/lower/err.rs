//! Error type for the lowering passes.
//!
//! Every failure while lowering a declaration is a `LoweringError`. The
//! `kind` tells callers whether the tree used a construct with no lowering
//! rule, whether a library template was malformed, or whether the name
//! table detected a broken invariant.

use crate::error::{Level, TrellisErrorExt};
use crate::location::{Location, Span};
use crate::reports::{E_NAMING, E_TEMPLATE, E_TREE, E_UNSUPPORTED, ErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoweringErrorKind {
    Unsupported,
    MalformedTemplate,
    NamingCollision,
    /// The tree references a declaration that is not in the arena or has
    /// the wrong shape.
    InvalidTree,
}

impl LoweringErrorKind {
    pub fn code(self) -> ErrorCode {
        match self {
            LoweringErrorKind::Unsupported => E_UNSUPPORTED,
            LoweringErrorKind::MalformedTemplate => E_TEMPLATE,
            LoweringErrorKind::NamingCollision => E_NAMING,
            LoweringErrorKind::InvalidTree => E_TREE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoweringError {
    kind: LoweringErrorKind,
    level: Level,
    message: String,
    issuer: String,
    location: Option<Location>,
    span: Option<Span>,
}

impl LoweringError {
    pub fn with(
        kind: LoweringErrorKind,
        level: Level,
        message: String,
        issuer: &str,
        location: Option<Location>,
        span: Option<Span>,
    ) -> Self {
        LoweringError {
            kind,
            level,
            message,
            issuer: issuer.to_string(),
            location,
            span,
        }
    }

    pub fn unsupported(what: &str, issuer: &str, location: Option<Location>) -> Self {
        LoweringError::with(
            LoweringErrorKind::Unsupported,
            Level::Error,
            format!("no lowering rule for {}", what),
            issuer,
            location,
            None,
        )
    }

    pub fn template(message: String, issuer: &str) -> Self {
        LoweringError::with(LoweringErrorKind::MalformedTemplate, Level::Error, message, issuer, None, None)
    }

    pub fn collision(message: String, issuer: &str, location: Option<Location>) -> Self {
        LoweringError::with(LoweringErrorKind::NamingCollision, Level::Critical, message, issuer, location, None)
    }

    pub fn invalid_tree(message: String, issuer: &str) -> Self {
        LoweringError::with(LoweringErrorKind::InvalidTree, Level::Error, message, issuer, None, None)
    }

    /// Attach a location if the error does not carry one yet.
    pub fn at(mut self, location: Option<&Location>) -> Self {
        if self.location.is_none() {
            self.location = location.cloned();
        }
        self
    }

    pub fn kind(&self) -> LoweringErrorKind {
        self.kind
    }
}

impl std::fmt::Display for LoweringError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(loc) = &self.location {
            write!(f, "{} (at {}:{}:{})", self.message, loc.file, loc.line, loc.column)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for LoweringError {}

impl TrellisErrorExt for LoweringError {
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

pub type LowerResult<T> = Result<T, LoweringError>;
