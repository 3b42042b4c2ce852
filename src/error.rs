//! Error types for tree building, mounting and reconciliation.
//!
//! Absent children and props are never errors; they are filtered while
//! building. Merge conflicts in `set_state` are resolved by overwriting and
//! never surface here either.

use thiserror::Error;

use crate::document::{SpanId, UnitId};

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong between the tree builder and the host document.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// A child value is neither text, a node, null, nor a nested list.
    #[error("invalid child: expected text, node, null or list, found {found}")]
    InvalidChild { found: String },

    /// A span was used after its boundaries were invalidated, or was used in a
    /// way its boundaries cannot support. Always a reconciliation-ordering bug.
    #[error("span {span:?} violated: {reason}")]
    SpanViolation { span: Option<SpanId>, reason: String },

    /// The host has no unit with this id.
    #[error("unknown document unit {0:?}")]
    UnknownUnit(UnitId),

    /// A prop value cannot be applied to an element under the attribute conventions.
    #[error("malformed attribute '{name}': {reason}")]
    MalformedAttribute { name: String, reason: String },

    /// Any other failure reported by the host document.
    #[error("host error: {reason}")]
    Host { reason: String },

    /// Component state or props could not be (de)serialized.
    #[error("state error: {0}")]
    State(#[from] serde_json::Error),

    /// Terminal I/O failed.
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a span violation.
    pub fn span_violation(span: Option<SpanId>, reason: impl Into<String>) -> Self {
        Error::SpanViolation {
            span,
            reason: reason.into(),
        }
    }

    /// Shorthand for a malformed attribute.
    pub fn malformed_attribute(name: &str, reason: impl Into<String>) -> Self {
        Error::MalformedAttribute {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Check if this error signals a reconciliation-ordering defect.
    pub fn is_span_violation(&self) -> bool {
        matches!(self, Error::SpanViolation { .. })
    }
}
