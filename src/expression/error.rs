use std::fmt;

use crate::foundation::error::CollatzError;

/// Failure while lexing, parsing, or evaluating an angle expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprError {
    /// Byte offset into the (trimmed) source text.
    pub offset: usize,
    /// Human-readable description.
    pub message: String,
}

impl ExprError {
    pub(crate) fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at byte {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for ExprError {}

impl From<ExprError> for CollatzError {
    fn from(e: ExprError) -> Self {
        CollatzError::expression(e.to_string())
    }
}
