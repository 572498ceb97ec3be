//! Errors
//!
//! Unsupported selectors and unavailable sheets are recovered where they
//! happen and never show up here. What remains is what the caller has to
//! know about.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScopeError>;

#[derive(Debug, Error)]
pub enum ScopeError {
    /// Reading a sheet's rules failed for a reason other than a cross-origin
    /// denial or content that is still being parsed.
    #[error("cannot read rules of sheet {sheet}: {reason}")]
    ReadRules { sheet: String, reason: String },

    /// The host rejected a mutation of its rule tree.
    #[error("host rejected {operation}: {reason}")]
    Host {
        operation: &'static str,
        reason: String,
    },

    #[error("invalid scope options: {0}")]
    Options(#[from] serde_json::Error),
}

impl ScopeError {
    pub fn host(operation: &'static str, reason: impl Into<String>) -> Self {
        ScopeError::Host {
            operation,
            reason: reason.into(),
        }
    }
}
