//! Error kinds surfaced by every engine instruction.
//!
//! Each variant is terminal for the instruction that raised it: the staged
//! changeset is dropped and no balance moves.

use serde::{Deserialize, Serialize};

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum LedgerError {
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Invalid stage: {0}")]
    InvalidStage(String),

    #[error("Insufficient balance: {available} < {required}")]
    InsufficientBalance { available: u64, required: u64 },

    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Duplicate state: {0}")]
    DuplicateState(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No viable bump seed for derived address")]
    AddressDerivation,
}

impl LedgerError {
    /// Stable machine-readable name, used by the HTTP layer
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::NotAuthorized(_) => "NotAuthorized",
            LedgerError::InvalidStage(_) => "InvalidStage",
            LedgerError::InsufficientBalance { .. } => "InsufficientBalance",
            LedgerError::ArithmeticOverflow(_) => "ArithmeticOverflow",
            LedgerError::InvariantViolation(_) => "InvariantViolation",
            LedgerError::DuplicateState(_) => "DuplicateState",
            LedgerError::NotFound(_) => "NotFound",
            LedgerError::InvalidArgument(_) => "InvalidArgument",
            LedgerError::AddressDerivation => "AddressDerivation",
        }
    }

    pub(crate) fn overflow(what: &str) -> Self {
        LedgerError::ArithmeticOverflow(what.to_string())
    }
}
