#![forbid(unsafe_code)]

use thiserror::Error;

use mesa_kernel_contracts::ContractViolation;
use mesa_storage::StorageError;

/// Core fault taxonomy. Policy denials are deliberately absent: a
/// denial is a first-class `ConsumeOutcome`, not an error.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or incomplete input; a caller error, never retried
    /// automatically.
    #[error("validation failed: {0:?}")]
    Validation(ContractViolation),
    /// Unknown source, connector, product, or space.
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },
    /// I/O or persistence fault. The current operation is aborted
    /// whole; callers may retry since operations are idempotent at the
    /// natural-key level.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ContractViolation> for CoreError {
    fn from(violation: ContractViolation) -> Self {
        CoreError::Validation(violation)
    }
}
