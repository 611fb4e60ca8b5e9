//! Local policy failures.
//!
//! These block an operation before anything reaches the data service. Field
//! level problems use [`ValidationError`](crate::services::validation::ValidationError)
//! and remote failures use [`ServiceError`](crate::services::data_service::ServiceError).

/// An operation refused by a local business rule
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("Unable to delete the ledger. User must have at least one ledger.")]
    LastLedger,
    #[error("Unable to delete the {noun}. At least {min} must remain.")]
    MinimumItems { noun: &'static str, min: usize },
    #[error("The values of the passwords don't match.")]
    PasswordMismatch,
}

impl PolicyError {
    /// The error raised when deleting would drop a collection below `min` items
    pub fn below_minimum(noun: &'static str, min: usize) -> Self {
        if noun == "ledger" && min == 1 {
            PolicyError::LastLedger
        } else {
            PolicyError::MinimumItems { noun, min }
        }
    }
}
