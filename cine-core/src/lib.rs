pub mod identity;
pub mod payment;

pub use identity::UserId;
pub use payment::{PaymentAdapter, PaymentError, PaymentMethod, PaymentOutcome};

/// Errors surfaced by storage backends behind the repository traits.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Duplicate booking code: {0}")]
    DuplicateCode(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
