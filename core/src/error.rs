use thiserror::Error;

/// Errors surfaced by the ledger, the goal engine, the catalog, and the store boundary.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    #[error("invalid food item: {0}")]
    InvalidFoodItem(String),

    /// The durable store could not be read or written. In-memory state is still valid.
    #[error("persistence failure: {0:#}")]
    Persistence(anyhow::Error),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;
