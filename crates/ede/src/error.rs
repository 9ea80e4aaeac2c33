//! Error types for the EDE facade.

use ede_core::{CoreError, Digest};
use ede_ledger::LedgerError;
use thiserror::Error;

/// Errors raised by a [`LedgerStore`](crate::store::LedgerStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing storage could not be read or written.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Stored bytes are not a persisted ledger.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Errors that can occur during facade operations.
#[derive(Debug, Error)]
pub enum EdeError {
    /// The event was built against a head that is no longer current.
    #[error("stale head: ledger is at {expected}, event links from {found}")]
    StaleHead { expected: Digest, found: Digest },

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Append refused, replay overflow or persisted-layout error.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Claim construction or encoding error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, EdeError>;
