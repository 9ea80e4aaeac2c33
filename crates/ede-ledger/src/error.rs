//! Error types for the ledger.

use ede_core::{CoreError, Digest, EventKind, Rejection};
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The event's own proof failed verification; nothing was appended.
    #[error("append refused for {kind} event {id}: {reason}")]
    Refused {
        id: Digest,
        kind: EventKind,
        #[source]
        reason: Rejection,
    },

    /// A balance or consumed amount overflowed during replay.
    #[error("CT overflow replaying event {0}")]
    CtOverflow(Digest),

    /// Encoding error from the core.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Persisted layout could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A persisted head does not match the head recomputed on import.
    #[error("recorded head {recorded} does not match recomputed head {computed}")]
    HeadMismatch { recorded: Digest, computed: Digest },
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
