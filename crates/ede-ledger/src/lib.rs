//! # EDE Ledger
//!
//! The CSL: an append-only, hash-chained sequence of proof-bearing events.
//!
//! - [`Csl::append`] is the safety gate. It verifies the event's own proof
//!   and refuses anything that fails; it is the only place a bad proof is an
//!   error rather than a verdict.
//! - [`derive_state`] replays the events into a [`DerivedState`] snapshot.
//! - [`PersistedLedger`] is the layout a host stores: events plus head.
//!
//! Cross-event consistency (chain continuity, conservation, policy) is not
//! checked here. That is the job of `ede-audit`.

pub mod csl;
pub mod error;
pub mod persist;
pub mod replay;

#[cfg(test)]
mod testing;

pub use csl::{append, verify_all_proofs, Csl, ProofFailure, DEFAULT_GENESIS_SEED};
pub use error::{LedgerError, Result};
pub use persist::PersistedLedger;
pub use replay::{derive_state, derive_state_at, DerivedState};
