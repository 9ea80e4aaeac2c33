//! # EDE
//!
//! Independent parties ("substrates") open bilateral channels, move CT
//! through them and settle, while every claim about the system is backed by
//! a proof anyone can check.
//!
//! ## Overview
//!
//! - **Proofs**: a claim plus evidence (signatures, hash-chain link,
//!   inclusion, bio-binding), verified locally with no ledger access
//! - **CSL**: an append-only, hash-chained ledger of proof-bearing events
//! - **Replay**: current state is derived from the events, never stored
//! - **Audit**: seven ledger-wide invariants reported as data
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ede::{Ede, EdeConfig, MemoryStore};
//! use ede::core::VerifierTable;
//!
//! async fn example() -> ede::Result<()> {
//!     let ede = Ede::open(
//!         MemoryStore::new(),
//!         EdeConfig::default(),
//!         VerifierTable::development(),
//!     )
//!     .await?;
//!
//!     // Build events against `ede.snapshot()` with the `ede::core`
//!     // operations, then `ede.submit(event)`.
//!     let report = ede.audit().await;
//!     assert!(report.all_ok);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `ede::core` - ids, CT, canonical encoding, evidence, proofs, operations
//! - `ede::ledger` - the CSL, append, replay, persisted layout
//! - `ede::audit` - the invariant engine

pub mod config;
pub mod error;
pub mod service;
pub mod store;

// Re-export component crates
pub use ede_audit as audit;
pub use ede_core as core;
pub use ede_ledger as ledger;

// Re-export main types for convenience
pub use config::EdeConfig;
pub use error::{EdeError, Result, StoreError};
pub use service::Ede;
pub use store::{LedgerStore, MemoryStore};

// Re-export commonly used types
pub use ede_audit::{verify_all_invariants, InvariantConfig, InvariantReport, ViolationCode};
pub use ede_core::{CslEvent, Ct, Digest, EventKind, Proof, SubstrateId, VerifierTable};
pub use ede_ledger::{Csl, DerivedState, PersistedLedger};
