//! # EDE Audit
//!
//! Ledger-wide invariants. Local proof verification says each event is
//! internally sound; these theorems say the ledger as a whole is:
//!
//! | Invariant | Violation codes |
//! |---|---|
//! | CT_CONSERVATION | `CT_MISMATCH` |
//! | BILATERAL_ATTESTATION | `MISSING_BILATERAL_SIG` |
//! | APPEND_ONLY | `MISSING_HASH_CHAIN`, `HASH_CHAIN_BROKEN`, `HEAD_MISMATCH` |
//! | SUBSTRATE_SOVEREIGNTY | `MISSING_FROM_CONSENT`, `MISSING_TO_CONSENT` |
//! | PQ_COMPLIANCE | `SUBSTRATE_NOT_PQ`, `SETTLEMENT_NOT_PQ` |
//! | TOPOLOGY_NEUTRALITY | `INVALID_EVENT_TYPE` |
//! | H_GUARD_CRITICAL_CT | `H_GUARD_MISSING` |
//!
//! [`verify_all_invariants`] is the entry point a host gates writes or
//! payouts on. Results are data: a failing ledger yields a report, not an
//! error.

pub mod invariants;
pub mod report;

pub use invariants::{
    verify_all_invariants, verify_append_only, verify_bilateral_attestation,
    verify_ct_conservation, verify_h_guard, verify_pq_compliance, verify_substrate_sovereignty,
    verify_topology_neutrality, InvariantConfig,
};
pub use report::{Invariant, InvariantReport, InvariantResult, Violation, ViolationCode};
