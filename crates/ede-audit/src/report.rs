//! Invariant results as data.
//!
//! A scan never stops at the first problem. Each invariant yields an
//! [`InvariantResult`] holding every [`Violation`] it found, and
//! [`InvariantReport`] gathers the seven of them.

use std::collections::BTreeMap;
use std::fmt;

use ede_core::{Digest, SessionId};
use serde::Serialize;

/// The seven ledger-wide invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Invariant {
    CtConservation,
    BilateralAttestation,
    AppendOnly,
    SubstrateSovereignty,
    PqCompliance,
    TopologyNeutrality,
    HGuardCriticalCt,
}

impl Invariant {
    /// All invariants, in reporting order.
    pub const ALL: [Invariant; 7] = [
        Invariant::CtConservation,
        Invariant::BilateralAttestation,
        Invariant::AppendOnly,
        Invariant::SubstrateSovereignty,
        Invariant::PqCompliance,
        Invariant::TopologyNeutrality,
        Invariant::HGuardCriticalCt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Invariant::CtConservation => "CT_CONSERVATION",
            Invariant::BilateralAttestation => "BILATERAL_ATTESTATION",
            Invariant::AppendOnly => "APPEND_ONLY",
            Invariant::SubstrateSovereignty => "SUBSTRATE_SOVEREIGNTY",
            Invariant::PqCompliance => "PQ_COMPLIANCE",
            Invariant::TopologyNeutrality => "TOPOLOGY_NEUTRALITY",
            Invariant::HGuardCriticalCt => "H_GUARD_CRITICAL_CT",
        }
    }
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed violation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    CtMismatch,
    MissingBilateralSig,
    MissingHashChain,
    HashChainBroken,
    HeadMismatch,
    MissingFromConsent,
    MissingToConsent,
    SubstrateNotPq,
    SettlementNotPq,
    InvalidEventType,
    HGuardMissing,
}

impl ViolationCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationCode::CtMismatch => "CT_MISMATCH",
            ViolationCode::MissingBilateralSig => "MISSING_BILATERAL_SIG",
            ViolationCode::MissingHashChain => "MISSING_HASH_CHAIN",
            ViolationCode::HashChainBroken => "HASH_CHAIN_BROKEN",
            ViolationCode::HeadMismatch => "HEAD_MISMATCH",
            ViolationCode::MissingFromConsent => "MISSING_FROM_CONSENT",
            ViolationCode::MissingToConsent => "MISSING_TO_CONSENT",
            ViolationCode::SubstrateNotPq => "SUBSTRATE_NOT_PQ",
            ViolationCode::SettlementNotPq => "SETTLEMENT_NOT_PQ",
            ViolationCode::InvalidEventType => "INVALID_EVENT_TYPE",
            ViolationCode::HGuardMissing => "H_GUARD_MISSING",
        }
    }
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding of an invariant scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub code: ViolationCode,
    pub message: String,
    /// Event the finding is about, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Digest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionId>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

impl Violation {
    pub fn new(code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            event: None,
            session: None,
            details: BTreeMap::new(),
        }
    }

    pub fn at_event(mut self, id: Digest) -> Self {
        self.event = Some(id);
        self
    }

    pub fn in_session(mut self, session: SessionId) -> Self {
        self.session = Some(session);
        self
    }

    /// Attach a detail entry.
    pub fn detail(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.details.insert(key.to_owned(), value.to_string());
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Outcome of one invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvariantResult {
    pub invariant: Invariant,
    pub ok: bool,
    pub violations: Vec<Violation>,
}

impl InvariantResult {
    /// `ok` exactly when there are no violations.
    pub fn from_violations(invariant: Invariant, violations: Vec<Violation>) -> Self {
        Self {
            invariant,
            ok: violations.is_empty(),
            violations,
        }
    }
}

/// Outcome of a full scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvariantReport {
    pub results: Vec<InvariantResult>,
    pub all_ok: bool,
}

impl InvariantReport {
    pub fn new(results: Vec<InvariantResult>) -> Self {
        let all_ok = results.iter().all(|result| result.ok);
        Self { results, all_ok }
    }

    /// The result for `invariant`, if it was run.
    pub fn get(&self, invariant: Invariant) -> Option<&InvariantResult> {
        self.results.iter().find(|result| result.invariant == invariant)
    }

    /// Every violation across all invariants.
    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.results.iter().flat_map(|result| result.violations.iter())
    }

    /// Invariants that did not hold.
    pub fn failed(&self) -> Vec<Invariant> {
        self.results
            .iter()
            .filter(|result| !result.ok)
            .map(|result| result.invariant)
            .collect()
    }

    pub fn has_code(&self, code: ViolationCode) -> bool {
        self.violations().any(|violation| violation.code == code)
    }
}
