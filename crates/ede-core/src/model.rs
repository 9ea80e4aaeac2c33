//! The claim types: what substrates, channels, sessions, fluxes and
//! settlements look like once admitted.
//!
//! All of these are plain values. They are immutable once a constructor has
//! produced them; the ledger only ever derives new state by replaying them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::crypto::SuiteId;
use crate::ct::Ct;
use crate::types::{ChannelId, FluxId, SessionId, SubstrateId, Timestamp};

/// Substrate class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SubstrateClass {
    /// Human.
    #[serde(rename = "H")]
    H,
    /// Augmented human (neural coupling).
    #[serde(rename = "H_PLUS")]
    HPlus,
    /// Synthetic operator.
    #[serde(rename = "SO")]
    So,
    /// Synthetic cluster.
    #[serde(rename = "SSI")]
    Ssi,
}

impl SubstrateClass {
    /// Tag as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            SubstrateClass::H => "H",
            SubstrateClass::HPlus => "H_PLUS",
            SubstrateClass::So => "SO",
            SubstrateClass::Ssi => "SSI",
        }
    }

    /// H or H_PLUS.
    pub fn is_human(self) -> bool {
        matches!(self, SubstrateClass::H | SubstrateClass::HPlus)
    }
}

impl fmt::Display for SubstrateClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// I/O capabilities of a substrate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoProfile {
    pub max_bps: f64,
    pub latency_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise_entropy: Option<f64>,
    /// H_PLUS only; must be > 0 for that class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neural_coupling: Option<f64>,
    /// SO only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_context_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brain_temporal_alignment_r: Option<f64>,
}

impl IoProfile {
    /// A profile with only throughput and latency set.
    pub fn new(max_bps: f64, latency_ms: f64) -> Self {
        Self {
            max_bps,
            latency_ms,
            jitter_ms: None,
            noise_entropy: None,
            neural_coupling: None,
            max_context_tokens: None,
            brain_temporal_alignment_r: None,
        }
    }
}

/// Operational stability of a substrate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityProfile {
    pub drift_rate: f64,
    pub fault_rate: f64,
    pub uptime_ratio: f64,
}

impl Default for StabilityProfile {
    fn default() -> Self {
        Self {
            drift_rate: 0.0,
            fault_rate: 0.0,
            uptime_ratio: 1.0,
        }
    }
}

/// Suites a substrate can sign with and its key under each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstrateCrypto {
    pub supported_suites: Vec<SuiteId>,
    pub primary_suite: SuiteId,
    /// Hex public key per suite.
    pub public_keys: BTreeMap<SuiteId, String>,
}

impl SubstrateCrypto {
    /// Public key under `suite`, if one is registered.
    pub fn public_key(&self, suite: &SuiteId) -> Option<&str> {
        self.public_keys.get(suite).map(String::as_str)
    }

    /// Public key under the primary suite.
    pub fn primary_public_key(&self) -> Option<&str> {
        self.public_key(&self.primary_suite)
    }
}

/// A registered participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substrate {
    pub id: SubstrateId,
    pub class: SubstrateClass,
    pub io: IoProfile,
    pub stability: StabilityProfile,
    pub crypto: SubstrateCrypto,
    pub ct_balance: Ct,
    pub registered_at: Timestamp,
}

/// Lifecycle state of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelState {
    Open,
    Settling,
    Closed,
}

/// A bilateral, budgeted, time-bounded authorization to move CT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub from: SubstrateId,
    pub to: SubstrateId,
    /// Budget.
    pub reserved_ct: Ct,
    /// Advanced only by FLUX replay.
    pub consumed_ct: Ct,
    pub max_bps: f64,
    pub expires: Timestamp,
    pub state: ChannelState,
    pub bio_binding_required: bool,
    pub crypto_suite: SuiteId,
    pub authorized_at: Timestamp,
}

/// Role a participant holds within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantRole {
    Requestor,
    Operator,
    SoNode,
    SsiCluster,
    Observer,
}

impl ParticipantRole {
    /// REQUESTOR or OPERATOR.
    pub fn is_decision_role(self) -> bool {
        matches!(self, ParticipantRole::Requestor | ParticipantRole::Operator)
    }
}

/// Session membership entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub entity: SubstrateId,
    pub class: SubstrateClass,
    pub role: ParticipantRole,
}

/// A named grouping of substrates with roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub participants: Vec<Participant>,
    pub created_at: Timestamp,
}

/// Metrics observed while a flux was carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedMetrics {
    pub actual_bps: f64,
    pub error_rate: f64,
    pub energy_joules: f64,
}

/// One accountable transfer within a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flux {
    pub id: FluxId,
    pub channel: ChannelId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionId>,
    pub from: SubstrateId,
    pub to: SubstrateId,
    pub ct_delta: Ct,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_critical: Option<bool>,
    pub observed: ObservedMetrics,
    pub timestamp: Timestamp,
}

/// CT paid out to one substrate at settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub substrate: SubstrateId,
    pub ct_amount: Ct,
}

impl Distribution {
    pub fn new(substrate: SubstrateId, ct_amount: impl Into<Ct>) -> Self {
        Self {
            substrate,
            ct_amount: ct_amount.into(),
        }
    }
}

/// The terminal event of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub channel: ChannelId,
    pub total_fluxed: Ct,
    pub fees: Ct,
    pub distributions: Vec<Distribution>,
    pub settled_at: Timestamp,
}

impl Settlement {
    /// `sum(distributions) + fees`, or `None` on overflow.
    pub fn total_out(&self) -> Option<Ct> {
        Ct::checked_sum(self.distributions.iter().map(|d| d.ct_amount))?.checked_add(self.fees)
    }
}
