//! The CSL: an append-only, hash-chained sequence of proof-bearing events.
//!
//! A [`Csl`] is a value. [`Csl::append`] never mutates; it returns the
//! successor ledger or refuses. Holders of an old value keep a consistent
//! snapshot, which is what lets scans and replays run without locks.

use ede_core::{
    generate_merkle_proof, ChannelId, CslEvent, Digest, EventKind, EventProof, InclusionEvidence,
    Rejection, SubstrateId, VerifierTable,
};
use tracing::{debug, warn};

use crate::error::{LedgerError, Result};

/// Seed of the default genesis head.
pub const DEFAULT_GENESIS_SEED: &str = "ede-genesis-v1";

/// The ledger value.
#[derive(Debug, Clone, PartialEq)]
pub struct Csl {
    genesis: Digest,
    events: Vec<CslEvent>,
    head: Digest,
}

impl Csl {
    /// An empty ledger whose head is the default genesis.
    pub fn new() -> Self {
        Self::with_genesis(Digest::genesis(DEFAULT_GENESIS_SEED))
    }

    /// An empty ledger whose head is `genesis`.
    pub fn with_genesis(genesis: Digest) -> Self {
        Self {
            genesis,
            events: Vec::new(),
            head: genesis,
        }
    }

    /// Assemble a ledger from raw parts without any verification.
    ///
    /// Audits run over whatever a holder presents, so this is how an
    /// untrusted ledger is brought in for inspection.
    pub fn from_parts(genesis: Digest, events: Vec<CslEvent>, head: Digest) -> Self {
        Self {
            genesis,
            events,
            head,
        }
    }

    pub fn genesis(&self) -> Digest {
        self.genesis
    }

    /// Id of the last appended event, or genesis when empty.
    pub fn head(&self) -> Digest {
        self.head
    }

    pub fn events(&self) -> &[CslEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Look up an event by id.
    pub fn get(&self, id: &Digest) -> Option<&CslEvent> {
        self.events.iter().find(|event| event.id == *id)
    }

    /// Verify `event`'s own proof and return the successor ledger.
    ///
    /// On success the new head is the event id. No other check is made: how
    /// the event's link relates to the previous head is audited by the
    /// APPEND_ONLY invariant, not here.
    pub fn append(&self, event: CslEvent, verifiers: &VerifierTable) -> Result<Csl> {
        if let Err(reason) = event.verify(verifiers) {
            warn!(
                id = %event.id,
                kind = %event.kind,
                %reason,
                "append refused"
            );
            return Err(LedgerError::Refused {
                id: event.id,
                kind: event.kind,
                reason,
            });
        }

        let head = event.id;
        debug!(id = %head, kind = %event.kind, seq = self.events.len(), "event appended");

        let mut events = Vec::with_capacity(self.events.len() + 1);
        events.extend_from_slice(&self.events);
        events.push(event);

        Ok(Csl {
            genesis: self.genesis,
            events,
            head,
        })
    }

    /// The ledger as it stood after its first `n` events.
    pub fn prefix(&self, n: usize) -> Csl {
        let events: Vec<CslEvent> = self.events.iter().take(n).cloned().collect();
        let head = events.last().map_or(self.genesis, |event| event.id);
        Csl {
            genesis: self.genesis,
            events,
            head,
        }
    }

    /// Event ids in order; the leaves of every inclusion proof.
    pub fn event_ids(&self) -> Vec<Digest> {
        self.events.iter().map(|event| event.id).collect()
    }

    /// INCLUSION evidence that `event_id` is in this ledger.
    pub fn inclusion_proof(&self, event_id: &Digest) -> Option<InclusionEvidence> {
        let leaves = self.event_ids();
        let index = leaves.iter().position(|id| id == event_id)?;
        generate_merkle_proof(&leaves, index).map(InclusionEvidence::from)
    }

    /// INCLUSION evidence for the registration of `substrate`.
    pub fn substrate_inclusion(&self, substrate: &SubstrateId) -> Option<InclusionEvidence> {
        let event = self.events.iter().find(|event| match &event.proof {
            EventProof::SubstrateRegistered(p) => p.claim.id == *substrate,
            _ => false,
        })?;
        self.inclusion_proof(&event.id)
    }

    /// INCLUSION evidence for the authorization of `channel`.
    pub fn channel_inclusion(&self, channel: &ChannelId) -> Option<InclusionEvidence> {
        let event = self.events.iter().find(|event| match &event.proof {
            EventProof::ChannelAuthorized(p) => p.claim.id == *channel,
            _ => false,
        })?;
        self.inclusion_proof(&event.id)
    }
}

impl Default for Csl {
    fn default() -> Self {
        Self::new()
    }
}

/// Append `event` to `csl`. See [`Csl::append`].
pub fn append(csl: &Csl, event: CslEvent, verifiers: &VerifierTable) -> Result<Csl> {
    csl.append(event, verifiers)
}

/// One event whose proof no longer verifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofFailure {
    pub index: usize,
    pub id: Digest,
    pub kind: EventKind,
    pub reason: Rejection,
}

/// Re-run every event's local verification. Empty when all pass.
pub fn verify_all_proofs(csl: &Csl, verifiers: &VerifierTable) -> Vec<ProofFailure> {
    csl.events()
        .iter()
        .enumerate()
        .filter_map(|(index, event)| {
            event.verify(verifiers).err().map(|reason| ProofFailure {
                index,
                id: event.id,
                kind: event.kind,
                reason,
            })
        })
        .collect()
}
