//! Ledger events: a type tag plus the proof it carries.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::canonical::link_hash;
use crate::crypto::{Digest, VerifierTable};
use crate::error::{CoreError, Verdict};
use crate::evidence::{hash_chains, signatures, Evidence, HashChainEvidence};
use crate::model::{Channel, Flux, Session, Settlement, Substrate};
use crate::proof::{Claim, Proof};
use crate::types::{SubstrateId, Timestamp};
use crate::validation;

/// The five canonical event tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    SubstrateRegistered,
    ChannelAuthorized,
    SessionCreated,
    Flux,
    ChannelSettled,
}

impl EventKind {
    /// Every canonical tag.
    pub const ALL: [EventKind; 5] = [
        EventKind::SubstrateRegistered,
        EventKind::ChannelAuthorized,
        EventKind::SessionCreated,
        EventKind::Flux,
        EventKind::ChannelSettled,
    ];

    /// Tag as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::SubstrateRegistered => "SUBSTRATE_REGISTERED",
            EventKind::ChannelAuthorized => "CHANNEL_AUTHORIZED",
            EventKind::SessionCreated => "SESSION_CREATED",
            EventKind::Flux => "FLUX",
            EventKind::ChannelSettled => "CHANNEL_SETTLED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proof of one of the five claim types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventProof {
    SubstrateRegistered(Proof<Substrate>),
    ChannelAuthorized(Proof<Channel>),
    SessionCreated(Proof<Session>),
    Flux(Proof<Flux>),
    ChannelSettled(Proof<Settlement>),
}

impl EventProof {
    /// The tag of the claim this proof carries.
    pub fn kind(&self) -> EventKind {
        match self {
            EventProof::SubstrateRegistered(_) => EventKind::SubstrateRegistered,
            EventProof::ChannelAuthorized(_) => EventKind::ChannelAuthorized,
            EventProof::SessionCreated(_) => EventKind::SessionCreated,
            EventProof::Flux(_) => EventKind::Flux,
            EventProof::ChannelSettled(_) => EventKind::ChannelSettled,
        }
    }

    pub fn evidence(&self) -> &[Evidence] {
        match self {
            EventProof::SubstrateRegistered(p) => &p.evidence,
            EventProof::ChannelAuthorized(p) => &p.evidence,
            EventProof::SessionCreated(p) => &p.evidence,
            EventProof::Flux(p) => &p.evidence,
            EventProof::ChannelSettled(p) => &p.evidence,
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        match self {
            EventProof::SubstrateRegistered(p) => p.claim.timestamp(),
            EventProof::ChannelAuthorized(p) => p.claim.timestamp(),
            EventProof::SessionCreated(p) => p.claim.timestamp(),
            EventProof::Flux(p) => p.claim.timestamp(),
            EventProof::ChannelSettled(p) => p.claim.timestamp(),
        }
    }

    /// Run the local verification rule of the carried claim.
    pub fn verify(&self, verifiers: &VerifierTable) -> Verdict {
        match self {
            EventProof::SubstrateRegistered(p) => p.verify(verifiers),
            EventProof::ChannelAuthorized(p) => p.verify(verifiers),
            EventProof::SessionCreated(p) => p.verify(verifiers),
            EventProof::Flux(p) => p.verify(verifiers),
            EventProof::ChannelSettled(p) => p.verify(verifiers),
        }
    }

    /// Recompute the hash-chain link of the carried claim after `prev`.
    pub fn link_after(&self, prev: &Digest) -> Result<Digest, CoreError> {
        let kind = self.kind();
        match self {
            EventProof::SubstrateRegistered(p) => link_hash(prev, kind, &p.claim),
            EventProof::ChannelAuthorized(p) => link_hash(prev, kind, &p.claim),
            EventProof::SessionCreated(p) => link_hash(prev, kind, &p.claim),
            EventProof::Flux(p) => link_hash(prev, kind, &p.claim),
            EventProof::ChannelSettled(p) => link_hash(prev, kind, &p.claim),
        }
    }
}

/// One entry of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CslEvent {
    /// Equal to the `current` of the event's hash-chain link.
    pub id: Digest,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub timestamp: Timestamp,
    pub proof: EventProof,
}

impl CslEvent {
    /// Wrap a constructed proof as an event.
    ///
    /// The id is taken from the proof's hash-chain link and the timestamp
    /// from its claim.
    pub fn from_proof<T: Claim>(proof: Proof<T>) -> Result<Self, CoreError> {
        let id = proof
            .hash_chain()
            .map(|link| link.current)
            .ok_or(CoreError::MissingHashChain)?;
        let timestamp = proof.claim.timestamp();
        Ok(Self {
            id,
            kind: T::KIND,
            timestamp,
            proof: T::into_event_proof(proof),
        })
    }

    /// Local verification of the carried proof.
    pub fn verify(&self, verifiers: &VerifierTable) -> Verdict {
        self.proof.verify(verifiers)
    }

    pub fn evidence(&self) -> &[Evidence] {
        self.proof.evidence()
    }

    /// The first hash-chain item, if any.
    pub fn hash_chain(&self) -> Option<&HashChainEvidence> {
        hash_chains(self.evidence()).next()
    }

    /// Parties named by the signature items.
    pub fn signature_parties(&self) -> Vec<&SubstrateId> {
        signatures(self.evidence()).map(|sig| &sig.party).collect()
    }
}

impl Claim for Substrate {
    const KIND: EventKind = EventKind::SubstrateRegistered;

    fn timestamp(&self) -> Timestamp {
        self.registered_at
    }

    fn verify_local(&self, evidence: &[Evidence], verifiers: &VerifierTable) -> Verdict {
        validation::verify_registration(self, evidence, verifiers)
    }

    fn into_event_proof(proof: Proof<Self>) -> EventProof {
        EventProof::SubstrateRegistered(proof)
    }
}

impl Claim for Channel {
    const KIND: EventKind = EventKind::ChannelAuthorized;

    fn timestamp(&self) -> Timestamp {
        self.authorized_at
    }

    fn verify_local(&self, evidence: &[Evidence], verifiers: &VerifierTable) -> Verdict {
        validation::verify_channel_authorization(self, evidence, verifiers)
    }

    fn into_event_proof(proof: Proof<Self>) -> EventProof {
        EventProof::ChannelAuthorized(proof)
    }
}

impl Claim for Session {
    const KIND: EventKind = EventKind::SessionCreated;

    fn timestamp(&self) -> Timestamp {
        self.created_at
    }

    fn verify_local(&self, evidence: &[Evidence], verifiers: &VerifierTable) -> Verdict {
        validation::verify_session(self, evidence, verifiers)
    }

    fn into_event_proof(proof: Proof<Self>) -> EventProof {
        EventProof::SessionCreated(proof)
    }
}

impl Claim for Flux {
    const KIND: EventKind = EventKind::Flux;

    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    fn verify_local(&self, evidence: &[Evidence], verifiers: &VerifierTable) -> Verdict {
        validation::verify_flux(self, evidence, verifiers)
    }

    fn into_event_proof(proof: Proof<Self>) -> EventProof {
        EventProof::Flux(proof)
    }
}

impl Claim for Settlement {
    const KIND: EventKind = EventKind::ChannelSettled;

    fn timestamp(&self) -> Timestamp {
        self.settled_at
    }

    fn verify_local(&self, evidence: &[Evidence], verifiers: &VerifierTable) -> Verdict {
        validation::verify_settlement(self, evidence, verifiers)
    }

    fn into_event_proof(proof: Proof<Self>) -> EventProof {
        EventProof::ChannelSettled(proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_tags_match_display() {
        for kind in EventKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(serde_json::from_str::<EventKind>("\"CHANNEL_FORKED\"").is_err());
    }
}
