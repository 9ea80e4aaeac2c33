//! Evidence: the typed pieces of support a proof carries.
//!
//! [`Evidence`] is a closed sum type. Every consumer matches it exhaustively,
//! so adding a variant is a compile error everywhere it matters.

use serde::{Deserialize, Serialize};

use crate::crypto::{Digest, HashSuite, Signature, SuiteId};
use crate::merkle::{verify_merkle_proof, MerkleProof};
use crate::types::{SubstrateId, Timestamp};

/// One typed piece of support for a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Evidence {
    Signature(SignatureEvidence),
    HashChain(HashChainEvidence),
    Inclusion(InclusionEvidence),
    BioBinding(BioBindingEvidence),
    /// Present in the taxonomy; no core rule consumes it.
    Oracle(OracleEvidence),
}

/// A party's signature over the claim's signing bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEvidence {
    pub suite: SuiteId,
    pub party: SubstrateId,
    pub signature: Signature,
}

impl SignatureEvidence {
    pub fn new(party: SubstrateId, signature: Signature) -> Self {
        Self {
            suite: signature.suite.clone(),
            party,
            signature,
        }
    }
}

/// Link from the previous ledger head to this event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashChainEvidence {
    pub hash_suite: HashSuite,
    pub prev: Digest,
    pub current: Digest,
}

/// Merkle inclusion of `leaf` under `root`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionEvidence {
    pub hash_suite: HashSuite,
    pub root: Digest,
    pub path: Vec<Digest>,
    pub index: u64,
    pub leaf: Digest,
    pub leaf_count: u64,
}

impl InclusionEvidence {
    /// Recompute the root from the recorded path.
    pub fn verify(&self) -> bool {
        verify_merkle_proof(&self.root, &self.leaf, &self.path, self.index, self.leaf_count)
    }
}

impl From<MerkleProof> for InclusionEvidence {
    fn from(proof: MerkleProof) -> Self {
        Self {
            hash_suite: HashSuite::Blake3,
            root: proof.root,
            path: proof.path,
            index: proof.index,
            leaf: proof.leaf,
            leaf_count: proof.leaf_count,
        }
    }
}

/// Measured neural coupling of an augmented-human sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuralCouplingProof {
    pub coupling_score: f64,
    pub bio_plausibility: f64,
    pub noise_entropy: f64,
    pub conduction_velocity_ms: f64,
}

/// Binds a flux to a biological source over a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BioBindingEvidence {
    pub substrate: SubstrateId,
    pub coupling: NeuralCouplingProof,
    pub time_window: (Timestamp, Timestamp),
    pub io_correlation: f64,
}

/// An external attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleEvidence {
    pub oracle_id: String,
    pub attestation: String,
    pub timestamp: Timestamp,
}

/// Signature items, in order.
pub fn signatures(evidence: &[Evidence]) -> impl Iterator<Item = &SignatureEvidence> {
    evidence.iter().filter_map(|e| match e {
        Evidence::Signature(sig) => Some(sig),
        _ => None,
    })
}

/// Hash-chain items, in order.
pub fn hash_chains(evidence: &[Evidence]) -> impl Iterator<Item = &HashChainEvidence> {
    evidence.iter().filter_map(|e| match e {
        Evidence::HashChain(link) => Some(link),
        _ => None,
    })
}

/// Inclusion items, in order.
pub fn inclusions(evidence: &[Evidence]) -> impl Iterator<Item = &InclusionEvidence> {
    evidence.iter().filter_map(|e| match e {
        Evidence::Inclusion(inclusion) => Some(inclusion),
        _ => None,
    })
}

/// Bio-binding items, in order.
pub fn bio_bindings(evidence: &[Evidence]) -> impl Iterator<Item = &BioBindingEvidence> {
    evidence.iter().filter_map(|e| match e {
        Evidence::BioBinding(binding) => Some(binding),
        _ => None,
    })
}

/// Whether `party` appears among the signature items.
pub fn signed_by(evidence: &[Evidence], party: &SubstrateId) -> bool {
    signatures(evidence).any(|sig| sig.party == *party)
}
