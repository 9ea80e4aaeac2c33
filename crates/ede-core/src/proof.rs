//! `Proof<T>`: a claim bundled with its evidence.
//!
//! A proof is plain data. Verification is a free function chosen by the
//! claim type ([`Claim::verify_local`]) plus an explicitly passed
//! [`VerifierTable`]; it reads nothing but the proof and the table, so any
//! holder of the proof reaches the same verdict.

use serde::{Deserialize, Serialize};

use crate::canonical;
use crate::crypto::{Digest, VerifierTable};
use crate::error::{CoreError, Verdict};
use crate::event::{EventKind, EventProof};
use crate::evidence::{hash_chains, Evidence, HashChainEvidence};
use crate::types::Timestamp;

/// A claim type that can be admitted to the ledger.
pub trait Claim: Serialize + Clone {
    /// The event tag this claim is recorded under.
    const KIND: EventKind;

    /// When the claim was made.
    fn timestamp(&self) -> Timestamp;

    /// Local verification rule for this claim type.
    fn verify_local(&self, evidence: &[Evidence], verifiers: &VerifierTable) -> Verdict;

    /// Wrap a proof of this claim into the ledger's proof sum type.
    fn into_event_proof(proof: Proof<Self>) -> EventProof;
}

/// A claim value plus an ordered evidence list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proof<T> {
    pub claim: T,
    pub evidence: Vec<Evidence>,
}

impl<T: Claim> Proof<T> {
    /// Assemble a proof. Constructors in [`crate::operations`] are the
    /// normal way to get one.
    pub fn new(claim: T, evidence: Vec<Evidence>) -> Self {
        Self { claim, evidence }
    }

    /// Run the claim type's local verification rule.
    ///
    /// Pure: repeated calls with the same table give the same verdict.
    pub fn verify(&self, verifiers: &VerifierTable) -> Verdict {
        self.claim.verify_local(&self.evidence, verifiers)
    }

    /// The first hash-chain item, if any.
    pub fn hash_chain(&self) -> Option<&HashChainEvidence> {
        hash_chains(&self.evidence).next()
    }

    /// Digest of the canonical encoding of claim and evidence.
    pub fn digest(&self) -> Result<Digest, CoreError> {
        canonical::hash(self)
    }
}
