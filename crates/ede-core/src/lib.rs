//! # EDE Core
//!
//! Pure primitives for EDE: claims, evidence, proofs and the five operations
//! that produce them.
//!
//! This crate contains no I/O, no storage, no clock reads. It is pure
//! computation over value types; the ledger lives in `ede-ledger` and the
//! ledger-wide invariants in `ede-audit`.
//!
//! ## Key Types
//!
//! - [`Proof`] - A claim plus its evidence, verified by [`Proof::verify`]
//! - [`Evidence`] - Signature, hash-chain, inclusion, bio-binding or oracle support
//! - [`CslEvent`] - A ledger entry: type tag plus an [`EventProof`]
//! - [`Ct`] - Conserved, non-negative integer value
//! - [`VerifierTable`] - Suite -> verifier capability table, always passed in
//!
//! ## Canonicalization
//!
//! Every hash and signature is computed over deterministic CBOR. See the
//! [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod ct;
pub mod error;
pub mod event;
pub mod evidence;
pub mod interchange;
pub mod merkle;
pub mod model;
pub mod operations;
pub mod proof;
pub mod types;
pub mod validation;

pub use canonical::{canonical_bytes, link_hash, signing_bytes};
pub use crypto::{
    is_pq_suite, sign, verify_signature, Digest, HashSuite, Keypair, Signature, SuiteId,
    SuiteVerifier, VerifierTable,
};
pub use ct::Ct;
pub use error::{CoreError, Rejection, Verdict};
pub use event::{CslEvent, EventKind, EventProof};
pub use evidence::{
    BioBindingEvidence, Evidence, HashChainEvidence, InclusionEvidence, NeuralCouplingProof,
    OracleEvidence, SignatureEvidence,
};
pub use interchange::{export_entity, import_entity, EntityDocument};
pub use merkle::{build_merkle_tree, generate_merkle_proof, verify_merkle_proof, MerkleProof};
pub use model::{
    Channel, ChannelState, Distribution, Flux, IoProfile, ObservedMetrics, Participant,
    ParticipantRole, Session, Settlement, StabilityProfile, Substrate, SubstrateClass,
    SubstrateCrypto,
};
pub use operations::{
    authorize_channel, create_session, flow, register_substrate, settle_ct, AuthorizeChannel,
    CreateSession, Flow, RegisterSubstrate, SettleCt,
};
pub use proof::{Claim, Proof};
pub use types::{ChannelId, FluxId, SessionId, SubstrateId, Timestamp};
