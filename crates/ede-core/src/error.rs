//! Error types for EDE core.

use thiserror::Error;

use crate::ct::Ct;
use crate::event::EventKind;
use crate::types::SubstrateId;

/// Errors that can occur while constructing or encoding claims.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("no public key registered for primary suite {0}")]
    MissingPrimaryKey(String),

    #[error("proof carries no hash-chain evidence")]
    MissingHashChain,

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("decoding error: {0}")]
    Decoding(String),
}

/// Why a proof failed local verification.
///
/// Verification is data: a [`Verdict`] is returned, never panicked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("primary crypto suite {0} must be post-quantum")]
    PrimarySuiteNotPq(String),

    #[error("no post-quantum signature for substrate registration")]
    NoPqSignature,

    #[error("signature suite {0} must be post-quantum")]
    SignatureSuiteNotPq(String),

    #[error("no public key for suite {0}")]
    MissingPublicKey(String),

    #[error("signature by {party} does not verify")]
    SignatureInvalid { party: SubstrateId },

    #[error("self-signature names {found}, expected {expected}")]
    SelfSignatureParty {
        expected: SubstrateId,
        found: SubstrateId,
    },

    #[error("H+ substrate must have neural_coupling > 0")]
    NeuralCouplingRequired,

    #[error("channel crypto suite {0} must be post-quantum")]
    ChannelSuiteNotPq(String),

    #[error("missing signature from {0}")]
    MissingSignature(SubstrateId),

    #[error("at least one signature must be post-quantum")]
    NoPqChannelSignature,

    #[error("expected at least {expected} signatures, found {found}")]
    TooFewSignatures { expected: usize, found: usize },

    #[error("settlement signature by {party} uses non post-quantum suite {suite}")]
    SettlementSignatureNotPq { party: SubstrateId, suite: String },

    #[error("expected at least {expected} inclusion proofs, found {found}")]
    MissingInclusion { expected: usize, found: usize },

    #[error("inclusion proof {0} does not recompute its root")]
    InvalidInclusion(usize),

    #[error("channel budget must be positive")]
    NonPositiveBudget,

    #[error("channel expiry {expires} must be after authorization time {authorized_at}")]
    ExpiryNotAfterAuthorization { expires: i64, authorized_at: i64 },

    #[error("session must have at least one participant")]
    EmptySession,

    #[error("CT delta must be positive")]
    NonPositiveDelta,

    #[error("bio-binding evidence names {found}, expected sender {expected}")]
    BioBindingParty {
        expected: SubstrateId,
        found: SubstrateId,
    },

    #[error("CT conservation violated: fluxed={total_fluxed}, out={total_out}")]
    ConservationViolated { total_fluxed: Ct, total_out: Ct },

    #[error("distribution amounts must be positive (substrate {0})")]
    NonPositiveDistribution(SubstrateId),

    #[error("CT arithmetic overflow")]
    CtOverflow,

    #[error("missing hash chain evidence")]
    MissingHashChain,

    #[error("expected exactly one hash chain evidence item, found {0}")]
    DuplicateHashChain(usize),

    #[error("hash chain link does not match {0} claim")]
    HashChainMismatch(EventKind),

    #[error("claim could not be encoded: {0}")]
    Encoding(String),
}

/// Outcome of local proof verification.
pub type Verdict = Result<(), Rejection>;
