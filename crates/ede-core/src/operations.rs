//! The five claim-producing operations.
//!
//! Each operation is a params struct plus a constructor. The params build
//! the claim deterministically (`claim()`), so parties can sign
//! [`signing_bytes`](crate::canonical::signing_bytes) of it before the proof
//! is assembled. The constructor then takes those signatures, any inclusion
//! evidence and the previous ledger head, and returns a [`Proof`] whose
//! hash-chain link is computed against that head.
//!
//! Constructors do not verify. Call [`Proof::verify`] or let the ledger do it
//! on append.

use crate::canonical::link_hash;
use crate::crypto::{Digest, HashSuite, Signature, SuiteId};
use crate::ct::Ct;
use crate::error::CoreError;
use crate::evidence::{
    BioBindingEvidence, Evidence, HashChainEvidence, InclusionEvidence, NeuralCouplingProof,
    SignatureEvidence,
};
use crate::model::{
    Channel, ChannelState, Distribution, Flux, IoProfile, ObservedMetrics, Participant, Session,
    Settlement, StabilityProfile, Substrate, SubstrateClass, SubstrateCrypto,
};
use crate::proof::{Claim, Proof};
use crate::types::{ChannelId, FluxId, SessionId, SubstrateId, Timestamp};

/// Hash-chain link for `claim` appended after `prev`.
fn chain_link<T: Claim>(prev: &Digest, claim: &T) -> Result<Evidence, CoreError> {
    Ok(Evidence::HashChain(HashChainEvidence {
        hash_suite: HashSuite::Blake3,
        prev: *prev,
        current: link_hash(prev, T::KIND, claim)?,
    }))
}

fn signed(party: &SubstrateId, signature: Signature) -> Evidence {
    Evidence::Signature(SignatureEvidence::new(party.clone(), signature))
}

/// Parameters of `register_substrate`.
#[derive(Debug, Clone)]
pub struct RegisterSubstrate {
    pub class: SubstrateClass,
    pub io: IoProfile,
    pub stability: StabilityProfile,
    pub crypto: SubstrateCrypto,
    pub initial_ct: Ct,
    pub registered_at: Timestamp,
}

impl RegisterSubstrate {
    /// The substrate claim. The id is derived from the primary public key.
    pub fn claim(&self) -> Result<Substrate, CoreError> {
        let primary_key = self
            .crypto
            .primary_public_key()
            .ok_or_else(|| CoreError::MissingPrimaryKey(self.crypto.primary_suite.to_string()))?;

        Ok(Substrate {
            id: SubstrateId::derive(primary_key),
            class: self.class,
            io: self.io.clone(),
            stability: self.stability.clone(),
            crypto: self.crypto.clone(),
            ct_balance: self.initial_ct,
            registered_at: self.registered_at,
        })
    }
}

/// Build a registration proof: one self-signature and one hash-chain link.
pub fn register_substrate(
    params: &RegisterSubstrate,
    self_signature: Signature,
    prev: &Digest,
) -> Result<Proof<Substrate>, CoreError> {
    let claim = params.claim()?;
    let evidence = vec![signed(&claim.id, self_signature), chain_link(prev, &claim)?];
    Ok(Proof::new(claim, evidence))
}

/// Parameters of `authorize_channel`.
#[derive(Debug, Clone)]
pub struct AuthorizeChannel {
    pub from: SubstrateId,
    pub to: SubstrateId,
    pub budget_ct: Ct,
    pub max_bps: f64,
    pub expires: Timestamp,
    pub bio_binding_required: bool,
    pub crypto_suite: SuiteId,
    pub authorized_at: Timestamp,
}

impl AuthorizeChannel {
    /// The channel claim, OPEN with nothing consumed.
    pub fn claim(&self) -> Channel {
        Channel {
            id: ChannelId::derive(&self.from, &self.to, self.authorized_at),
            from: self.from.clone(),
            to: self.to.clone(),
            reserved_ct: self.budget_ct,
            consumed_ct: Ct::ZERO,
            max_bps: self.max_bps,
            expires: self.expires,
            state: ChannelState::Open,
            bio_binding_required: self.bio_binding_required,
            crypto_suite: self.crypto_suite.clone(),
            authorized_at: self.authorized_at,
        }
    }
}

/// Build a channel authorization proof.
///
/// Evidence: both parties' signatures, an inclusion proof for each endpoint
/// and the hash-chain link.
pub fn authorize_channel(
    params: &AuthorizeChannel,
    sig_from: Signature,
    sig_to: Signature,
    from_inclusion: InclusionEvidence,
    to_inclusion: InclusionEvidence,
    prev: &Digest,
) -> Result<Proof<Channel>, CoreError> {
    let claim = params.claim();
    let evidence = vec![
        signed(&claim.from, sig_from),
        signed(&claim.to, sig_to),
        Evidence::Inclusion(from_inclusion),
        Evidence::Inclusion(to_inclusion),
        chain_link(prev, &claim)?,
    ];
    Ok(Proof::new(claim, evidence))
}

/// Parameters of `create_session`.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub creator: SubstrateId,
    pub domain: Option<String>,
    pub participants: Vec<Participant>,
    pub created_at: Timestamp,
}

impl CreateSession {
    pub fn claim(&self) -> Session {
        Session {
            id: SessionId::derive(&self.creator, self.domain.as_deref(), self.created_at),
            domain: self.domain.clone(),
            participants: self.participants.clone(),
            created_at: self.created_at,
        }
    }
}

/// Build a session proof: the creator's signature and the hash-chain link.
pub fn create_session(
    params: &CreateSession,
    signature: Signature,
    prev: &Digest,
) -> Result<Proof<Session>, CoreError> {
    let claim = params.claim();
    let evidence = vec![signed(&params.creator, signature), chain_link(prev, &claim)?];
    Ok(Proof::new(claim, evidence))
}

/// Parameters of `flow`.
#[derive(Debug, Clone)]
pub struct Flow {
    pub channel: ChannelId,
    pub session: Option<SessionId>,
    pub from: SubstrateId,
    pub to: SubstrateId,
    pub ct_delta: Ct,
    pub is_critical: Option<bool>,
    pub observed: ObservedMetrics,
    pub timestamp: Timestamp,
}

impl Flow {
    /// The flux claim. Its id is bound to the head it is built against.
    pub fn claim(&self, prev: &Digest) -> Flux {
        Flux {
            id: FluxId::derive(&self.channel, self.timestamp, prev.as_bytes()),
            channel: self.channel.clone(),
            session: self.session.clone(),
            from: self.from.clone(),
            to: self.to.clone(),
            ct_delta: self.ct_delta,
            is_critical: self.is_critical,
            observed: self.observed.clone(),
            timestamp: self.timestamp,
        }
    }
}

/// Build a flux proof.
///
/// A supplied coupling proof adds bio-binding evidence for the sender over
/// `[sig_from.timestamp, claim.timestamp]`.
pub fn flow(
    params: &Flow,
    sig_from: Signature,
    sig_to: Signature,
    channel_inclusion: InclusionEvidence,
    coupling: Option<NeuralCouplingProof>,
    prev: &Digest,
) -> Result<Proof<Flux>, CoreError> {
    let claim = params.claim(prev);
    let window_start = sig_from.timestamp;

    let mut evidence = vec![
        signed(&claim.from, sig_from),
        signed(&claim.to, sig_to),
        Evidence::Inclusion(channel_inclusion),
    ];
    if let Some(coupling) = coupling {
        evidence.push(Evidence::BioBinding(BioBindingEvidence {
            substrate: claim.from.clone(),
            io_correlation: coupling.coupling_score,
            coupling,
            time_window: (window_start, claim.timestamp),
        }));
    }
    evidence.push(chain_link(prev, &claim)?);

    Ok(Proof::new(claim, evidence))
}

/// Parameters of `settle_ct`.
#[derive(Debug, Clone)]
pub struct SettleCt {
    pub channel: ChannelId,
    /// Channel endpoints, named as the signing parties.
    pub from: SubstrateId,
    pub to: SubstrateId,
    pub total_fluxed: Ct,
    pub fees: Ct,
    pub distributions: Vec<Distribution>,
    pub settled_at: Timestamp,
}

impl SettleCt {
    pub fn claim(&self) -> Settlement {
        Settlement {
            channel: self.channel.clone(),
            total_fluxed: self.total_fluxed,
            fees: self.fees,
            distributions: self.distributions.clone(),
            settled_at: self.settled_at,
        }
    }
}

/// Build a settlement proof: both endpoints' signatures, the channel's
/// inclusion proof and the hash-chain link.
pub fn settle_ct(
    params: &SettleCt,
    sig_from: Signature,
    sig_to: Signature,
    channel_inclusion: InclusionEvidence,
    prev: &Digest,
) -> Result<Proof<Settlement>, CoreError> {
    let claim = params.claim();
    let evidence = vec![
        signed(&params.from, sig_from),
        signed(&params.to, sig_to),
        Evidence::Inclusion(channel_inclusion),
        chain_link(prev, &claim)?,
    ];
    Ok(Proof::new(claim, evidence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::signing_bytes;
    use crate::crypto::{Keypair, VerifierTable};
    use crate::error::Rejection;
    use crate::evidence::{bio_bindings, signatures};
    use crate::merkle::generate_merkle_proof;
    use crate::model::ParticipantRole;
    use std::collections::BTreeMap;

    const T0: Timestamp = 1_736_870_400_000;

    fn crypto_for(keypair: &Keypair, primary: SuiteId) -> SubstrateCrypto {
        let mut public_keys = BTreeMap::new();
        public_keys.insert(primary.clone(), keypair.public_key(&primary));
        SubstrateCrypto {
            supported_suites: vec![primary.clone()],
            primary_suite: primary,
            public_keys,
        }
    }

    fn registration(keypair: &Keypair, class: SubstrateClass, suite: SuiteId) -> RegisterSubstrate {
        let mut io = IoProfile::new(1e6, 5.0);
        if class == SubstrateClass::HPlus {
            io.neural_coupling = Some(0.8);
        }
        RegisterSubstrate {
            class,
            io,
            stability: StabilityProfile::default(),
            crypto: crypto_for(keypair, suite),
            initial_ct: Ct::new(100),
            registered_at: T0,
        }
    }

    fn inclusion(tag: &[u8]) -> InclusionEvidence {
        let leaves = [Digest::hash(tag), Digest::hash(b"other")];
        generate_merkle_proof(&leaves, 0).unwrap().into()
    }

    #[test]
    fn test_register_substrate_valid() {
        let keypair = Keypair::from_seed(&[0x11; 32]);
        let params = registration(&keypair, SubstrateClass::HPlus, SuiteId::PQ_DILITHIUM_3);
        let claim = params.claim().unwrap();
        let sig = keypair.sign(&SuiteId::PQ_DILITHIUM_3, &signing_bytes(&claim).unwrap(), T0);

        let proof = register_substrate(&params, sig, &Digest::ZERO).unwrap();
        let table = VerifierTable::development();
        assert_eq!(proof.verify(&table), Ok(()));
        assert_eq!(proof.verify(&table), Ok(()));
        assert_eq!(proof.digest().unwrap(), proof.digest().unwrap());
    }

    #[test]
    fn test_register_classical_primary_rejected() {
        let keypair = Keypair::from_seed(&[0x12; 32]);
        let params = registration(&keypair, SubstrateClass::So, SuiteId::CLASSICAL_ED25519);
        let claim = params.claim().unwrap();
        let sig = keypair.sign(&SuiteId::CLASSICAL_ED25519, &signing_bytes(&claim).unwrap(), T0);

        let proof = register_substrate(&params, sig, &Digest::ZERO).unwrap();
        assert!(matches!(
            proof.verify(&VerifierTable::development()),
            Err(Rejection::PrimarySuiteNotPq(_))
        ));
    }

    #[test]
    fn test_register_h_plus_requires_coupling() {
        let keypair = Keypair::from_seed(&[0x13; 32]);
        let mut params = registration(&keypair, SubstrateClass::HPlus, SuiteId::PQ_FALCON_512);
        params.io.neural_coupling = None;
        let claim = params.claim().unwrap();
        let sig = keypair.sign(&SuiteId::PQ_FALCON_512, &signing_bytes(&claim).unwrap(), T0);

        let proof = register_substrate(&params, sig, &Digest::ZERO).unwrap();
        assert_eq!(
            proof.verify(&VerifierTable::development()),
            Err(Rejection::NeuralCouplingRequired)
        );
    }

    #[test]
    fn test_register_missing_primary_key() {
        let keypair = Keypair::from_seed(&[0x14; 32]);
        let mut params = registration(&keypair, SubstrateClass::So, SuiteId::PQ_FALCON_512);
        params.crypto.public_keys.clear();
        assert!(matches!(params.claim(), Err(CoreError::MissingPrimaryKey(_))));
    }

    #[test]
    fn test_register_tampered_claim_fails_signature() {
        let keypair = Keypair::from_seed(&[0x15; 32]);
        let params = registration(&keypair, SubstrateClass::So, SuiteId::PQ_FALCON_512);
        let claim = params.claim().unwrap();
        let sig = keypair.sign(&SuiteId::PQ_FALCON_512, &signing_bytes(&claim).unwrap(), T0);

        let mut proof = register_substrate(&params, sig, &Digest::ZERO).unwrap();
        proof.claim.ct_balance = Ct::new(1_000_000);
        assert!(matches!(
            proof.verify(&VerifierTable::development()),
            Err(Rejection::SignatureInvalid { .. })
        ));
    }

    fn channel_params() -> AuthorizeChannel {
        AuthorizeChannel {
            from: SubstrateId::from("did:ede:from"),
            to: SubstrateId::from("did:ede:to"),
            budget_ct: Ct::new(1000),
            max_bps: 1e6,
            expires: T0 + 3_600_000,
            bio_binding_required: false,
            crypto_suite: SuiteId::PQ_DILITHIUM_3,
            authorized_at: T0,
        }
    }

    #[test]
    fn test_authorize_channel_valid_and_rules() {
        let alice = Keypair::from_seed(&[0x21; 32]);
        let bob = Keypair::from_seed(&[0x22; 32]);
        let table = VerifierTable::development();

        let build = |params: &AuthorizeChannel, to_suite: &SuiteId| {
            let msg = signing_bytes(&params.claim()).unwrap();
            authorize_channel(
                params,
                alice.sign(&SuiteId::PQ_DILITHIUM_3, &msg, T0),
                bob.sign(to_suite, &msg, T0),
                inclusion(b"from"),
                inclusion(b"to"),
                &Digest::ZERO,
            )
            .unwrap()
        };

        let params = channel_params();
        let proof = build(&params, &SuiteId::CLASSICAL_ED25519);
        assert_eq!(proof.verify(&table), Ok(()));
        assert_eq!(proof.claim.consumed_ct, Ct::ZERO);
        assert_eq!(proof.claim.state, ChannelState::Open);

        let mut zero_budget = channel_params();
        zero_budget.budget_ct = Ct::ZERO;
        assert_eq!(
            build(&zero_budget, &SuiteId::PQ_FALCON_512).verify(&table),
            Err(Rejection::NonPositiveBudget)
        );

        let mut expired = channel_params();
        expired.expires = T0;
        assert!(matches!(
            build(&expired, &SuiteId::PQ_FALCON_512).verify(&table),
            Err(Rejection::ExpiryNotAfterAuthorization { .. })
        ));

        let mut classical = channel_params();
        classical.crypto_suite = SuiteId::CLASSICAL_ECDSA_SECP256K1;
        assert!(matches!(
            build(&classical, &SuiteId::PQ_FALCON_512).verify(&table),
            Err(Rejection::ChannelSuiteNotPq(_))
        ));
    }

    #[test]
    fn test_authorize_channel_needs_both_inclusions() {
        let alice = Keypair::from_seed(&[0x23; 32]);
        let bob = Keypair::from_seed(&[0x24; 32]);
        let params = channel_params();
        let msg = signing_bytes(&params.claim()).unwrap();

        let mut proof = authorize_channel(
            &params,
            alice.sign(&SuiteId::PQ_DILITHIUM_3, &msg, T0),
            bob.sign(&SuiteId::PQ_DILITHIUM_3, &msg, T0),
            inclusion(b"from"),
            inclusion(b"to"),
            &Digest::ZERO,
        )
        .unwrap();
        proof.evidence.retain(|e| !matches!(e, Evidence::Inclusion(_)));

        assert_eq!(
            proof.verify(&VerifierTable::development()),
            Err(Rejection::MissingInclusion {
                expected: 2,
                found: 0
            })
        );
    }

    #[test]
    fn test_create_session() {
        let creator = Keypair::from_seed(&[0x31; 32]);
        let params = CreateSession {
            creator: SubstrateId::from("did:ede:creator"),
            domain: Some("surgery".into()),
            participants: vec![Participant {
                entity: SubstrateId::from("did:ede:creator"),
                class: SubstrateClass::H,
                role: ParticipantRole::Operator,
            }],
            created_at: T0,
        };
        let msg = signing_bytes(&params.claim()).unwrap();
        let proof = create_session(
            &params,
            creator.sign(&SuiteId::PQ_DILITHIUM_3, &msg, T0),
            &Digest::ZERO,
        )
        .unwrap();
        assert_eq!(proof.verify(&VerifierTable::development()), Ok(()));

        let mut empty = proof.clone();
        empty.claim.participants.clear();
        assert_eq!(
            empty.verify(&VerifierTable::development()),
            Err(Rejection::EmptySession)
        );
    }

    fn flow_params() -> Flow {
        Flow {
            channel: ChannelId::from("ch_test"),
            session: None,
            from: SubstrateId::from("did:ede:from"),
            to: SubstrateId::from("did:ede:to"),
            ct_delta: Ct::new(500),
            is_critical: None,
            observed: ObservedMetrics {
                actual_bps: 9e5,
                error_rate: 0.001,
                energy_joules: 0.5,
            },
            timestamp: T0 + 1000,
        }
    }

    #[test]
    fn test_flow_with_coupling_adds_bio_binding() {
        let alice = Keypair::from_seed(&[0x41; 32]);
        let bob = Keypair::from_seed(&[0x42; 32]);
        let params = flow_params();
        let prev = Digest::hash(b"head");
        let msg = signing_bytes(&params.claim(&prev)).unwrap();

        let coupling = NeuralCouplingProof {
            coupling_score: 0.9,
            bio_plausibility: 0.95,
            noise_entropy: 0.1,
            conduction_velocity_ms: 60.0,
        };
        let proof = flow(
            &params,
            alice.sign(&SuiteId::PQ_DILITHIUM_3, &msg, T0),
            bob.sign(&SuiteId::PQ_DILITHIUM_3, &msg, T0),
            inclusion(b"channel"),
            Some(coupling),
            &prev,
        )
        .unwrap();

        assert_eq!(proof.verify(&VerifierTable::development()), Ok(()));
        let binding = bio_bindings(&proof.evidence).next().unwrap();
        assert_eq!(binding.substrate, params.from);
        assert_eq!(binding.time_window, (T0, T0 + 1000));
        assert_eq!(binding.io_correlation, 0.9);
    }

    #[test]
    fn test_flow_single_signature_fails() {
        let alice = Keypair::from_seed(&[0x43; 32]);
        let bob = Keypair::from_seed(&[0x44; 32]);
        let params = flow_params();
        let msg = signing_bytes(&params.claim(&Digest::ZERO)).unwrap();

        let mut proof = flow(
            &params,
            alice.sign(&SuiteId::PQ_DILITHIUM_3, &msg, T0),
            bob.sign(&SuiteId::PQ_DILITHIUM_3, &msg, T0),
            inclusion(b"channel"),
            None,
            &Digest::ZERO,
        )
        .unwrap();
        let to = params.to.clone();
        proof
            .evidence
            .retain(|e| !matches!(e, Evidence::Signature(sig) if sig.party == to));

        assert_eq!(signatures(&proof.evidence).count(), 1);
        assert_eq!(
            proof.verify(&VerifierTable::development()),
            Err(Rejection::MissingSignature(to))
        );
    }

    #[test]
    fn test_flow_zero_delta_fails() {
        let alice = Keypair::from_seed(&[0x45; 32]);
        let mut params = flow_params();
        params.ct_delta = Ct::ZERO;
        let msg = signing_bytes(&params.claim(&Digest::ZERO)).unwrap();
        let proof = flow(
            &params,
            alice.sign(&SuiteId::PQ_DILITHIUM_3, &msg, T0),
            alice.sign(&SuiteId::PQ_DILITHIUM_3, &msg, T0),
            inclusion(b"channel"),
            None,
            &Digest::ZERO,
        )
        .unwrap();
        assert_eq!(
            proof.verify(&VerifierTable::development()),
            Err(Rejection::NonPositiveDelta)
        );
    }

    fn settle_params(fees: u64) -> SettleCt {
        SettleCt {
            channel: ChannelId::from("ch_test"),
            from: SubstrateId::from("did:ede:from"),
            to: SubstrateId::from("did:ede:to"),
            total_fluxed: Ct::new(500),
            fees: Ct::from(fees),
            distributions: vec![
                Distribution::new(SubstrateId::from("did:ede:to"), 450u64),
                Distribution::new(SubstrateId::from("did:ede:from"), 25u64),
            ],
            settled_at: T0 + 5000,
        }
    }

    fn settle_with(params: &SettleCt, to_suite: &SuiteId) -> Proof<Settlement> {
        let alice = Keypair::from_seed(&[0x51; 32]);
        let bob = Keypair::from_seed(&[0x52; 32]);
        let msg = signing_bytes(&params.claim()).unwrap();
        settle_ct(
            params,
            alice.sign(&SuiteId::PQ_DILITHIUM_3, &msg, T0),
            bob.sign(to_suite, &msg, T0),
            inclusion(b"channel"),
            &Digest::ZERO,
        )
        .unwrap()
    }

    #[test]
    fn test_settle_conserves() {
        let table = VerifierTable::development();
        assert_eq!(
            settle_with(&settle_params(25), &SuiteId::PQ_FALCON_512).verify(&table),
            Ok(())
        );
        assert_eq!(
            settle_with(&settle_params(30), &SuiteId::PQ_FALCON_512).verify(&table),
            Err(Rejection::ConservationViolated {
                total_fluxed: Ct::new(500),
                total_out: Ct::new(505),
            })
        );
    }

    #[test]
    fn test_settle_requires_all_pq() {
        let proof = settle_with(&settle_params(25), &SuiteId::CLASSICAL_ED25519);
        assert!(matches!(
            proof.verify(&VerifierTable::development()),
            Err(Rejection::SettlementSignatureNotPq { .. })
        ));
    }

    #[test]
    fn test_settle_zero_distribution_fails() {
        let mut params = settle_params(25);
        params.distributions.push(Distribution::new(SubstrateId::from("did:ede:x"), 0u64));
        let proof = settle_with(&params, &SuiteId::PQ_FALCON_512);
        assert!(matches!(
            proof.verify(&VerifierTable::development()),
            Err(Rejection::NonPositiveDistribution(_))
        ));
    }

    #[test]
    fn test_tampered_link_detected() {
        let mut proof = settle_with(&settle_params(25), &SuiteId::PQ_FALCON_512);
        for e in proof.evidence.iter_mut() {
            if let Evidence::HashChain(link) = e {
                link.prev = Digest::hash(b"elsewhere");
            }
        }
        assert_eq!(
            proof.verify(&VerifierTable::development()),
            Err(Rejection::HashChainMismatch(crate::event::EventKind::ChannelSettled))
        );
    }

    #[test]
    fn test_register_self_signature_must_name_substrate() {
        let keypair = Keypair::from_seed(&[0x16; 32]);
        let params = registration(&keypair, SubstrateClass::So, SuiteId::PQ_FALCON_512);
        let claim = params.claim().unwrap();
        let sig = keypair.sign(&SuiteId::PQ_FALCON_512, &signing_bytes(&claim).unwrap(), T0);

        let mut proof = register_substrate(&params, sig, &Digest::ZERO).unwrap();
        let impostor = SubstrateId::from("did:ede:impostor");
        for e in proof.evidence.iter_mut() {
            if let Evidence::Signature(sig) = e {
                sig.party = impostor.clone();
            }
        }
        assert_eq!(
            proof.verify(&VerifierTable::development()),
            Err(Rejection::SelfSignatureParty {
                expected: claim.id,
                found: impostor,
            })
        );
    }

    #[test]
    fn test_register_signature_suite_needs_registered_key() {
        let keypair = Keypair::from_seed(&[0x17; 32]);
        let params = registration(&keypair, SubstrateClass::So, SuiteId::PQ_FALCON_512);
        let claim = params.claim().unwrap();
        // Signed under a PQ suite the claim registers no key for.
        let sig = keypair.sign(&SuiteId::PQ_DILITHIUM_5, &signing_bytes(&claim).unwrap(), T0);

        let proof = register_substrate(&params, sig, &Digest::ZERO).unwrap();
        assert_eq!(
            proof.verify(&VerifierTable::development()),
            Err(Rejection::MissingPublicKey(SuiteId::PQ_DILITHIUM_5.to_string()))
        );
    }

    #[test]
    fn test_register_without_signature() {
        let keypair = Keypair::from_seed(&[0x18; 32]);
        let params = registration(&keypair, SubstrateClass::So, SuiteId::PQ_FALCON_512);
        let claim = params.claim().unwrap();
        let sig = keypair.sign(&SuiteId::PQ_FALCON_512, &signing_bytes(&claim).unwrap(), T0);

        let mut proof = register_substrate(&params, sig, &Digest::ZERO).unwrap();
        proof.evidence.retain(|e| !matches!(e, Evidence::Signature(_)));
        assert_eq!(
            proof.verify(&VerifierTable::development()),
            Err(Rejection::NoPqSignature)
        );
    }

    #[test]
    fn test_session_needs_a_signature() {
        let creator = Keypair::from_seed(&[0x32; 32]);
        let params = CreateSession {
            creator: SubstrateId::from("did:ede:creator"),
            domain: None,
            participants: vec![Participant {
                entity: SubstrateId::from("did:ede:creator"),
                class: SubstrateClass::So,
                role: ParticipantRole::SoNode,
            }],
            created_at: T0,
        };
        let msg = signing_bytes(&params.claim()).unwrap();
        let mut proof = create_session(
            &params,
            creator.sign(&SuiteId::PQ_FALCON_512, &msg, T0),
            &Digest::ZERO,
        )
        .unwrap();
        proof.evidence.retain(|e| !matches!(e, Evidence::Signature(_)));

        assert_eq!(
            proof.verify(&VerifierTable::development()),
            Err(Rejection::TooFewSignatures {
                expected: 1,
                found: 0
            })
        );
    }

    #[test]
    fn test_bio_binding_must_name_sender() {
        let alice = Keypair::from_seed(&[0x46; 32]);
        let bob = Keypair::from_seed(&[0x47; 32]);
        let params = flow_params();
        let msg = signing_bytes(&params.claim(&Digest::ZERO)).unwrap();
        let coupling = NeuralCouplingProof {
            coupling_score: 0.7,
            bio_plausibility: 0.9,
            noise_entropy: 0.2,
            conduction_velocity_ms: 55.0,
        };

        let mut proof = flow(
            &params,
            alice.sign(&SuiteId::PQ_DILITHIUM_3, &msg, T0),
            bob.sign(&SuiteId::PQ_DILITHIUM_3, &msg, T0),
            inclusion(b"channel"),
            Some(coupling),
            &Digest::ZERO,
        )
        .unwrap();
        for e in proof.evidence.iter_mut() {
            if let Evidence::BioBinding(binding) = e {
                binding.substrate = params.to.clone();
            }
        }

        assert_eq!(
            proof.verify(&VerifierTable::development()),
            Err(Rejection::BioBindingParty {
                expected: params.from.clone(),
                found: params.to.clone(),
            })
        );
    }

    #[test]
    fn test_settle_needs_both_signatures() {
        let mut proof = settle_with(&settle_params(25), &SuiteId::PQ_FALCON_512);
        let to = SubstrateId::from("did:ede:to");
        proof
            .evidence
            .retain(|e| !matches!(e, Evidence::Signature(sig) if sig.party == to));

        assert_eq!(
            proof.verify(&VerifierTable::development()),
            Err(Rejection::TooFewSignatures {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_inclusion_must_recompute_root() {
        let mut proof = settle_with(&settle_params(25), &SuiteId::PQ_FALCON_512);
        for e in proof.evidence.iter_mut() {
            if let Evidence::Inclusion(inclusion) = e {
                inclusion.root = Digest::hash(b"another tree");
            }
        }
        assert_eq!(
            proof.verify(&VerifierTable::development()),
            Err(Rejection::InvalidInclusion(0))
        );
    }

    #[test]
    fn test_exactly_one_hash_chain_link() {
        let table = VerifierTable::development();
        let proof = settle_with(&settle_params(25), &SuiteId::PQ_FALCON_512);
        let link = proof
            .evidence
            .iter()
            .find(|e| matches!(e, Evidence::HashChain(_)))
            .cloned()
            .unwrap();

        let mut doubled = proof.clone();
        doubled.evidence.push(link);
        assert_eq!(doubled.verify(&table), Err(Rejection::DuplicateHashChain(2)));

        let mut unlinked = proof;
        unlinked.evidence.retain(|e| !matches!(e, Evidence::HashChain(_)));
        assert_eq!(unlinked.verify(&table), Err(Rejection::MissingHashChain));
    }
}
