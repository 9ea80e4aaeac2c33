//! Local verification rules, one per claim type.
//!
//! Each rule reads only the claim, its evidence and the verifier table.
//! Rules check cheap structural conditions before signatures, and the
//! hash-chain link last.

use serde::Serialize;

use crate::canonical::{link_hash, signing_bytes};
use crate::crypto::{is_pq_suite, VerifierTable};
use crate::ct::Ct;
use crate::error::{Rejection, Verdict};
use crate::event::EventKind;
use crate::evidence::{
    bio_bindings, hash_chains, inclusions, signatures, signed_by, Evidence, SignatureEvidence,
};
use crate::model::{Channel, Flux, Session, Settlement, Substrate, SubstrateClass};

/// Signing bytes of `claim`, as a rejection if the claim cannot be encoded.
fn claim_bytes<T: Serialize>(claim: &T) -> Result<Vec<u8>, Rejection> {
    signing_bytes(claim).map_err(|e| Rejection::Encoding(e.to_string()))
}

/// Exactly one hash-chain item whose `current` is the link of `claim` after `prev`.
fn check_hash_chain<T: Serialize>(kind: EventKind, claim: &T, evidence: &[Evidence]) -> Verdict {
    let links: Vec<_> = hash_chains(evidence).collect();
    let link = match links.as_slice() {
        [] => return Err(Rejection::MissingHashChain),
        [link] => link,
        many => return Err(Rejection::DuplicateHashChain(many.len())),
    };

    let expected =
        link_hash(&link.prev, kind, claim).map_err(|e| Rejection::Encoding(e.to_string()))?;
    if link.current != expected {
        return Err(Rejection::HashChainMismatch(kind));
    }
    Ok(())
}

/// A signature verifies over `message` under `public_key`, and the suite the
/// evidence declares is the one the blob was made with.
fn check_signature_under(
    sig: &SignatureEvidence,
    message: &[u8],
    public_key: &str,
    verifiers: &VerifierTable,
) -> Verdict {
    if sig.suite != sig.signature.suite
        || !verifiers.verify_signature(message, &sig.signature, public_key)
    {
        return Err(Rejection::SignatureInvalid {
            party: sig.party.clone(),
        });
    }
    Ok(())
}

/// A signature verifies under the key it carries.
fn check_signature(sig: &SignatureEvidence, message: &[u8], verifiers: &VerifierTable) -> Verdict {
    check_signature_under(sig, message, &sig.signature.public_key, verifiers)
}

fn check_inclusions(evidence: &[Evidence], expected: usize) -> Verdict {
    let mut found = 0;
    for (i, inclusion) in inclusions(evidence).enumerate() {
        if !inclusion.verify() {
            return Err(Rejection::InvalidInclusion(i));
        }
        found += 1;
    }
    if found < expected {
        return Err(Rejection::MissingInclusion { expected, found });
    }
    Ok(())
}

/// SUBSTRATE_REGISTERED.
///
/// - primary suite is PQ/hybrid
/// - H_PLUS declares neural coupling > 0
/// - a self-signature exists; every signature is PQ/hybrid, names the
///   substrate, and verifies under the key the claim registers for its suite
/// - one hash-chain link
pub fn verify_registration(
    claim: &Substrate,
    evidence: &[Evidence],
    verifiers: &VerifierTable,
) -> Verdict {
    if !is_pq_suite(&claim.crypto.primary_suite) {
        return Err(Rejection::PrimarySuiteNotPq(
            claim.crypto.primary_suite.to_string(),
        ));
    }

    if claim.class == SubstrateClass::HPlus {
        match claim.io.neural_coupling {
            Some(coupling) if coupling > 0.0 => {}
            _ => return Err(Rejection::NeuralCouplingRequired),
        }
    }

    let message = claim_bytes(claim)?;
    let mut seen = 0;
    for sig in signatures(evidence) {
        seen += 1;
        if !is_pq_suite(&sig.suite) {
            return Err(Rejection::SignatureSuiteNotPq(sig.suite.to_string()));
        }
        if sig.party != claim.id {
            return Err(Rejection::SelfSignatureParty {
                expected: claim.id.clone(),
                found: sig.party.clone(),
            });
        }
        let public_key = claim
            .crypto
            .public_key(&sig.suite)
            .ok_or_else(|| Rejection::MissingPublicKey(sig.suite.to_string()))?;
        check_signature_under(sig, &message, public_key, verifiers)?;
    }
    if seen == 0 {
        return Err(Rejection::NoPqSignature);
    }

    check_hash_chain(EventKind::SubstrateRegistered, claim, evidence)
}

/// CHANNEL_AUTHORIZED.
pub fn verify_channel_authorization(
    claim: &Channel,
    evidence: &[Evidence],
    verifiers: &VerifierTable,
) -> Verdict {
    if !is_pq_suite(&claim.crypto_suite) {
        return Err(Rejection::ChannelSuiteNotPq(claim.crypto_suite.to_string()));
    }
    if claim.reserved_ct.is_zero() {
        return Err(Rejection::NonPositiveBudget);
    }
    if claim.expires <= claim.authorized_at {
        return Err(Rejection::ExpiryNotAfterAuthorization {
            expires: claim.expires,
            authorized_at: claim.authorized_at,
        });
    }

    for party in [&claim.from, &claim.to] {
        if !signed_by(evidence, party) {
            return Err(Rejection::MissingSignature(party.clone()));
        }
    }
    if !signatures(evidence).any(|sig| is_pq_suite(&sig.suite)) {
        return Err(Rejection::NoPqChannelSignature);
    }
    let message = claim_bytes(claim)?;
    for sig in signatures(evidence) {
        check_signature(sig, &message, verifiers)?;
    }

    check_inclusions(evidence, 2)?;
    check_hash_chain(EventKind::ChannelAuthorized, claim, evidence)
}

/// SESSION_CREATED.
pub fn verify_session(claim: &Session, evidence: &[Evidence], verifiers: &VerifierTable) -> Verdict {
    if claim.participants.is_empty() {
        return Err(Rejection::EmptySession);
    }

    let message = claim_bytes(claim)?;
    let mut seen = 0;
    for sig in signatures(evidence) {
        seen += 1;
        check_signature(sig, &message, verifiers)?;
    }
    if seen == 0 {
        return Err(Rejection::TooFewSignatures {
            expected: 1,
            found: 0,
        });
    }

    check_hash_chain(EventKind::SessionCreated, claim, evidence)
}

/// FLUX.
///
/// No PQ requirement: a flux may be signed with any suite the table accepts.
pub fn verify_flux(claim: &Flux, evidence: &[Evidence], verifiers: &VerifierTable) -> Verdict {
    if claim.ct_delta.is_zero() {
        return Err(Rejection::NonPositiveDelta);
    }

    for party in [&claim.from, &claim.to] {
        if !signed_by(evidence, party) {
            return Err(Rejection::MissingSignature(party.clone()));
        }
    }
    let message = claim_bytes(claim)?;
    for sig in signatures(evidence) {
        check_signature(sig, &message, verifiers)?;
    }

    for binding in bio_bindings(evidence) {
        if binding.substrate != claim.from {
            return Err(Rejection::BioBindingParty {
                expected: claim.from.clone(),
                found: binding.substrate.clone(),
            });
        }
    }

    check_inclusions(evidence, 1)?;
    check_hash_chain(EventKind::Flux, claim, evidence)
}

/// CHANNEL_SETTLED.
///
/// Every signature must be PQ/hybrid, not just one.
pub fn verify_settlement(
    claim: &Settlement,
    evidence: &[Evidence],
    verifiers: &VerifierTable,
) -> Verdict {
    let sigs: Vec<_> = signatures(evidence).collect();
    if sigs.len() < 2 {
        return Err(Rejection::TooFewSignatures {
            expected: 2,
            found: sigs.len(),
        });
    }
    if let Some(sig) = sigs.iter().find(|sig| !is_pq_suite(&sig.suite)) {
        return Err(Rejection::SettlementSignatureNotPq {
            party: sig.party.clone(),
            suite: sig.suite.to_string(),
        });
    }

    let total_out = claim.total_out().ok_or(Rejection::CtOverflow)?;
    if total_out != claim.total_fluxed {
        return Err(Rejection::ConservationViolated {
            total_fluxed: claim.total_fluxed,
            total_out,
        });
    }
    if let Some(d) = claim.distributions.iter().find(|d| d.ct_amount == Ct::ZERO) {
        return Err(Rejection::NonPositiveDistribution(d.substrate.clone()));
    }

    let message = claim_bytes(claim)?;
    for sig in sigs {
        check_signature(sig, &message, verifiers)?;
    }

    check_inclusions(evidence, 1)?;
    check_hash_chain(EventKind::ChannelSettled, claim, evidence)
}
