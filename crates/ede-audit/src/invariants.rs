//! The seven ledger-wide invariants.
//!
//! Every check is a pure scan over an immutable ledger value. Checks are
//! exhaustive: they walk every relevant event and report each violation, so
//! one pass gives a complete audit.

use std::collections::BTreeMap;

use ede_core::evidence::{hash_chains, signatures};
use ede_core::{
    is_pq_suite, CslEvent, Ct, Digest, EventProof, Flux, Session, SessionId, SubstrateId,
};
use ede_ledger::{Csl, DEFAULT_GENESIS_SEED};
use tracing::{debug, info};

use crate::report::{Invariant, InvariantReport, InvariantResult, Violation, ViolationCode};

/// Parameters of a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantConfig {
    /// Head the APPEND_ONLY walk starts from.
    pub genesis: Digest,
    /// A flux of at least this much CT makes its session critical.
    pub critical_ct_threshold: Ct,
}

impl Default for InvariantConfig {
    fn default() -> Self {
        Self {
            genesis: Digest::genesis(DEFAULT_GENESIS_SEED),
            critical_ct_threshold: Ct::new(1000),
        }
    }
}

impl InvariantConfig {
    /// The default configuration over `csl`'s own genesis.
    pub fn for_ledger(csl: &Csl) -> Self {
        Self {
            genesis: csl.genesis(),
            ..Self::default()
        }
    }
}

impl Invariant {
    /// Run this invariant over `csl`.
    pub fn check(self, csl: &Csl, config: &InvariantConfig) -> InvariantResult {
        let violations = match self {
            Invariant::CtConservation => ct_conservation(csl),
            Invariant::BilateralAttestation => bilateral_attestation(csl),
            Invariant::AppendOnly => append_only(csl, &config.genesis),
            Invariant::SubstrateSovereignty => substrate_sovereignty(csl),
            Invariant::PqCompliance => pq_compliance(csl),
            Invariant::TopologyNeutrality => topology_neutrality(csl),
            Invariant::HGuardCriticalCt => h_guard(csl, config.critical_ct_threshold),
        };
        debug!(
            invariant = %self,
            violations = violations.len(),
            "invariant checked"
        );
        InvariantResult::from_violations(self, violations)
    }
}

/// Run all seven invariants. `all_ok` is their conjunction.
pub fn verify_all_invariants(csl: &Csl, config: &InvariantConfig) -> InvariantReport {
    let report = InvariantReport::new(
        Invariant::ALL
            .iter()
            .map(|invariant| invariant.check(csl, config))
            .collect(),
    );
    if !report.all_ok {
        info!(
            events = csl.len(),
            failed = ?report.failed(),
            violations = report.violations().count(),
            "ledger audit failed"
        );
    }
    report
}

/// For every settlement, distributions plus fees equal `total_fluxed`.
pub fn verify_ct_conservation(csl: &Csl) -> InvariantResult {
    Invariant::CtConservation.check(csl, &InvariantConfig::for_ledger(csl))
}

/// Every flux is signed by both endpoints.
pub fn verify_bilateral_attestation(csl: &Csl) -> InvariantResult {
    Invariant::BilateralAttestation.check(csl, &InvariantConfig::for_ledger(csl))
}

/// The hash chain is unbroken from `genesis` to the recorded head.
pub fn verify_append_only(csl: &Csl, genesis: &Digest) -> InvariantResult {
    let config = InvariantConfig {
        genesis: *genesis,
        ..InvariantConfig::default()
    };
    Invariant::AppendOnly.check(csl, &config)
}

/// Every channel authorization carries both endpoints' consent.
pub fn verify_substrate_sovereignty(csl: &Csl) -> InvariantResult {
    Invariant::SubstrateSovereignty.check(csl, &InvariantConfig::for_ledger(csl))
}

/// Registrations carry a PQ signature; settlements carry only PQ signatures.
pub fn verify_pq_compliance(csl: &Csl) -> InvariantResult {
    Invariant::PqCompliance.check(csl, &InvariantConfig::for_ledger(csl))
}

/// Every event's tag names the proof it carries.
pub fn verify_topology_neutrality(csl: &Csl) -> InvariantResult {
    Invariant::TopologyNeutrality.check(csl, &InvariantConfig::for_ledger(csl))
}

/// Critical sessions include a human in a decision role.
pub fn verify_h_guard(csl: &Csl, critical_ct_threshold: Ct) -> InvariantResult {
    let config = InvariantConfig {
        genesis: csl.genesis(),
        critical_ct_threshold,
    };
    Invariant::HGuardCriticalCt.check(csl, &config)
}

fn ct_conservation(csl: &Csl) -> Vec<Violation> {
    let mut violations = Vec::new();
    for event in csl.events() {
        let EventProof::ChannelSettled(proof) = &event.proof else {
            continue;
        };
        let settlement = &proof.claim;
        match settlement.total_out() {
            Some(out) if out == settlement.total_fluxed => {}
            Some(out) => violations.push(
                Violation::new(
                    ViolationCode::CtMismatch,
                    format!(
                        "settlement of {} distributes {out} CT against {} fluxed",
                        settlement.channel, settlement.total_fluxed
                    ),
                )
                .at_event(event.id)
                .detail("channel", &settlement.channel)
                .detail("total_fluxed", settlement.total_fluxed)
                .detail("total_out", out),
            ),
            None => violations.push(
                Violation::new(
                    ViolationCode::CtMismatch,
                    format!("settlement of {} overflows CT", settlement.channel),
                )
                .at_event(event.id)
                .detail("channel", &settlement.channel)
                .detail("total_fluxed", settlement.total_fluxed),
            ),
        }
    }
    violations
}

fn signer_set(event: &CslEvent) -> Vec<&SubstrateId> {
    signatures(event.evidence()).map(|sig| &sig.party).collect()
}

fn bilateral_attestation(csl: &Csl) -> Vec<Violation> {
    let mut violations = Vec::new();
    for event in csl.events() {
        let EventProof::Flux(proof) = &event.proof else {
            continue;
        };
        let flux = &proof.claim;
        let signers = signer_set(event);
        let missing: Vec<&SubstrateId> = [&flux.from, &flux.to]
            .into_iter()
            .filter(|party| !signers.contains(party))
            .collect();
        if missing.is_empty() {
            continue;
        }

        let mut violation = Violation::new(
            ViolationCode::MissingBilateralSig,
            format!("flux {} is not signed by both endpoints", flux.id),
        )
        .at_event(event.id)
        .detail("flux", &flux.id);
        for party in missing {
            let key = if *party == flux.from { "missing_from" } else { "missing_to" };
            violation = violation.detail(key, party);
        }
        violations.push(violation);
    }
    violations
}

fn append_only(csl: &Csl, genesis: &Digest) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut running = *genesis;

    for (index, event) in csl.events().iter().enumerate() {
        let links: Vec<_> = hash_chains(event.evidence()).collect();
        let Some(link) = links.first() else {
            violations.push(
                Violation::new(
                    ViolationCode::MissingHashChain,
                    format!("event {index} carries no hash-chain link"),
                )
                .at_event(event.id)
                .detail("index", index),
            );
            running = event.proof.link_after(&running).unwrap_or(event.id);
            continue;
        };

        let expected = event.proof.link_after(&running);
        let problem = if links.len() > 1 {
            Some(format!("event {index} carries {} hash-chain links", links.len()))
        } else if link.prev != running {
            Some(format!(
                "event {index} links to {} but the chain is at {running}",
                link.prev
            ))
        } else {
            match &expected {
                Ok(expected) if link.current == *expected && event.id == *expected => None,
                Ok(expected) => Some(format!(
                    "event {index} link does not match its content (expected {expected})"
                )),
                Err(err) => Some(format!("event {index} cannot be encoded: {err}")),
            }
        };

        if let Some(message) = problem {
            violations.push(
                Violation::new(ViolationCode::HashChainBroken, message)
                    .at_event(event.id)
                    .detail("index", index)
                    .detail("expected_prev", running)
                    .detail("prev", link.prev),
            );
        }
        // Continue along the recomputed chain.
        running = expected.unwrap_or(event.id);
    }

    if running != csl.head() {
        violations.push(
            Violation::new(
                ViolationCode::HeadMismatch,
                format!("recorded head {} differs from chain end {running}", csl.head()),
            )
            .detail("recorded", csl.head())
            .detail("computed", running),
        );
    }
    violations
}

fn substrate_sovereignty(csl: &Csl) -> Vec<Violation> {
    let mut violations = Vec::new();
    for event in csl.events() {
        let EventProof::ChannelAuthorized(proof) = &event.proof else {
            continue;
        };
        let channel = &proof.claim;
        let signers = signer_set(event);
        if !signers.contains(&&channel.from) {
            violations.push(
                Violation::new(
                    ViolationCode::MissingFromConsent,
                    format!("channel {} lacks consent of {}", channel.id, channel.from),
                )
                .at_event(event.id)
                .detail("channel", &channel.id)
                .detail("party", &channel.from),
            );
        }
        if !signers.contains(&&channel.to) {
            violations.push(
                Violation::new(
                    ViolationCode::MissingToConsent,
                    format!("channel {} lacks consent of {}", channel.id, channel.to),
                )
                .at_event(event.id)
                .detail("channel", &channel.id)
                .detail("party", &channel.to),
            );
        }
    }
    violations
}

fn pq_compliance(csl: &Csl) -> Vec<Violation> {
    let mut violations = Vec::new();
    for event in csl.events() {
        let mut suites = signatures(event.evidence()).map(|sig| &sig.signature.suite);
        match &event.proof {
            EventProof::SubstrateRegistered(proof) => {
                if !suites.any(is_pq_suite) {
                    violations.push(
                        Violation::new(
                            ViolationCode::SubstrateNotPq,
                            format!("registration of {} has no PQ signature", proof.claim.id),
                        )
                        .at_event(event.id)
                        .detail("substrate", &proof.claim.id),
                    );
                }
            }
            EventProof::ChannelSettled(proof) => {
                let suites: Vec<_> = suites.collect();
                let classical: Vec<String> = suites
                    .iter()
                    .filter(|suite| !is_pq_suite(suite))
                    .map(|suite| suite.to_string())
                    .collect();
                if suites.is_empty() || !classical.is_empty() {
                    let mut violation = Violation::new(
                        ViolationCode::SettlementNotPq,
                        format!(
                            "settlement of {} is not signed exclusively under PQ suites",
                            proof.claim.channel
                        ),
                    )
                    .at_event(event.id)
                    .detail("channel", &proof.claim.channel);
                    if !classical.is_empty() {
                        violation = violation.detail("classical_suites", classical.join(","));
                    }
                    violations.push(violation);
                }
            }
            _ => {}
        }
    }
    violations
}

fn topology_neutrality(csl: &Csl) -> Vec<Violation> {
    csl.events()
        .iter()
        .enumerate()
        .filter(|(_, event)| event.kind != event.proof.kind())
        .map(|(index, event)| {
            Violation::new(
                ViolationCode::InvalidEventType,
                format!(
                    "event {index} is tagged {} but carries a {} proof",
                    event.kind,
                    event.proof.kind()
                ),
            )
            .at_event(event.id)
            .detail("declared", event.kind)
            .detail("carried", event.proof.kind())
        })
        .collect()
}

fn h_guard(csl: &Csl, threshold: Ct) -> Vec<Violation> {
    let mut sessions: BTreeMap<&SessionId, &Session> = BTreeMap::new();
    let mut fluxes: BTreeMap<&SessionId, Vec<&Flux>> = BTreeMap::new();
    for event in csl.events() {
        match &event.proof {
            EventProof::SessionCreated(proof) => {
                sessions.insert(&proof.claim.id, &proof.claim);
            }
            EventProof::Flux(proof) => {
                if let Some(session) = &proof.claim.session {
                    fluxes.entry(session).or_default().push(&proof.claim);
                }
            }
            _ => {}
        }
    }

    let mut violations = Vec::new();
    for (session_id, session_fluxes) in fluxes {
        let critical: Vec<&Flux> = session_fluxes
            .into_iter()
            .filter(|flux| flux.is_critical == Some(true) || flux.ct_delta >= threshold)
            .collect();
        if critical.is_empty() {
            continue;
        }

        let guarded = sessions.get(session_id).is_some_and(|session| {
            session
                .participants
                .iter()
                .any(|p| p.class.is_human() && p.role.is_decision_role())
        });
        if guarded {
            continue;
        }

        let message = if sessions.contains_key(session_id) {
            format!("critical session {session_id} has no human decision-maker")
        } else {
            format!("critical fluxes reference unknown session {session_id}")
        };
        let flux_ids: Vec<&str> = critical.iter().map(|flux| flux.id.as_str()).collect();
        violations.push(
            Violation::new(ViolationCode::HGuardMissing, message)
                .in_session(session_id.clone())
                .detail("critical_fluxes", flux_ids.join(","))
                .detail("threshold", threshold),
        );
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ledger_passes_everything() {
        let csl = Csl::new();
        let report = verify_all_invariants(&csl, &InvariantConfig::default());
        assert!(report.all_ok);
        assert_eq!(report.results.len(), 7);
    }

    #[test]
    fn test_wrong_genesis_is_a_head_mismatch_on_empty_ledger() {
        let csl = Csl::new();
        let result = verify_append_only(&csl, &Digest::hash(b"elsewhere"));
        assert!(!result.ok);
        assert_eq!(result.violations[0].code, ViolationCode::HeadMismatch);
    }

    #[test]
    fn test_default_config() {
        let config = InvariantConfig::default();
        assert_eq!(config.critical_ct_threshold, Ct::new(1000));
        assert_eq!(config.genesis, Csl::new().genesis());
    }
}
