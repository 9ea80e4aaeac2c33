//! Test fixtures and helpers.
//!
//! A [`TestParty`] is a substrate with a deterministic keypair. A
//! [`LedgerBuilder`] drives the five operations against a growing ledger,
//! signing as whichever parties are named, so integration tests read as a
//! sequence of business steps.

use std::collections::BTreeMap;

use ede_core::{
    authorize_channel, create_session, flow, register_substrate, settle_ct, signing_bytes,
    AuthorizeChannel, ChannelId, CreateSession, CslEvent, Ct, Digest, Distribution, Flow, FluxId,
    InclusionEvidence, IoProfile, Keypair, MerkleProof, NeuralCouplingProof, ObservedMetrics,
    Participant, ParticipantRole, RegisterSubstrate, SessionId, SettleCt, Signature,
    StabilityProfile, SubstrateClass, SubstrateCrypto, SubstrateId, SuiteId, Timestamp,
    VerifierTable,
};
use ede_ledger::{Csl, Result};
use serde::Serialize;

/// Start of every fixture clock (2025-01-14T16:00:00Z).
pub const T0: Timestamp = 1_736_870_400_000;

/// Suite fixtures register and sign with unless told otherwise.
pub const DEFAULT_SUITE: SuiteId = SuiteId::PQ_FALCON_512;

/// Genesis seed of [`end_to_end_scenario`].
pub const SCENARIO_GENESIS_SEED: &str = "ede-scenario-v1";

/// A substrate with a deterministic keypair.
#[derive(Clone)]
pub struct TestParty {
    pub name: &'static str,
    pub keypair: Keypair,
    pub class: SubstrateClass,
    /// Primary suite, registered in the substrate's crypto profile.
    pub suite: SuiteId,
    /// Suite used for signatures. Equal to `suite` unless overridden.
    pub signing_suite: SuiteId,
    pub initial_ct: Ct,
}

impl TestParty {
    /// Create a party whose key is derived from `[seed; 32]`.
    pub fn new(name: &'static str, seed: u8, class: SubstrateClass, initial_ct: u64) -> Self {
        Self {
            name,
            keypair: Keypair::from_seed(&[seed; 32]),
            class,
            suite: DEFAULT_SUITE,
            signing_suite: DEFAULT_SUITE,
            initial_ct: Ct::from(initial_ct),
        }
    }

    /// Register and sign under `suite`.
    pub fn with_suite(mut self, suite: SuiteId) -> Self {
        self.suite = suite.clone();
        self.signing_suite = suite;
        self
    }

    /// Keep the registered suite but sign under `suite`.
    pub fn signing_with(mut self, suite: SuiteId) -> Self {
        self.signing_suite = suite;
        self
    }

    pub fn id(&self) -> SubstrateId {
        SubstrateId::derive(&self.keypair.public_key(&self.suite))
    }

    /// Crypto profile with the primary key registered.
    pub fn crypto(&self) -> SubstrateCrypto {
        let mut public_keys = BTreeMap::new();
        public_keys.insert(self.suite.clone(), self.keypair.public_key(&self.suite));
        SubstrateCrypto {
            supported_suites: vec![self.suite.clone()],
            primary_suite: self.suite.clone(),
            public_keys,
        }
    }

    /// Registration parameters. H_PLUS parties declare a neural coupling.
    pub fn registration(&self, registered_at: Timestamp) -> RegisterSubstrate {
        let mut io = IoProfile::new(1e6, 5.0);
        if self.class == SubstrateClass::HPlus {
            io.neural_coupling = Some(0.8);
        }
        RegisterSubstrate {
            class: self.class,
            io,
            stability: StabilityProfile::default(),
            crypto: self.crypto(),
            initial_ct: self.initial_ct,
            registered_at,
        }
    }

    /// Sign the canonical signing bytes of `claim`.
    pub fn sign<T: Serialize + ?Sized>(&self, claim: &T, timestamp: Timestamp) -> Result<Signature> {
        let message = signing_bytes(claim)?;
        Ok(self.keypair.sign(&self.signing_suite, &message, timestamp))
    }

    /// A session participant entry for this party.
    pub fn as_participant(&self, role: ParticipantRole) -> Participant {
        Participant {
            entity: self.id(),
            class: self.class,
            role,
        }
    }
}

/// Optional parts of a flux.
#[derive(Debug, Clone, Default)]
pub struct FlowOptions {
    pub session: Option<SessionId>,
    pub is_critical: Option<bool>,
    pub coupling: Option<NeuralCouplingProof>,
}

impl FlowOptions {
    /// A flux inside `session`.
    pub fn in_session(session: &SessionId) -> Self {
        Self {
            session: Some(session.clone()),
            ..Self::default()
        }
    }

    /// Mark the flux critical.
    pub fn critical(mut self) -> Self {
        self.is_critical = Some(true);
        self
    }
}

/// A plausible coupling proof for bio-binding evidence.
pub fn sample_coupling() -> NeuralCouplingProof {
    NeuralCouplingProof {
        coupling_score: 0.82,
        bio_plausibility: 0.91,
        noise_entropy: 0.4,
        conduction_velocity_ms: 12.5,
    }
}

/// Inclusion of the current head in a one-leaf tree of itself.
///
/// Stands in when the referenced channel is absent, so events against
/// unknown channels can still be built.
pub fn head_inclusion(csl: &Csl) -> InclusionEvidence {
    let head = csl.head();
    InclusionEvidence::from(MerkleProof {
        root: head,
        path: Vec::new(),
        index: 0,
        leaf: head,
        leaf_count: 1,
    })
}

/// Builds a ledger one operation at a time.
#[derive(Clone)]
pub struct LedgerBuilder {
    csl: Csl,
    verifiers: VerifierTable,
    clock: Timestamp,
}

impl LedgerBuilder {
    /// An empty ledger on the default genesis with the development verifiers.
    pub fn new() -> Self {
        Self::from_csl(Csl::new())
    }

    /// An empty ledger on `genesis`.
    pub fn with_genesis(genesis: Digest) -> Self {
        Self::from_csl(Csl::with_genesis(genesis))
    }

    /// Continue building on an existing ledger.
    pub fn from_csl(csl: Csl) -> Self {
        Self {
            csl,
            verifiers: VerifierTable::development(),
            clock: T0,
        }
    }

    pub fn csl(&self) -> &Csl {
        &self.csl
    }

    pub fn into_csl(self) -> Csl {
        self.csl
    }

    pub fn verifiers(&self) -> &VerifierTable {
        &self.verifiers
    }

    /// Advance the clock by one second and return the new time.
    pub fn tick(&mut self) -> Timestamp {
        self.clock += 1_000;
        self.clock
    }

    /// Append through the verifying gate.
    pub fn push(&mut self, event: CslEvent) -> Result<()> {
        self.csl = self.csl.append(event, &self.verifiers)?;
        Ok(())
    }

    /// Append with no verification at all; the head becomes the event id.
    pub fn push_unchecked(&mut self, event: CslEvent) {
        let head = event.id;
        let mut events = self.csl.events().to_vec();
        events.push(event);
        self.csl = Csl::from_parts(self.csl.genesis(), events, head);
    }

    pub fn registration_event(&mut self, party: &TestParty) -> Result<CslEvent> {
        let at = self.tick();
        let params = party.registration(at);
        let signature = party.sign(&params.claim()?, at)?;
        let proof = register_substrate(&params, signature, &self.csl.head())?;
        Ok(CslEvent::from_proof(proof)?)
    }

    pub fn channel_event(
        &mut self,
        from: &TestParty,
        to: &TestParty,
        budget: u64,
    ) -> Result<(CslEvent, ChannelId)> {
        let at = self.tick();
        let params = AuthorizeChannel {
            from: from.id(),
            to: to.id(),
            budget_ct: Ct::from(budget),
            max_bps: 1e6,
            expires: at + 3_600_000,
            bio_binding_required: false,
            crypto_suite: from.suite.clone(),
            authorized_at: at,
        };
        let claim = params.claim();
        let from_inclusion = self
            .csl
            .substrate_inclusion(&params.from)
            .unwrap_or_else(|| head_inclusion(&self.csl));
        let to_inclusion = self
            .csl
            .substrate_inclusion(&params.to)
            .unwrap_or_else(|| head_inclusion(&self.csl));
        let proof = authorize_channel(
            &params,
            from.sign(&claim, at)?,
            to.sign(&claim, at)?,
            from_inclusion,
            to_inclusion,
            &self.csl.head(),
        )?;
        Ok((CslEvent::from_proof(proof)?, claim.id))
    }

    pub fn session_event(
        &mut self,
        creator: &TestParty,
        domain: Option<&str>,
        participants: &[(&TestParty, ParticipantRole)],
    ) -> Result<(CslEvent, SessionId)> {
        let at = self.tick();
        let params = CreateSession {
            creator: creator.id(),
            domain: domain.map(str::to_owned),
            participants: participants
                .iter()
                .map(|(party, role)| party.as_participant(*role))
                .collect(),
            created_at: at,
        };
        let claim = params.claim();
        let proof = create_session(&params, creator.sign(&claim, at)?, &self.csl.head())?;
        Ok((CslEvent::from_proof(proof)?, claim.id))
    }

    pub fn flux_event(
        &mut self,
        channel: &ChannelId,
        from: &TestParty,
        to: &TestParty,
        delta: u64,
        options: FlowOptions,
    ) -> Result<(CslEvent, FluxId)> {
        let at = self.tick();
        let head = self.csl.head();
        let params = Flow {
            channel: channel.clone(),
            session: options.session,
            from: from.id(),
            to: to.id(),
            ct_delta: Ct::from(delta),
            is_critical: options.is_critical,
            observed: ObservedMetrics {
                actual_bps: 2.5e5,
                error_rate: 0.001,
                energy_joules: 0.75,
            },
            timestamp: at,
        };
        let claim = params.claim(&head);
        let inclusion = self
            .csl
            .channel_inclusion(channel)
            .unwrap_or_else(|| head_inclusion(&self.csl));
        let proof = flow(
            &params,
            from.sign(&claim, at)?,
            to.sign(&claim, at)?,
            inclusion,
            options.coupling,
            &head,
        )?;
        Ok((CslEvent::from_proof(proof)?, claim.id))
    }

    /// A settlement with an explicit `total_fluxed`, balanced or not.
    pub fn settlement_event(
        &mut self,
        channel: &ChannelId,
        from: &TestParty,
        to: &TestParty,
        total_fluxed: u64,
        fees: u64,
        distributions: &[(&TestParty, u64)],
    ) -> Result<CslEvent> {
        let at = self.tick();
        let params = SettleCt {
            channel: channel.clone(),
            from: from.id(),
            to: to.id(),
            total_fluxed: Ct::from(total_fluxed),
            fees: Ct::from(fees),
            distributions: distributions
                .iter()
                .map(|(party, amount)| Distribution::new(party.id(), *amount))
                .collect(),
            settled_at: at,
        };
        let claim = params.claim();
        let inclusion = self
            .csl
            .channel_inclusion(channel)
            .unwrap_or_else(|| head_inclusion(&self.csl));
        let proof = settle_ct(
            &params,
            from.sign(&claim, at)?,
            to.sign(&claim, at)?,
            inclusion,
            &self.csl.head(),
        )?;
        Ok(CslEvent::from_proof(proof)?)
    }

    pub fn register(&mut self, party: &TestParty) -> Result<SubstrateId> {
        let event = self.registration_event(party)?;
        self.push(event)?;
        Ok(party.id())
    }

    pub fn authorize(&mut self, from: &TestParty, to: &TestParty, budget: u64) -> Result<ChannelId> {
        let (event, channel) = self.channel_event(from, to, budget)?;
        self.push(event)?;
        Ok(channel)
    }

    pub fn create_session(
        &mut self,
        creator: &TestParty,
        domain: Option<&str>,
        participants: &[(&TestParty, ParticipantRole)],
    ) -> Result<SessionId> {
        let (event, session) = self.session_event(creator, domain, participants)?;
        self.push(event)?;
        Ok(session)
    }

    pub fn flow(
        &mut self,
        channel: &ChannelId,
        from: &TestParty,
        to: &TestParty,
        delta: u64,
        options: FlowOptions,
    ) -> Result<FluxId> {
        let (event, flux) = self.flux_event(channel, from, to, delta, options)?;
        self.push(event)?;
        Ok(flux)
    }

    /// Settle with `total_fluxed` equal to fees plus the distributions.
    pub fn settle(
        &mut self,
        channel: &ChannelId,
        from: &TestParty,
        to: &TestParty,
        fees: u64,
        distributions: &[(&TestParty, u64)],
    ) -> Result<()> {
        let total = distributions.iter().map(|(_, amount)| amount).sum::<u64>() + fees;
        let event = self.settlement_event(channel, from, to, total, fees, distributions)?;
        self.push(event)
    }
}

impl Default for LedgerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The ledger and parties of the standard end-to-end flow.
#[derive(Clone)]
pub struct Scenario {
    pub csl: Csl,
    pub human: TestParty,
    pub system: TestParty,
    pub channel: ChannelId,
}

/// The human (H_PLUS, 10000 CT) and the system (SO, 5000 CT) register, open
/// a 1000 CT channel, flow 500 CT and settle 450 to the system and 25 to the
/// human with 25 in fees.
pub fn end_to_end_scenario() -> Result<Scenario> {
    let human = TestParty::new("human", 0x0a, SubstrateClass::HPlus, 10_000);
    let system = TestParty::new("system", 0x05, SubstrateClass::So, 5_000);

    let mut ledger = LedgerBuilder::with_genesis(Digest::genesis(SCENARIO_GENESIS_SEED));
    ledger.register(&human)?;
    ledger.register(&system)?;
    let channel = ledger.authorize(&human, &system, 1_000)?;
    ledger.flow(&channel, &human, &system, 500, FlowOptions::default())?;
    ledger.settle(&channel, &human, &system, 25, &[(&system, 450), (&human, 25)])?;

    Ok(Scenario {
        csl: ledger.into_csl(),
        human,
        system,
        channel,
    })
}

/// `n` SO parties with seeds `1..=n`, each holding 1000 CT.
pub fn system_parties(n: u8) -> Vec<TestParty> {
    (1..=n)
        .map(|seed| TestParty::new("system", seed, SubstrateClass::So, 1_000))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ede_core::{ChannelState, EventKind};
    use ede_ledger::derive_state;

    #[test]
    fn test_party_ids_are_stable() {
        let a = TestParty::new("a", 0x01, SubstrateClass::So, 0);
        let b = TestParty::new("b", 0x01, SubstrateClass::So, 0);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), a.clone().with_suite(SuiteId::PQ_DILITHIUM_3).id());
    }

    #[test]
    fn test_scenario_builds() {
        let scenario = end_to_end_scenario().unwrap();
        let kinds: Vec<EventKind> = scenario.csl.events().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::SubstrateRegistered,
                EventKind::SubstrateRegistered,
                EventKind::ChannelAuthorized,
                EventKind::Flux,
                EventKind::ChannelSettled,
            ]
        );

        let state = derive_state(&scenario.csl).unwrap();
        assert_eq!(state.channels[&scenario.channel].state, ChannelState::Closed);
        assert_eq!(state.balance(&scenario.system.id()), Ct::new(5_450));
        assert_eq!(state.balance(&scenario.human.id()), Ct::new(10_025));
    }

    #[test]
    fn test_push_unchecked_moves_head() {
        let mut ledger = LedgerBuilder::new();
        let party = TestParty::new("so", 0x07, SubstrateClass::So, 10);
        let event = ledger.registration_event(&party).unwrap();
        let id = event.id;
        ledger.push_unchecked(event);
        assert_eq!(ledger.csl().head(), id);
        assert_eq!(ledger.csl().len(), 1);
    }

    #[test]
    fn test_head_inclusion_verifies() {
        let ledger = LedgerBuilder::new();
        assert!(head_inclusion(ledger.csl()).verify());
    }
}
