//! Event builders for unit tests. Substrates are identified by a one-byte
//! seed; ids and keys are derived from it.

use std::collections::BTreeMap;

use ede_core::{
    authorize_channel, flow, register_substrate, settle_ct, signing_bytes, AuthorizeChannel,
    ChannelId, CslEvent, Ct, Digest, Distribution, Flow, IoProfile, Keypair, ObservedMetrics,
    RegisterSubstrate, SettleCt, StabilityProfile, SubstrateClass, SubstrateCrypto, SubstrateId,
    SuiteId, Timestamp,
};

use crate::csl::Csl;

pub const T0: Timestamp = 1_736_870_400_000;
pub const SUITE: SuiteId = SuiteId::PQ_FALCON_512;

pub fn keypair(seed: u8) -> Keypair {
    Keypair::from_seed(&[seed; 32])
}

pub fn substrate_id(seed: u8) -> SubstrateId {
    SubstrateId::derive(&keypair(seed).public_key(&SUITE))
}

pub fn registration_event(
    seed: u8,
    class: SubstrateClass,
    suite: SuiteId,
    prev: &Digest,
) -> CslEvent {
    let kp = keypair(seed);
    let mut public_keys = BTreeMap::new();
    public_keys.insert(suite.clone(), kp.public_key(&suite));
    let mut io = IoProfile::new(1e6, 5.0);
    io.neural_coupling = Some(0.5);

    let params = RegisterSubstrate {
        class,
        io,
        stability: StabilityProfile::default(),
        crypto: SubstrateCrypto {
            supported_suites: vec![suite.clone()],
            primary_suite: suite.clone(),
            public_keys,
        },
        initial_ct: Ct::from(1000 * u64::from(seed)),
        registered_at: T0,
    };
    let claim = params.claim().unwrap();
    let sig = kp.sign(&suite, &signing_bytes(&claim).unwrap(), T0);
    CslEvent::from_proof(register_substrate(&params, sig, prev).unwrap()).unwrap()
}

pub fn channel_event(csl: &Csl, from: u8, to: u8, budget: u64) -> (CslEvent, ChannelId) {
    let params = AuthorizeChannel {
        from: substrate_id(from),
        to: substrate_id(to),
        budget_ct: Ct::from(budget),
        max_bps: 1e6,
        expires: T0 + 3_600_000,
        bio_binding_required: false,
        crypto_suite: SUITE,
        authorized_at: T0 + 10,
    };
    let claim = params.claim();
    let msg = signing_bytes(&claim).unwrap();
    let proof = authorize_channel(
        &params,
        keypair(from).sign(&SUITE, &msg, T0),
        keypair(to).sign(&SUITE, &msg, T0),
        csl.substrate_inclusion(&params.from).unwrap(),
        csl.substrate_inclusion(&params.to).unwrap(),
        &csl.head(),
    )
    .unwrap();
    (CslEvent::from_proof(proof).unwrap(), claim.id)
}

pub fn flux_event(csl: &Csl, channel: &ChannelId, from: u8, to: u8, delta: u64) -> CslEvent {
    let params = Flow {
        channel: channel.clone(),
        session: None,
        from: substrate_id(from),
        to: substrate_id(to),
        ct_delta: Ct::from(delta),
        is_critical: None,
        observed: ObservedMetrics {
            actual_bps: 1e5,
            error_rate: 0.0,
            energy_joules: 1.0,
        },
        timestamp: T0 + 20 + csl.len() as i64,
    };
    let msg = signing_bytes(&params.claim(&csl.head())).unwrap();
    let inclusion = csl
        .channel_inclusion(channel)
        .or_else(|| csl.inclusion_proof(&csl.head()))
        .unwrap();
    let proof = flow(
        &params,
        keypair(from).sign(&SUITE, &msg, T0),
        keypair(to).sign(&SUITE, &msg, T0),
        inclusion,
        None,
        &csl.head(),
    )
    .unwrap();
    CslEvent::from_proof(proof).unwrap()
}

pub fn settlement_event(
    csl: &Csl,
    channel: &ChannelId,
    from: u8,
    to: u8,
    fees: u64,
    distributions: &[(u8, u64)],
) -> CslEvent {
    let distributions: Vec<Distribution> = distributions
        .iter()
        .map(|(seed, amount)| Distribution::new(substrate_id(*seed), *amount))
        .collect();
    let total = distributions.iter().map(|d| d.ct_amount.amount()).sum::<u128>() + u128::from(fees);
    let params = SettleCt {
        channel: channel.clone(),
        from: substrate_id(from),
        to: substrate_id(to),
        total_fluxed: Ct::new(total),
        fees: Ct::from(fees),
        distributions,
        settled_at: T0 + 100,
    };
    let msg = signing_bytes(&params.claim()).unwrap();
    let inclusion = csl
        .channel_inclusion(channel)
        .or_else(|| csl.inclusion_proof(&csl.head()))
        .unwrap();
    let proof = settle_ct(
        &params,
        keypair(from).sign(&SUITE, &msg, T0),
        keypair(to).sign(&SUITE, &msg, T0),
        inclusion,
        &csl.head(),
    )
    .unwrap();
    CslEvent::from_proof(proof).unwrap()
}
