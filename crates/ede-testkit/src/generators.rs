//! Proptest generators for property-based testing.

use proptest::prelude::*;

use ede_core::{register_substrate, CslEvent, Digest, SubstrateClass, SuiteId, Timestamp};
use ede_ledger::Result;

use crate::fixtures::TestParty;

/// Generate a random Digest.
pub fn digest() -> impl Strategy<Value = Digest> {
    any::<[u8; 32]>().prop_map(Digest::from_bytes)
}

/// Generate a post-quantum or hybrid suite.
pub fn pq_suite() -> impl Strategy<Value = SuiteId> {
    prop::sample::select(SuiteId::KNOWN_PQ.to_vec())
}

/// Generate a classical suite.
pub fn classical_suite() -> impl Strategy<Value = SuiteId> {
    prop_oneof![
        Just(SuiteId::CLASSICAL_ED25519),
        Just(SuiteId::CLASSICAL_ECDSA_SECP256K1),
    ]
}

/// Generate a SubstrateClass.
pub fn substrate_class() -> impl Strategy<Value = SubstrateClass> {
    prop_oneof![
        Just(SubstrateClass::H),
        Just(SubstrateClass::HPlus),
        Just(SubstrateClass::So),
        Just(SubstrateClass::Ssi),
    ]
}

/// Generate a reasonable timestamp.
pub fn timestamp() -> impl Strategy<Value = Timestamp> {
    0i64..=i64::MAX / 2
}

/// Generate a sequence of flux deltas for one channel.
pub fn flow_plan() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(1u64..=500, 1..8)
}

/// Parameters for a registration event.
#[derive(Debug, Clone)]
pub struct RegistrationParams {
    pub seed: u8,
    pub class: SubstrateClass,
    pub suite: SuiteId,
    pub initial_ct: u64,
    pub registered_at: Timestamp,
    pub prev: Digest,
}

impl Arbitrary for RegistrationParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: ()) -> Self::Strategy {
        (
            any::<u8>(),
            substrate_class(),
            pq_suite(),
            0u64..=1_000_000,
            timestamp(),
            digest(),
        )
            .prop_map(
                |(seed, class, suite, initial_ct, registered_at, prev)| RegistrationParams {
                    seed,
                    class,
                    suite,
                    initial_ct,
                    registered_at,
                    prev,
                },
            )
            .boxed()
    }
}

/// Build a registration event from parameters.
pub fn registration_from_params(params: &RegistrationParams) -> Result<CslEvent> {
    let party = TestParty::new("generated", params.seed, params.class, params.initial_ct)
        .with_suite(params.suite.clone());
    let registration = party.registration(params.registered_at);
    let signature = party.sign(&registration.claim()?, params.registered_at)?;
    let proof = register_substrate(&registration, signature, &params.prev)?;
    Ok(CslEvent::from_proof(proof)?)
}

/// A settlement split: distributions plus fees.
///
/// Every distribution is positive. `skew` is added to the total, so a zero
/// skew is a conserving settlement.
#[derive(Debug, Clone)]
pub struct SettlementParams {
    pub amounts: Vec<u64>,
    pub fees: u64,
    pub skew: i64,
}

impl SettlementParams {
    /// Total the settlement declares as fluxed.
    pub fn total_fluxed(&self) -> u64 {
        let balanced = self.amounts.iter().sum::<u64>() + self.fees;
        balanced.saturating_add_signed(self.skew)
    }

    pub fn is_balanced(&self) -> bool {
        self.total_fluxed() == self.amounts.iter().sum::<u64>() + self.fees
    }
}

impl Arbitrary for SettlementParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: ()) -> Self::Strategy {
        (
            prop::collection::vec(1u64..=1_000, 1..5),
            0u64..=100,
            prop_oneof![3 => Just(0i64), 1 => -50i64..=50],
        )
            .prop_map(|(amounts, fees, skew)| SettlementParams {
                amounts,
                fees,
                skew,
            })
            .boxed()
    }
}
