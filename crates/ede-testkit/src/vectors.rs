//! Golden test vectors for deterministic verification.
//!
//! Encoding vectors pin the canonical CBOR bytes of small values, so any
//! implementation can check it agrees byte for byte. The scenario vector
//! rebuilds the end-to-end ledger and reports its head.

use ede_core::{
    canonical_bytes, CoreError, Ct, Distribution, ObservedMetrics, SubstrateClass, SubstrateId,
};
use ede_ledger::Result;

use crate::fixtures::end_to_end_scenario;

/// A golden encoding vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Produces the canonical bytes under test.
    pub encode: fn() -> std::result::Result<Vec<u8>, CoreError>,
    /// Expected canonical bytes (hex).
    pub expected_hex: &'static str,
}

fn ct_amount() -> std::result::Result<Vec<u8>, CoreError> {
    canonical_bytes(&Ct::new(1000))
}

fn substrate_class() -> std::result::Result<Vec<u8>, CoreError> {
    canonical_bytes(&SubstrateClass::HPlus)
}

fn distribution() -> std::result::Result<Vec<u8>, CoreError> {
    canonical_bytes(&Distribution::new(SubstrateId::new("did:ede:x"), 450u64))
}

fn observed_metrics() -> std::result::Result<Vec<u8>, CoreError> {
    canonical_bytes(&ObservedMetrics {
        actual_bps: 1.0,
        error_rate: 0.0,
        energy_joules: 0.5,
    })
}

/// Get all golden encoding vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "CT amount is decimal text",
            encode: ct_amount,
            expected_hex: "6431303030",
        },
        GoldenVector {
            name: "Substrate class tag",
            encode: substrate_class,
            expected_hex: "66485f504c5553",
        },
        GoldenVector {
            name: "Distribution keys sorted",
            encode: distribution,
            expected_hex: concat!(
                "a2",
                "69", "63745f616d6f756e74",
                "63", "343530",
                "69", "737562737472617465",
                "69", "6469643a6564653a78",
            ),
        },
        GoldenVector {
            name: "Observed metrics as 64-bit floats",
            encode: observed_metrics,
            expected_hex: concat!(
                "a3",
                "6a", "61637475616c5f627073", "fb", "3ff0000000000000",
                "6a", "6572726f725f72617465", "fb", "0000000000000000",
                "6d", "656e657267795f6a6f756c6573", "fb", "3fe0000000000000",
            ),
        },
    ]
}

/// Check every vector. Returns `(name, matches, actual hex)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let actual = (v.encode)().map(hex::encode).unwrap_or_default();
            (v.name.to_string(), actual == v.expected_hex, actual)
        })
        .collect()
}

/// Head of the end-to-end scenario ledger as bare lowercase hex.
pub fn scenario_head() -> Result<String> {
    Ok(hex::encode(end_to_end_scenario()?.csl.head().as_bytes()))
}
