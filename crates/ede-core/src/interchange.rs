//! Entity interchange document.
//!
//! The JSON shape external tooling (schema linters, ranking helpers) reads
//! and writes for a substrate. Only the primary suite's key travels; stability
//! defaults to a perfectly stable profile and the balance to zero on import.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::crypto::SuiteId;
use crate::ct::Ct;
use crate::error::CoreError;
use crate::model::{IoProfile, StabilityProfile, Substrate, SubstrateClass, SubstrateCrypto};
use crate::types::{SubstrateId, Timestamp};

/// Document version written by [`export_entity`].
pub const ENTITY_DOCUMENT_VERSION: &str = "2.0";

/// A substrate as seen by external tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDocument {
    pub version: String,
    pub substrate_id: SubstrateId,
    pub class: SubstrateClass,
    pub crypto: EntityCrypto,
    pub io_profile: EntityIoProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCrypto {
    pub primary_suite: SuiteId,
    pub public_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityIoProfile {
    pub max_bps: f64,
    pub latency_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neural_coupling: Option<f64>,
}

/// Build a substrate from a document.
pub fn import_entity(doc: &EntityDocument, registered_at: Timestamp) -> Substrate {
    let mut public_keys = BTreeMap::new();
    public_keys.insert(doc.crypto.primary_suite.clone(), doc.crypto.public_key.clone());

    let mut io = IoProfile::new(doc.io_profile.max_bps, doc.io_profile.latency_ms);
    io.neural_coupling = doc.io_profile.neural_coupling;

    Substrate {
        id: doc.substrate_id.clone(),
        class: doc.class,
        io,
        stability: StabilityProfile::default(),
        crypto: SubstrateCrypto {
            supported_suites: vec![doc.crypto.primary_suite.clone()],
            primary_suite: doc.crypto.primary_suite.clone(),
            public_keys,
        },
        ct_balance: Ct::ZERO,
        registered_at,
    }
}

/// Describe a substrate as a document.
///
/// A substrate with no key for its primary suite exports an empty key.
pub fn export_entity(substrate: &Substrate) -> EntityDocument {
    EntityDocument {
        version: ENTITY_DOCUMENT_VERSION.to_string(),
        substrate_id: substrate.id.clone(),
        class: substrate.class,
        crypto: EntityCrypto {
            primary_suite: substrate.crypto.primary_suite.clone(),
            public_key: substrate
                .crypto
                .primary_public_key()
                .unwrap_or_default()
                .to_string(),
        },
        io_profile: EntityIoProfile {
            max_bps: substrate.io.max_bps,
            latency_ms: substrate.io.latency_ms,
            neural_coupling: substrate.io.neural_coupling,
        },
    }
}

/// Parse a document from JSON.
pub fn entity_from_json(json: &str) -> Result<EntityDocument, CoreError> {
    serde_json::from_str(json).map_err(|e| CoreError::Decoding(e.to_string()))
}

/// Serialize a document to pretty JSON.
pub fn entity_to_json(doc: &EntityDocument) -> Result<String, CoreError> {
    serde_json::to_string_pretty(doc).map_err(|e| CoreError::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(neural_coupling: Option<f64>) -> EntityDocument {
        EntityDocument {
            version: ENTITY_DOCUMENT_VERSION.into(),
            substrate_id: SubstrateId::from("did:ede:0011223344556677"),
            class: SubstrateClass::HPlus,
            crypto: EntityCrypto {
                primary_suite: SuiteId::PQ_DILITHIUM_3,
                public_key: "ab".repeat(32),
            },
            io_profile: EntityIoProfile {
                max_bps: 1_250_000.5,
                latency_ms: 4.25,
                neural_coupling,
            },
        }
    }

    #[test]
    fn test_import_export_lossless() {
        for coupling in [Some(0.73), None] {
            let doc = document(coupling);
            let substrate = import_entity(&doc, 1000);
            assert_eq!(substrate.stability, StabilityProfile::default());
            assert_eq!(substrate.ct_balance, Ct::ZERO);
            assert_eq!(export_entity(&substrate), doc);
        }
    }

    #[test]
    fn test_json_roundtrip_and_shape() {
        let doc = document(None);
        let json = entity_to_json(&doc).unwrap();
        assert!(!json.contains("neural_coupling"));
        assert!(json.contains("\"class\": \"H_PLUS\""));
        assert_eq!(entity_from_json(&json).unwrap(), doc);
    }

    #[test]
    fn test_unknown_class_rejected() {
        let json = r#"{
            "version": "2.0",
            "substrate_id": "did:ede:x",
            "class": "ROBOT",
            "crypto": { "primary_suite": "PQ_DILITHIUM_3", "public_key": "00" },
            "io_profile": { "max_bps": 1.0, "latency_ms": 1.0 }
        }"#;
        assert!(matches!(entity_from_json(json), Err(CoreError::Decoding(_))));
    }
}
