//! Persisted ledger layout: an ordered array of events plus the head.
//!
//! Where the bytes live is the host's business. This module only fixes the
//! layout and the rule for bringing it back: every event is re-appended, so
//! nothing enters a ledger value without its proof verifying.

use ede_core::{CslEvent, Digest, VerifierTable};
use serde::{Deserialize, Serialize};

use crate::csl::Csl;
use crate::error::{LedgerError, Result};

/// The persisted form of a [`Csl`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedLedger {
    pub events: Vec<CslEvent>,
    pub head: Digest,
}

impl PersistedLedger {
    /// Capture a ledger value.
    pub fn from_csl(csl: &Csl) -> Self {
        Self {
            events: csl.events().to_vec(),
            head: csl.head(),
        }
    }

    /// Rebuild a ledger on `genesis`, re-verifying every event.
    ///
    /// Refuses if any proof fails or the recorded head differs from the one
    /// the re-append arrives at.
    pub fn restore(self, genesis: Digest, verifiers: &VerifierTable) -> Result<Csl> {
        let recorded = self.head;
        let csl = self
            .events
            .into_iter()
            .try_fold(Csl::with_genesis(genesis), |csl, event| {
                csl.append(event, verifiers)
            })?;

        if csl.head() != recorded {
            return Err(LedgerError::HeadMismatch {
                recorded,
                computed: csl.head(),
            });
        }
        Ok(csl)
    }

    /// Rebuild a ledger on `genesis` as recorded, without verification.
    pub fn restore_unchecked(self, genesis: Digest) -> Csl {
        Csl::from_parts(genesis, self.events, self.head)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    /// Deserialize from JSON. Unknown event tags are rejected here.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| LedgerError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{registration_event, SUITE};
    use ede_core::SubstrateClass;

    fn two_event_ledger(table: &VerifierTable) -> Csl {
        let mut csl = Csl::new();
        for seed in [0x01, 0x02] {
            let event = registration_event(seed, SubstrateClass::So, SUITE, &csl.head());
            csl = csl.append(event, table).unwrap();
        }
        csl
    }

    #[test]
    fn test_json_restore_roundtrip() {
        let table = VerifierTable::development();
        let csl = two_event_ledger(&table);

        let json = PersistedLedger::from_csl(&csl).to_json().unwrap();
        let restored = PersistedLedger::from_json(&json)
            .unwrap()
            .restore(csl.genesis(), &table)
            .unwrap();
        assert_eq!(restored, csl);
    }

    #[test]
    fn test_restore_refuses_wrong_head() {
        let table = VerifierTable::development();
        let csl = two_event_ledger(&table);

        let mut persisted = PersistedLedger::from_csl(&csl);
        persisted.head = Digest::hash(b"forged");
        assert!(matches!(
            persisted.restore(csl.genesis(), &table),
            Err(LedgerError::HeadMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_event_type_rejected_at_decode() {
        let table = VerifierTable::development();
        let csl = two_event_ledger(&table);
        let json = PersistedLedger::from_csl(&csl)
            .to_json()
            .unwrap()
            .replace("\"type\":\"SUBSTRATE_REGISTERED\"", "\"type\":\"SUBSTRATE_MERGED\"");

        assert!(matches!(
            PersistedLedger::from_json(&json),
            Err(LedgerError::Serialization(_))
        ));
    }
}
