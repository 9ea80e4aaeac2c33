//! Host configuration.

use ede_audit::InvariantConfig;
use ede_core::{Ct, Digest};
use ede_ledger::DEFAULT_GENESIS_SEED;
use serde::{Deserialize, Serialize};

use crate::error::{EdeError, Result};

/// Configuration for an [`Ede`](crate::Ede) instance.
///
/// Every field has a default, so a JSON document only needs the fields it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdeConfig {
    /// The genesis head is the hash of this seed.
    pub genesis_seed: String,
    /// A flux of at least this much CT makes its session critical.
    pub critical_ct_threshold: Ct,
    /// Re-verify every proof when loading a persisted ledger.
    pub verify_proofs_on_open: bool,
}

impl Default for EdeConfig {
    fn default() -> Self {
        Self {
            genesis_seed: DEFAULT_GENESIS_SEED.to_owned(),
            critical_ct_threshold: Ct::new(1000),
            verify_proofs_on_open: true,
        }
    }
}

impl EdeConfig {
    /// Load from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| EdeError::Config(e.to_string()))
    }

    pub fn genesis(&self) -> Digest {
        Digest::genesis(&self.genesis_seed)
    }

    /// Parameters for the invariant engine.
    pub fn invariant_config(&self) -> InvariantConfig {
        InvariantConfig {
            genesis: self.genesis(),
            critical_ct_threshold: self.critical_ct_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EdeConfig::from_json(r#"{"critical_ct_threshold":"250"}"#).unwrap();
        assert_eq!(config.critical_ct_threshold, Ct::new(250));
        assert_eq!(config.genesis_seed, DEFAULT_GENESIS_SEED);
        assert!(config.verify_proofs_on_open);
    }

    #[test]
    fn test_bad_json_is_config_error() {
        assert!(matches!(
            EdeConfig::from_json(r#"{"critical_ct_threshold":-1}"#),
            Err(EdeError::Config(_))
        ));
    }

    #[test]
    fn test_invariant_config_follows_seed() {
        let config = EdeConfig {
            genesis_seed: "other".into(),
            ..EdeConfig::default()
        };
        assert_eq!(config.invariant_config().genesis, Digest::genesis("other"));
        assert_ne!(config.genesis(), EdeConfig::default().genesis());
    }
}
