//! Host persistence seam.
//!
//! The core never touches storage. A host hands the facade a
//! [`LedgerStore`]; the facade saves the persisted layout after every
//! accepted append and loads it on open.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use ede_ledger::PersistedLedger;

use crate::error::{Result, StoreError};

/// Where a persisted ledger lives.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load the stored ledger, `None` if nothing was saved yet.
    async fn load(&self) -> Result<Option<PersistedLedger>>;

    /// Replace the stored ledger.
    async fn save(&self, ledger: &PersistedLedger) -> Result<()>;
}

/// In-memory store for tests and development.
///
/// Keeps the JSON form, so every load goes through the same decoding
/// boundary a durable store would. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<RwLock<Option<String>>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored JSON directly.
    pub fn put_raw(&self, json: impl Into<String>) -> Result<()> {
        let mut slot = self.slot.write().map_err(|_| poisoned())?;
        *slot = Some(json.into());
        Ok(())
    }

    /// The stored JSON, if any.
    pub fn raw(&self) -> Result<Option<String>> {
        let slot = self.slot.read().map_err(|_| poisoned())?;
        Ok(slot.clone())
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".into())
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn load(&self) -> Result<Option<PersistedLedger>> {
        match self.raw()? {
            Some(json) => {
                let ledger = PersistedLedger::from_json(&json)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(ledger))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, ledger: &PersistedLedger) -> Result<()> {
        let json = ledger
            .to_json()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.put_raw(json)
    }
}
