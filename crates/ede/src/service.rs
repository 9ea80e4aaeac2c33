//! The ledger service: one writer, many readers.
//!
//! An [`Ede`] owns the current ledger value behind an async mutex. Writers
//! serialize through it; an append is verified, persisted and only then
//! published, so a failure at any step leaves the visible ledger unchanged.
//! Readers take an `Arc` snapshot and scan it without holding the lock.

use std::sync::Arc;

use ede_audit::{verify_all_invariants, InvariantReport};
use ede_core::{CslEvent, Digest, VerifierTable};
use ede_ledger::{derive_state, verify_all_proofs, Csl, DerivedState, PersistedLedger, ProofFailure};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::EdeConfig;
use crate::error::{EdeError, Result};
use crate::store::LedgerStore;

/// The main service struct.
///
/// Provides a unified API for:
/// - Opening a ledger from a host store
/// - Submitting events under the single-writer discipline
/// - Replaying state and auditing invariants over snapshots
pub struct Ede<S: LedgerStore> {
    /// The current ledger value.
    csl: Mutex<Arc<Csl>>,
    /// The storage backend.
    store: Arc<S>,
    /// Configuration.
    config: EdeConfig,
    /// Suite -> verifier table used for every append.
    verifiers: VerifierTable,
}

impl<S: LedgerStore> Ede<S> {
    /// Open the ledger held by `store`, or start an empty one on the
    /// configured genesis.
    pub async fn open(store: S, config: EdeConfig, verifiers: VerifierTable) -> Result<Self> {
        let genesis = config.genesis();
        let csl = match store.load().await? {
            Some(persisted) if config.verify_proofs_on_open => {
                persisted.restore(genesis, &verifiers)?
            }
            Some(persisted) => persisted.restore_unchecked(genesis),
            None => Csl::with_genesis(genesis),
        };
        info!(events = csl.len(), head = %csl.head(), "ledger opened");

        Ok(Self {
            csl: Mutex::new(Arc::new(csl)),
            store: Arc::new(store),
            config,
            verifiers,
        })
    }

    pub fn config(&self) -> &EdeConfig {
        &self.config
    }

    pub fn verifiers(&self) -> &VerifierTable {
        &self.verifiers
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current head.
    pub async fn head(&self) -> Digest {
        self.csl.lock().await.head()
    }

    /// An immutable view of the ledger as it stands now.
    pub async fn snapshot(&self) -> Arc<Csl> {
        Arc::clone(&*self.csl.lock().await)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a fully built event.
    ///
    /// The event must link from the current head; one built against an older
    /// head is refused with [`EdeError::StaleHead`] and can be rebuilt.
    pub async fn submit(&self, event: CslEvent) -> Result<Digest> {
        let mut current = self.csl.lock().await;
        self.commit(&mut *current, event).await
    }

    /// Build an event against the current ledger and append it, holding the
    /// writer lock throughout so the head cannot move in between.
    pub async fn append_with<F, E>(&self, build: F) -> Result<Digest>
    where
        F: FnOnce(&Csl) -> std::result::Result<CslEvent, E>,
        E: Into<EdeError>,
    {
        let mut current = self.csl.lock().await;
        let event = build(&**current).map_err(Into::into)?;
        self.commit(&mut *current, event).await
    }

    async fn commit(&self, current: &mut Arc<Csl>, event: CslEvent) -> Result<Digest> {
        let head = current.head();
        if let Some(link) = event.hash_chain() {
            if link.prev != head {
                warn!(expected = %head, found = %link.prev, "stale event refused");
                return Err(EdeError::StaleHead {
                    expected: head,
                    found: link.prev,
                });
            }
        }

        let kind = event.kind;
        let next = current.append(event, &self.verifiers)?;
        self.store.save(&PersistedLedger::from_csl(&next)).await?;
        debug!(events = next.len(), "ledger persisted");

        let id = next.head();
        *current = Arc::new(next);
        info!(id = %id, %kind, "event submitted");
        Ok(id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Replay the current ledger.
    pub async fn state(&self) -> Result<DerivedState> {
        let csl = self.snapshot().await;
        Ok(derive_state(&csl)?)
    }

    /// Run all seven invariants over the current ledger.
    pub async fn audit(&self) -> InvariantReport {
        let csl = self.snapshot().await;
        verify_all_invariants(&csl, &self.config.invariant_config())
    }

    /// Re-verify every event's proof.
    pub async fn verify_proofs(&self) -> Vec<ProofFailure> {
        let csl = self.snapshot().await;
        verify_all_proofs(&csl, &self.verifiers)
    }
}
