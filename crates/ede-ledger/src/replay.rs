//! State replay.
//!
//! Current state is never stored; it is derived by a strict, order-preserving
//! left fold over the ledger's events. Replaying any prefix gives the state
//! as of that point.

use std::collections::BTreeMap;

use ede_core::{
    Channel, ChannelId, ChannelState, CslEvent, Ct, EventProof, FluxId, Session, SessionId,
    Substrate, SubstrateId,
};
use tracing::warn;

use crate::csl::Csl;
use crate::error::{LedgerError, Result};

/// Snapshot of everything the ledger implies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedState {
    pub substrates: BTreeMap<SubstrateId, Substrate>,
    pub channels: BTreeMap<ChannelId, Channel>,
    pub sessions: BTreeMap<SessionId, Session>,
    pub ct_balances: BTreeMap<SubstrateId, Ct>,
    /// FLUX events skipped because their channel was never authorized.
    pub orphan_fluxes: Vec<FluxId>,
}

impl DerivedState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `substrate`, zero if unknown.
    pub fn balance(&self, substrate: &SubstrateId) -> Ct {
        self.ct_balances.get(substrate).copied().unwrap_or_default()
    }

    /// Apply one event.
    ///
    /// Authorization moves no balance; value only moves at settlement.
    pub fn apply(&mut self, event: &CslEvent) -> Result<()> {
        match &event.proof {
            EventProof::SubstrateRegistered(proof) => {
                let substrate = &proof.claim;
                self.ct_balances
                    .insert(substrate.id.clone(), substrate.ct_balance);
                self.substrates
                    .insert(substrate.id.clone(), substrate.clone());
            }
            EventProof::ChannelAuthorized(proof) => {
                let mut channel = proof.claim.clone();
                channel.consumed_ct = Ct::ZERO;
                self.channels.insert(channel.id.clone(), channel);
            }
            EventProof::SessionCreated(proof) => {
                self.sessions
                    .insert(proof.claim.id.clone(), proof.claim.clone());
            }
            EventProof::Flux(proof) => {
                let flux = &proof.claim;
                match self.channels.get_mut(&flux.channel) {
                    Some(channel) => {
                        channel.consumed_ct = channel
                            .consumed_ct
                            .checked_add(flux.ct_delta)
                            .ok_or(LedgerError::CtOverflow(event.id))?;
                    }
                    None => {
                        warn!(
                            flux = %flux.id,
                            channel = %flux.channel,
                            "flux references unknown channel, skipped"
                        );
                        self.orphan_fluxes.push(flux.id.clone());
                    }
                }
            }
            EventProof::ChannelSettled(proof) => {
                let settlement = &proof.claim;
                if let Some(channel) = self.channels.get_mut(&settlement.channel) {
                    channel.state = ChannelState::Closed;
                }
                for distribution in &settlement.distributions {
                    let balance = self
                        .ct_balances
                        .entry(distribution.substrate.clone())
                        .or_default();
                    *balance = balance
                        .checked_add(distribution.ct_amount)
                        .ok_or(LedgerError::CtOverflow(event.id))?;
                }
            }
        }
        Ok(())
    }
}

/// Replay the whole ledger.
pub fn derive_state(csl: &Csl) -> Result<DerivedState> {
    replay(csl.events())
}

/// Replay only the first `n` events.
pub fn derive_state_at(csl: &Csl, n: usize) -> Result<DerivedState> {
    replay(&csl.events()[..n.min(csl.len())])
}

fn replay(events: &[CslEvent]) -> Result<DerivedState> {
    events.iter().try_fold(DerivedState::new(), |mut state, event| {
        state.apply(event)?;
        Ok(state)
    })
}
