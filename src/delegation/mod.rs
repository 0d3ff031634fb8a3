//! Delegation records and their lifecycle.

use bitcoin::consensus::encode;
use bitcoin::{OutPoint, Transaction};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod flow;
pub mod revalidator;
mod state;

pub use state::{DelegationEvent, DelegationState, SlashedOutput, Transition, WithdrawableKind};

/// The persistent record of a delegation. Created when its staking
/// transaction is first broadcast or reported by the registry; mutated
/// only through state transitions; never deleted (terminal records are
/// kept for history).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Delegation {
    pub staking_tx_hash_hex: String,
    /// The full staking transaction, cached so funding inputs can be
    /// re-checked against live UTXOs without refetching.
    pub staking_tx_hex: String,
    pub staking_amount_sat: u64,
    pub params_version: u32,
    pub staker_btc_pk_hex: String,
    pub finality_provider_btc_pks_hex: Vec<String>,
    pub staking_timelock: u16,
    pub unbonding_timelock: u16,
    pub bbn_inception_height: u64,
    pub bbn_inception_time: i64,
    pub start_height: u32,
    pub end_height: u32,
    /// Set when this delegation expands an earlier one.
    pub previous_staking_tx_hash_hex: Option<String>,
    pub state: DelegationState,
}

impl Delegation {
    pub fn staking_tx(&self) -> Result<Transaction> {
        Ok(encode::deserialize(&hex::decode(&self.staking_tx_hex)?)?)
    }

    /// The outpoints the staking transaction consumes.
    pub fn funding_outpoints(&self) -> Result<Vec<OutPoint>> {
        Ok(self
            .staking_tx()?
            .input
            .iter()
            .map(|txin| txin.previous_output)
            .collect())
    }

    pub fn is_expansion(&self) -> bool {
        self.previous_staking_tx_hash_hex.is_some()
    }

    /// Applies a lifecycle event, advancing the stored state on success.
    pub fn transition(
        &mut self,
        event: &DelegationEvent,
        confirmation_depth: u32,
    ) -> Result<Transition> {
        let transition = self.state.apply(event, confirmation_depth)?;
        if let Transition::Next(next) = transition {
            self.state = next;
        }
        Ok(transition)
    }
}

/// Promotes a confirmed expansion and retires the delegation it
/// replaces, atomically: both records move or neither does.
///
/// Returns `false` without touching either record when the expansion's
/// staking transaction is not yet buried deep enough.
pub fn activate_expansion(
    prior: &mut Delegation,
    expansion: &mut Delegation,
    depth: u32,
    confirmation_depth: u32,
) -> Result<bool> {
    match &expansion.previous_staking_tx_hash_hex {
        Some(hash) if *hash == prior.staking_tx_hash_hex => {}
        _ => {
            return Err(Error::InvalidParams(
                "Expansion does not reference the prior delegation".to_string(),
            ))
        }
    }

    let expansion_next = expansion
        .state
        .apply(&DelegationEvent::StakingConfirmed { depth }, confirmation_depth)?;
    let expansion_next = match expansion_next {
        Transition::Next(DelegationState::Active) => DelegationState::Active,
        // Not deep enough yet; nothing moves.
        Transition::Next(_) => return Ok(false),
        Transition::Expire => {
            return Err(Error::InvalidTransition {
                state: expansion.state.to_string(),
                event: "StakingConfirmed".to_string(),
            })
        }
    };

    // Validate the prior record's transition before mutating anything.
    let prior_next = match prior
        .state
        .apply(&DelegationEvent::ExpansionActivated, confirmation_depth)?
    {
        Transition::Next(next) => next,
        Transition::Expire => {
            return Err(Error::InvalidTransition {
                state: prior.state.to_string(),
                event: "ExpansionActivated".to_string(),
            })
        }
    };

    expansion.state = expansion_next;
    prior.state = prior_next;
    Ok(true)
}

#[cfg(test)]
pub(crate) fn test_delegation(state: DelegationState) -> Delegation {
    use bitcoin::hashes::Hash;
    use bitcoin::{PackedLockTime, Script, Sequence, TxIn, TxOut, Txid, Witness};

    let tx = Transaction {
        version: 2,
        lock_time: PackedLockTime(0),
        input: vec![TxIn {
            previous_output: OutPoint {
                txid: Txid::from_inner([0xAA; 32]),
                vout: 1,
            },
            script_sig: Script::new(),
            sequence: Sequence(u32::MAX),
            witness: Witness::default(),
        }],
        output: vec![TxOut {
            value: 50_000,
            script_pubkey: Script::new(),
        }],
    };

    Delegation {
        staking_tx_hash_hex: tx.txid().to_string(),
        staking_tx_hex: hex::encode(encode::serialize(&tx)),
        staking_amount_sat: 50_000,
        params_version: 0,
        staker_btc_pk_hex: "b3193611fc3fad7c35847dc98fb3bbc22f7c86fa87a5b5d3c64e06bf4e2ff54b"
            .to_string(),
        finality_provider_btc_pks_hex: vec![
            "14102e9fedd4a93e0955c07ba06a598309e75371b7bb8645717abb37b5fde939".to_string(),
        ],
        staking_timelock: 1_000,
        unbonding_timelock: 144,
        bbn_inception_height: 100,
        bbn_inception_time: 1_700_000_000,
        start_height: 0,
        end_height: 0,
        previous_staking_tx_hash_hex: None,
        state,
    }
}
