//! Reconciliation of delegation records against live UTXO data.
//!
//! A delegation that is registered but not yet confirmed on Bitcoin
//! still depends on its funding UTXOs being spendable; another wallet
//! action can consume them out from under it. Revalidation classifies
//! such records as invalid for display and action purposes without
//! touching their last confirmed state.

use std::collections::HashSet;

use bitcoin::{Address, OutPoint};
use tokio::time::{sleep, Duration};

use super::flow::UtxoSource;
use crate::delegation::{Delegation, DelegationState};
use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevalidationResult {
    Valid,
    Invalid { reason: String },
}

/// Checks a delegation's funding inputs against the available UTXO set.
///
/// Only delegations whose staking transaction is not yet buried re-parse
/// their inputs: `Verified` records and broadcast-but-unconfirmed
/// expansions. Everything else is confirmed on-chain and trivially
/// valid. For expansions, the input spending the previous staking output
/// is exempt; it is never a wallet UTXO.
pub fn revalidate(
    delegation: &Delegation,
    available: &HashSet<OutPoint>,
) -> Result<RevalidationResult> {
    let recheck = matches!(
        delegation.state,
        DelegationState::Verified | DelegationState::IntermediateExpansionSubmitted
    );
    if !recheck {
        return Ok(RevalidationResult::Valid);
    }

    for outpoint in delegation.funding_outpoints()? {
        if let Some(previous) = &delegation.previous_staking_tx_hash_hex {
            if outpoint.txid.to_string() == *previous {
                continue;
            }
        }
        if !available.contains(&outpoint) {
            return Ok(RevalidationResult::Invalid {
                reason: format!("funding UTXO already spent: {}", outpoint),
            });
        }
    }

    Ok(RevalidationResult::Valid)
}

/// Periodically refetches the wallet's UTXOs and reclassifies every
/// delegation. Classification is reported through `on_result` and never
/// mutates the records; fetch failures are logged and retried on the
/// next pass.
pub async fn run<U, D, F>(
    source: &U,
    address: &Address,
    interval: Duration,
    delegations: D,
    mut on_result: F,
) -> Result<()>
where
    U: UtxoSource,
    D: Fn() -> Vec<Delegation>,
    F: FnMut(&Delegation, RevalidationResult),
{
    loop {
        match source.get_utxos(address).await {
            Ok(utxos) => {
                let available: HashSet<OutPoint> = utxos.iter().map(|u| u.outpoint).collect();
                for delegation in delegations() {
                    match revalidate(&delegation, &available) {
                        Ok(result) => {
                            if let RevalidationResult::Invalid { reason } = &result {
                                log::info!(
                                    "Delegation {} flagged invalid: {}",
                                    delegation.staking_tx_hash_hex,
                                    reason
                                );
                            }
                            on_result(&delegation, result);
                        }
                        Err(err) => log::warn!(
                            "Could not revalidate delegation {}: {}",
                            delegation.staking_tx_hash_hex,
                            err
                        ),
                    }
                }
            }
            Err(err) => log::warn!("Could not fetch UTXOs: {}", err),
        }

        sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegation::test_delegation;
    use bitcoin::hashes::Hash;
    use bitcoin::Txid;

    fn funding_outpoint() -> OutPoint {
        OutPoint {
            txid: Txid::from_inner([0xAA; 32]),
            vout: 1,
        }
    }

    #[test]
    fn verified_with_live_utxo_is_valid() {
        let del = test_delegation(DelegationState::Verified);
        let available = HashSet::from([funding_outpoint()]);
        assert_eq!(
            revalidate(&del, &available).unwrap(),
            RevalidationResult::Valid
        );
    }

    #[test]
    fn verified_with_spent_utxo_is_invalid() {
        let del = test_delegation(DelegationState::Verified);
        let result = revalidate(&del, &HashSet::new()).unwrap();
        assert!(matches!(result, RevalidationResult::Invalid { .. }));
    }

    #[test]
    fn confirmed_states_skip_the_check() {
        for state in [
            DelegationState::Active,
            DelegationState::Pending,
            DelegationState::TimelockWithdrawable,
        ] {
            let del = test_delegation(state);
            assert_eq!(
                revalidate(&del, &HashSet::new()).unwrap(),
                RevalidationResult::Valid
            );
        }
    }

    #[test]
    fn expansion_exempts_previous_staking_input() {
        let mut del = test_delegation(DelegationState::IntermediateExpansionSubmitted);
        // The record's only input spends the previous staking output.
        del.previous_staking_tx_hash_hex = Some(funding_outpoint().txid.to_string());
        assert_eq!(
            revalidate(&del, &HashSet::new()).unwrap(),
            RevalidationResult::Valid
        );

        // Without the linkage the same input counts as ordinary funding.
        del.previous_staking_tx_hash_hex = None;
        let result = revalidate(&del, &HashSet::new()).unwrap();
        assert!(matches!(result, RevalidationResult::Invalid { .. }));
    }
}
