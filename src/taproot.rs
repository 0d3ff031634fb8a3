//! Arrangement of the compiled scripts into Taproot outputs.
//!
//! The staking output commits to three script paths under an unspendable
//! internal key. The slashing leaf sits at depth 1 so the most
//! time-critical path is reachable with a single Merkle step; unbonding
//! and timelock share the deeper branch.

use bitcoin::secp256k1::Secp256k1;
use bitcoin::util::taproot::{ControlBlock, LeafVersion, TapLeafHash, TaprootBuilder, TaprootSpendInfo};
use bitcoin::{Address, Network, Script, XOnlyPublicKey};

use crate::error::{Error, Result};
use crate::script::ScriptSet;

/// A point with no known discrete log, per BIP-341. Using it as the
/// internal key makes the key path unspendable: only the script paths
/// can move funds.
pub const UNSPENDABLE_KEY: &str =
    "50929b74c1a04954b78b4b6035e97a5e078a5a0f28ec96d547bfee9ace803ac0";

pub fn unspendable_key() -> Result<XOnlyPublicKey> {
    Ok(UNSPENDABLE_KEY.parse()?)
}

/// Spend info for the staking output: slashing at depth 1, unbonding and
/// timelock paired at depth 2.
pub fn staking_spend_info(scripts: &ScriptSet) -> Result<TaprootSpendInfo> {
    TaprootBuilder::new()
        .add_leaf(2, scripts.timelock.clone())?
        .add_leaf(2, scripts.unbonding.clone())?
        .add_leaf(1, scripts.slashing.clone())?
        .finalize(&Secp256k1::new(), unspendable_key()?)
        .map_err(|_| Error::TaprootFinalize)
}

/// Spend info for the unbonding output: the unbonding timelock and the
/// slashing path, both at depth 1.
pub fn unbonding_spend_info(scripts: &ScriptSet) -> Result<TaprootSpendInfo> {
    TaprootBuilder::new()
        .add_leaf(1, scripts.unbonding_timelock.clone())?
        .add_leaf(1, scripts.slashing.clone())?
        .finalize(&Secp256k1::new(), unspendable_key()?)
        .map_err(|_| Error::TaprootFinalize)
}

/// Spend info for a slashing transaction's change output: a single-leaf
/// tree holding the unbonding timelock script, so the staker recovers
/// the unslashed remainder after the unbonding delay.
pub fn timelock_change_spend_info(unbonding_timelock: &Script) -> Result<TaprootSpendInfo> {
    TaprootBuilder::new()
        .add_leaf(0, unbonding_timelock.clone())?
        .finalize(&Secp256k1::new(), unspendable_key()?)
        .map_err(|_| Error::TaprootFinalize)
}

pub fn staking_script_pubkey(scripts: &ScriptSet) -> Result<Script> {
    Ok(Script::new_v1_p2tr_tweaked(
        staking_spend_info(scripts)?.output_key(),
    ))
}

pub fn staking_address(scripts: &ScriptSet, network: Network) -> Result<Address> {
    Ok(Address::p2tr_tweaked(
        staking_spend_info(scripts)?.output_key(),
        network,
    ))
}

/// The control block proving a leaf's membership in the tree, required
/// in the witness of any script-path spend.
pub fn control_block(spend_info: &TaprootSpendInfo, leaf: &Script) -> Result<ControlBlock> {
    spend_info
        .control_block(&(leaf.clone(), LeafVersion::TapScript))
        .ok_or(Error::TaprootFinalize)
}

pub fn leaf_hash(leaf: &Script) -> TapLeafHash {
    TapLeafHash::from_script(leaf, LeafVersion::TapScript)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ChainParams, StakingParams};
    use crate::script::{build_scripts, test_keys};

    #[test]
    fn staking_output_fixture() {
        // Known-good vector for the bbn test network covenant set.
        let staker_btc_pk = "b3193611fc3fad7c35847dc98fb3bbc22f7c86fa87a5b5d3c64e06bf4e2ff54b";
        let fp_pk = "14102e9fedd4a93e0955c07ba06a598309e75371b7bb8645717abb37b5fde939";
        let expected_staking_addr =
            "tb1p9e7vhkuskwfzyt8wz4v2769p9wd0et3gz78y39hawpm2ekeqjawqakm862";

        let chain = ChainParams::bbn_test();
        let params = StakingParams::new(
            staker_btc_pk.parse().unwrap(),
            vec![fp_pk.parse().unwrap()],
            &chain,
            1_008,
            101,
        )
        .unwrap();

        let scripts = build_scripts(&params).unwrap();
        let addr = staking_address(&scripts, Network::Signet).unwrap();
        assert_eq!(addr.to_string(), expected_staking_addr);
    }

    #[test]
    fn key_path_is_unspendable_constant() {
        let key = unspendable_key().unwrap();
        assert_eq!(hex::encode(key.serialize()), UNSPENDABLE_KEY);
    }

    #[test]
    fn slashing_leaf_has_shortest_merkle_path() {
        let keys = test_keys(5);
        let params = StakingParams {
            staker_key: keys[0],
            fp_keys: vec![keys[1]],
            covenant_keys: vec![keys[2], keys[3], keys[4]],
            covenant_quorum: 2,
            staking_time: 1_000,
            unbonding_time: 144,
        };
        let scripts = build_scripts(&params).unwrap();
        let info = staking_spend_info(&scripts).unwrap();

        let slashing_cb = control_block(&info, &scripts.slashing).unwrap();
        let timelock_cb = control_block(&info, &scripts.timelock).unwrap();
        assert_eq!(slashing_cb.merkle_branch.as_inner().len(), 1);
        assert_eq!(timelock_cb.merkle_branch.as_inner().len(), 2);
    }

    #[test]
    fn all_leaves_are_spendable_paths() {
        let keys = test_keys(3);
        let params = StakingParams {
            staker_key: keys[0],
            fp_keys: vec![keys[1]],
            covenant_keys: vec![keys[2]],
            covenant_quorum: 1,
            staking_time: 1_000,
            unbonding_time: 144,
        };
        let scripts = build_scripts(&params).unwrap();

        let staking = staking_spend_info(&scripts).unwrap();
        for leaf in [&scripts.timelock, &scripts.unbonding, &scripts.slashing] {
            control_block(&staking, leaf).unwrap();
        }

        let unbonding = unbonding_spend_info(&scripts).unwrap();
        for leaf in [&scripts.unbonding_timelock, &scripts.slashing] {
            control_block(&unbonding, leaf).unwrap();
        }
    }
}
