//! Assembly of the delegation transaction set.
//!
//! All constructors return freshly-owned unsigned transactions; nothing
//! here holds or mutates shared buffers. UTXO selection is the caller's
//! concern, the composer only checks that what it was given conserves
//! value.

use bitcoin::util::psbt::PartiallySignedTransaction as Psbt;
use bitcoin::util::taproot::{LeafVersion, TaprootSpendInfo};
use bitcoin::{
    OutPoint, PackedLockTime, Script, Sequence, Transaction, TxIn, TxOut, Witness, XOnlyPublicKey,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::params::ChainParams;
use crate::script::ScriptSet;
use crate::taproot;

/// A read-only snapshot of a spendable output, as reported by the
/// indexer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub outpoint: OutPoint,
    pub value: u64,
    pub script_pubkey: Script,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FeeEstimates {
    pub fast: u64,
    pub medium: u64,
    pub slow: u64,
}

fn input(previous_output: OutPoint) -> TxIn {
    TxIn {
        previous_output,
        script_sig: Script::new(),
        sequence: Sequence(u32::MAX),
        witness: Witness::default(),
    }
}

/// Builds the staking transaction: output 0 locks `amount` in the
/// staking taproot output, with change back to `change_script` iff it is
/// strictly positive. Inputs are taken verbatim from `utxos`.
pub fn staking_tx(
    scripts: &ScriptSet,
    amount: u64,
    fee: u64,
    change_script: &Script,
    utxos: &[Utxo],
) -> Result<Transaction> {
    if utxos.is_empty() {
        return Err(Error::InvalidParams("No funding inputs provided".to_string()));
    }

    let available: u64 = utxos.iter().map(|u| u.value).sum();
    let required = amount
        .checked_add(fee)
        .ok_or_else(|| Error::InvalidParams("Amount plus fee overflows".to_string()))?;
    if available < required {
        return Err(Error::InsufficientFunds {
            available,
            required,
        });
    }

    let mut output = vec![TxOut {
        value: amount,
        script_pubkey: taproot::staking_script_pubkey(scripts)?,
    }];

    let change = available - required;
    if change > 0 {
        output.push(TxOut {
            value: change,
            script_pubkey: change_script.clone(),
        });
    }

    Ok(Transaction {
        version: 2,
        lock_time: PackedLockTime(0),
        input: utxos.iter().map(|u| input(u.outpoint)).collect(),
        output,
    })
}

/// Spends the staking output into the unbonding taproot output, minus
/// the fixed unbonding fee.
pub fn unbonding_tx(
    scripts: &ScriptSet,
    staking_outpoint: OutPoint,
    staking_value: u64,
    chain: &ChainParams,
) -> Result<Transaction> {
    let value = staking_value
        .checked_sub(chain.unbonding_fee)
        .filter(|v| *v > 0)
        .ok_or(Error::InsufficientFunds {
            available: staking_value,
            required: chain.unbonding_fee,
        })?;

    Ok(Transaction {
        version: 2,
        lock_time: PackedLockTime(0),
        input: vec![input(staking_outpoint)],
        output: vec![TxOut {
            value,
            script_pubkey: Script::new_v1_p2tr_tweaked(
                taproot::unbonding_spend_info(scripts)?.output_key(),
            ),
        }],
    })
}

/// Spends a staking or unbonding output on the slashing path: the slashed
/// portion goes to the chain's slashing script, the remainder back to the
/// staker behind the unbonding timelock.
pub fn slashing_tx(
    scripts: &ScriptSet,
    slashed_outpoint: OutPoint,
    slashed_value: u64,
    chain: &ChainParams,
) -> Result<Transaction> {
    let (rate_num, rate_den) = chain.slashing_rate;
    if rate_den == 0 || rate_num > rate_den {
        return Err(Error::InvalidParams(format!(
            "Invalid slashing rate {}/{}",
            rate_num, rate_den
        )));
    }

    let slashing_value = slashed_value * rate_num / rate_den;
    let change = slashed_value
        .checked_sub(slashing_value)
        .and_then(|v| v.checked_sub(chain.slashing_min_fee))
        .ok_or(Error::InsufficientFunds {
            available: slashed_value,
            required: slashing_value + chain.slashing_min_fee,
        })?;

    let mut output = vec![TxOut {
        value: slashing_value,
        script_pubkey: chain.slashing_script_pubkey.clone(),
    }];

    if change > 0 {
        let change_key =
            taproot::timelock_change_spend_info(&scripts.unbonding_timelock)?.output_key();
        output.push(TxOut {
            value: change,
            script_pubkey: Script::new_v1_p2tr_tweaked(change_key),
        });
    }

    Ok(Transaction {
        version: 2,
        lock_time: PackedLockTime(0),
        input: vec![input(slashed_outpoint)],
        output,
    })
}

/// Wraps the staking transaction for wallet signing: every input carries
/// its witness UTXO, and optionally the wallet's taproot internal key so
/// it can derive the tweak for its own key-path inputs.
pub fn staking_psbt(
    tx: Transaction,
    utxos: &[Utxo],
    internal_key_override: Option<XOnlyPublicKey>,
) -> Result<Psbt> {
    let mut psbt = Psbt::from_unsigned_tx(tx)?;
    for (i, utxo) in utxos.iter().enumerate() {
        psbt.inputs[i].witness_utxo = Some(TxOut {
            value: utxo.value,
            script_pubkey: utxo.script_pubkey.clone(),
        });
        if let Some(key) = internal_key_override {
            psbt.inputs[i].tap_internal_key = Some(key);
        }
    }
    Ok(psbt)
}

/// Wraps a single-input transaction spending a taproot output on a
/// script path, carrying everything the wallet needs to produce the
/// Schnorr signature: the witness UTXO, internal key, merkle root and
/// the leaf's control block.
pub fn script_spend_psbt(
    tx: Transaction,
    prevout: &TxOut,
    spend_info: &TaprootSpendInfo,
    leaf: &Script,
) -> Result<Psbt> {
    let control_block = taproot::control_block(spend_info, leaf)?;

    let mut psbt = Psbt::from_unsigned_tx(tx)?;
    let psbt_in = &mut psbt.inputs[0];
    psbt_in.witness_utxo = Some(prevout.clone());
    psbt_in.tap_internal_key = Some(spend_info.internal_key());
    psbt_in.tap_merkle_root = spend_info.merkle_root();
    psbt_in
        .tap_scripts
        .insert(control_block, (leaf.clone(), LeafVersion::TapScript));

    Ok(psbt)
}
