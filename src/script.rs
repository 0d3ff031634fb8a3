//! Compilation of the staking contract's spending conditions into raw
//! Bitcoin Script.
//!
//! All scripts are deterministic pure functions of the staking
//! parameters: the same parameters always compile to byte-identical
//! scripts, and key lists are canonically sorted before emission so that
//! third-party verifiers can reproduce the exact bytes.

use bitcoin::blockdata::opcodes::all as opcodes;
use bitcoin::blockdata::script::Builder;
use bitcoin::secp256k1::PublicKey;
use bitcoin::{Script, XOnlyPublicKey};

use crate::error::{Error, Result};
use crate::params::StakingParams;

/// The compiled spending paths of a staking output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptSet {
    /// Staker key + staking-time CSV.
    pub timelock: Script,
    /// Staker key + covenant quorum.
    pub unbonding: Script,
    /// Staker key + any finality provider + covenant quorum.
    pub slashing: Script,
    /// Staker key + unbonding-time CSV, used by the unbonding output and
    /// by slashing change outputs.
    pub unbonding_timelock: Script,
}

/// Normalizes a serialized public key to x-only form. Accepts the
/// 32-byte x-only and 33-byte compressed encodings; anything else is
/// rejected so a parity byte can never leak into script construction.
pub fn x_only_key(bytes: &[u8]) -> Result<XOnlyPublicKey> {
    match bytes.len() {
        32 => Ok(XOnlyPublicKey::from_slice(bytes)?),
        33 => Ok(PublicKey::from_slice(bytes)?.x_only_public_key().0),
        n => Err(Error::InvalidKeyLength(n)),
    }
}

pub fn single_key_script(pk: XOnlyPublicKey, verify: bool) -> Script {
    Builder::new()
        .push_slice(&pk.serialize())
        .push_opcode(if verify {
            opcodes::OP_CHECKSIGVERIFY
        } else {
            opcodes::OP_CHECKSIG
        })
        .into_script()
}

pub fn multisig_script(pks: &[XOnlyPublicKey], threshold: u32, verify: bool) -> Result<Script> {
    if pks.is_empty() {
        return Err(Error::EmptyKeySet);
    }

    if threshold as usize > pks.len() {
        return Err(Error::ThresholdExceedsKeys);
    }

    if pks.len() == 1 {
        return Ok(single_key_script(pks[0], verify));
    }

    let pks = sort_keys(pks)?;

    let mut builder = Builder::new();
    for (i, pk) in pks.iter().enumerate() {
        builder = builder.push_slice(&pk.serialize()).push_opcode(if i == 0 {
            opcodes::OP_CHECKSIG
        } else {
            opcodes::OP_CHECKSIGADD
        });
    }
    builder = builder
        .push_int(threshold as i64)
        .push_opcode(opcodes::OP_GREATERTHANOREQUAL);
    if verify {
        builder = builder.push_opcode(opcodes::OP_VERIFY);
    }

    Ok(builder.into_script())
}

/// Sorts keys in canonical byte order. The ordering is a protocol-level
/// contract: verifiers must reproduce it exactly.
pub fn sort_keys(pks: &[XOnlyPublicKey]) -> Result<Vec<XOnlyPublicKey>> {
    if pks.len() < 2 {
        return Err(Error::InvalidParams(
            "Cannot sort less than two keys".to_string(),
        ));
    }

    let mut pks = pks.to_vec();
    pks.sort_by(|a, b| a.serialize().cmp(&b.serialize()));

    for i in 0..pks.len() - 1 {
        if pks[i] == pks[i + 1] {
            return Err(Error::DuplicateKey);
        }
    }

    Ok(pks)
}

pub fn timelock_script(pk: XOnlyPublicKey, timelock: u16) -> Script {
    let mut bytes = single_key_script(pk, true).into_bytes();
    bytes.extend(
        Builder::new()
            .push_int(timelock as i64)
            .push_opcode(opcodes::OP_CSV)
            .into_script()
            .into_bytes(),
    );
    bytes.into()
}

pub fn aggregate_scripts(scripts: &[Script]) -> Script {
    let mut bytes = vec![];
    for script in scripts.iter() {
        bytes.extend(script.clone().into_bytes());
    }
    bytes.into()
}

pub fn unbonding_script(params: &StakingParams) -> Result<Script> {
    Ok(aggregate_scripts(&[
        single_key_script(params.staker_key, true),
        multisig_script(&params.covenant_keys, params.covenant_quorum, false)?,
    ]))
}

/// The finality-provider group always has threshold 1: any single
/// finality-provider signature is sufficient evidence of an offense.
pub fn slashing_script(params: &StakingParams) -> Result<Script> {
    Ok(aggregate_scripts(&[
        single_key_script(params.staker_key, true),
        multisig_script(&params.fp_keys, 1, true)?,
        multisig_script(&params.covenant_keys, params.covenant_quorum, false)?,
    ]))
}

pub fn build_scripts(params: &StakingParams) -> Result<ScriptSet> {
    params.validate()?;

    Ok(ScriptSet {
        timelock: timelock_script(params.staker_key, params.staking_time),
        unbonding: unbonding_script(params)?,
        slashing: slashing_script(params)?,
        unbonding_timelock: timelock_script(params.staker_key, params.unbonding_time),
    })
}

#[cfg(test)]
pub fn test_keys(n: usize) -> Vec<XOnlyPublicKey> {
    use bitcoin::secp256k1::{KeyPair, Secp256k1};

    let secp = Secp256k1::new();
    (0..n)
        .map(|i| {
            KeyPair::from_seckey_slice(&secp, &[i as u8 + 1; 32])
                .unwrap()
                .x_only_public_key()
                .0
        })
        .collect()
}
