use bitcoin::{Script, XOnlyPublicKey};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::script::sort_keys;

/// Maximum value encodable in a CSV timelock used by the staking
/// contract. Staking and unbonding times are `u16` by construction, this
/// bound guards the seam where registry-supplied `u32` values enter.
pub const MAX_STAKING_TIME_BLOCKS: u32 = u16::MAX as u32;

/// Chain-level staking parameters, versioned by the consensus chain's
/// registry. Everything here is shared by all delegations created under
/// the same version.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainParams {
    pub version: u32,
    pub covenant_keys: Vec<XOnlyPublicKey>,
    pub covenant_quorum: u32,
    /// Destination of the slashed portion of a stake.
    pub slashing_script_pubkey: Script,
    /// Fraction of the staked value burned on slashing.
    pub slashing_rate: (u64, u64),
    pub slashing_min_fee: u64,
    /// Fee deducted when the staking output is spent into the unbonding
    /// output.
    pub unbonding_fee: u64,
    /// Confirmation depth required before a delegation becomes active.
    pub confirmation_depth: u32,
    pub min_staking_time: u16,
    pub max_staking_time: u16,
    pub min_staking_amount: u64,
}

impl ChainParams {
    pub fn bbn_test() -> Self {
        let covenant_keys = [
            "ffeaec52a9b407b355ef6967a7ffc15fd6c3fe07de2844d61550475e7a5233e5",
            "a5c60c2188e833d39d0fa798ab3f69aa12ed3dd2f3bad659effa252782de3c31",
            "59d3532148a597a2d05c0395bf5f7176044b1cd312f37701a9b4d0aad70bc5a4",
            "57349e985e742d5131e1e2b227b5170f6350ac2e2feb72254fcc25b3cee21a18",
            "c8ccb03c379e452f10c81232b41a1ca8b63d0baf8387e57d302c987e5abb8527",
        ];

        let slashing_addr: bitcoin::Address = "tb1qv03wm7hxhag6awldvwacy0z42edtt6kwljrhd9"
            .parse()
            .unwrap();

        Self {
            version: 0,
            covenant_keys: covenant_keys.iter().map(|k| k.parse().unwrap()).collect(),
            covenant_quorum: 3,
            slashing_script_pubkey: slashing_addr.script_pubkey(),
            slashing_rate: (1, 10),
            slashing_min_fee: 1_000,
            unbonding_fee: 1_000,
            confirmation_depth: 10,
            min_staking_time: 64,
            max_staking_time: u16::MAX,
            min_staking_amount: 50_000,
        }
    }

    /// Timelocks arrive from the registry as `u32`; anything beyond the
    /// CSV-encodable range is rejected rather than truncated.
    pub fn staking_time_from_u32(time: u32) -> Result<u16> {
        if time > MAX_STAKING_TIME_BLOCKS {
            return Err(Error::InvalidParams(format!(
                "staking time {} exceeds {} blocks",
                time, MAX_STAKING_TIME_BLOCKS
            )));
        }
        Ok(time as u16)
    }
}

/// The immutable key material and timelocks of a single delegation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StakingParams {
    pub staker_key: XOnlyPublicKey,
    pub fp_keys: Vec<XOnlyPublicKey>,
    pub covenant_keys: Vec<XOnlyPublicKey>,
    pub covenant_quorum: u32,
    pub staking_time: u16,
    pub unbonding_time: u16,
}

impl StakingParams {
    pub fn new(
        staker_key: XOnlyPublicKey,
        fp_keys: Vec<XOnlyPublicKey>,
        chain: &ChainParams,
        staking_time: u16,
        unbonding_time: u16,
    ) -> Result<Self> {
        let params = Self {
            staker_key,
            fp_keys,
            covenant_keys: chain.covenant_keys.clone(),
            covenant_quorum: chain.covenant_quorum,
            staking_time,
            unbonding_time,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fp_keys.is_empty() {
            return Err(Error::EmptyKeySet);
        }
        if self.covenant_keys.is_empty() {
            return Err(Error::EmptyKeySet);
        }
        if self.covenant_quorum as usize > self.covenant_keys.len() {
            return Err(Error::ThresholdExceedsKeys);
        }

        // sort_keys rejects duplicates; single-key lists cannot contain any
        if self.fp_keys.len() > 1 {
            sort_keys(&self.fp_keys)?;
        }
        if self.covenant_keys.len() > 1 {
            sort_keys(&self.covenant_keys)?;
        }

        Ok(())
    }
}
