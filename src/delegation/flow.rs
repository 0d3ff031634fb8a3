//! Assembly of a full delegation bundle against an external wallet.
//!
//! The four transactions are signed strictly in order: staking, then
//! unbonding, then the two slashing transactions. Each one is built
//! against the signed (and de-signed for hashing) form of its
//! predecessor, so the order is a correctness requirement, not a
//! convention. Nothing is broadcast until the whole bundle exists;
//! aborting between any two signing steps just drops the partial state.

use async_trait::async_trait;
use bitcoin::consensus::encode;
use bitcoin::secp256k1::schnorr;
use bitcoin::util::psbt::PartiallySignedTransaction as Psbt;
use bitcoin::{Address, BlockHash, OutPoint, Script, Transaction, Txid, XOnlyPublicKey};

use crate::delegation::{Delegation, DelegationState};
use crate::error::{Error, Result};
use crate::params::{ChainParams, StakingParams};
use crate::proof::MerkleProof;
use crate::proto::{
    BtcSigType, InclusionProof, MsgBtcStakeExpand, MsgCreateBtcDelegation, TransactionKey,
};
use crate::script::{build_scripts, ScriptSet};
use crate::{pop, taproot, tx, witness};

/// An external wallet. Only opaque hex crosses this boundary.
///
/// Implementations must return [`Error::Signing`] when the user rejects
/// a request, so callers can distinguish cancellation from a malformed
/// transaction. `sign_message` signs the SHA-256 digest of `payload`
/// under the requested scheme.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign_psbt(&self, psbt_hex: &str) -> Result<String>;
    async fn sign_message(&self, payload: &[u8], scheme: BtcSigType) -> Result<Vec<u8>>;
}

#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn push_tx(&self, tx_hex: &str) -> Result<Txid>;
}

#[async_trait]
pub trait UtxoSource: Send + Sync {
    async fn get_utxos(&self, address: &Address) -> Result<Vec<tx::Utxo>>;
    async fn get_fee_estimates(&self) -> Result<tx::FeeEstimates>;
}

/// Everything the caller decides up front about a new delegation.
#[derive(Clone, Debug)]
pub struct DelegationRequest {
    pub staking_params: StakingParams,
    pub amount: u64,
    pub fee: u64,
    pub change_script: Script,
    /// Funding inputs, selected by the wallet. The composer does not do
    /// UTXO selection.
    pub funding_utxos: Vec<tx::Utxo>,
    /// The wallet's taproot internal key, when it needs the tweak hint
    /// to sign its own key-path inputs.
    pub staker_internal_key: Option<XOnlyPublicKey>,
    /// The consensus-chain account receiving the delegation.
    pub staker_addr: String,
    pub pop_scheme: BtcSigType,
}

/// The fully signed material required to register a delegation.
#[derive(Clone, Debug)]
pub struct DelegationBundle {
    pub scripts: ScriptSet,
    /// Signed staking transaction, ready for broadcast.
    pub staking_tx_signed: Transaction,
    /// Canonical unsigned forms, as hashed and registered.
    pub staking_tx: Transaction,
    pub unbonding_tx: Transaction,
    pub slashing_tx: Transaction,
    pub unbonding_slashing_tx: Transaction,
    /// The staker's Schnorr signatures recovered from the wallet's
    /// witnesses.
    pub unbonding_sig: schnorr::Signature,
    pub slashing_sig: schnorr::Signature,
    pub unbonding_slashing_sig: schnorr::Signature,
    pub pop: crate::proto::ProofOfPossessionBtc,
}

pub struct StakingFlow<'a, S, B> {
    signer: &'a S,
    broadcaster: &'a B,
    chain: &'a ChainParams,
}

impl<'a, S: Signer, B: Broadcaster> StakingFlow<'a, S, B> {
    pub fn new(signer: &'a S, broadcaster: &'a B, chain: &'a ChainParams) -> Self {
        StakingFlow {
            signer,
            broadcaster,
            chain,
        }
    }

    async fn sign_psbt(&self, psbt: Psbt) -> Result<Transaction> {
        let request = hex::encode(encode::serialize(&psbt));
        let response = self.signer.sign_psbt(&request).await?;
        let signed: Psbt = encode::deserialize(&hex::decode(response)?)?;
        Ok(signed.extract_tx())
    }

    fn validate_request(&self, req: &DelegationRequest) -> Result<()> {
        req.staking_params.validate()?;

        if req.amount < self.chain.min_staking_amount {
            return Err(Error::InvalidParams(format!(
                "Staking amount {} below minimum {}",
                req.amount, self.chain.min_staking_amount
            )));
        }
        let time = req.staking_params.staking_time;
        if time < self.chain.min_staking_time || time > self.chain.max_staking_time {
            return Err(Error::InvalidParams(format!(
                "Staking time {} outside [{}, {}]",
                time, self.chain.min_staking_time, self.chain.max_staking_time
            )));
        }
        Ok(())
    }

    /// Builds and signs the whole delegation bundle. No network side
    /// effects besides the wallet round-trips; broadcast is separate and
    /// last.
    pub async fn assemble(&self, req: &DelegationRequest) -> Result<DelegationBundle> {
        self.validate_request(req)?;

        let scripts = build_scripts(&req.staking_params)?;
        let staking_spend = taproot::staking_spend_info(&scripts)?;

        let unsigned = tx::staking_tx(
            &scripts,
            req.amount,
            req.fee,
            &req.change_script,
            &req.funding_utxos,
        )?;
        let psbt = tx::staking_psbt(unsigned, &req.funding_utxos, req.staker_internal_key)?;
        log::debug!("Requesting staking signature");
        let staking_tx_signed = self.sign_psbt(psbt).await?;
        let staking_tx = witness::clear_signatures(&staking_tx_signed);

        let staking_outpoint = OutPoint {
            txid: staking_tx.txid(),
            vout: 0,
        };
        let staking_prevout = staking_tx.output[0].clone();

        let unsigned = tx::unbonding_tx(
            &scripts,
            staking_outpoint,
            staking_prevout.value,
            self.chain,
        )?;
        let psbt =
            tx::script_spend_psbt(unsigned, &staking_prevout, &staking_spend, &scripts.unbonding)?;
        log::debug!("Requesting unbonding signature");
        let unbonding_signed = self.sign_psbt(psbt).await?;
        let unbonding_sig = witness::extract_schnorr_signature(&unbonding_signed)?;
        let unbonding_tx = witness::clear_signatures(&unbonding_signed);

        let unsigned = tx::slashing_tx(
            &scripts,
            staking_outpoint,
            staking_prevout.value,
            self.chain,
        )?;
        let psbt =
            tx::script_spend_psbt(unsigned, &staking_prevout, &staking_spend, &scripts.slashing)?;
        log::debug!("Requesting slashing signature");
        let slashing_signed = self.sign_psbt(psbt).await?;
        let slashing_sig = witness::extract_schnorr_signature(&slashing_signed)?;
        let slashing_tx = witness::clear_signatures(&slashing_signed);

        let unbonding_spend = taproot::unbonding_spend_info(&scripts)?;
        let unbonding_prevout = unbonding_tx.output[0].clone();
        let unsigned = tx::slashing_tx(
            &scripts,
            OutPoint {
                txid: unbonding_tx.txid(),
                vout: 0,
            },
            unbonding_prevout.value,
            self.chain,
        )?;
        let psbt = tx::script_spend_psbt(
            unsigned,
            &unbonding_prevout,
            &unbonding_spend,
            &scripts.slashing,
        )?;
        log::debug!("Requesting unbonding slashing signature");
        let unbonding_slashing_signed = self.sign_psbt(psbt).await?;
        let unbonding_slashing_sig = witness::extract_schnorr_signature(&unbonding_slashing_signed)?;
        let unbonding_slashing_tx = witness::clear_signatures(&unbonding_slashing_signed);

        let pop_sig = self
            .signer
            .sign_message(req.staker_addr.as_bytes(), req.pop_scheme)
            .await?;
        let pop = pop::pop_from_signature(req.pop_scheme, pop_sig);

        Ok(DelegationBundle {
            scripts,
            staking_tx_signed,
            staking_tx,
            unbonding_tx,
            slashing_tx,
            unbonding_slashing_tx,
            unbonding_sig,
            slashing_sig,
            unbonding_slashing_sig,
            pop,
        })
    }

    /// The registration message for the consensus chain.
    pub fn registration_msg(
        &self,
        req: &DelegationRequest,
        bundle: &DelegationBundle,
        inclusion: Option<(BlockHash, MerkleProof)>,
    ) -> MsgCreateBtcDelegation {
        MsgCreateBtcDelegation {
            staker_addr: req.staker_addr.clone(),
            pop: Some(bundle.pop.clone()),
            btc_pk: req.staking_params.staker_key.serialize().to_vec(),
            fp_btc_pk_list: req
                .staking_params
                .fp_keys
                .iter()
                .map(|k| k.serialize().to_vec())
                .collect(),
            staking_time: req.staking_params.staking_time as u32,
            staking_value: req.amount as i64,
            staking_tx: encode::serialize(&bundle.staking_tx),
            staking_tx_inclusion_proof: inclusion.map(inclusion_proof),
            slashing_tx: encode::serialize(&bundle.slashing_tx),
            delegator_slashing_sig: bundle.slashing_sig.as_ref().to_vec(),
            unbonding_time: req.staking_params.unbonding_time as u32,
            unbonding_tx: encode::serialize(&bundle.unbonding_tx),
            unbonding_value: bundle.unbonding_tx.output[0].value as i64,
            unbonding_slashing_tx: encode::serialize(&bundle.unbonding_slashing_tx),
            delegator_unbonding_slashing_sig: bundle.unbonding_slashing_sig.as_ref().to_vec(),
        }
    }

    /// The registration message for a stake expansion, carrying the
    /// reference to the delegation it supersedes and the transaction
    /// funding the value difference.
    pub fn expansion_msg(
        &self,
        req: &DelegationRequest,
        bundle: &DelegationBundle,
        previous_staking_tx_hash: &str,
        funding_tx: &Transaction,
    ) -> MsgBtcStakeExpand {
        MsgBtcStakeExpand {
            staker_addr: req.staker_addr.clone(),
            pop: Some(bundle.pop.clone()),
            btc_pk: req.staking_params.staker_key.serialize().to_vec(),
            fp_btc_pk_list: req
                .staking_params
                .fp_keys
                .iter()
                .map(|k| k.serialize().to_vec())
                .collect(),
            staking_time: req.staking_params.staking_time as u32,
            staking_value: req.amount as i64,
            staking_tx: encode::serialize(&bundle.staking_tx),
            slashing_tx: encode::serialize(&bundle.slashing_tx),
            delegator_slashing_sig: bundle.slashing_sig.as_ref().to_vec(),
            unbonding_time: req.staking_params.unbonding_time as u32,
            unbonding_tx: encode::serialize(&bundle.unbonding_tx),
            unbonding_value: bundle.unbonding_tx.output[0].value as i64,
            unbonding_slashing_tx: encode::serialize(&bundle.unbonding_slashing_tx),
            delegator_unbonding_slashing_sig: bundle.unbonding_slashing_sig.as_ref().to_vec(),
            previous_staking_tx_hash: previous_staking_tx_hash.to_string(),
            funding_tx: encode::serialize(funding_tx),
        }
    }

    /// Broadcasts the signed staking transaction. This is the final step
    /// of the flow, gated on a fully assembled bundle.
    pub async fn broadcast(&self, bundle: &DelegationBundle) -> Result<Txid> {
        let tx_hex = hex::encode(encode::serialize(&bundle.staking_tx_signed));
        let txid = self.broadcaster.push_tx(&tx_hex).await?;
        log::info!("Broadcast staking tx {}", txid);
        Ok(txid)
    }

    /// The local record for a freshly broadcast delegation. Registry
    /// fields (inception, start/end heights) are filled in once the
    /// chain reports them.
    pub fn delegation_record(
        &self,
        req: &DelegationRequest,
        bundle: &DelegationBundle,
        previous_staking_tx_hash_hex: Option<String>,
    ) -> Delegation {
        Delegation {
            staking_tx_hash_hex: bundle.staking_tx.txid().to_string(),
            staking_tx_hex: hex::encode(encode::serialize(&bundle.staking_tx)),
            staking_amount_sat: req.amount,
            params_version: self.chain.version,
            staker_btc_pk_hex: hex::encode(req.staking_params.staker_key.serialize()),
            finality_provider_btc_pks_hex: req
                .staking_params
                .fp_keys
                .iter()
                .map(|k| hex::encode(k.serialize()))
                .collect(),
            staking_timelock: req.staking_params.staking_time,
            unbonding_timelock: req.staking_params.unbonding_time,
            bbn_inception_height: 0,
            bbn_inception_time: 0,
            start_height: 0,
            end_height: 0,
            previous_staking_tx_hash_hex,
            state: DelegationState::IntermediatePendingVerification,
        }
    }
}

fn inclusion_proof((block_hash, proof): (BlockHash, MerkleProof)) -> InclusionProof {
    use bitcoin::hashes::Hash;

    InclusionProof {
        key: Some(TransactionKey {
            index: proof.index,
            hash: block_hash.into_inner().to_vec(),
        }),
        proof: proof.nodes,
    }
}
