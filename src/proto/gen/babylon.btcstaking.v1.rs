// @generated
/// ProofOfPossessionBTC is the proof of possession that a Babylon
/// address and a Bitcoin secp256k1 secret key are held by the same
/// person
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProofOfPossessionBtc {
    /// btc_sig_type indicates the type of btc_sig in the pop
    #[prost(enumeration="BtcSigType", tag="1")]
    pub btc_sig_type: i32,
    /// btc_sig is the signature generated via sign(sk_btc, babylon_staker_address)
    /// the signature follows encoding in either BIP-340 spec or BIP-322 spec
    #[prost(bytes="vec", tag="2")]
    pub btc_sig: ::prost::alloc::vec::Vec<u8>,
}
/// TransactionKey is the position of a transaction on the Bitcoin
/// blockchain: its index within a block, and the hash of that block
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransactionKey {
    #[prost(uint32, tag="1")]
    pub index: u32,
    #[prost(bytes="vec", tag="2")]
    pub hash: ::prost::alloc::vec::Vec<u8>,
}
/// InclusionProof proves the inclusion of a transaction on the Bitcoin
/// blockchain
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InclusionProof {
    /// key is the position (txIdx, blockHash) of this tx on BTC blockchain
    #[prost(message, optional, tag="1")]
    pub key: ::core::option::Option<TransactionKey>,
    /// proof is the Merkle proof that this tx is included in the position in `key`
    /// List of concatenated intermediate merkle tree nodes, without root node and
    /// leaf node against which we calculate the proof. Each node has 32 byte
    /// length.
    #[prost(bytes="vec", tag="2")]
    pub proof: ::prost::alloc::vec::Vec<u8>,
}
/// MsgCreateBTCDelegation is the message for creating a BTC delegation
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgCreateBtcDelegation {
    /// staker_addr is the address to receive rewards from BTC delegation
    #[prost(string, tag="1")]
    pub staker_addr: ::prost::alloc::string::String,
    /// pop is the proof of possession of btc_pk by the staker_addr
    #[prost(message, optional, tag="2")]
    pub pop: ::core::option::Option<ProofOfPossessionBtc>,
    /// btc_pk is the Bitcoin secp256k1 PK of the BTC delegator
    #[prost(bytes="vec", tag="3")]
    pub btc_pk: ::prost::alloc::vec::Vec<u8>,
    /// fp_btc_pk_list is the list of Bitcoin secp256k1 PKs of the finality providers, if there is more than one
    /// finality provider pk it means that delegation is re-staked
    #[prost(bytes="vec", repeated, tag="4")]
    pub fp_btc_pk_list: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
    /// staking_time is the time lock used in staking transaction
    #[prost(uint32, tag="5")]
    pub staking_time: u32,
    /// staking_value is the amount of satoshis locked in staking output
    #[prost(int64, tag="6")]
    pub staking_value: i64,
    /// staking_tx is a bitcoin staking transaction i.e transaction that locks funds
    #[prost(bytes="vec", tag="7")]
    pub staking_tx: ::prost::alloc::vec::Vec<u8>,
    /// staking_tx_inclusion_proof is the inclusion proof of the staking tx in BTC chain
    #[prost(message, optional, tag="8")]
    pub staking_tx_inclusion_proof: ::core::option::Option<InclusionProof>,
    /// slashing_tx is the slashing tx
    /// Note that the tx itself does not contain signatures, which are off-chain.
    #[prost(bytes="vec", tag="9")]
    pub slashing_tx: ::prost::alloc::vec::Vec<u8>,
    /// delegator_slashing_sig is the signature on the slashing tx by the delegator (i.e., SK corresponding to btc_pk).
    /// It will be a part of the witness for the staking tx output.
    /// The staking tx output further needs signatures from covenant and finality provider in
    /// order to be spendable.
    #[prost(bytes="vec", tag="10")]
    pub delegator_slashing_sig: ::prost::alloc::vec::Vec<u8>,
    /// unbonding_time is the time lock used when funds are being unbonded. It is be used in:
    /// - unbonding transaction, time lock spending path
    /// - staking slashing transaction, change output
    /// - unbonding slashing transaction, change output
    /// It must be smaller than math.MaxUInt16 and larger that max(MinUnbondingTime, CheckpointFinalizationTimeout)
    #[prost(uint32, tag="11")]
    pub unbonding_time: u32,
    /// fields related to unbonding transaction
    /// unbonding_tx is a bitcoin unbonding transaction i.e transaction that spends
    /// staking output and sends it to the unbonding output
    #[prost(bytes="vec", tag="12")]
    pub unbonding_tx: ::prost::alloc::vec::Vec<u8>,
    /// unbonding_value is amount of satoshis locked in unbonding output.
    /// NOTE: staking_value and unbonding_value could be different because of the difference between the fee for staking tx and that for unbonding
    #[prost(int64, tag="13")]
    pub unbonding_value: i64,
    /// unbonding_slashing_tx is the slashing tx which slash unbonding contract
    /// Note that the tx itself does not contain signatures, which are off-chain.
    #[prost(bytes="vec", tag="14")]
    pub unbonding_slashing_tx: ::prost::alloc::vec::Vec<u8>,
    /// delegator_unbonding_slashing_sig is the signature on the slashing tx by the delegator (i.e., SK corresponding to btc_pk).
    #[prost(bytes="vec", tag="15")]
    pub delegator_unbonding_slashing_sig: ::prost::alloc::vec::Vec<u8>,
}
/// MsgBtcStakeExpand is the message for expanding an existing BTC
/// delegation into a new one with a larger value or a different
/// finality provider set, atomically spending the previous staking
/// output
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgBtcStakeExpand {
    /// staker_addr is the address to receive rewards from BTC delegation
    #[prost(string, tag="1")]
    pub staker_addr: ::prost::alloc::string::String,
    /// pop is the proof of possession of btc_pk by the staker_addr
    #[prost(message, optional, tag="2")]
    pub pop: ::core::option::Option<ProofOfPossessionBtc>,
    /// btc_pk is the Bitcoin secp256k1 PK of the BTC delegator
    #[prost(bytes="vec", tag="3")]
    pub btc_pk: ::prost::alloc::vec::Vec<u8>,
    /// fp_btc_pk_list is the list of Bitcoin secp256k1 PKs of the finality providers
    #[prost(bytes="vec", repeated, tag="4")]
    pub fp_btc_pk_list: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
    /// staking_time is the time lock used in staking transaction
    #[prost(uint32, tag="5")]
    pub staking_time: u32,
    /// staking_value is the amount of satoshis locked in staking output
    #[prost(int64, tag="6")]
    pub staking_value: i64,
    /// staking_tx is the new bitcoin staking transaction
    #[prost(bytes="vec", tag="7")]
    pub staking_tx: ::prost::alloc::vec::Vec<u8>,
    /// slashing_tx is the slashing tx for the new staking output
    #[prost(bytes="vec", tag="8")]
    pub slashing_tx: ::prost::alloc::vec::Vec<u8>,
    /// delegator_slashing_sig is the signature on the slashing tx by the delegator
    #[prost(bytes="vec", tag="9")]
    pub delegator_slashing_sig: ::prost::alloc::vec::Vec<u8>,
    /// unbonding_time is the time lock used when funds are being unbonded
    #[prost(uint32, tag="10")]
    pub unbonding_time: u32,
    /// unbonding_tx is the transaction that spends the new staking output into
    /// the unbonding output
    #[prost(bytes="vec", tag="11")]
    pub unbonding_tx: ::prost::alloc::vec::Vec<u8>,
    /// unbonding_value is amount of satoshis locked in unbonding output
    #[prost(int64, tag="12")]
    pub unbonding_value: i64,
    /// unbonding_slashing_tx is the slashing tx which slash unbonding contract
    #[prost(bytes="vec", tag="13")]
    pub unbonding_slashing_tx: ::prost::alloc::vec::Vec<u8>,
    /// delegator_unbonding_slashing_sig is the signature on the unbonding slashing tx by the delegator
    #[prost(bytes="vec", tag="14")]
    pub delegator_unbonding_slashing_sig: ::prost::alloc::vec::Vec<u8>,
    /// previous_staking_tx_hash is the hash of the staking tx of the
    /// delegation being expanded
    #[prost(string, tag="15")]
    pub previous_staking_tx_hash: ::prost::alloc::string::String,
    /// funding_tx is the transaction that funds the value difference
    /// between the previous and the new staking output
    #[prost(bytes="vec", tag="16")]
    pub funding_tx: ::prost::alloc::vec::Vec<u8>,
}
/// BTCSigType indicates the type of btc_sig in a pop
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum BtcSigType {
    /// BIP340 means the btc_sig will follow the BIP-340 encoding
    Bip340 = 0,
    /// BIP322 means the btc_sig will follow the BIP-322 encoding
    Bip322 = 1,
    /// ECDSA means the btc_sig will follow the ECDSA encoding
    /// ref: <https://github.com/okx/js-wallet-sdk/blob/main/packages/coin-bitcoin/src/message.ts#L105>
    Ecdsa = 2,
}
impl BtcSigType {
    /// String value of the enum field names used in the ProtoBuf definition.
    ///
    /// The values are not transformed in any way and thus are considered stable
    /// (if the ProtoBuf definition does not change) and safe for programmatic use.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            BtcSigType::Bip340 => "BIP340",
            BtcSigType::Bip322 => "BIP322",
            BtcSigType::Ecdsa => "ECDSA",
        }
    }
}
// @@protoc_insertion_point(module)
