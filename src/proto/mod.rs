//! Protobuf messages accepted by the consensus chain's delegation
//! registry. The generated modules are committed; field layout follows
//! the chain's published protos.

#![allow(clippy::all)]

mod btcstaking {
    include!("gen/babylon.btcstaking.v1.rs");
}

pub use btcstaking::{
    BtcSigType, InclusionProof, MsgBtcStakeExpand, MsgCreateBtcDelegation, ProofOfPossessionBtc,
    TransactionKey,
};

impl MsgCreateBtcDelegation {
    pub const TYPE_URL: &'static str = "/babylon.btcstaking.v1.MsgCreateBTCDelegation";
}

impl MsgBtcStakeExpand {
    pub const TYPE_URL: &'static str = "/babylon.btcstaking.v1.MsgBtcStakeExpand";
}
