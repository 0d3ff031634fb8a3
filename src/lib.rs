//! Self-custodial Bitcoin staking engine.
//!
//! Compiles a staking contract into Taproot script trees, assembles the
//! interdependent staking / unbonding / slashing transactions, recovers
//! staker signatures from wallet-signed PSBTs, and tracks delegations
//! through their lifecycle on both Bitcoin and the consensus chain's
//! registry. Wallets, indexers and the chain are injected via the
//! traits in [`delegation::flow`].

pub mod delegation;
pub mod error;
pub mod params;
pub mod pop;
pub mod proof;
pub mod proto;
pub mod script;
pub mod taproot;
pub mod tx;
pub mod witness;

pub use delegation::{Delegation, DelegationEvent, DelegationState, Transition};
pub use error::{Error, Result};
pub use params::{ChainParams, StakingParams};
pub use script::{build_scripts, ScriptSet};
pub use tx::{FeeEstimates, Utxo};
