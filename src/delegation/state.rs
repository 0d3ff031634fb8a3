//! The delegation lifecycle state machine.
//!
//! States mirror the registry's view of a delegation plus the local
//! "intermediate" shadows entered the moment a transaction is broadcast
//! and held until the indexer or registry confirms it. Transitions are
//! an exhaustive match over a closed enum: adding a state without
//! defining its transitions and label is a compile error.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Which withdrawable branch a withdrawal was broadcast from. Carried in
/// the intermediate state so confirmation and reorg rollback land in the
/// right branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WithdrawableKind {
    Timelock,
    EarlyUnbonding,
    TimelockSlashing,
    EarlyUnbondingSlashing,
}

impl WithdrawableKind {
    fn withdrawable(self) -> DelegationState {
        match self {
            WithdrawableKind::Timelock => DelegationState::TimelockWithdrawable,
            WithdrawableKind::EarlyUnbonding => DelegationState::EarlyUnbondingWithdrawable,
            WithdrawableKind::TimelockSlashing => DelegationState::TimelockSlashingWithdrawable,
            WithdrawableKind::EarlyUnbondingSlashing => {
                DelegationState::EarlyUnbondingSlashingWithdrawable
            }
        }
    }

    fn withdrawn(self) -> DelegationState {
        match self {
            WithdrawableKind::Timelock => DelegationState::TimelockWithdrawn,
            WithdrawableKind::EarlyUnbonding => DelegationState::EarlyUnbondingWithdrawn,
            WithdrawableKind::TimelockSlashing => DelegationState::TimelockSlashingWithdrawn,
            WithdrawableKind::EarlyUnbondingSlashing => {
                DelegationState::EarlyUnbondingSlashingWithdrawn
            }
        }
    }
}

/// Which output a slashing transaction consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlashedOutput {
    Staking,
    Unbonding,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DelegationState {
    Pending,
    Verified,
    Active,
    TimelockUnbonding,
    EarlyUnbonding,
    TimelockWithdrawable,
    EarlyUnbondingWithdrawable,
    TimelockSlashingWithdrawable,
    EarlyUnbondingSlashingWithdrawable,
    Slashed,
    TimelockWithdrawn,
    EarlyUnbondingWithdrawn,
    TimelockSlashingWithdrawn,
    EarlyUnbondingSlashingWithdrawn,
    Expanded,
    IntermediatePendingVerification,
    IntermediatePendingBtcConfirmation,
    IntermediateUnbondingSubmitted,
    IntermediateWithdrawalSubmitted { origin: WithdrawableKind },
    IntermediateExpansionSubmitted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DelegationEvent {
    /// The registry reports the delegation as pending covenant
    /// signatures.
    RegistryPending,
    /// The covenant quorum has signed; the delegation is verified.
    CovenantVerified,
    /// The staking transaction was broadcast locally.
    StakingBroadcast,
    /// The staking transaction has `depth` confirmations.
    StakingConfirmed { depth: u32 },
    /// The staking timelock has run out.
    StakingTimelockExpired,
    /// The unbonding transaction was broadcast locally.
    UnbondingBroadcast,
    /// The unbonding transaction is confirmed on-chain.
    UnbondingConfirmed,
    /// The unbonding timelock gating withdrawal has passed.
    UnbondingTimelockExpired,
    /// A withdrawal transaction was broadcast locally.
    WithdrawalBroadcast,
    /// A withdrawal transaction is confirmed on-chain.
    WithdrawalConfirmed,
    /// Double-sign evidence against a finality provider was observed.
    /// This event is only ever consumed, never derived locally.
    SlashingEvidence,
    /// The timelock on a slashing change output has passed.
    SlashingTimelockExpired { output: SlashedOutput },
    /// A stake-expansion transaction was broadcast locally.
    ExpansionBroadcast,
    /// The expansion's delegation has become active on the registry.
    ExpansionActivated,
    /// The broadcast transaction backing an intermediate state was
    /// reorged out before confirmation.
    BroadcastReorged,
}

/// Outcome of applying an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Next(DelegationState),
    /// The record was never promoted past its broadcast and the backing
    /// transaction is gone; the local record should be dropped.
    Expire,
}

impl DelegationState {
    /// Terminal states admit no transitions; records in them are kept
    /// for history only.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DelegationState::TimelockWithdrawn
                | DelegationState::EarlyUnbondingWithdrawn
                | DelegationState::TimelockSlashingWithdrawn
                | DelegationState::EarlyUnbondingSlashingWithdrawn
                | DelegationState::Expanded
        )
    }

    pub fn is_intermediate(&self) -> bool {
        matches!(
            self,
            DelegationState::IntermediatePendingVerification
                | DelegationState::IntermediatePendingBtcConfirmation
                | DelegationState::IntermediateUnbondingSubmitted
                | DelegationState::IntermediateWithdrawalSubmitted { .. }
                | DelegationState::IntermediateExpansionSubmitted
        )
    }

    /// Applies `event`, returning the successor state or `Expire`.
    /// `confirmation_depth` is the chain-parameter depth gating
    /// activation.
    pub fn apply(self, event: &DelegationEvent, confirmation_depth: u32) -> Result<Transition> {
        use DelegationEvent as E;
        use DelegationState as S;
        use Transition::{Expire, Next};

        let confirmed = |depth: u32, held: S| {
            if depth >= confirmation_depth {
                Next(S::Active)
            } else {
                Next(held)
            }
        };

        let transition = match (self, event) {
            (S::Pending, E::CovenantVerified) => Next(S::Verified),

            (S::Verified, E::StakingBroadcast) => Next(S::IntermediatePendingBtcConfirmation),
            (S::Verified, E::StakingConfirmed { depth }) => confirmed(*depth, S::Verified),
            (S::Verified, E::SlashingEvidence) => Next(S::Slashed),

            (S::IntermediatePendingVerification, E::RegistryPending) => Next(S::Pending),
            (S::IntermediatePendingVerification, E::CovenantVerified) => Next(S::Verified),
            (S::IntermediatePendingVerification, E::BroadcastReorged) => Expire,

            (S::IntermediatePendingBtcConfirmation, E::StakingConfirmed { depth }) => {
                confirmed(*depth, S::IntermediatePendingBtcConfirmation)
            }
            (S::IntermediatePendingBtcConfirmation, E::BroadcastReorged) => Next(S::Verified),

            (S::Active, E::StakingTimelockExpired) => Next(S::TimelockUnbonding),
            (S::Active, E::UnbondingBroadcast) => Next(S::IntermediateUnbondingSubmitted),
            (S::Active, E::UnbondingConfirmed) => Next(S::EarlyUnbonding),
            (S::Active, E::SlashingEvidence) => Next(S::Slashed),
            (S::Active, E::ExpansionBroadcast) => Next(S::IntermediateExpansionSubmitted),
            (S::Active, E::ExpansionActivated) => Next(S::Expanded),

            (S::IntermediateUnbondingSubmitted, E::UnbondingConfirmed) => Next(S::EarlyUnbonding),
            (S::IntermediateUnbondingSubmitted, E::BroadcastReorged) => Next(S::Active),

            (S::TimelockUnbonding, E::UnbondingTimelockExpired) => Next(S::TimelockWithdrawable),
            (S::TimelockUnbonding, E::SlashingEvidence) => Next(S::Slashed),

            (S::EarlyUnbonding, E::UnbondingTimelockExpired) => {
                Next(S::EarlyUnbondingWithdrawable)
            }
            (S::EarlyUnbonding, E::SlashingEvidence) => Next(S::Slashed),

            (S::Slashed, E::SlashingTimelockExpired { output }) => Next(match output {
                SlashedOutput::Staking => S::TimelockSlashingWithdrawable,
                SlashedOutput::Unbonding => S::EarlyUnbondingSlashingWithdrawable,
            }),

            (S::TimelockWithdrawable, E::WithdrawalBroadcast) => {
                Next(S::IntermediateWithdrawalSubmitted {
                    origin: WithdrawableKind::Timelock,
                })
            }
            (S::TimelockWithdrawable, E::WithdrawalConfirmed) => Next(S::TimelockWithdrawn),
            (S::EarlyUnbondingWithdrawable, E::WithdrawalBroadcast) => {
                Next(S::IntermediateWithdrawalSubmitted {
                    origin: WithdrawableKind::EarlyUnbonding,
                })
            }
            (S::EarlyUnbondingWithdrawable, E::WithdrawalConfirmed) => {
                Next(S::EarlyUnbondingWithdrawn)
            }
            (S::TimelockSlashingWithdrawable, E::WithdrawalBroadcast) => {
                Next(S::IntermediateWithdrawalSubmitted {
                    origin: WithdrawableKind::TimelockSlashing,
                })
            }
            (S::TimelockSlashingWithdrawable, E::WithdrawalConfirmed) => {
                Next(S::TimelockSlashingWithdrawn)
            }
            (S::EarlyUnbondingSlashingWithdrawable, E::WithdrawalBroadcast) => {
                Next(S::IntermediateWithdrawalSubmitted {
                    origin: WithdrawableKind::EarlyUnbondingSlashing,
                })
            }
            (S::EarlyUnbondingSlashingWithdrawable, E::WithdrawalConfirmed) => {
                Next(S::EarlyUnbondingSlashingWithdrawn)
            }

            (S::IntermediateWithdrawalSubmitted { origin }, E::WithdrawalConfirmed) => {
                Next(origin.withdrawn())
            }
            (S::IntermediateWithdrawalSubmitted { origin }, E::BroadcastReorged) => {
                Next(origin.withdrawable())
            }

            (S::IntermediateExpansionSubmitted, E::ExpansionActivated) => Next(S::Expanded),
            (S::IntermediateExpansionSubmitted, E::BroadcastReorged) => Next(S::Active),

            (state, event) => {
                return Err(Error::InvalidTransition {
                    state: state.to_string(),
                    event: format!("{:?}", event),
                })
            }
        };

        Ok(transition)
    }
}

impl fmt::Display for DelegationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DelegationState::Pending => "PENDING",
            DelegationState::Verified => "VERIFIED",
            DelegationState::Active => "ACTIVE",
            DelegationState::TimelockUnbonding => "TIMELOCK_UNBONDING",
            DelegationState::EarlyUnbonding => "EARLY_UNBONDING",
            DelegationState::TimelockWithdrawable => "TIMELOCK_WITHDRAWABLE",
            DelegationState::EarlyUnbondingWithdrawable => "EARLY_UNBONDING_WITHDRAWABLE",
            DelegationState::TimelockSlashingWithdrawable => "TIMELOCK_SLASHING_WITHDRAWABLE",
            DelegationState::EarlyUnbondingSlashingWithdrawable => {
                "EARLY_UNBONDING_SLASHING_WITHDRAWABLE"
            }
            DelegationState::Slashed => "SLASHED",
            DelegationState::TimelockWithdrawn => "TIMELOCK_WITHDRAWN",
            DelegationState::EarlyUnbondingWithdrawn => "EARLY_UNBONDING_WITHDRAWN",
            DelegationState::TimelockSlashingWithdrawn => "TIMELOCK_SLASHING_WITHDRAWN",
            DelegationState::EarlyUnbondingSlashingWithdrawn => {
                "EARLY_UNBONDING_SLASHING_WITHDRAWN"
            }
            DelegationState::Expanded => "EXPANDED",
            DelegationState::IntermediatePendingVerification => "INTERMEDIATE_PENDING_VERIFICATION",
            DelegationState::IntermediatePendingBtcConfirmation => {
                "INTERMEDIATE_PENDING_BTC_CONFIRMATION"
            }
            DelegationState::IntermediateUnbondingSubmitted => "INTERMEDIATE_UNBONDING_SUBMITTED",
            DelegationState::IntermediateWithdrawalSubmitted { .. } => {
                "INTERMEDIATE_WITHDRAWAL_SUBMITTED"
            }
            DelegationState::IntermediateExpansionSubmitted => "INTERMEDIATE_EXPANSION_SUBMITTED",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPTH: u32 = 10;

    fn all_states() -> Vec<DelegationState> {
        use DelegationState as S;
        let mut states = vec![
            S::Pending,
            S::Verified,
            S::Active,
            S::TimelockUnbonding,
            S::EarlyUnbonding,
            S::TimelockWithdrawable,
            S::EarlyUnbondingWithdrawable,
            S::TimelockSlashingWithdrawable,
            S::EarlyUnbondingSlashingWithdrawable,
            S::Slashed,
            S::TimelockWithdrawn,
            S::EarlyUnbondingWithdrawn,
            S::TimelockSlashingWithdrawn,
            S::EarlyUnbondingSlashingWithdrawn,
            S::Expanded,
            S::IntermediatePendingVerification,
            S::IntermediatePendingBtcConfirmation,
            S::IntermediateUnbondingSubmitted,
            S::IntermediateExpansionSubmitted,
        ];
        for origin in [
            WithdrawableKind::Timelock,
            WithdrawableKind::EarlyUnbonding,
            WithdrawableKind::TimelockSlashing,
            WithdrawableKind::EarlyUnbondingSlashing,
        ] {
            states.push(S::IntermediateWithdrawalSubmitted { origin });
        }
        states
    }

    fn all_events() -> Vec<DelegationEvent> {
        use DelegationEvent as E;
        vec![
            E::RegistryPending,
            E::CovenantVerified,
            E::StakingBroadcast,
            E::StakingConfirmed { depth: DEPTH },
            E::StakingConfirmed { depth: 1 },
            E::StakingTimelockExpired,
            E::UnbondingBroadcast,
            E::UnbondingConfirmed,
            E::UnbondingTimelockExpired,
            E::WithdrawalBroadcast,
            E::WithdrawalConfirmed,
            E::SlashingEvidence,
            E::SlashingTimelockExpired {
                output: SlashedOutput::Staking,
            },
            E::SlashingTimelockExpired {
                output: SlashedOutput::Unbonding,
            },
            E::ExpansionBroadcast,
            E::ExpansionActivated,
            E::BroadcastReorged,
        ]
    }

    #[test]
    fn no_transition_leaves_a_terminal_state() {
        for state in all_states().into_iter().filter(|s| s.is_terminal()) {
            for event in all_events() {
                assert!(
                    state.apply(&event, DEPTH).is_err(),
                    "{} must not leave terminal on {:?}",
                    state,
                    event
                );
            }
        }
    }

    #[test]
    fn every_non_terminal_state_has_an_exit() {
        for state in all_states().into_iter().filter(|s| !s.is_terminal()) {
            let has_exit = all_events().iter().any(|event| {
                matches!(
                    state.apply(event, DEPTH),
                    Ok(Transition::Next(next)) if next != state
                ) || matches!(state.apply(event, DEPTH), Ok(Transition::Expire))
            });
            assert!(has_exit, "{} has no outgoing transition", state);
        }
    }

    #[test]
    fn slashed_is_only_reachable_via_evidence() {
        for state in all_states() {
            for event in all_events() {
                if let Ok(Transition::Next(DelegationState::Slashed)) = state.apply(&event, DEPTH)
                {
                    assert_eq!(
                        event,
                        DelegationEvent::SlashingEvidence,
                        "{} entered SLASHED on {:?}",
                        state,
                        event
                    );
                }
            }
        }
    }

    #[test]
    fn activation_requires_confirmation_depth() {
        let verified = DelegationState::Verified;
        assert_eq!(
            verified
                .apply(&DelegationEvent::StakingConfirmed { depth: DEPTH - 1 }, DEPTH)
                .unwrap(),
            Transition::Next(DelegationState::Verified)
        );
        assert_eq!(
            verified
                .apply(&DelegationEvent::StakingConfirmed { depth: DEPTH }, DEPTH)
                .unwrap(),
            Transition::Next(DelegationState::Active)
        );
    }

    #[test]
    fn happy_path_walk() {
        use DelegationEvent as E;
        use DelegationState as S;

        let steps = [
            (E::CovenantVerified, S::Verified),
            (E::StakingBroadcast, S::IntermediatePendingBtcConfirmation),
            (E::StakingConfirmed { depth: DEPTH }, S::Active),
            (E::StakingTimelockExpired, S::TimelockUnbonding),
            (E::UnbondingTimelockExpired, S::TimelockWithdrawable),
            (E::WithdrawalConfirmed, S::TimelockWithdrawn),
        ];

        let mut state = S::Pending;
        for (event, expected) in steps {
            state = match state.apply(&event, DEPTH).unwrap() {
                Transition::Next(next) => next,
                Transition::Expire => panic!("unexpected expiry"),
            };
            assert_eq!(state, expected);
        }
        assert!(state.is_terminal());
    }

    #[test]
    fn withdrawal_branch_is_tracked_through_broadcast() {
        use DelegationEvent as E;
        use DelegationState as S;

        let state = S::EarlyUnbondingSlashingWithdrawable;
        let submitted = match state.apply(&E::WithdrawalBroadcast, DEPTH).unwrap() {
            Transition::Next(s) => s,
            Transition::Expire => panic!(),
        };
        assert_eq!(
            submitted.apply(&E::WithdrawalConfirmed, DEPTH).unwrap(),
            Transition::Next(S::EarlyUnbondingSlashingWithdrawn)
        );
        assert_eq!(
            submitted.apply(&E::BroadcastReorged, DEPTH).unwrap(),
            Transition::Next(S::EarlyUnbondingSlashingWithdrawable)
        );
    }

    #[test]
    fn unregistered_broadcast_expires_on_reorg() {
        assert_eq!(
            DelegationState::IntermediatePendingVerification
                .apply(&DelegationEvent::BroadcastReorged, DEPTH)
                .unwrap(),
            Transition::Expire
        );
        // A verified-then-broadcast record rolls back instead.
        assert_eq!(
            DelegationState::IntermediatePendingBtcConfirmation
                .apply(&DelegationEvent::BroadcastReorged, DEPTH)
                .unwrap(),
            Transition::Next(DelegationState::Verified)
        );
    }
}
