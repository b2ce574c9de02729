//! Workflow state machine: the session phase and its legal transitions
//!
//! Phases advance one step at a time and never move backward. Each
//! transition is valid from exactly one phase, so a transition that has
//! already happened can never be applied again.

use ballot_types::{BallotError, BallotResult, ProposalId, WorkflowStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Administrator-driven phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowTransition {
    StartProposalsRegistering,
    EndProposalsRegistering,
    StartVotingSession,
    EndVotingSession,
    TallyVotes,
}

impl WorkflowTransition {
    pub const ALL: [WorkflowTransition; 5] = [
        WorkflowTransition::StartProposalsRegistering,
        WorkflowTransition::EndProposalsRegistering,
        WorkflowTransition::StartVotingSession,
        WorkflowTransition::EndVotingSession,
        WorkflowTransition::TallyVotes,
    ];

    /// The only phase this transition may start from
    pub fn source(self) -> WorkflowStatus {
        match self {
            WorkflowTransition::StartProposalsRegistering => WorkflowStatus::RegisteringVoters,
            WorkflowTransition::EndProposalsRegistering => {
                WorkflowStatus::ProposalsRegistrationStarted
            }
            WorkflowTransition::StartVotingSession => WorkflowStatus::ProposalsRegistrationEnded,
            WorkflowTransition::EndVotingSession => WorkflowStatus::VotingSessionStarted,
            WorkflowTransition::TallyVotes => WorkflowStatus::VotingSessionEnded,
        }
    }

    pub fn target(self) -> WorkflowStatus {
        match self {
            WorkflowTransition::StartProposalsRegistering => {
                WorkflowStatus::ProposalsRegistrationStarted
            }
            WorkflowTransition::EndProposalsRegistering => {
                WorkflowStatus::ProposalsRegistrationEnded
            }
            WorkflowTransition::StartVotingSession => WorkflowStatus::VotingSessionStarted,
            WorkflowTransition::EndVotingSession => WorkflowStatus::VotingSessionEnded,
            WorkflowTransition::TallyVotes => WorkflowStatus::VotesTallied,
        }
    }

    /// Reason reported when the session is not in [`source`](Self::source)
    pub fn rejection_reason(self) -> &'static str {
        match self {
            WorkflowTransition::StartProposalsRegistering => {
                "Registering proposals cant be started now"
            }
            WorkflowTransition::EndProposalsRegistering => {
                "Registering proposals havent started yet"
            }
            WorkflowTransition::StartVotingSession => "Registering proposals phase is not finished",
            WorkflowTransition::EndVotingSession => "Voting session havent started yet",
            WorkflowTransition::TallyVotes => "Current status is not voting session ended",
        }
    }

    /// Transition leaving `status`, if any
    pub fn from_source(status: WorkflowStatus) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.source() == status)
    }
}

impl fmt::Display for WorkflowTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowTransition::StartProposalsRegistering => "start_proposals_registering",
            WorkflowTransition::EndProposalsRegistering => "end_proposals_registering",
            WorkflowTransition::StartVotingSession => "start_voting_session",
            WorkflowTransition::EndVotingSession => "end_voting_session",
            WorkflowTransition::TallyVotes => "tally_votes",
        };
        f.write_str(name)
    }
}

/// Registry operations that are only open during one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseGate {
    VoterRegistration,
    ProposalSubmission,
    Voting,
}

impl PhaseGate {
    pub fn required(self) -> WorkflowStatus {
        match self {
            PhaseGate::VoterRegistration => WorkflowStatus::RegisteringVoters,
            PhaseGate::ProposalSubmission => WorkflowStatus::ProposalsRegistrationStarted,
            PhaseGate::Voting => WorkflowStatus::VotingSessionStarted,
        }
    }

    pub fn rejection_reason(self) -> &'static str {
        match self {
            PhaseGate::VoterRegistration => "Voters registration is not open yet",
            PhaseGate::ProposalSubmission => "Proposals are not allowed yet",
            PhaseGate::Voting => "Voting session havent started yet",
        }
    }
}

/// Owner of the session phase and the tally result
#[derive(Clone, Debug, Default)]
pub struct StateMachine {
    status: WorkflowStatus,
    winning_proposal_id: Option<ProposalId>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume at a persisted phase
    pub(crate) fn resume(status: WorkflowStatus, winning_proposal_id: Option<ProposalId>) -> Self {
        Self {
            status,
            winning_proposal_id,
        }
    }

    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    pub fn winning_proposal_id(&self) -> Option<ProposalId> {
        self.winning_proposal_id
    }

    pub fn is_tallied(&self) -> bool {
        self.status == WorkflowStatus::VotesTallied
    }

    /// Check that `transition` may fire from the current phase
    pub fn ensure_transition(&self, transition: WorkflowTransition) -> BallotResult<()> {
        if self.status == transition.source() {
            Ok(())
        } else {
            Err(BallotError::InvalidTransition(
                transition.rejection_reason().to_string(),
            ))
        }
    }

    /// Check that `gate` is open in the current phase
    pub fn ensure_open(&self, gate: PhaseGate) -> BallotResult<()> {
        if self.status == gate.required() {
            Ok(())
        } else {
            Err(BallotError::PhaseViolation(gate.rejection_reason().to_string()))
        }
    }

    /// Fire `transition`, returning `(previous, next)`.
    ///
    /// Tallying goes through [`complete_tally`](Self::complete_tally)
    /// so the result is recorded in the same step.
    pub fn advance(
        &mut self,
        transition: WorkflowTransition,
    ) -> BallotResult<(WorkflowStatus, WorkflowStatus)> {
        if transition == WorkflowTransition::TallyVotes {
            return Err(BallotError::InvalidTransition(
                "Tallying must record a result".to_string(),
            ));
        }
        self.step(transition)
    }

    /// Record the tally result and enter the terminal phase
    pub fn complete_tally(
        &mut self,
        winning_proposal_id: Option<ProposalId>,
    ) -> BallotResult<(WorkflowStatus, WorkflowStatus)> {
        let change = self.step(WorkflowTransition::TallyVotes)?;
        self.winning_proposal_id = winning_proposal_id;
        Ok(change)
    }

    fn step(
        &mut self,
        transition: WorkflowTransition,
    ) -> BallotResult<(WorkflowStatus, WorkflowStatus)> {
        self.ensure_transition(transition)?;
        let previous = self.status;
        self.status = transition.target();
        Ok((previous, self.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_chain() {
        for pair in WorkflowStatus::ALL.windows(2) {
            let transition = WorkflowTransition::from_source(pair[0]).unwrap();
            assert_eq!(transition.target(), pair[1]);
        }
        assert_eq!(
            WorkflowTransition::from_source(WorkflowStatus::VotesTallied),
            None
        );
    }

    #[test]
    fn test_full_lifecycle() {
        let mut machine = StateMachine::new();
        for transition in &WorkflowTransition::ALL[..4] {
            let (previous, next) = machine.advance(*transition).unwrap();
            assert_eq!(previous.next(), Some(next));
        }
        let (previous, next) = machine.complete_tally(Some(ProposalId::new(1))).unwrap();
        assert_eq!(previous, WorkflowStatus::VotingSessionEnded);
        assert_eq!(next, WorkflowStatus::VotesTallied);
        assert!(machine.is_tallied());
        assert_eq!(machine.winning_proposal_id(), Some(ProposalId::new(1)));
    }

    #[test]
    fn test_skipping_rejected() {
        let mut machine = StateMachine::new();
        let err = machine
            .advance(WorkflowTransition::StartVotingSession)
            .unwrap_err();
        assert_eq!(
            err,
            BallotError::InvalidTransition("Registering proposals phase is not finished".into())
        );
        assert_eq!(machine.status(), WorkflowStatus::RegisteringVoters);
    }

    #[test]
    fn test_transition_not_reapplied() {
        let mut machine = StateMachine::new();
        machine
            .advance(WorkflowTransition::StartProposalsRegistering)
            .unwrap();
        let err = machine
            .advance(WorkflowTransition::StartProposalsRegistering)
            .unwrap_err();
        assert_eq!(err.to_string(), "Registering proposals cant be started now");
        assert_eq!(machine.status(), WorkflowStatus::ProposalsRegistrationStarted);
    }

    #[test]
    fn test_tally_requires_result_path() {
        let mut machine = StateMachine::resume(WorkflowStatus::VotingSessionEnded, None);
        assert!(machine.advance(WorkflowTransition::TallyVotes).is_err());
        assert_eq!(machine.status(), WorkflowStatus::VotingSessionEnded);
    }

    #[test]
    fn test_gates() {
        let machine = StateMachine::new();
        assert!(machine.ensure_open(PhaseGate::VoterRegistration).is_ok());
        assert_eq!(
            machine.ensure_open(PhaseGate::ProposalSubmission),
            Err(BallotError::PhaseViolation("Proposals are not allowed yet".into()))
        );
        assert_eq!(
            machine.ensure_open(PhaseGate::Voting).unwrap_err().to_string(),
            "Voting session havent started yet"
        );
    }
}
