//! Workflow phases of a voting session

use serde::{Deserialize, Serialize};
use std::fmt;

/// The six phases of a session, in the only order they may be entered.
///
/// Derived `Ord` follows declaration order, so `a < b` means `a` comes
/// earlier in the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WorkflowStatus {
    RegisteringVoters,
    ProposalsRegistrationStarted,
    ProposalsRegistrationEnded,
    VotingSessionStarted,
    VotingSessionEnded,
    VotesTallied,
}

impl WorkflowStatus {
    /// Every phase in lifecycle order
    pub const ALL: [WorkflowStatus; 6] = [
        WorkflowStatus::RegisteringVoters,
        WorkflowStatus::ProposalsRegistrationStarted,
        WorkflowStatus::ProposalsRegistrationEnded,
        WorkflowStatus::VotingSessionStarted,
        WorkflowStatus::VotingSessionEnded,
        WorkflowStatus::VotesTallied,
    ];

    /// Numeric position of the phase (0 for `RegisteringVoters`)
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// The phase that follows this one, `None` for the terminal phase
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn is_terminal(self) -> bool {
        self == WorkflowStatus::VotesTallied
    }
}

impl Default for WorkflowStatus {
    fn default() -> Self {
        WorkflowStatus::RegisteringVoters
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStatus::RegisteringVoters => "RegisteringVoters",
            WorkflowStatus::ProposalsRegistrationStarted => "ProposalsRegistrationStarted",
            WorkflowStatus::ProposalsRegistrationEnded => "ProposalsRegistrationEnded",
            WorkflowStatus::VotingSessionStarted => "VotingSessionStarted",
            WorkflowStatus::VotingSessionEnded => "VotingSessionEnded",
            WorkflowStatus::VotesTallied => "VotesTallied",
        };
        f.write_str(name)
    }
}
