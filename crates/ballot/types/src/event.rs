//! Facts emitted on every state change

use crate::{ProposalId, VoterAddress, WorkflowStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An immutable record of one committed state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BallotEvent {
    WorkflowStatusChange {
        previous: WorkflowStatus,
        next: WorkflowStatus,
    },
    VoterRegistered {
        voter_address: VoterAddress,
    },
    ProposalRegistered {
        proposal_id: ProposalId,
    },
    Voted {
        voter_address: VoterAddress,
        proposal_id: ProposalId,
    },
}

impl BallotEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            BallotEvent::WorkflowStatusChange { .. } => EventKind::WorkflowStatusChange,
            BallotEvent::VoterRegistered { .. } => EventKind::VoterRegistered,
            BallotEvent::ProposalRegistered { .. } => EventKind::ProposalRegistered,
            BallotEvent::Voted { .. } => EventKind::Voted,
        }
    }
}

/// Discriminant of a [`BallotEvent`], used for counters and filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    WorkflowStatusChange,
    VoterRegistered,
    ProposalRegistered,
    Voted,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A fact together with its position in the emission order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// 1-based, strictly increasing within a session
    pub sequence: u64,
    pub event: BallotEvent,
    pub emitted_at: DateTime<Utc>,
}
