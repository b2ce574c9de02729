//! Persisted shape of a voting session

use crate::{EventEnvelope, Proposal, ProposalId, Voter, VoterAddress, WorkflowStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything needed to resume a session in another process.
///
/// Only registered voters are stored; any other address reads as the
/// default [`Voter`]. The fact log travels with the state so a resumed
/// session keeps numbering facts where the previous process stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: WorkflowStatus,
    pub administrator: VoterAddress,
    pub voters: BTreeMap<VoterAddress, Voter>,
    /// Admission order of `voters`; when empty, address order is assumed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub registration_order: Vec<VoterAddress>,
    pub proposals: Vec<Proposal>,
    #[serde(default)]
    pub winning_proposal_id: Option<ProposalId>,
    /// Every fact emitted so far, in sequence order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventEnvelope>,
}

impl SessionSnapshot {
    /// Snapshot of a session that has just been created by `administrator`
    pub fn genesis(administrator: VoterAddress) -> Self {
        Self {
            phase: WorkflowStatus::RegisteringVoters,
            administrator,
            voters: BTreeMap::new(),
            registration_order: Vec::new(),
            proposals: Vec::new(),
            winning_proposal_id: None,
            events: Vec::new(),
        }
    }

    /// Sequence number of the latest fact, 0 before the first one
    pub fn last_sequence(&self) -> u64 {
        self.events.last().map_or(0, |envelope| envelope.sequence)
    }

    /// Total number of ballots cast
    pub fn ballots_cast(&self) -> usize {
        self.voters.values().filter(|v| v.has_voted).count()
    }
}
