//! Fact replay: rebuild the observable session state from its facts
//!
//! Facts carry no proposal descriptions, so the projection tracks what
//! they do describe: the phase, who was admitted, who voted for what, the
//! per-proposal counts and the winner implied by those counts.

use crate::state_machine::{PhaseGate, WorkflowTransition};
use crate::tally_engine::TallyEngine;
use ballot_types::{
    BallotError, BallotEvent, BallotResult, EventEnvelope, ProposalId, SessionSnapshot,
    VoterAddress, WorkflowStatus,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Session state as seen by an observer of the fact stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProjection {
    pub phase: WorkflowStatus,
    /// Admitted voters in admission order
    pub voters: Vec<VoterAddress>,
    /// Ballot of each voter who voted
    pub ballots: BTreeMap<VoterAddress, ProposalId>,
    /// Vote count per proposal, indexed by id
    pub vote_counts: Vec<u64>,
    pub winning_proposal_id: Option<ProposalId>,
}

impl SessionProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay facts in order, rejecting gaps and facts that could not have
    /// been emitted by a live session
    pub fn replay<'a>(facts: impl IntoIterator<Item = &'a EventEnvelope>) -> BallotResult<Self> {
        let mut projection = Self::new();
        let mut expected = 1u64;
        for envelope in facts {
            if envelope.sequence != expected {
                return Err(BallotError::Restore(format!(
                    "expected fact {} but found {}",
                    expected, envelope.sequence
                )));
            }
            projection.apply(&envelope.event)?;
            expected += 1;
        }
        Ok(projection)
    }

    /// Apply a single fact
    pub fn apply(&mut self, event: &BallotEvent) -> BallotResult<()> {
        match event {
            BallotEvent::WorkflowStatusChange { previous, next } => {
                let legal = WorkflowTransition::from_source(self.phase)
                    .map(|t| t.source() == *previous && t.target() == *next)
                    .unwrap_or(false);
                if !legal {
                    return Err(illegal(event, self.phase));
                }
                self.phase = *next;
                if self.phase == WorkflowStatus::VotesTallied {
                    self.winning_proposal_id = TallyEngine::leader(self.counts());
                }
            }
            BallotEvent::VoterRegistered { voter_address } => {
                if !self.open(PhaseGate::VoterRegistration) || self.voters.contains(voter_address) {
                    return Err(illegal(event, self.phase));
                }
                self.voters.push(voter_address.clone());
            }
            BallotEvent::ProposalRegistered { proposal_id } => {
                let next_id = ProposalId::new(self.vote_counts.len() as u64);
                if !self.open(PhaseGate::ProposalSubmission) || *proposal_id != next_id {
                    return Err(illegal(event, self.phase));
                }
                self.vote_counts.push(0);
            }
            BallotEvent::Voted {
                voter_address,
                proposal_id,
            } => {
                let slot = proposal_id.as_usize().filter(|&i| i < self.vote_counts.len());
                let eligible = self.open(PhaseGate::Voting)
                    && self.voters.contains(voter_address)
                    && !self.ballots.contains_key(voter_address);
                match slot {
                    Some(index) if eligible => {
                        self.vote_counts[index] += 1;
                        self.ballots.insert(voter_address.clone(), *proposal_id);
                    }
                    _ => return Err(illegal(event, self.phase)),
                }
            }
        }
        Ok(())
    }

    /// Projection of a snapshot, for comparison with a replayed stream
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        let voters = if snapshot.registration_order.is_empty() {
            snapshot.voters.keys().cloned().collect()
        } else {
            snapshot.registration_order.clone()
        };
        let ballots = snapshot
            .voters
            .iter()
            .filter_map(|(address, voter)| voter.voted_proposal_id.map(|id| (address.clone(), id)))
            .collect();

        Self {
            phase: snapshot.phase,
            voters,
            ballots,
            vote_counts: snapshot.proposals.iter().map(|p| p.vote_count).collect(),
            winning_proposal_id: snapshot.winning_proposal_id,
        }
    }

    fn open(&self, gate: PhaseGate) -> bool {
        self.phase == gate.required()
    }

    fn counts(&self) -> impl Iterator<Item = (ProposalId, u64)> + '_ {
        self.vote_counts
            .iter()
            .enumerate()
            .map(|(index, &count)| (ProposalId::new(index as u64), count))
    }
}

fn illegal(event: &BallotEvent, phase: WorkflowStatus) -> BallotError {
    BallotError::Restore(format!("fact {:?} cannot occur in phase {}", event.kind(), phase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn envelope(sequence: u64, event: BallotEvent) -> EventEnvelope {
        EventEnvelope {
            sequence,
            event,
            emitted_at: Utc::now(),
        }
    }

    fn change(previous: WorkflowStatus, next: WorkflowStatus) -> BallotEvent {
        BallotEvent::WorkflowStatusChange { previous, next }
    }

    #[test]
    fn test_replay_registration() {
        let facts = vec![
            envelope(
                1,
                BallotEvent::VoterRegistered {
                    voter_address: VoterAddress::new("a"),
                },
            ),
            envelope(
                2,
                change(
                    WorkflowStatus::RegisteringVoters,
                    WorkflowStatus::ProposalsRegistrationStarted,
                ),
            ),
            envelope(
                3,
                BallotEvent::ProposalRegistered {
                    proposal_id: ProposalId::new(0),
                },
            ),
        ];
        let projection = SessionProjection::replay(&facts).unwrap();
        assert_eq!(projection.phase, WorkflowStatus::ProposalsRegistrationStarted);
        assert_eq!(projection.voters, vec![VoterAddress::new("a")]);
        assert_eq!(projection.vote_counts, vec![0]);
    }

    #[test]
    fn test_sequence_gap_rejected() {
        let facts = vec![envelope(
            2,
            BallotEvent::VoterRegistered {
                voter_address: VoterAddress::new("a"),
            },
        )];
        assert!(SessionProjection::replay(&facts).is_err());
    }

    #[test]
    fn test_skipped_phase_rejected() {
        let mut projection = SessionProjection::new();
        let err = projection
            .apply(&change(
                WorkflowStatus::RegisteringVoters,
                WorkflowStatus::VotingSessionStarted,
            ))
            .unwrap_err();
        assert!(matches!(err, BallotError::Restore(_)));
        assert_eq!(projection.phase, WorkflowStatus::RegisteringVoters);
    }

    #[test]
    fn test_vote_from_unknown_voter_rejected() {
        let mut projection = SessionProjection::new();
        projection.phase = WorkflowStatus::VotingSessionStarted;
        projection.vote_counts = vec![0];
        let vote = BallotEvent::Voted {
            voter_address: VoterAddress::new("ghost"),
            proposal_id: ProposalId::new(0),
        };
        assert!(projection.apply(&vote).is_err());
        assert_eq!(projection.vote_counts, vec![0]);
    }
}
