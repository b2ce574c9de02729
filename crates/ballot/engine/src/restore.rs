//! Snapshot validation
//!
//! A snapshot is only accepted when it could have been produced by a live
//! session: every stored voter is registered, ids match positions, counts
//! match ballots, nothing exists before its phase, the recorded winner
//! is what the tally engine would pick, and the fact log replays to the
//! stored state.

use crate::projection::SessionProjection;
use crate::tally_engine::TallyEngine;
use ballot_types::{BallotError, BallotResult, SessionSnapshot, VoterAddress, WorkflowStatus};
use std::collections::HashSet;

/// Check `snapshot` and return the effective voter admission order
pub(crate) fn validate(snapshot: &SessionSnapshot) -> BallotResult<Vec<VoterAddress>> {
    let order = admission_order(snapshot)?;
    let phase = snapshot.phase;

    for (address, voter) in &snapshot.voters {
        if !voter.is_registered {
            return Err(reject(format!("voter {} is stored but not registered", address)));
        }
    }

    if phase < WorkflowStatus::ProposalsRegistrationStarted && !snapshot.proposals.is_empty() {
        return Err(reject(format!("proposals exist in phase {}", phase)));
    }

    for (position, proposal) in snapshot.proposals.iter().enumerate() {
        if proposal.id.as_usize() != Some(position) {
            return Err(reject(format!(
                "proposal at position {} has id {}",
                position, proposal.id
            )));
        }
        if proposal.description.is_empty() {
            return Err(reject(format!("proposal {} has no description", proposal.id)));
        }
    }

    let mut ballots = vec![0u64; snapshot.proposals.len()];
    for (address, voter) in &snapshot.voters {
        match (voter.has_voted, voter.voted_proposal_id) {
            (false, None) => {}
            (true, Some(id)) => {
                if phase < WorkflowStatus::VotingSessionStarted {
                    return Err(reject(format!("voter {} voted in phase {}", address, phase)));
                }
                let slot = id
                    .as_usize()
                    .and_then(|index| ballots.get_mut(index))
                    .ok_or_else(|| {
                        reject(format!("voter {} voted for unknown proposal {}", address, id))
                    })?;
                *slot += 1;
            }
            _ => {
                return Err(reject(format!(
                    "voter {} has an inconsistent ballot",
                    address
                )))
            }
        }
    }

    for (proposal, counted) in snapshot.proposals.iter().zip(&ballots) {
        if proposal.vote_count != *counted {
            return Err(reject(format!(
                "proposal {} records {} votes but {} ballots name it",
                proposal.id, proposal.vote_count, counted
            )));
        }
    }

    let expected_winner = if phase == WorkflowStatus::VotesTallied {
        TallyEngine::new().tally(&snapshot.proposals)
    } else {
        None
    };
    if snapshot.winning_proposal_id != expected_winner {
        return Err(reject(format!(
            "winning proposal {:?} does not match tally {:?}",
            snapshot.winning_proposal_id, expected_winner
        )));
    }

    let replayed = SessionProjection::replay(&snapshot.events)?;
    if replayed != SessionProjection::from_snapshot(snapshot) {
        return Err(reject(format!(
            "fact log up to {} does not reproduce the stored state",
            snapshot.last_sequence()
        )));
    }

    Ok(order)
}

fn admission_order(snapshot: &SessionSnapshot) -> BallotResult<Vec<VoterAddress>> {
    if snapshot.registration_order.is_empty() {
        return Ok(snapshot.voters.keys().cloned().collect());
    }

    let mut seen = HashSet::new();
    for address in &snapshot.registration_order {
        if !snapshot.voters.contains_key(address) {
            return Err(reject(format!("ordered voter {} has no record", address)));
        }
        if !seen.insert(address) {
            return Err(reject(format!("voter {} admitted twice", address)));
        }
    }
    if seen.len() != snapshot.voters.len() {
        return Err(reject("registration order does not cover every voter"));
    }
    Ok(snapshot.registration_order.clone())
}

fn reject(reason: impl Into<String>) -> BallotError {
    BallotError::Restore(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VotingSession;
    use ballot_types::{BallotEvent, ErrorKind, ProposalId, Voter};

    fn addr(s: &str) -> VoterAddress {
        VoterAddress::new(s)
    }

    fn voting_session() -> VotingSession {
        let admin = addr("admin");
        let session = VotingSession::new(admin.clone());
        session.add_voter(&admin, addr("a")).unwrap();
        session.add_voter(&admin, addr("b")).unwrap();
        session.start_proposals_registering(&admin).unwrap();
        session.add_proposal(&addr("a"), "P1").unwrap();
        session.add_proposal(&addr("b"), "P2").unwrap();
        session.end_proposals_registering(&admin).unwrap();
        session.start_voting_session(&admin).unwrap();
        session.cast_vote(&addr("a"), ProposalId::new(1)).unwrap();
        session.end_voting_session(&admin).unwrap();
        session
    }

    fn voting_snapshot() -> SessionSnapshot {
        voting_session().snapshot()
    }

    fn tallied_snapshot() -> SessionSnapshot {
        let session = voting_session();
        session.tally_votes(&addr("admin")).unwrap();
        session.snapshot()
    }

    #[test]
    fn test_consistent_snapshot_accepted() {
        let order = validate(&voting_snapshot()).unwrap();
        assert_eq!(order, vec![addr("a"), addr("b")]);
    }

    #[test]
    fn test_genesis_without_log_accepted() {
        assert!(validate(&SessionSnapshot::genesis(addr("admin"))).is_ok());
    }

    #[test]
    fn test_count_mismatch_rejected() {
        let mut snapshot = voting_snapshot();
        snapshot.proposals[0].vote_count = 4;
        assert_eq!(validate(&snapshot).unwrap_err().kind(), ErrorKind::Restore);
    }

    #[test]
    fn test_gapped_ids_rejected() {
        let mut snapshot = voting_snapshot();
        snapshot.proposals[1].id = ProposalId::new(5);
        assert!(validate(&snapshot).is_err());
    }

    #[test]
    fn test_unregistered_record_rejected() {
        let mut snapshot = voting_snapshot();
        snapshot.voters.insert(addr("c"), Voter::default());
        assert!(validate(&snapshot).is_err());
    }

    #[test]
    fn test_winner_must_match_tally() {
        let mut snapshot = tallied_snapshot();
        assert!(validate(&snapshot).is_ok());

        snapshot.winning_proposal_id = Some(ProposalId::new(0));
        assert!(validate(&snapshot).is_err());
    }

    #[test]
    fn test_winner_before_tally_rejected() {
        let mut snapshot = voting_snapshot();
        snapshot.winning_proposal_id = Some(ProposalId::new(1));
        assert!(validate(&snapshot).is_err());
    }

    #[test]
    fn test_votes_before_voting_rejected() {
        let mut snapshot = voting_snapshot();
        snapshot.phase = WorkflowStatus::ProposalsRegistrationEnded;
        assert!(validate(&snapshot).is_err());
    }

    #[test]
    fn test_partial_order_rejected() {
        let mut snapshot = voting_snapshot();
        snapshot.registration_order = vec![addr("b")];
        assert!(validate(&snapshot).is_err());
    }

    #[test]
    fn test_order_contradicting_log_rejected() {
        let mut snapshot = voting_snapshot();
        snapshot.registration_order = vec![addr("b"), addr("a")];
        let err = validate(&snapshot).unwrap_err();
        assert!(err.to_string().contains("does not reproduce"));
    }

    #[test]
    fn test_missing_log_rejected() {
        let mut snapshot = voting_snapshot();
        snapshot.events.clear();
        assert_eq!(validate(&snapshot).unwrap_err().kind(), ErrorKind::Restore);
    }

    #[test]
    fn test_truncated_log_rejected() {
        let mut snapshot = voting_snapshot();
        snapshot.events.pop();
        assert!(validate(&snapshot).is_err());
    }

    #[test]
    fn test_log_with_extra_vote_rejected() {
        let mut snapshot = voting_snapshot();
        let last = snapshot.last_sequence();
        let mut forged = snapshot.events[0].clone();
        forged.sequence = last + 1;
        forged.event = BallotEvent::Voted {
            voter_address: addr("b"),
            proposal_id: ProposalId::new(0),
        };
        snapshot.events.push(forged);
        assert!(validate(&snapshot).is_err());
    }
}
