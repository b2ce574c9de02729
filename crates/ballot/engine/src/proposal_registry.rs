//! Proposal registry: append-only, index-addressed proposals
//!
//! Ids are assigned from the position in the sequence, so they start at 0,
//! are never reused and stay valid for the life of the session.

use ballot_types::{BallotError, BallotResult, Proposal, ProposalId};

/// Ordered store of proposals and their tallies
#[derive(Clone, Debug, Default)]
pub struct ProposalRegistry {
    proposals: Vec<Proposal>,
}

impl ProposalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted proposals whose ids equal their positions
    pub(crate) fn from_proposals(proposals: Vec<Proposal>) -> Self {
        Self { proposals }
    }

    /// Reject descriptions that cannot become a proposal
    pub fn validate_description(description: &str) -> BallotResult<()> {
        if description.is_empty() {
            Err(BallotError::EmptyDescription)
        } else {
            Ok(())
        }
    }

    /// Append a proposal and return its id
    pub fn add(&mut self, description: &str) -> BallotResult<ProposalId> {
        Self::validate_description(description)?;
        let id = self.next_id();
        self.proposals.push(Proposal::new(id, description));
        Ok(id)
    }

    /// Id the next appended proposal will receive
    pub fn next_id(&self) -> ProposalId {
        ProposalId::new(self.proposals.len() as u64)
    }

    pub fn get(&self, id: ProposalId) -> BallotResult<&Proposal> {
        id.as_usize()
            .and_then(|index| self.proposals.get(index))
            .ok_or(BallotError::ProposalNotFound)
    }

    pub fn contains(&self, id: ProposalId) -> bool {
        self.get(id).is_ok()
    }

    /// Count one more vote for `id`
    pub fn increment(&mut self, id: ProposalId) -> BallotResult<u64> {
        let proposal = id
            .as_usize()
            .and_then(|index| self.proposals.get_mut(index))
            .ok_or(BallotError::ProposalNotFound)?;
        proposal.vote_count += 1;
        Ok(proposal.vote_count)
    }

    /// All proposals in insertion order
    pub fn list(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn count(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential_from_zero() {
        let mut registry = ProposalRegistry::new();
        assert_eq!(registry.add("P1").unwrap(), ProposalId::new(0));
        assert_eq!(registry.add("P2").unwrap(), ProposalId::new(1));
        assert_eq!(registry.add("P3").unwrap(), ProposalId::new(2));

        let descriptions: Vec<_> = registry.list().iter().map(|p| p.description.as_str()).collect();
        assert_eq!(descriptions, vec!["P1", "P2", "P3"]);
    }

    #[test]
    fn test_empty_description_rejected() {
        let mut registry = ProposalRegistry::new();
        assert_eq!(registry.add(""), Err(BallotError::EmptyDescription));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_get_missing() {
        let mut registry = ProposalRegistry::new();
        registry.add("P1").unwrap();
        assert!(registry.contains(ProposalId::new(0)));
        assert_eq!(
            registry.get(ProposalId::new(10)).unwrap_err(),
            BallotError::ProposalNotFound
        );
    }

    #[test]
    fn test_increment() {
        let mut registry = ProposalRegistry::new();
        let id = registry.add("P1").unwrap();
        assert_eq!(registry.increment(id).unwrap(), 1);
        assert_eq!(registry.increment(id).unwrap(), 2);
        assert_eq!(registry.get(id).unwrap().vote_count, 2);
        assert_eq!(
            registry.increment(ProposalId::new(5)),
            Err(BallotError::ProposalNotFound)
        );
    }
}
