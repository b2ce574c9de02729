//! Voter registry: who may take part, and whether they have voted
//!
//! Records are only ever promoted (unregistered → registered → voted), never
//! removed. Addresses that were never admitted read as the default record.

use ballot_types::{BallotError, BallotResult, ProposalId, Voter, VoterAddress};
use std::collections::HashMap;

/// Registry of admitted voters and their ballot state
#[derive(Clone, Debug, Default)]
pub struct VoterRegistry {
    /// Admitted voters, keyed by address
    voters: HashMap<VoterAddress, Voter>,
    /// Addresses in admission order
    order: Vec<VoterAddress>,
}

impl VoterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from persisted records.
    ///
    /// `order` must list every key of `voters` exactly once.
    pub(crate) fn from_parts(
        voters: HashMap<VoterAddress, Voter>,
        order: Vec<VoterAddress>,
    ) -> Self {
        Self { voters, order }
    }

    pub fn is_registered(&self, address: &VoterAddress) -> bool {
        self.voters
            .get(address)
            .map(|v| v.is_registered)
            .unwrap_or(false)
    }

    /// The record for `address`, or the unregistered default
    pub fn get(&self, address: &VoterAddress) -> Voter {
        self.voters.get(address).cloned().unwrap_or_default()
    }

    /// Reject callers that were never admitted
    pub fn ensure_voter(&self, caller: &VoterAddress) -> BallotResult<()> {
        if self.is_registered(caller) {
            Ok(())
        } else {
            Err(BallotError::NotAVoter)
        }
    }

    /// Reject voters that already cast their ballot
    pub fn ensure_not_voted(&self, caller: &VoterAddress) -> BallotResult<()> {
        match self.voters.get(caller) {
            Some(voter) if voter.has_voted => Err(BallotError::AlreadyVoted),
            _ => Ok(()),
        }
    }

    /// Admit a new voter
    pub fn register(&mut self, address: VoterAddress) -> BallotResult<()> {
        if self.is_registered(&address) {
            return Err(BallotError::AlreadyRegistered);
        }
        self.voters.insert(address.clone(), Voter::registered());
        self.order.push(address);
        Ok(())
    }

    /// Mark `voter` as having voted for `proposal_id`.
    ///
    /// Callers must have checked [`ensure_voter`](Self::ensure_voter) and
    /// [`ensure_not_voted`](Self::ensure_not_voted) first.
    pub(crate) fn record_vote(&mut self, voter: &VoterAddress, proposal_id: ProposalId) {
        if let Some(record) = self.voters.get_mut(voter) {
            record.record_vote(proposal_id);
        }
    }

    /// Admitted addresses in admission order
    pub fn addresses(&self) -> &[VoterAddress] {
        &self.order
    }

    /// Admitted voters with their records
    pub fn iter(&self) -> impl Iterator<Item = (&VoterAddress, &Voter)> {
        self.order
            .iter()
            .filter_map(|address| self.voters.get(address).map(|v| (address, v)))
    }

    pub fn count(&self) -> usize {
        self.voters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> VoterAddress {
        VoterAddress::new(s)
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = VoterRegistry::new();
        registry.register(addr("a")).unwrap();

        assert!(registry.is_registered(&addr("a")));
        assert_eq!(registry.get(&addr("a")), Voter::registered());
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_unknown_reads_as_default() {
        let registry = VoterRegistry::new();
        assert_eq!(registry.get(&addr("ghost")), Voter::default());
        assert_eq!(
            registry.ensure_voter(&addr("ghost")),
            Err(BallotError::NotAVoter)
        );
    }

    #[test]
    fn test_register_twice() {
        let mut registry = VoterRegistry::new();
        registry.register(addr("a")).unwrap();
        assert_eq!(
            registry.register(addr("a")),
            Err(BallotError::AlreadyRegistered)
        );
        assert_eq!(registry.addresses().len(), 1);
    }

    #[test]
    fn test_vote_once() {
        let mut registry = VoterRegistry::new();
        registry.register(addr("a")).unwrap();
        assert!(registry.ensure_not_voted(&addr("a")).is_ok());

        registry.record_vote(&addr("a"), ProposalId::new(0));
        let voter = registry.get(&addr("a"));
        assert!(voter.has_voted);
        assert_eq!(voter.voted_proposal_id, Some(ProposalId::new(0)));
        assert_eq!(
            registry.ensure_not_voted(&addr("a")),
            Err(BallotError::AlreadyVoted)
        );
    }

    #[test]
    fn test_admission_order_kept() {
        let mut registry = VoterRegistry::new();
        for name in ["c", "a", "b"] {
            registry.register(addr(name)).unwrap();
        }
        let order: Vec<_> = registry.addresses().iter().map(|a| a.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
        assert_eq!(registry.iter().count(), 3);
    }
}
