//! Tally engine: picks the winning proposal once voting has closed
//!
//! Proposals are scanned in ascending id order and a later proposal only
//! takes the lead with a strictly higher count, so the earliest proposal
//! wins a tie.

use ballot_types::{Proposal, ProposalId};

/// Stateless winner computation
#[derive(Clone, Copy, Debug, Default)]
pub struct TallyEngine;

impl TallyEngine {
    pub fn new() -> Self {
        Self
    }

    /// Winning proposal, `None` when there is nothing to choose from
    pub fn tally(&self, proposals: &[Proposal]) -> Option<ProposalId> {
        Self::leader(proposals.iter().map(|p| (p.id, p.vote_count)))
    }

    /// First `(id, count)` pair holding the maximum count
    pub fn leader(counts: impl IntoIterator<Item = (ProposalId, u64)>) -> Option<ProposalId> {
        let mut best: Option<(ProposalId, u64)> = None;
        for (id, count) in counts {
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((id, count)),
            }
        }
        best.map(|(id, _)| id)
    }
}
