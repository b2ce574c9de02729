//! Voter record

use crate::ProposalId;
use serde::{Deserialize, Serialize};

/// Per-address participation state.
///
/// Unknown addresses read as the default record: not registered, not voted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub is_registered: bool,
    pub has_voted: bool,
    /// Set together with `has_voted`; `None` until the voter casts a ballot
    pub voted_proposal_id: Option<ProposalId>,
}

impl Voter {
    /// A freshly admitted voter who has not voted yet
    pub fn registered() -> Self {
        Self {
            is_registered: true,
            has_voted: false,
            voted_proposal_id: None,
        }
    }

    pub fn record_vote(&mut self, proposal_id: ProposalId) {
        self.has_voted = true;
        self.voted_proposal_id = Some(proposal_id);
    }
}
