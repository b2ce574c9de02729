//! Proposal record

use crate::ProposalId;
use serde::{Deserialize, Serialize};

/// A text submission voters can vote for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub description: String,
    pub vote_count: u64,
}

impl Proposal {
    pub fn new(id: ProposalId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            vote_count: 0,
        }
    }
}
