//! Strongly-typed identifiers for ballot entities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity of a participant (administrator or voter)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoterAddress(String);

impl VoterAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VoterAddress {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

/// Zero-based sequential index of a proposal
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProposalId(pub u64);

impl ProposalId {
    pub fn new(index: u64) -> Self {
        Self(index)
    }

    pub fn index(self) -> u64 {
        self.0
    }

    /// Position in the proposal sequence, if it fits the platform's usize
    pub fn as_usize(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProposalId {
    fn from(index: u64) -> Self {
        Self(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_is_transparent_in_json() {
        let address = VoterAddress::new("0xA1");
        assert_eq!(serde_json::to_string(&address).unwrap(), "\"0xA1\"");
        assert_eq!(address.to_string(), "0xA1");
    }

    #[test]
    fn test_proposal_id_ordering() {
        assert!(ProposalId::new(0) < ProposalId::new(1));
        assert_eq!(ProposalId::new(7).as_usize(), Some(7));
        assert_eq!(serde_json::to_string(&ProposalId::new(3)).unwrap(), "3");
    }
}
