//! Access control: the single administrator identity
//!
//! The administrator is fixed when the session is created and is the only
//! caller allowed to register voters and drive phase transitions.

use ballot_types::{BallotError, BallotResult, VoterAddress};

/// Distinguishes the administrator from every other caller
#[derive(Clone, Debug)]
pub struct AccessControl {
    administrator: VoterAddress,
}

impl AccessControl {
    pub fn new(administrator: VoterAddress) -> Self {
        Self { administrator }
    }

    pub fn administrator(&self) -> &VoterAddress {
        &self.administrator
    }

    pub fn is_administrator(&self, identity: &VoterAddress) -> bool {
        &self.administrator == identity
    }

    /// Reject any caller other than the administrator
    pub fn ensure_administrator(&self, caller: &VoterAddress) -> BallotResult<()> {
        if self.is_administrator(caller) {
            Ok(())
        } else {
            Err(BallotError::Unauthorized)
        }
    }
}
