//! Error types for ballot operations
//!
//! Every variant is a caller-visible rejection of an invalid request. The
//! display string is the reason reported back to the caller.

use serde::{Deserialize, Serialize};

/// Errors that can occur in ballot operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BallotError {
    #[error("Ownable: caller is not the owner")]
    Unauthorized,

    #[error("{0}")]
    InvalidTransition(String),

    #[error("{0}")]
    PhaseViolation(String),

    #[error("Already registered")]
    AlreadyRegistered,

    #[error("You have already voted")]
    AlreadyVoted,

    #[error("You're not a voter")]
    NotAVoter,

    #[error("Cannot accept an empty proposal description")]
    EmptyDescription,

    #[error("Proposal not found")]
    ProposalNotFound,

    #[error("Snapshot rejected: {0}")]
    Restore(String),
}

impl BallotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BallotError::Unauthorized => ErrorKind::Unauthorized,
            BallotError::InvalidTransition(_) => ErrorKind::InvalidTransition,
            BallotError::PhaseViolation(_) => ErrorKind::PhaseViolation,
            BallotError::AlreadyRegistered => ErrorKind::AlreadyRegistered,
            BallotError::AlreadyVoted => ErrorKind::AlreadyVoted,
            BallotError::NotAVoter => ErrorKind::NotAVoter,
            BallotError::EmptyDescription => ErrorKind::EmptyDescription,
            BallotError::ProposalNotFound => ErrorKind::ProposalNotFound,
            BallotError::Restore(_) => ErrorKind::Restore,
        }
    }
}

/// Machine-readable category of a [`BallotError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Unauthorized,
    InvalidTransition,
    PhaseViolation,
    AlreadyRegistered,
    AlreadyVoted,
    NotAVoter,
    EmptyDescription,
    ProposalNotFound,
    Restore,
}

/// Result type alias for ballot operations
pub type BallotResult<T> = Result<T, BallotError>;
