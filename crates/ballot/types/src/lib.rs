//! Ballot domain types
//!
//! Shared vocabulary for a single permissioned voting session: who may take
//! part ([`Voter`]), what they vote on ([`Proposal`]), which phase the session
//! is in ([`WorkflowStatus`]), the facts emitted on every state change
//! ([`BallotEvent`]) and the persisted shape of a session
//! ([`SessionSnapshot`]).
//!
//! The runtime behaviour lives in `ballot-engine`; this crate only defines
//! data and the error taxonomy every operation reports through.

#![deny(unsafe_code)]

pub mod errors;
pub mod event;
pub mod ids;
pub mod proposal;
pub mod snapshot;
pub mod status;
pub mod voter;

pub use errors::{BallotError, BallotResult, ErrorKind};
pub use event::{BallotEvent, EventEnvelope, EventKind};
pub use ids::{ProposalId, VoterAddress};
pub use proposal::Proposal;
pub use snapshot::SessionSnapshot;
pub use status::WorkflowStatus;
pub use voter::Voter;
