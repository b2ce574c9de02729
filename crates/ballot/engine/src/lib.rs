//! Voting session runtime
//!
//! Runs one permissioned voting session: the administrator admits voters,
//! opens and closes proposal submission, opens and closes voting, and
//! tallies the result. Every state change is emitted as a fact.
//!
//! # Architecture
//!
//! The [`VotingSession`] owns specialized components behind one lock:
//!
//! - [`AccessControl`]: Tells the administrator apart from everyone else
//! - [`StateMachine`]: Owns the phase and the tally result, gates operations by phase
//! - [`VoterRegistry`]: Admitted voters and their ballots
//! - [`ProposalRegistry`]: Append-only proposals and their counts
//! - [`TallyEngine`]: Picks the winner, earliest proposal on ties
//! - [`EventBus`]: Fact log and live fan-out, plus any [`EventNotifier`]s
//!
//! [`SessionProjection`] replays the fact log for observers.
//!
//! # Example
//!
//! ```rust
//! use ballot_engine::VotingSession;
//! use ballot_types::{ProposalId, VoterAddress, WorkflowStatus};
//!
//! let admin = VoterAddress::new("admin");
//! let alice = VoterAddress::new("alice");
//! let session = VotingSession::new(admin.clone());
//!
//! session.add_voter(&admin, alice.clone()).unwrap();
//! session.start_proposals_registering(&admin).unwrap();
//! let id = session.add_proposal(&alice, "Plant more trees").unwrap();
//! session.end_proposals_registering(&admin).unwrap();
//! session.start_voting_session(&admin).unwrap();
//! session.cast_vote(&alice, id).unwrap();
//! session.end_voting_session(&admin).unwrap();
//!
//! assert_eq!(session.tally_votes(&admin).unwrap(), Some(ProposalId::new(0)));
//! assert_eq!(session.workflow_status(), WorkflowStatus::VotesTallied);
//! ```

#![deny(unsafe_code)]

pub mod access_control;
pub mod event_bus;
pub mod projection;
pub mod proposal_registry;
mod restore;
pub mod session;
pub mod state_machine;
pub mod tally_engine;
pub mod voter_registry;

// Re-export main types
pub use access_control::AccessControl;
pub use event_bus::{EventBus, EventBusStats, EventNotifier, TracingNotifier};
pub use projection::SessionProjection;
pub use proposal_registry::ProposalRegistry;
pub use session::{SessionConfig, VotingSession};
pub use state_machine::{PhaseGate, StateMachine, WorkflowTransition};
pub use tally_engine::TallyEngine;
pub use voter_registry::VoterRegistry;
