//! Subcommands and their execution against a stored session

use anyhow::Context;
use ballot_engine::{TracingNotifier, VotingSession};
use ballot_store::{SessionStore, SnapshotStore};
use ballot_types::{BallotError, ProposalId, VoterAddress};
use clap::Subcommand;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create a new session administered by ADMIN
    Init {
        #[arg(long)]
        admin: String,
    },

    /// Register a voter
    AddVoter {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        address: String,
    },

    /// Open proposal registration
    StartProposals {
        #[arg(long)]
        caller: String,
    },

    /// Close proposal registration
    EndProposals {
        #[arg(long)]
        caller: String,
    },

    /// Open the voting session
    StartVoting {
        #[arg(long)]
        caller: String,
    },

    /// Close the voting session
    EndVoting {
        #[arg(long)]
        caller: String,
    },

    /// Count the votes and record the winner
    Tally {
        #[arg(long)]
        caller: String,
    },

    /// Submit a proposal
    Propose {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        description: String,
    },

    /// Vote for a proposal
    Vote {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        proposal: u64,
    },

    /// Show a voter record
    Voter {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        address: String,
    },

    /// Show a proposal
    Proposal {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        id: u64,
    },

    /// List every proposal
    Proposals {
        #[arg(long)]
        caller: String,
    },

    /// List registered voters (administrator only)
    Voters {
        #[arg(long)]
        caller: String,
    },

    /// Show the workflow phase
    Status,

    /// Show the winning proposal id, or the winning proposal for a voter
    Winner {
        #[arg(long)]
        caller: Option<String>,
    },
}

impl Command {
    fn mutates(&self) -> bool {
        matches!(
            self,
            Command::AddVoter { .. }
                | Command::StartProposals { .. }
                | Command::EndProposals { .. }
                | Command::StartVoting { .. }
                | Command::EndVoting { .. }
                | Command::Tally { .. }
                | Command::Propose { .. }
                | Command::Vote { .. }
        )
    }
}

/// Run `command` against the session held by `store`.
///
/// Rejections come back as a [`BallotError`] inside the `anyhow::Error`; the
/// stored snapshot is only rewritten after a successful mutation. The output
/// of a mutation lists the facts it appended to the session's log.
pub fn execute<S: SnapshotStore>(
    store: &SessionStore<S>,
    command: &Command,
) -> anyhow::Result<Value> {
    if let Command::Init { admin } = command {
        let session = VotingSession::new(VoterAddress::new(admin.as_str()));
        store.create(&session).context("Failed to create session")?;
        tracing::info!(administrator = %admin, "Session created");
        return Ok(json!({
            "administrator": session.owner(),
            "status": session.workflow_status(),
        }));
    }

    let session = store
        .open()
        .context("Failed to open session")?
        .with_notifier(Arc::new(TracingNotifier));
    let last_sequence = session.event_stats().total_events;
    let result = dispatch(&session, command)?;

    if !command.mutates() {
        return Ok(result);
    }

    store.persist(&session).context("Failed to persist session")?;
    Ok(json!({
        "result": result,
        "status": session.workflow_status(),
        "events": session.events_since(last_sequence),
    }))
}

fn dispatch(session: &VotingSession, command: &Command) -> Result<Value, BallotError> {
    let value = match command {
        Command::Init { .. } => json!(null),
        Command::AddVoter { caller, address } => {
            let address = identity(address);
            session.add_voter(&identity(caller), address.clone())?;
            json!({ "registered": address })
        }
        Command::StartProposals { caller } => {
            session.start_proposals_registering(&identity(caller))?;
            json!(null)
        }
        Command::EndProposals { caller } => {
            session.end_proposals_registering(&identity(caller))?;
            json!(null)
        }
        Command::StartVoting { caller } => {
            session.start_voting_session(&identity(caller))?;
            json!(null)
        }
        Command::EndVoting { caller } => {
            session.end_voting_session(&identity(caller))?;
            json!(null)
        }
        Command::Tally { caller } => {
            let winner = session.tally_votes(&identity(caller))?;
            json!({ "winning_proposal_id": winner })
        }
        Command::Propose {
            caller,
            description,
        } => {
            let id = session.add_proposal(&identity(caller), description)?;
            json!({ "proposal_id": id })
        }
        Command::Vote { caller, proposal } => {
            let id = ProposalId::new(*proposal);
            session.cast_vote(&identity(caller), id)?;
            json!({ "proposal_id": id })
        }
        Command::Voter { caller, address } => {
            json!(session.get_voter(&identity(caller), &identity(address))?)
        }
        Command::Proposal { caller, id } => {
            json!(session.get_proposal(&identity(caller), ProposalId::new(*id))?)
        }
        Command::Proposals { caller } => json!(session.list_proposals(&identity(caller))?),
        Command::Voters { caller } => json!(session.registered_voters(&identity(caller))?),
        Command::Status => json!({
            "status": session.workflow_status(),
            "owner": session.owner(),
            "winning_proposal_id": session.winning_proposal_id(),
            "facts": session.event_stats().total_events,
        }),
        Command::Winner { caller: None } => {
            json!({ "winning_proposal_id": session.winning_proposal_id() })
        }
        Command::Winner {
            caller: Some(caller),
        } => json!(session.winner(&identity(caller))?),
    };
    Ok(value)
}

fn identity(address: &str) -> VoterAddress {
    VoterAddress::new(address)
}

/// JSON body printed for a rejected command
pub fn rejection(error: &BallotError) -> Value {
    json!({
        "error": {
            "kind": error.kind(),
            "message": error.to_string(),
        }
    })
}
