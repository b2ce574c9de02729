//! Voting session: the single owner of all ballot state
//!
//! Every call enters through access control, then the phase gate, then the
//! registry that owns the data. Mutations hold one exclusive lock from the
//! first precondition check until their facts have been emitted, so no two
//! mutations interleave and a rejected request leaves no trace. Read-only
//! queries share the lock and only ever observe committed state.

use crate::access_control::AccessControl;
use crate::event_bus::{EventBus, EventBusStats, EventNotifier, DEFAULT_CHANNEL_CAPACITY};
use crate::proposal_registry::ProposalRegistry;
use crate::restore;
use crate::state_machine::{PhaseGate, StateMachine, WorkflowTransition};
use crate::tally_engine::TallyEngine;
use crate::voter_registry::VoterRegistry;
use ballot_types::{
    BallotError, BallotEvent, BallotResult, EventEnvelope, Proposal, ProposalId, SessionSnapshot,
    Voter, VoterAddress, WorkflowStatus,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

/// Runtime settings of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Facts buffered per live subscriber before it starts lagging
    #[serde(default = "default_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

/// Components owned by the session, guarded together
#[derive(Debug)]
struct SessionState {
    access: AccessControl,
    machine: StateMachine,
    voters: VoterRegistry,
    proposals: ProposalRegistry,
    tally: TallyEngine,
    bus: EventBus,
}

/// One voting session, from voter registration to the tallied result
pub struct VotingSession {
    state: RwLock<SessionState>,
    notifiers: Vec<Arc<dyn EventNotifier>>,
    events: broadcast::Sender<EventEnvelope>,
}

impl VotingSession {
    /// Open a session administered by `administrator`
    pub fn new(administrator: VoterAddress) -> Self {
        Self::with_config(administrator, SessionConfig::default())
    }

    pub fn with_config(administrator: VoterAddress, config: SessionConfig) -> Self {
        tracing::info!(administrator = %administrator, "Voting session created");
        Self::from_state(SessionState {
            access: AccessControl::new(administrator),
            machine: StateMachine::new(),
            voters: VoterRegistry::new(),
            proposals: ProposalRegistry::new(),
            tally: TallyEngine::new(),
            bus: EventBus::with_capacity(config.event_channel_capacity),
        })
    }

    /// Resume a session from a snapshot after checking its invariants.
    ///
    /// The stored fact log must replay to exactly the stored state; the
    /// resumed session keeps appending to it.
    pub fn restore(snapshot: SessionSnapshot, config: SessionConfig) -> BallotResult<Self> {
        let order = restore::validate(&snapshot)?;
        let phase = snapshot.phase;
        let last_sequence = snapshot.last_sequence();
        let voters = snapshot.voters.into_iter().collect();

        tracing::info!(
            administrator = %snapshot.administrator,
            phase = %phase,
            voters = order.len(),
            proposals = snapshot.proposals.len(),
            last_sequence,
            "Voting session restored"
        );

        Ok(Self::from_state(SessionState {
            access: AccessControl::new(snapshot.administrator),
            machine: StateMachine::resume(phase, snapshot.winning_proposal_id),
            voters: VoterRegistry::from_parts(voters, order),
            proposals: ProposalRegistry::from_proposals(snapshot.proposals),
            tally: TallyEngine::new(),
            bus: EventBus::resume(snapshot.events, config.event_channel_capacity),
        }))
    }

    fn from_state(state: SessionState) -> Self {
        let events = state.bus.sender();
        Self {
            state: RwLock::new(state),
            notifiers: Vec::new(),
            events,
        }
    }

    /// Forward every fact emitted from now on to `notifier`
    pub fn with_notifier(mut self, notifier: Arc<dyn EventNotifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    // ── Voter registry ───────────────────────────────────────────────

    /// Admit `address` as a voter (administrator, registration phase only)
    pub fn add_voter(&self, caller: &VoterAddress, address: VoterAddress) -> BallotResult<()> {
        self.mutate("add_voter", caller, |state, facts| {
            state.access.ensure_administrator(caller)?;
            state.machine.ensure_open(PhaseGate::VoterRegistration)?;
            state.voters.register(address.clone())?;

            tracing::info!(voter = %address, "Voter registered");
            facts.push(BallotEvent::VoterRegistered {
                voter_address: address,
            });
            Ok(())
        })
    }

    /// Read any address's record; the caller must be a registered voter
    pub fn get_voter(&self, caller: &VoterAddress, address: &VoterAddress) -> BallotResult<Voter> {
        self.query("get_voter", caller, |state| {
            state.voters.ensure_voter(caller)?;
            Ok(state.voters.get(address))
        })
    }

    /// Vote for `proposal_id` (registered voters, voting phase, once)
    pub fn cast_vote(&self, caller: &VoterAddress, proposal_id: ProposalId) -> BallotResult<()> {
        self.mutate("cast_vote", caller, |state, facts| {
            state.voters.ensure_voter(caller)?;
            state.machine.ensure_open(PhaseGate::Voting)?;
            state.voters.ensure_not_voted(caller)?;
            state.proposals.get(proposal_id)?;

            let vote_count = state.proposals.increment(proposal_id)?;
            state.voters.record_vote(caller, proposal_id);

            tracing::info!(voter = %caller, proposal_id = %proposal_id, vote_count, "Vote cast");
            facts.push(BallotEvent::Voted {
                voter_address: caller.clone(),
                proposal_id,
            });
            Ok(())
        })
    }

    /// Admitted voters in admission order (administrator only)
    pub fn registered_voters(&self, caller: &VoterAddress) -> BallotResult<Vec<VoterAddress>> {
        self.query("registered_voters", caller, |state| {
            state.access.ensure_administrator(caller)?;
            Ok(state.voters.addresses().to_vec())
        })
    }

    // ── Proposal registry ────────────────────────────────────────────

    /// Submit a proposal (registered voters, proposal phase only)
    pub fn add_proposal(
        &self,
        caller: &VoterAddress,
        description: &str,
    ) -> BallotResult<ProposalId> {
        self.mutate("add_proposal", caller, |state, facts| {
            state.voters.ensure_voter(caller)?;
            state.machine.ensure_open(PhaseGate::ProposalSubmission)?;
            let proposal_id = state.proposals.add(description)?;

            tracing::info!(voter = %caller, proposal_id = %proposal_id, "Proposal registered");
            facts.push(BallotEvent::ProposalRegistered { proposal_id });
            Ok(proposal_id)
        })
    }

    pub fn get_proposal(&self, caller: &VoterAddress, id: ProposalId) -> BallotResult<Proposal> {
        self.query("get_proposal", caller, |state| {
            state.voters.ensure_voter(caller)?;
            state.proposals.get(id).cloned()
        })
    }

    /// All proposals in id order
    pub fn list_proposals(&self, caller: &VoterAddress) -> BallotResult<Vec<Proposal>> {
        self.query("list_proposals", caller, |state| {
            state.voters.ensure_voter(caller)?;
            Ok(state.proposals.list().to_vec())
        })
    }

    // ── Workflow ─────────────────────────────────────────────────────

    pub fn start_proposals_registering(&self, caller: &VoterAddress) -> BallotResult<()> {
        self.transition(caller, WorkflowTransition::StartProposalsRegistering)
    }

    pub fn end_proposals_registering(&self, caller: &VoterAddress) -> BallotResult<()> {
        self.transition(caller, WorkflowTransition::EndProposalsRegistering)
    }

    pub fn start_voting_session(&self, caller: &VoterAddress) -> BallotResult<()> {
        self.transition(caller, WorkflowTransition::StartVotingSession)
    }

    pub fn end_voting_session(&self, caller: &VoterAddress) -> BallotResult<()> {
        self.transition(caller, WorkflowTransition::EndVotingSession)
    }

    /// Count the votes and close the session.
    ///
    /// Returns the winning proposal, `None` if no proposal was submitted.
    pub fn tally_votes(&self, caller: &VoterAddress) -> BallotResult<Option<ProposalId>> {
        self.mutate("tally_votes", caller, |state, facts| {
            state.access.ensure_administrator(caller)?;
            state
                .machine
                .ensure_transition(WorkflowTransition::TallyVotes)?;

            let winner = state.tally.tally(state.proposals.list());
            let (previous, next) = state.machine.complete_tally(winner)?;

            tracing::info!(
                from = %previous,
                to = %next,
                winning_proposal_id = ?winner,
                "Votes tallied"
            );
            facts.push(BallotEvent::WorkflowStatusChange { previous, next });
            Ok(winner)
        })
    }

    /// Fire any of the transitions, tallying included
    pub fn apply_transition(
        &self,
        caller: &VoterAddress,
        transition: WorkflowTransition,
    ) -> BallotResult<()> {
        match transition {
            WorkflowTransition::TallyVotes => self.tally_votes(caller).map(|_| ()),
            other => self.transition(caller, other),
        }
    }

    fn transition(
        &self,
        caller: &VoterAddress,
        transition: WorkflowTransition,
    ) -> BallotResult<()> {
        let operation = match transition {
            WorkflowTransition::StartProposalsRegistering => "start_proposals_registering",
            WorkflowTransition::EndProposalsRegistering => "end_proposals_registering",
            WorkflowTransition::StartVotingSession => "start_voting_session",
            WorkflowTransition::EndVotingSession => "end_voting_session",
            WorkflowTransition::TallyVotes => "tally_votes",
        };
        self.mutate(operation, caller, |state, facts| {
            state.access.ensure_administrator(caller)?;
            let (previous, next) = state.machine.advance(transition)?;

            tracing::info!(from = %previous, to = %next, "Workflow status changed");
            facts.push(BallotEvent::WorkflowStatusChange { previous, next });
            Ok(())
        })
    }

    // ── Public reads ─────────────────────────────────────────────────

    /// The administrator identity
    pub fn owner(&self) -> VoterAddress {
        self.read().access.administrator().clone()
    }

    pub fn workflow_status(&self) -> WorkflowStatus {
        self.read().machine.status()
    }

    /// Winning proposal id, `None` until tallied
    pub fn winning_proposal_id(&self) -> Option<ProposalId> {
        self.read().machine.winning_proposal_id()
    }

    /// The winning proposal with its description and count
    pub fn winner(&self, caller: &VoterAddress) -> BallotResult<Proposal> {
        self.query("winner", caller, |state| {
            state.voters.ensure_voter(caller)?;
            let id = state
                .machine
                .winning_proposal_id()
                .ok_or(BallotError::ProposalNotFound)?;
            state.proposals.get(id).cloned()
        })
    }

    // ── Facts ────────────────────────────────────────────────────────

    /// Every fact emitted by this session, in emission order
    pub fn events(&self) -> Vec<EventEnvelope> {
        self.read().bus.events().to_vec()
    }

    /// Facts with a sequence number greater than `sequence`
    pub fn events_since(&self, sequence: u64) -> Vec<EventEnvelope> {
        self.read().bus.events_since(sequence).to_vec()
    }

    /// Live stream of facts emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }

    pub fn event_stats(&self) -> EventBusStats {
        self.read().bus.stats()
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Persistable copy of the committed state
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.read();
        let voters: BTreeMap<_, _> = state
            .voters
            .iter()
            .map(|(address, voter)| (address.clone(), voter.clone()))
            .collect();

        SessionSnapshot {
            phase: state.machine.status(),
            administrator: state.access.administrator().clone(),
            voters,
            registration_order: state.voters.addresses().to_vec(),
            proposals: state.proposals.list().to_vec(),
            winning_proposal_id: state.machine.winning_proposal_id(),
            events: state.bus.events().to_vec(),
        }
    }

    // ── Internal helpers ─────────────────────────────────────────────

    /// Run `apply` inside the exclusive section and emit its facts on success.
    ///
    /// `apply` must finish every check before its first write.
    fn mutate<T>(
        &self,
        operation: &'static str,
        caller: &VoterAddress,
        apply: impl FnOnce(&mut SessionState, &mut Vec<BallotEvent>) -> BallotResult<T>,
    ) -> BallotResult<T> {
        let mut state = self.write();
        let mut facts = Vec::new();

        match apply(&mut *state, &mut facts) {
            Ok(value) => {
                for fact in facts {
                    let envelope = state.bus.publish(fact);
                    self.deliver(&envelope);
                }
                Ok(value)
            }
            Err(err) => Err(rejected(operation, caller, err)),
        }
    }

    /// Hand a committed fact to every notifier.
    ///
    /// A panicking notifier is logged and skipped; the mutation stays
    /// committed and later notifiers still receive the fact.
    fn deliver(&self, envelope: &EventEnvelope) {
        for (index, notifier) in self.notifiers.iter().enumerate() {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| notifier.notify(envelope)));
            if delivered.is_err() {
                tracing::error!(
                    notifier = index,
                    sequence = envelope.sequence,
                    kind = %envelope.event.kind(),
                    "Event notifier panicked"
                );
            }
        }
    }

    fn query<T>(
        &self,
        operation: &'static str,
        caller: &VoterAddress,
        read: impl FnOnce(&SessionState) -> BallotResult<T>,
    ) -> BallotResult<T> {
        let state = self.read();
        read(&*state).map_err(|err| rejected(operation, caller, err))
    }

    // Mutations finish every check before their first write and contain
    // notifier panics, so the state behind a poisoned lock is consistent.
    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for VotingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VotingSession")
            .field("state", &*self.read())
            .field("notifiers", &self.notifiers.len())
            .finish()
    }
}

fn rejected(operation: &'static str, caller: &VoterAddress, err: BallotError) -> BallotError {
    tracing::debug!(operation, caller = %caller, reason = %err, "Request rejected");
    err
}
