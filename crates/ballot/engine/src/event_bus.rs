//! Event bus: fact log and live fan-out
//!
//! Every committed state change is appended to an in-memory log with a
//! sequence number and broadcast to live subscribers. Observers that replay
//! the log in sequence order see the session evolve exactly as it did.

use ballot_types::{BallotEvent, EventEnvelope, EventKind};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::broadcast;

/// Default capacity of the broadcast channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// External receiver of emitted facts.
///
/// Notifiers are called synchronously, in emission order, while the
/// session still holds the lock of the mutation that produced the fact.
/// Implementations must not call back into the session. A panic inside
/// `notify` is logged and does not reach the caller of the mutation.
pub trait EventNotifier: Send + Sync {
    fn notify(&self, envelope: &EventEnvelope);
}

/// Notifier that writes each fact to the `tracing` log
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl EventNotifier for TracingNotifier {
    fn notify(&self, envelope: &EventEnvelope) {
        tracing::info!(
            sequence = envelope.sequence,
            kind = %envelope.event.kind(),
            event = ?envelope.event,
            "Ballot fact emitted"
        );
    }
}

/// Append-only fact log with broadcast distribution
pub struct EventBus {
    /// Every emitted fact, in emission order
    log: Vec<EventEnvelope>,
    /// Broadcast channel for real-time distribution
    sender: broadcast::Sender<EventEnvelope>,
    /// Fact counters by kind
    counts: HashMap<EventKind, u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus whose live channel buffers `capacity` facts per subscriber
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            log: Vec::new(),
            sender,
            counts: HashMap::new(),
        }
    }

    /// Continue a log written by an earlier bus.
    ///
    /// `log` must already be in sequence order starting at 1; new facts are
    /// numbered after its last entry.
    pub fn resume(log: Vec<EventEnvelope>, capacity: usize) -> Self {
        let mut bus = Self::with_capacity(capacity);
        for envelope in &log {
            *bus.counts.entry(envelope.event.kind()).or_insert(0) += 1;
        }
        bus.log = log;
        bus
    }

    /// Append a fact to the log and broadcast it
    pub fn publish(&mut self, event: BallotEvent) -> EventEnvelope {
        let envelope = EventEnvelope {
            sequence: self.log.len() as u64 + 1,
            event,
            emitted_at: Utc::now(),
        };

        *self.counts.entry(envelope.event.kind()).or_insert(0) += 1;
        self.log.push(envelope.clone());

        // No receivers is not an error
        let _ = self.sender.send(envelope.clone());
        envelope
    }

    /// Subscribe to facts emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Handle that can create subscriptions without access to the bus
    pub fn sender(&self) -> broadcast::Sender<EventEnvelope> {
        self.sender.clone()
    }

    pub fn events(&self) -> &[EventEnvelope] {
        &self.log
    }

    /// Facts with a sequence number greater than `sequence`
    pub fn events_since(&self, sequence: u64) -> &[EventEnvelope] {
        let start = usize::try_from(sequence)
            .unwrap_or(usize::MAX)
            .min(self.log.len());
        &self.log[start..]
    }

    pub fn event_count(&self) -> usize {
        self.log.len()
    }

    pub fn count_of(&self, kind: EventKind) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn stats(&self) -> EventBusStats {
        EventBusStats {
            total_events: self.log.len() as u64,
            subscriber_count: self.sender.receiver_count(),
            events_by_kind: self.counts.clone(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("events", &self.log.len())
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

/// Event bus statistics
#[derive(Clone, Debug)]
pub struct EventBusStats {
    pub total_events: u64,
    pub subscriber_count: usize,
    pub events_by_kind: HashMap<EventKind, u64>,
}
