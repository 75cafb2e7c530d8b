// Event bus for match lifecycle events
// The host owns the bus; phase gates and extensions publish through senders

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::MatchEvent;

/// Source of the event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    /// Published by the host while orchestrating a match
    Host,
    /// Published by a countdown callback
    Countdown,
    /// Published by extension code
    Extension,
}

/// Complete event envelope
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub event: MatchEvent,
    /// Bus-wide sequence number, strictly increasing in publish order
    pub sequence: u64,
    pub timestamp: Instant,
    pub source: EventSource,
}

impl EventEnvelope {
    pub fn new(event: MatchEvent, sequence: u64, source: EventSource) -> Self {
        Self {
            event,
            sequence,
            timestamp: Instant::now(),
            source,
        }
    }
}

/// Event sender that publishers use to put events on the bus
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: broadcast::Sender<EventEnvelope>,
    sequence: Arc<AtomicU64>,
    source: EventSource,
}

impl EventSender {
    /// Publish an event; returns the number of subscribers that received it
    pub fn publish(&self, event: impl Into<MatchEvent>) -> usize {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let envelope = EventEnvelope::new(event.into(), sequence, self.source);
        match self.sender.send(envelope) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!(target: "events", "Event {} published with no subscribers", sequence);
                0
            }
        }
    }

    pub fn source(&self) -> EventSource {
        self.source
    }
}

/// Central event bus that manages event distribution
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new(capacity: usize) -> (Self, broadcast::Receiver<EventEnvelope>) {
        let (sender, receiver) = broadcast::channel(capacity);
        let bus = EventBus {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        };
        (bus, receiver)
    }

    pub fn create_sender(&self, source: EventSource) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
            sequence: Arc::clone(&self.sequence),
            source,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

// ============================================================================
// Event Consumers
// ============================================================================

/// Trait for components that react to lifecycle events
pub trait EventConsumer: Send + 'static {
    fn handle_event(&mut self, envelope: EventEnvelope);
}

/// Simple consumer that logs every event
#[derive(Debug, Default)]
pub struct LoggingConsumer;

impl EventConsumer for LoggingConsumer {
    fn handle_event(&mut self, envelope: EventEnvelope) {
        match &envelope.event {
            MatchEvent::CountdownTick(tick) => {
                debug!(target: "events", "{}: {}s remaining", tick.match_id(), tick.seconds_remaining());
            }
            MatchEvent::Prestart(e) => {
                let teams: Vec<&str> = e.teams().iter().map(|t| t.name.as_str()).collect();
                info!(target: "events", "{}: PRESTART teams={:?}", e.match_id(), teams);
            }
            MatchEvent::Start(e) => {
                info!(target: "events", "{}: START", e.match_id());
            }
            MatchEvent::Victory(e) => {
                let winners: Vec<&str> = e.winners().iter().map(|t| t.name.as_str()).collect();
                info!(target: "events", "{}: VICTORY winners={:?}", e.match_id(), winners);
            }
            MatchEvent::Completed(e) => {
                info!(target: "events", "{}: COMPLETED", e.match_id());
            }
            MatchEvent::Cancelled(e) => {
                warn!(target: "events", "{}: CANCELLED ({})", e.match_id(), e.reason());
            }
        }
    }
}

/// Drain a receiver into a consumer until every sender is gone
pub async fn run_consumer<C: EventConsumer>(
    mut receiver: broadcast::Receiver<EventEnvelope>,
    mut consumer: C,
) -> C {
    loop {
        match receiver.recv().await {
            Ok(envelope) => consumer.handle_event(envelope),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(target: "events", "Event consumer lagged, skipped {} event(s)", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    consumer
}
