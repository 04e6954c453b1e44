//! Session event stream.
//!
//! A `RobotSession` publishes every state change, report and persistence
//! result here. Observers never mutate the session; they only watch it.
//! The console uses the stream to print each failed save or history read
//! exactly once, even when two failures carry the same message.

use tokio::sync::broadcast;
use tracing::debug;
use toyrobot_domain::{DomainError, HistoryRecord, RobotState};

// =============================================================================
// Event Types
// =============================================================================

/// Events published by a robot session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A mutation replaced the current robot state
    RobotChanged {
        previous: Option<RobotState>,
        current: RobotState,
    },

    /// The startup fetch adopted a persisted state
    Restored(RobotState),

    /// A placement was rejected before any state change
    Rejected(DomainError),

    /// A report string was produced
    Reported(String),

    /// A state was appended to the history
    Persisted(HistoryRecord),

    /// Persisting a state failed; local state was kept
    PersistFailed { state: RobotState, message: String },

    /// Reading the history failed
    HistoryFailed(String),
}

impl SessionEvent {
    /// User-facing message of a failed store call, if this is one.
    pub fn store_failure(&self) -> Option<&str> {
        match self {
            SessionEvent::PersistFailed { message, .. } | SessionEvent::HistoryFailed(message) => {
                Some(message)
            },
            _ => None,
        }
    }
}

// =============================================================================
// Event Bus
// =============================================================================

/// Fan-out of session events to any number of observers.
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Events buffered per observer before the oldest are dropped.
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event. Returns how many observers will see it.
    pub fn send(&self, event: SessionEvent) -> usize {
        // A session with nobody watching is normal
        self.sender.send(event).unwrap_or(0)
    }

    /// Observe events published from now on.
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// One observer's view of a session's events.
pub struct EventReceiver {
    receiver: broadcast::Receiver<SessionEvent>,
}

impl EventReceiver {
    /// Wait for the next event.
    ///
    /// `None` once the session is gone. `Some(Err(_))` when this observer
    /// fell behind and older events were dropped.
    pub async fn recv(&mut self) -> Option<Result<SessionEvent, String>> {
        match self.receiver.recv().await {
            Ok(event) => Some(Ok(event)),
            Err(broadcast::error::RecvError::Closed) => None,
            Err(broadcast::error::RecvError::Lagged(count)) => Some(Err(lagged(count))),
        }
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<Result<SessionEvent, String>> {
        match self.receiver.try_recv() {
            Ok(event) => Some(Ok(event)),
            Err(broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed) => None,
            Err(broadcast::error::TryRecvError::Lagged(count)) => Some(Err(lagged(count))),
        }
    }

    /// Take every queued event, skipping over any gap left by lagging.
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Some(next) = self.try_recv() {
            match next {
                Ok(event) => events.push(event),
                Err(gap) => debug!(%gap, "Session observer fell behind"),
            }
        }
        events
    }
}

fn lagged(count: u64) -> String {
    format!("Observer lagged, missed {} events", count)
}

// =============================================================================
// Tests
// =============================================================================
