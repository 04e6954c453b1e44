//! Robot Session: owns the current robot and orchestrates persistence.
//!
//! The session is responsible for:
//! - Holding the single current robot state (or none)
//! - Applying intents through the pure grid model
//! - Persisting every accepted mutation in the background
//! - Exposing the last error and last report for observers
//!
//! # Ordering
//!
//! ```text
//! intent → grid model → replace local state → spawn save → (later) lastError
//! ```
//!
//! Local state is authoritative: a failed save sets `last_error` but never
//! rolls the state back. Saves issued in quick succession may complete in
//! any order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use uuid::Uuid;

use toyrobot_domain::{format_report, Command, DomainError, HistoryRecord, RobotState};
use toyrobot_store::{HistoryQuery, RobotRepository};

use crate::events::{EventBus, EventReceiver, SessionEvent};

/// Last error after a failed save with no collaborator message
pub const SAVE_FAILED_FALLBACK: &str = "Error saving robot state";

/// Last error after a failed history read with no collaborator message
pub const HISTORY_FAILED_FALLBACK: &str = "Failed to fetch robot history";

/// Identifier used to correlate a session's log lines
pub type SessionId = Uuid;

// =============================================================================
// Observations
// =============================================================================

/// Point-in-time copy of everything a session exposes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Current robot, `None` until placed or restored
    pub robot: Option<RobotState>,
    /// Last error message, empty when none
    pub last_error: String,
    /// Last report string, empty when none
    pub last_report: String,
}

/// Result of issuing an intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The intent was carried out; holds the resulting current state
    Applied(RobotState),
    /// Invalid placement, surfaced through `last_error`
    Rejected(DomainError),
    /// Nothing happened: no robot placed, or a move off the grid
    Ignored,
}

impl Outcome {
    /// Whether the intent was carried out
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }
}

fn lock(state: &Mutex<SessionSnapshot>) -> MutexGuard<'_, SessionSnapshot> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Robot Session
// =============================================================================

/// Controller for one robot.
///
/// Sessions are independent: each owns its state, and only the storage
/// collaborator may be shared. Mutations spawn their save on the current
/// Tokio runtime, so a session must be driven from inside one.
pub struct RobotSession<S: RobotRepository + 'static> {
    /// Log correlation id
    id: SessionId,
    /// Storage collaborator
    store: Arc<S>,
    /// Current robot plus transient observations
    state: Arc<Mutex<SessionSnapshot>>,
    /// Set once the startup fetch has been issued
    initialized: AtomicBool,
    /// In-flight persistence tasks
    tasks: TaskTracker,
    /// Observer notifications
    events: Arc<EventBus>,
}

impl<S: RobotRepository + 'static> RobotSession<S> {
    /// Create a session with no robot placed.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_event_bus(store, Arc::new(EventBus::default()))
    }

    /// Create a session publishing to an existing event bus.
    pub fn with_event_bus(store: Arc<S>, events: Arc<EventBus>) -> Self {
        let id = Uuid::now_v7();
        debug!(session_id = %id, "Created robot session");
        Self {
            id,
            store,
            state: Arc::new(Mutex::new(SessionSnapshot::default())),
            initialized: AtomicBool::new(false),
            tasks: TaskTracker::new(),
            events,
        }
    }

    /// Create a session and issue the startup fetch.
    pub fn start(store: Arc<S>) -> Self {
        let session = Self::new(store);
        session.initialize();
        session
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Log correlation id
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current robot, if placed
    pub fn robot(&self) -> Option<RobotState> {
        lock(&self.state).robot
    }

    /// Last error, empty when none
    pub fn last_error(&self) -> String {
        lock(&self.state).last_error.clone()
    }

    /// Last report, empty when none
    pub fn last_report(&self) -> String {
        lock(&self.state).last_report.clone()
    }

    /// Copy of the whole observable state
    pub fn snapshot(&self) -> SessionSnapshot {
        lock(&self.state).clone()
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Number of persistence tasks still running
    pub fn pending_saves(&self) -> usize {
        self.tasks.len()
    }

    /// Wait until every background task issued so far has finished.
    ///
    /// Not meant to be called from several places at once.
    pub async fn flush(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Fetch the latest persisted robot once and adopt it.
    ///
    /// Later calls are suppressed and return `false`. The fetched state is
    /// only adopted if no robot has been placed locally in the meantime.
    /// A failed fetch is logged and otherwise ignored.
    pub fn initialize(&self) -> bool {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!(session_id = %self.id, "Initial fetch already issued");
            return false;
        }

        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);
        let events = Arc::clone(&self.events);
        let session_id = self.id;

        self.tasks.spawn(async move {
            match store.fetch_current().await {
                Ok(Some(robot)) => {
                    let adopted = {
                        let mut s = lock(&state);
                        if s.robot.is_none() {
                            s.robot = Some(robot);
                            s.last_error.clear();
                            true
                        } else {
                            false
                        }
                    };
                    if adopted {
                        info!(%session_id, robot = %robot, "Restored robot from history");
                        events.send(SessionEvent::Restored(robot));
                    } else {
                        debug!(%session_id, "Robot placed before restore completed; keeping local state");
                    }
                },
                Ok(None) => {
                    {
                        let mut s = lock(&state);
                        if s.robot.is_none() {
                            s.last_error.clear();
                        }
                    }
                    info!(%session_id, "No persisted robot to restore");
                },
                Err(e) => {
                    warn!(%session_id, error = %e, "Failed to fetch current robot; starting without one");
                },
            }
        });

        true
    }

    // =========================================================================
    // Intents
    // =========================================================================

    /// Place the robot at `(x, y)` facing NORTH.
    ///
    /// An off-grid placement sets `last_error` and changes nothing else.
    pub fn place(&self, x: i32, y: i32) -> Outcome {
        match RobotState::place(x, y) {
            Ok(robot) => self.transition(|_| Some(robot)),
            Err(e) => {
                debug!(session_id = %self.id, x, y, "Placement rejected");
                lock(&self.state).last_error = e.to_string();
                self.events.send(SessionEvent::Rejected(e.clone()));
                Outcome::Rejected(e)
            },
        }
    }

    /// Step one cell forward.
    ///
    /// A step that would leave the grid is silently ignored.
    pub fn move_robot(&self) -> Outcome {
        self.transition(|current| {
            let Some(current) = current else {
                return None;
            };
            let next = current.moved();
            if next.is_none() {
                debug!(robot = %current, "Move would leave the grid; ignoring");
            }
            next
        })
    }

    /// Quarter turn counter-clockwise.
    pub fn turn_left(&self) -> Outcome {
        self.transition(|current| current.map(|r| r.turned_left()))
    }

    /// Quarter turn clockwise.
    pub fn turn_right(&self) -> Outcome {
        self.transition(|current| current.map(|r| r.turned_right()))
    }

    /// Set `last_report` to `x,y,DIRECTION`.
    ///
    /// Returns the report, or `None` (leaving `last_report` untouched)
    /// when no robot is placed. Nothing is persisted.
    pub fn report(&self) -> Option<String> {
        let report = {
            let mut s = lock(&self.state);
            let robot = s.robot?;
            let report = format_report(&robot);
            s.last_report = report.clone();
            report
        };
        self.events.send(SessionEvent::Reported(report.clone()));
        Some(report)
    }

    /// Reset `last_report` to empty.
    pub fn clear_report(&self) {
        lock(&self.state).last_report.clear();
    }

    /// Reset `last_error` to empty.
    pub fn clear_error(&self) {
        lock(&self.state).last_error.clear();
    }

    /// Dispatch a parsed command.
    pub fn execute(&self, command: Command) -> Outcome {
        debug!(session_id = %self.id, %command, "Executing command");
        match command {
            Command::Place { x, y } => self.place(x, y),
            Command::Move => self.move_robot(),
            Command::Left => self.turn_left(),
            Command::Right => self.turn_right(),
            Command::Report => match (self.report(), self.robot()) {
                (Some(_), Some(robot)) => Outcome::Applied(robot),
                _ => Outcome::Ignored,
            },
        }
    }

    /// Read the persisted history.
    ///
    /// A failed read sets `last_error` and yields an empty list.
    pub async fn history(&self, query: HistoryQuery) -> Vec<HistoryRecord> {
        match self.store.fetch_history(query).await {
            Ok(records) => records,
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Failed to fetch robot history");
                let message = e.user_message().unwrap_or_else(|| HISTORY_FAILED_FALLBACK.to_string());
                lock(&self.state).last_error = message.clone();
                self.events.send(SessionEvent::HistoryFailed(message));
                Vec::new()
            },
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Replace the current robot with `next(current)`, if it yields a state.
    ///
    /// The replacement, the report reset and the save dispatch happen in
    /// that order; the caller never waits for the save.
    fn transition<F>(&self, next: F) -> Outcome
    where
        F: FnOnce(Option<&RobotState>) -> Option<RobotState>,
    {
        let (previous, current) = {
            let mut s = lock(&self.state);
            let Some(current) = next(s.robot.as_ref()) else {
                return Outcome::Ignored;
            };
            let previous = s.robot.replace(current);
            s.last_report.clear();
            (previous, current)
        };

        debug!(session_id = %self.id, robot = %current, "Robot state changed");
        self.events.send(SessionEvent::RobotChanged { previous, current });
        self.persist(current);

        Outcome::Applied(current)
    }

    /// Append `robot` to the history in the background.
    fn persist(&self, robot: RobotState) {
        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);
        let events = Arc::clone(&self.events);
        let session_id = self.id;

        self.tasks.spawn(async move {
            match store.save_state(&robot).await {
                Ok(record) => {
                    debug!(%session_id, id = %record.id, "Persisted robot state");
                    lock(&state).last_error.clear();
                    events.send(SessionEvent::Persisted(record));
                },
                Err(e) => {
                    let message =
                        e.user_message().unwrap_or_else(|| SAVE_FAILED_FALLBACK.to_string());
                    warn!(%session_id, robot = %robot, error = %e, "Failed to persist robot state");
                    lock(&state).last_error = message.clone();
                    events.send(SessionEvent::PersistFailed { state: robot, message });
                },
            }
        });
    }
}

// =============================================================================
// Tests
// =============================================================================
