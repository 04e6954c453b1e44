//! Toy Robot Session
//!
//! Controller for a single robot: applies intents through the grid model,
//! keeps the current state authoritative locally, and persists every
//! accepted mutation without making the caller wait.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use toyrobot_session::RobotSession;
//! use toyrobot_store::MemoryStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = Arc::new(MemoryStore::new());
//! let session = RobotSession::start(store.clone());
//!
//! session.place(2, 3);
//! session.move_robot();
//! assert_eq!(session.report().as_deref(), Some("2,4,NORTH"));
//!
//! session.flush().await;
//! assert_eq!(store.record_count(), 2);
//! # }
//! ```

#![warn(clippy::all)]

pub mod events;
pub mod session;

pub use events::{EventBus, EventReceiver, SessionEvent};
pub use session::{
    Outcome, RobotSession, SessionId, SessionSnapshot, HISTORY_FAILED_FALLBACK,
    SAVE_FAILED_FALLBACK,
};
