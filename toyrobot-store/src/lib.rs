//! Toy Robot Storage Layer
//!
//! Provides persistence for the robot state history.
//!
//! # Architecture
//!
//! - **Repository trait**: `RobotRepository`, the storage port
//! - **In-memory store**: Fast implementation for testing
//! - **PostgreSQL store**: Production implementation (feature `postgres`)
//!
//! # Usage
//!
//! ```rust
//! use toyrobot_store::{HistoryQuery, MemoryStore, RobotRepository};
//! use toyrobot_domain::RobotState;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryStore::new();
//!
//!     // Append a state to the history
//!     let state = RobotState::place(2, 3).unwrap();
//!     let record = store.save_state(&state).await.unwrap();
//!     assert_eq!(record.id.0, 1);
//!
//!     // Read it back
//!     let current = store.fetch_current().await.unwrap();
//!     assert_eq!(current, Some(state));
//!
//!     let history = store.fetch_history(HistoryQuery::all()).await.unwrap();
//!     println!("History records: {}", history.len());
//! }
//! ```

#![warn(clippy::all)]

// Modules
mod error;
mod memory;
#[cfg(feature = "postgres")]
mod postgres;
mod repository;

// Re-exports
pub use error::StoreError;
pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PgRobotStore;
pub use repository::{HistoryQuery, RobotRepository};
