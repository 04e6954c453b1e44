//! Toy Robot Persistence API Client
//!
//! Adapter implementing the storage port over the HTTP persistence API.
//! Normalizes wire shapes (empty-object "no robot", error bodies) to
//! domain types and `StoreError`s at the boundary.

#![warn(clippy::all)]

// Public modules
pub mod http_store;
pub mod wire;

// Re-exports
pub use http_store::{ClientConfig, HttpRobotStore};
pub use wire::{CurrentRobot, ErrorBody};
