//! Toy Robot Daemon Library
//!
//! Persistence API for robot state history, plus an interactive console
//! that drives a robot session against it.
//!
//! # Architecture
//!
//! ```text
//! Console → RobotSession → HttpRobotStore ──HTTP──→ API Server → RobotRepository
//!                                                                   (memory | postgres)
//! ```
//!
//! # Components
//!
//! - **Daemon**: API server lifecycle and graceful shutdown
//! - **API**: HTTP endpoints and request validation
//! - **Console**: Line-oriented driver for a session
//! - **Config**: Environment-based configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use toyrobotd::{Config, Daemon};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().expect("Failed to load config");
//!     let daemon = Daemon::new_memory(config);
//!     daemon.run().await.expect("Daemon error");
//! }
//! ```

#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod console;
pub mod daemon;
pub mod error;

// Re-exports for convenience
pub use api::{create_router, ApiState, ErrorMessage, ErrorResponse};
pub use config::{ApiConfig, Config, Environment, StoreConfig, StoreKind};
pub use console::{parse_line, run_console, ConsoleCommand};
pub use daemon::Daemon;
pub use error::{DaemonError, DaemonResult};
