//! Toy Robot Domain Layer
//!
//! Pure grid model with zero I/O dependencies.
//! Contains the robot state, the grid rules, and the command set.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod command;
pub mod entities;
pub mod grid;
pub mod value_objects;

// Re-export commonly used types
pub use command::Command;
pub use entities::{HistoryRecord, RecordId, RobotState};
pub use grid::{
    format_report, is_valid_position, next_position, parse_report, turn_left, turn_right,
    GRID_MAX, GRID_MIN,
};
pub use value_objects::{Direction, DomainError, Position};
