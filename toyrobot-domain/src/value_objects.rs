//! Value Objects for the Toy Robot Domain
//!
//! Immutable domain primitives: compass directions and grid coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Domain errors for value object validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Position lies outside the 5x5 grid
    #[error("Position is out of bounds")]
    OutOfBounds {
        /// Rejected x coordinate
        x: i32,
        /// Rejected y coordinate
        y: i32,
    },

    /// Direction is not one of NORTH, SOUTH, EAST, WEST
    #[error("Invalid direction: {0}")]
    InvalidDirection(String),

    /// Report string does not have the `x,y,DIRECTION` shape
    #[error("Invalid report: {0}")]
    InvalidReport(String),

    /// Command text could not be parsed
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

// =============================================================================
// Direction
// =============================================================================

/// Direction the robot is facing
///
/// NORTH is "up" (positive y), EAST is "right" (positive x).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Facing up (positive y)
    North,
    /// Facing down (negative y)
    South,
    /// Facing right (positive x)
    East,
    /// Facing left (negative x)
    West,
}

impl Direction {
    /// All four directions, in declaration order
    pub const ALL: [Direction; 4] =
        [Direction::North, Direction::South, Direction::East, Direction::West];

    /// Unit step `(dx, dy)` taken when moving in this direction
    pub fn offset(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::South => (0, -1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    /// Upper-case wire name (e.g., "NORTH")
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::North => "NORTH",
            Direction::South => "SOUTH",
            Direction::East => "EAST",
            Direction::West => "WEST",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NORTH" => Ok(Direction::North),
            "SOUTH" => Ok(Direction::South),
            "EAST" => Ok(Direction::East),
            "WEST" => Ok(Direction::West),
            _ => Err(DomainError::InvalidDirection(s.to_string())),
        }
    }
}

// =============================================================================
// Position
// =============================================================================

/// Coordinate pair on (or next to) the grid
///
/// A `Position` is not bounds-checked; it can describe an off-grid
/// candidate produced by a step. `RobotState` is what carries the
/// on-grid guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Column, 0 is the left edge
    pub x: i32,
    /// Row, 0 is the bottom edge
    pub y: i32,
}

impl Position {
    /// Create a position from raw coordinates
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether this position lies inside the grid
    pub fn is_on_grid(&self) -> bool {
        crate::grid::is_valid_position(self.x, self.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_offsets() {
        assert_eq!(Direction::North.offset(), (0, 1));
        assert_eq!(Direction::South.offset(), (0, -1));
        assert_eq!(Direction::East.offset(), (1, 0));
        assert_eq!(Direction::West.offset(), (-1, 0));
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::North.to_string(), "NORTH");
        assert_eq!(Direction::West.to_string(), "WEST");
    }

    #[test]
    fn test_direction_from_str() {
        assert_eq!("NORTH".parse::<Direction>().unwrap(), Direction::North);
        assert_eq!("east".parse::<Direction>().unwrap(), Direction::East);
        assert_eq!(" South ".parse::<Direction>().unwrap(), Direction::South);
        assert!("UP".parse::<Direction>().is_err());
        assert!("".parse::<Direction>().is_err());
    }

    #[test]
    fn test_direction_serde_uses_upper_case_names() {
        let json = serde_json::to_string(&Direction::South).unwrap();
        assert_eq!(json, "\"SOUTH\"");

        let parsed: Direction = serde_json::from_str("\"WEST\"").unwrap();
        assert_eq!(parsed, Direction::West);

        assert!(serde_json::from_str::<Direction>("\"West\"").is_err());
    }

    #[test]
    fn test_position_on_grid() {
        assert!(Position::new(0, 0).is_on_grid());
        assert!(Position::new(4, 4).is_on_grid());
        assert!(!Position::new(5, 0).is_on_grid());
        assert!(!Position::new(0, -1).is_on_grid());
    }

    #[test]
    fn test_out_of_bounds_message() {
        let err = DomainError::OutOfBounds { x: 5, y: 5 };
        assert_eq!(err.to_string(), "Position is out of bounds");
    }
}
