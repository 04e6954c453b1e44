//! Domain Entities for the Toy Robot
//!
//! `RobotState` is the aggregate the session controller holds; `HistoryRecord`
//! is the persisted, identifier-tagged snapshot of one.

use crate::grid::{is_valid_position, next_position, turn_left, turn_right};
use crate::value_objects::{Direction, DomainError, Position};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Record ID
// =============================================================================

/// Storage-assigned identifier of a history record
///
/// Monotonically increasing in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// RobotState
// =============================================================================

/// Position and heading of a placed robot
///
/// # Invariants
/// - Position is always on the grid
/// - Values are never mutated; every transition returns a new state
///
/// Serializes as `{"x": 2, "y": 3, "direction": "NORTH"}`. Deserialization
/// goes through the same bounds check as [`RobotState::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRobotState", into = "RawRobotState")]
pub struct RobotState {
    position: Position,
    direction: Direction,
}

/// Unchecked wire shape of a `RobotState`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawRobotState {
    x: i32,
    y: i32,
    direction: Direction,
}

impl RobotState {
    /// Direction every newly placed robot faces
    pub const PLACEMENT_DIRECTION: Direction = Direction::North;

    /// Create a state at `(x, y)` facing `direction`
    ///
    /// # Errors
    /// Returns `DomainError::OutOfBounds` if `(x, y)` is off the grid
    pub fn new(x: i32, y: i32, direction: Direction) -> Result<Self, DomainError> {
        if !is_valid_position(x, y) {
            return Err(DomainError::OutOfBounds { x, y });
        }
        Ok(Self {
            position: Position::new(x, y),
            direction,
        })
    }

    /// Place a robot at `(x, y)`, always facing NORTH
    ///
    /// # Errors
    /// Returns `DomainError::OutOfBounds` if `(x, y)` is off the grid
    pub fn place(x: i32, y: i32) -> Result<Self, DomainError> {
        Self::new(x, y, Self::PLACEMENT_DIRECTION)
    }

    /// Current position
    pub fn position(&self) -> Position {
        self.position
    }

    /// Column
    pub fn x(&self) -> i32 {
        self.position.x
    }

    /// Row
    pub fn y(&self) -> i32 {
        self.position.y
    }

    /// Current heading
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// State after one step forward, or `None` if the step leaves the grid
    pub fn moved(&self) -> Option<Self> {
        let next = next_position(self.position, self.direction);
        next.is_on_grid().then_some(Self {
            position: next,
            direction: self.direction,
        })
    }

    /// State after a counter-clockwise quarter turn
    pub fn turned_left(&self) -> Self {
        Self {
            position: self.position,
            direction: turn_left(self.direction),
        }
    }

    /// State after a clockwise quarter turn
    pub fn turned_right(&self) -> Self {
        Self {
            position: self.position,
            direction: turn_right(self.direction),
        }
    }
}

impl TryFrom<RawRobotState> for RobotState {
    type Error = DomainError;

    fn try_from(raw: RawRobotState) -> Result<Self, Self::Error> {
        Self::new(raw.x, raw.y, raw.direction)
    }
}

impl From<RobotState> for RawRobotState {
    fn from(state: RobotState) -> Self {
        Self {
            x: state.position.x,
            y: state.position.y,
            direction: state.direction,
        }
    }
}

impl fmt::Display for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.position, self.direction)
    }
}

// =============================================================================
// HistoryRecord
// =============================================================================

/// Persisted snapshot of a robot state
///
/// Immutable once created. Serializes as
/// `{"id": 7, "x": 2, "y": 3, "direction": "NORTH", "createdAt": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Storage-assigned identifier
    pub id: RecordId,
    /// Snapshot of the robot
    #[serde(flatten)]
    pub state: RobotState,
    /// When the record was stored
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Create a record
    pub fn new(id: RecordId, state: RobotState, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            state,
            created_at,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_bounds() {
        assert!(RobotState::new(0, 0, Direction::East).is_ok());
        assert!(RobotState::new(4, 4, Direction::West).is_ok());
        assert_eq!(
            RobotState::new(5, 5, Direction::North),
            Err(DomainError::OutOfBounds { x: 5, y: 5 })
        );
        assert!(RobotState::new(-1, 0, Direction::North).is_err());
    }

    #[test]
    fn test_place_faces_north() {
        let state = RobotState::place(2, 3).unwrap();
        assert_eq!(state.x(), 2);
        assert_eq!(state.y(), 3);
        assert_eq!(state.direction(), Direction::North);
    }

    #[test]
    fn test_moved_inside_grid() {
        let state = RobotState::new(1, 1, Direction::East).unwrap();
        let moved = state.moved().unwrap();
        assert_eq!(moved.position(), Position::new(2, 1));
        assert_eq!(moved.direction(), Direction::East);
        // Original value is untouched
        assert_eq!(state.position(), Position::new(1, 1));
    }

    #[test]
    fn test_moved_off_grid_is_none() {
        assert!(RobotState::new(2, 4, Direction::North).unwrap().moved().is_none());
        assert!(RobotState::new(0, 2, Direction::West).unwrap().moved().is_none());
        assert!(RobotState::new(4, 2, Direction::East).unwrap().moved().is_none());
        assert!(RobotState::new(3, 0, Direction::South).unwrap().moved().is_none());
    }

    #[test]
    fn test_turns_keep_position() {
        let state = RobotState::place(0, 0).unwrap();
        let left = state.turned_left();
        assert_eq!(left.direction(), Direction::West);
        assert_eq!(left.turned_left().direction(), Direction::South);
        assert_eq!(state.turned_right().direction(), Direction::East);
        assert_eq!(left.position(), state.position());
    }

    #[test]
    fn test_robot_state_wire_shape() {
        let state = RobotState::place(2, 3).unwrap();
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(json, serde_json::json!({"x": 2, "y": 3, "direction": "NORTH"}));
    }

    #[test]
    fn test_robot_state_deserialize_rejects_off_grid() {
        let result = serde_json::from_str::<RobotState>(r#"{"x": 7, "y": 0, "direction": "EAST"}"#);
        assert!(result.is_err());

        let ok = serde_json::from_str::<RobotState>(r#"{"x": 4, "y": 0, "direction": "EAST"}"#);
        assert_eq!(ok.unwrap(), RobotState::new(4, 0, Direction::East).unwrap());
    }

    #[test]
    fn test_history_record_wire_shape() {
        let created_at = "2024-05-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let record =
            HistoryRecord::new(RecordId(7), RobotState::new(1, 2, Direction::West).unwrap(), created_at);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["x"], 1);
        assert_eq!(json["y"], 2);
        assert_eq!(json["direction"], "WEST");
        assert_eq!(json["createdAt"], "2024-05-01T10:00:00Z");

        let parsed: HistoryRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, record);
    }
}
