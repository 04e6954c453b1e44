//! Grid Rules (Pure Functions)
//!
//! Bounds checking, stepping, turning and report formatting on the 5x5 grid.
//! All functions are deterministic and have no side effects.
//!
//! ```text
//!   y
//!   4 . . . . .
//!   3 . . . . .
//!   2 . . . . .
//!   1 . . . . .
//!   0 . . . . .
//!     0 1 2 3 4  x
//! ```

use crate::entities::RobotState;
use crate::value_objects::{Direction, DomainError, Position};

/// Smallest valid coordinate on either axis
pub const GRID_MIN: i32 = 0;

/// Largest valid coordinate on either axis
pub const GRID_MAX: i32 = 4;

/// Counter-clockwise turn order: NORTH → WEST → SOUTH → EAST → NORTH
pub const LEFT_CYCLE: [Direction; 4] =
    [Direction::North, Direction::West, Direction::South, Direction::East];

/// Clockwise turn order: NORTH → EAST → SOUTH → WEST → NORTH
pub const RIGHT_CYCLE: [Direction; 4] =
    [Direction::North, Direction::East, Direction::South, Direction::West];

/// Whether `(x, y)` lies inside the grid (both bounds inclusive)
///
/// # Examples
/// ```
/// # use toyrobot_domain::grid::is_valid_position;
/// assert!(is_valid_position(0, 0));
/// assert!(is_valid_position(4, 4));
/// assert!(!is_valid_position(5, 5));
/// assert!(!is_valid_position(-1, 2));
/// ```
pub fn is_valid_position(x: i32, y: i32) -> bool {
    (GRID_MIN..=GRID_MAX).contains(&x) && (GRID_MIN..=GRID_MAX).contains(&y)
}

/// Position one step ahead in `direction`
///
/// The result is not bounds-checked; callers validate it before committing.
/// Coordinates saturate at the `i32` limits instead of wrapping.
pub fn next_position(position: Position, direction: Direction) -> Position {
    let (dx, dy) = direction.offset();
    Position::new(position.x.saturating_add(dx), position.y.saturating_add(dy))
}

/// Direction after a 90° counter-clockwise turn
pub fn turn_left(direction: Direction) -> Direction {
    successor(&LEFT_CYCLE, direction)
}

/// Direction after a 90° clockwise turn
pub fn turn_right(direction: Direction) -> Direction {
    successor(&RIGHT_CYCLE, direction)
}

fn successor(cycle: &[Direction; 4], direction: Direction) -> Direction {
    // Every direction occurs exactly once in each cycle.
    cycle
        .iter()
        .position(|d| *d == direction)
        .map_or(direction, |i| cycle[(i + 1) % cycle.len()])
}

/// Canonical report string: `"{x},{y},{DIRECTION}"`
///
/// # Examples
/// ```
/// # use toyrobot_domain::grid::format_report;
/// # use toyrobot_domain::{Direction, RobotState};
/// let state = RobotState::new(3, 1, Direction::South).unwrap();
/// assert_eq!(format_report(&state), "3,1,SOUTH");
/// ```
pub fn format_report(state: &RobotState) -> String {
    format!("{},{},{}", state.x(), state.y(), state.direction())
}

/// Parse a report string back into a robot state
///
/// Requires exactly three comma-delimited fields with on-grid integer
/// coordinates and a known direction name.
///
/// # Errors
/// Returns `DomainError::InvalidReport` for a malformed string and
/// `DomainError::OutOfBounds` for coordinates outside the grid.
pub fn parse_report(report: &str) -> Result<RobotState, DomainError> {
    let fields: Vec<&str> = report.split(',').collect();
    let [x, y, direction] = fields.as_slice() else {
        return Err(DomainError::InvalidReport(format!(
            "expected 3 fields, got {}: {}",
            fields.len(),
            report
        )));
    };

    let x: i32 = x
        .trim()
        .parse()
        .map_err(|_| DomainError::InvalidReport(format!("invalid x coordinate: {}", x)))?;
    let y: i32 = y
        .trim()
        .parse()
        .map_err(|_| DomainError::InvalidReport(format!("invalid y coordinate: {}", y)))?;
    let direction: Direction = direction.parse()?;

    RobotState::new(x, y, direction)
}

// =============================================================================
// Tests
// =============================================================================
