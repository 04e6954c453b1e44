//! Robot commands
//!
//! Textual command set accepted by interactive drivers:
//! `PLACE x,y`, `MOVE`, `LEFT`, `RIGHT`, `REPORT` (case-insensitive).

use crate::value_objects::DomainError;
use std::fmt;
use std::str::FromStr;

/// A single user intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Place the robot at `(x, y)` facing NORTH
    Place {
        /// Column
        x: i32,
        /// Row
        y: i32,
    },
    /// Step forward one cell
    Move,
    /// Quarter turn counter-clockwise
    Left,
    /// Quarter turn clockwise
    Right,
    /// Produce the `x,y,DIRECTION` report
    Report,
}

impl Command {
    /// Whether the command changes robot state (and is therefore persisted)
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Command::Report)
    }
}

impl FromStr for Command {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        let (verb, args) = match line.split_once(char::is_whitespace) {
            Some((verb, args)) => (verb, args.trim()),
            None => (line, ""),
        };

        let command = match verb.to_uppercase().as_str() {
            "PLACE" => {
                let (x, y) = args.split_once(',').ok_or_else(|| {
                    DomainError::InvalidCommand(format!("PLACE expects x,y: {}", line))
                })?;
                let x = x
                    .trim()
                    .parse()
                    .map_err(|_| DomainError::InvalidCommand(format!("invalid x: {}", x.trim())))?;
                let y = y
                    .trim()
                    .parse()
                    .map_err(|_| DomainError::InvalidCommand(format!("invalid y: {}", y.trim())))?;
                return Ok(Command::Place { x, y });
            },
            "MOVE" => Command::Move,
            "LEFT" => Command::Left,
            "RIGHT" => Command::Right,
            "REPORT" => Command::Report,
            "" => return Err(DomainError::InvalidCommand("empty command".to_string())),
            other => return Err(DomainError::InvalidCommand(format!("unknown command: {}", other))),
        };

        if !args.is_empty() {
            return Err(DomainError::InvalidCommand(format!(
                "{} takes no arguments: {}",
                command, line
            )));
        }
        Ok(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Place { x, y } => write!(f, "PLACE {},{}", x, y),
            Command::Move => write!(f, "MOVE"),
            Command::Left => write!(f, "LEFT"),
            Command::Right => write!(f, "RIGHT"),
            Command::Report => write!(f, "REPORT"),
        }
    }
}
