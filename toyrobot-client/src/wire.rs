//! Wire shapes of the persistence API.

use serde::Deserialize;
use serde_json::{Map, Value};
use toyrobot_domain::RobotState;

/// Body of `GET /robot/current`
///
/// The API answers `{}` when no robot was ever saved. That convention is
/// translated into an explicit `Option` here, at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentRobot(pub Option<RobotState>);

impl CurrentRobot {
    /// Parse a response body.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let object: Map<String, Value> = serde_json::from_str(body)?;
        if object.is_empty() {
            return Ok(Self(None));
        }
        let state = serde_json::from_value(Value::Object(object))?;
        Ok(Self(Some(state)))
    }
}

/// Error body returned by the API on a non-2xx status
///
/// `message` may be a string or a list of strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message(s)
    #[serde(default)]
    pub message: Option<Value>,
}

impl ErrorBody {
    /// The body's message, if it carries a non-empty one.
    ///
    /// Validation failures arrive as an array; its non-empty entries are
    /// joined with `,`.
    pub fn message(&self) -> Option<String> {
        match self.message.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Array(items) => {
                let joined = items
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|s| !s.trim().is_empty())
                    .collect::<Vec<_>>()
                    .join(",");
                (!joined.is_empty()).then_some(joined)
            },
            _ => None,
        }
    }

    /// Extract the message from a raw body, tolerating non-JSON bodies.
    pub fn message_from(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(body).ok()?.message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toyrobot_domain::Direction;

    #[test]
    fn test_empty_object_is_no_robot() {
        assert_eq!(CurrentRobot::from_json("{}").unwrap(), CurrentRobot(None));
    }

    #[test]
    fn test_record_body_is_robot() {
        let body = r#"{"id": 3, "x": 1, "y": 2, "direction": "EAST", "createdAt": "2024-05-01T10:00:00Z"}"#;
        let current = CurrentRobot::from_json(body).unwrap();
        assert_eq!(current, CurrentRobot(Some(RobotState::new(1, 2, Direction::East).unwrap())));
    }

    #[test]
    fn test_invalid_record_is_an_error_not_absent() {
        assert!(CurrentRobot::from_json(r#"{"x": 9, "y": 2, "direction": "EAST"}"#).is_err());
        assert!(CurrentRobot::from_json(r#"{"unexpected": true}"#).is_err());
        assert!(CurrentRobot::from_json("null").is_err());
    }

    #[test]
    fn test_error_message_string() {
        assert_eq!(
            ErrorBody::message_from(r#"{"statusCode": 400, "message": "x must not be greater than 4"}"#),
            Some("x must not be greater than 4".to_string())
        );
    }

    #[test]
    fn test_error_message_array() {
        assert_eq!(
            ErrorBody::message_from(r#"{"message": ["", "y must not be less than 0"]}"#),
            Some("y must not be less than 0".to_string())
        );
        assert_eq!(
            ErrorBody::message_from(
                r#"{"message": ["x must not be less than 0", "y must not be greater than 4"]}"#
            ),
            Some("x must not be less than 0,y must not be greater than 4".to_string())
        );
        assert_eq!(ErrorBody::message_from(r#"{"message": ["", " "]}"#), None);
    }

    #[test]
    fn test_error_message_missing() {
        assert_eq!(ErrorBody::message_from(r#"{"error": "Bad Request"}"#), None);
        assert_eq!(ErrorBody::message_from(r#"{"message": ""}"#), None);
        assert_eq!(ErrorBody::message_from("<html>502</html>"), None);
    }
}
