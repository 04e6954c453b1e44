//! Storage layer errors

use thiserror::Error;

/// Errors that can occur in the storage layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend refused the state (e.g., boundary validation)
    #[error("{0}")]
    Rejected(String),

    /// Backend unreachable or transport failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Request did not complete in time
    #[error("Request timed out")]
    Timeout,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error (reading a stored or received record)
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Domain error passthrough
    #[error("Domain error: {0}")]
    Domain(#[from] toyrobot_domain::DomainError),
}

impl StoreError {
    /// Human-readable message from the collaborator, when one is available.
    ///
    /// This is the text a session surfaces verbatim as its last error.
    pub fn user_message(&self) -> Option<String> {
        match self {
            StoreError::Rejected(msg) | StoreError::Connection(msg) | StoreError::Database(msg)
                if !msg.trim().is_empty() =>
            {
                Some(msg.clone())
            },
            StoreError::Timeout => Some(self.to_string()),
            _ => None,
        }
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                // 23514 = check_violation (grid bounds / direction constraint)
                if db_err.code().map(|c| c == "23514").unwrap_or(false) {
                    StoreError::Rejected(db_err.message().to_string())
                } else {
                    StoreError::Database(db_err.to_string())
                }
            },
            sqlx::Error::PoolTimedOut => StoreError::Timeout,
            sqlx::Error::Io(e) => StoreError::Connection(e.to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Deserialization(err.to_string())
            },
            _ => StoreError::Database(err.to_string()),
        }
    }
}
