//! Repository trait definitions (Ports)
//!
//! `RobotRepository` is the storage port the session controller depends on.
//! Implementations can be PostgreSQL, in-memory, or the HTTP persistence API.

use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use toyrobot_domain::{HistoryRecord, RobotState};

/// Paging for history reads
///
/// Records are always ordered by identifier descending (newest first);
/// `offset` skips that many of the newest records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryQuery {
    /// Maximum number of records to return (all when `None`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Number of newest records to skip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl HistoryQuery {
    /// Upper bound accepted for `limit`
    pub const MAX_LIMIT: u32 = 1000;

    /// Unpaged query: the whole history
    pub fn all() -> Self {
        Self::default()
    }

    /// First `limit` records, newest first
    pub fn latest(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: None,
        }
    }

    /// Apply this query to records already sorted newest first
    pub fn apply<T: Clone>(&self, newest_first: &[T]) -> Vec<T> {
        let skip = self.offset.unwrap_or(0) as usize;
        let take = self.limit.map_or(usize::MAX, |l| l as usize);
        newest_first.iter().skip(skip).take(take).cloned().collect()
    }
}

/// Storage port for robot states (append-only history log)
#[async_trait]
pub trait RobotRepository: Send + Sync {
    /// Most recently saved state, or `None` when nothing was ever saved
    async fn fetch_current(&self) -> Result<Option<RobotState>, StoreError>;

    /// Append a state to the history
    ///
    /// Returns the stored record with its assigned identifier and timestamp.
    async fn save_state(&self, state: &RobotState) -> Result<HistoryRecord, StoreError>;

    /// History records, newest first (identifier descending)
    async fn fetch_history(&self, query: HistoryQuery) -> Result<Vec<HistoryRecord>, StoreError>;
}

#[async_trait]
impl<R: RobotRepository + ?Sized> RobotRepository for std::sync::Arc<R> {
    async fn fetch_current(&self) -> Result<Option<RobotState>, StoreError> {
        (**self).fetch_current().await
    }

    async fn save_state(&self, state: &RobotState) -> Result<HistoryRecord, StoreError> {
        (**self).save_state(state).await
    }

    async fn fetch_history(&self, query: HistoryQuery) -> Result<Vec<HistoryRecord>, StoreError> {
        (**self).fetch_history(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_query_apply() {
        let newest_first = vec![5, 4, 3, 2, 1];

        assert_eq!(HistoryQuery::all().apply(&newest_first), vec![5, 4, 3, 2, 1]);
        assert_eq!(HistoryQuery::latest(2).apply(&newest_first), vec![5, 4]);

        let page = HistoryQuery {
            limit: Some(2),
            offset: Some(1),
        };
        assert_eq!(page.apply(&newest_first), vec![4, 3]);

        let past_end = HistoryQuery {
            limit: None,
            offset: Some(10),
        };
        assert!(past_end.apply(&newest_first).is_empty());
    }
}
