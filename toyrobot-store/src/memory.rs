//! In-memory store implementation
//!
//! Used for testing and development without a database.
//! Thread-safe using RwLock for concurrent access.

use crate::error::StoreError;
use crate::repository::{HistoryQuery, RobotRepository};
use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use toyrobot_domain::{HistoryRecord, RecordId, RobotState};
use tracing::debug;

/// In-memory append-only robot history
pub struct MemoryStore {
    /// Records in insertion order (oldest first)
    records: RwLock<Vec<HistoryRecord>>,
    /// Last assigned record id
    next_id: AtomicI64,
    /// Number of `save_state` calls attempted (including failed ones)
    save_calls: AtomicUsize,
    /// Number of `fetch_current` calls attempted
    fetch_calls: AtomicUsize,
    /// Failure to return from the next port call
    fail_next: RwLock<Option<StoreError>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(0),
            save_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            fail_next: RwLock::new(None),
        }
    }

    /// Create a store pre-seeded with the given states (oldest first)
    pub fn with_states(states: impl IntoIterator<Item = RobotState>) -> Self {
        let store = Self::new();
        {
            let mut records = store.records.write().unwrap_or_else(PoisonError::into_inner);
            for state in states {
                records.push(store.next_record(state));
            }
        }
        store
    }

    /// Get the number of stored records
    pub fn record_count(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Get the number of `save_state` calls received
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// Get the number of `fetch_current` calls received
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Most recently stored state
    pub fn last_saved(&self) -> Option<RobotState> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .map(|r| r.state)
    }

    /// Make the next port call (of any kind) fail with `error`.
    pub fn fail_next(&self, error: StoreError) {
        *self.fail_next.write().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    /// Clear all data (useful for test setup)
    pub fn clear(&self) {
        self.records.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.next_id.store(0, Ordering::SeqCst);
        self.save_calls.store(0, Ordering::SeqCst);
        self.fetch_calls.store(0, Ordering::SeqCst);
        self.fail_next.write().unwrap_or_else(PoisonError::into_inner).take();
    }

    /// Take the injected failure, if any (reset after check).
    fn take_failure(&self) -> Result<(), StoreError> {
        match self.fail_next.write().unwrap_or_else(PoisonError::into_inner).take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn next_record(&self, state: RobotState) -> HistoryRecord {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        HistoryRecord::new(RecordId(id), state, chrono::Utc::now())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Robot Repository Implementation
// =============================================================================

#[async_trait]
impl RobotRepository for MemoryStore {
    async fn fetch_current(&self) -> Result<Option<RobotState>, StoreError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        Ok(self.last_saved())
    }

    async fn save_state(&self, state: &RobotState) -> Result<HistoryRecord, StoreError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let record = self.next_record(*state);
        records.push(record.clone());

        debug!(id = %record.id, state = %record.state, "Saved robot state");
        Ok(record)
    }

    async fn fetch_history(&self, query: HistoryQuery) -> Result<Vec<HistoryRecord>, StoreError> {
        self.take_failure()?;
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let newest_first: Vec<HistoryRecord> = records.iter().rev().cloned().collect();
        Ok(query.apply(&newest_first))
    }
}

// =============================================================================
// Tests
// =============================================================================
