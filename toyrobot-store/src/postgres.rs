//! PostgreSQL robot history store.
//!
//! Backed by the append-only `robot_states` table (see `migrations/`).
//!
//! This module uses dynamic queries (sqlx::query) instead of compile-time
//! checked macros (sqlx::query!) to allow compilation without DATABASE_URL.

use crate::error::StoreError;
use crate::repository::{HistoryQuery, RobotRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use toyrobot_domain::{Direction, HistoryRecord, RecordId, RobotState};
use tracing::debug;

/// PostgreSQL adapter for the robot storage port.
pub struct PgRobotStore {
    /// PostgreSQL connection pool
    pool: Arc<PgPool>,
}

impl PgRobotStore {
    /// Create a new PostgreSQL robot store.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool (for testing).
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Convert a `robot_states` row into a domain record.
///
/// Rows are re-validated: a row that violates the grid invariant is a
/// deserialization error rather than a silently accepted state.
fn parse_record_row(row: &sqlx::postgres::PgRow) -> Result<HistoryRecord, StoreError> {
    let id: i64 = row.try_get("id")?;
    let x: i32 = row.try_get("x")?;
    let y: i32 = row.try_get("y")?;
    let direction: String = row.try_get("direction")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    let direction: Direction = direction
        .parse()
        .map_err(|e| StoreError::Deserialization(format!("Row {}: {}", id, e)))?;
    let state = RobotState::new(x, y, direction)
        .map_err(|e| StoreError::Deserialization(format!("Row {}: {}", id, e)))?;

    Ok(HistoryRecord::new(RecordId(id), state, created_at))
}

#[async_trait]
impl RobotRepository for PgRobotStore {
    async fn fetch_current(&self) -> Result<Option<RobotState>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, x, y, direction, created_at
            FROM robot_states
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(|r| parse_record_row(&r).map(|record| record.state)).transpose()
    }

    async fn save_state(&self, state: &RobotState) -> Result<HistoryRecord, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO robot_states (x, y, direction)
            VALUES ($1, $2, $3)
            RETURNING id, x, y, direction, created_at
            "#,
        )
        .bind(state.x())
        .bind(state.y())
        .bind(state.direction().as_str())
        .fetch_one(self.pool.as_ref())
        .await?;

        let record = parse_record_row(&row)?;
        debug!(id = %record.id, state = %record.state, "Saved robot state");
        Ok(record)
    }

    async fn fetch_history(&self, query: HistoryQuery) -> Result<Vec<HistoryRecord>, StoreError> {
        // LIMIT NULL means no limit in PostgreSQL.
        let rows = sqlx::query(
            r#"
            SELECT id, x, y, direction, created_at
            FROM robot_states
            ORDER BY id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(query.limit.map(i64::from))
        .bind(i64::from(query.offset.unwrap_or(0)))
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter().map(parse_record_row).collect()
    }
}
