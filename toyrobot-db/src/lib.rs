//! Database lifecycle management for the toy robot history.
//!
//! Provides migration running and status checking.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{info, warn};

/// Result type for DB operations.
pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// Snapshot of the schema as reported by `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbStatus {
    /// Applied migrations, newest first
    pub migrations: Vec<AppliedMigration>,
    /// Rows in `robot_states`, if the table exists
    pub robot_states: Option<i64>,
}

/// One row of `_sqlx_migrations`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: i64,
    pub description: String,
    pub installed_on: DateTime<Utc>,
    pub success: bool,
}

/// Run all pending migrations.
///
/// Uses sqlx migrations from the workspace `migrations` directory.
/// Idempotent: safe to run multiple times.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");

    sqlx::migrate!("../migrations").run(pool).await?;

    info!("Migrations completed successfully");
    Ok(())
}

/// Check database connectivity and migration status.
///
/// Logs the latest applied migrations and the size of the history table.
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let result: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;

    if result != 1 {
        return Err(anyhow::anyhow!("Database connectivity check failed"));
    }

    info!("Database connectivity: OK");

    let rows = sqlx::query(
        r#"
        SELECT version, description, installed_on, success
        FROM _sqlx_migrations
        ORDER BY version DESC
        LIMIT 10
        "#,
    )
    .fetch_all(pool)
    .await;

    let migrations = match rows {
        Ok(rows) => rows
            .into_iter()
            .map(|row| -> Result<AppliedMigration> {
                Ok(AppliedMigration {
                    version: row.try_get("version")?,
                    description: row.try_get("description")?,
                    installed_on: row.try_get("installed_on")?,
                    success: row.try_get("success")?,
                })
            })
            .collect::<Result<Vec<_>>>()?,
        Err(e) => {
            // Table might not exist yet
            if e.to_string().contains("_sqlx_migrations") {
                warn!("Migration table not found (run `toyrobotd db migrate` first)");
                Vec::new()
            } else {
                return Err(e.into());
            }
        },
    };

    if migrations.is_empty() {
        warn!("No migrations found in database (run `toyrobotd db migrate` first)");
    } else {
        info!("Latest migrations:");
        for mig in &migrations {
            let mark = if mig.success { "✓" } else { "✗" };
            info!("  {} v{}: {} ({})", mark, mig.version, mig.description, mig.installed_on);
        }
    }

    let robot_states = match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM robot_states")
        .fetch_one(pool)
        .await
    {
        Ok(count) => {
            info!(records = count, "robot_states table present");
            Some(count)
        },
        Err(e) => {
            warn!(error = %e, "robot_states table not readable");
            None
        },
    };

    Ok(DbStatus {
        migrations,
        robot_states,
    })
}
