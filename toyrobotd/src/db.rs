//! Database CLI subcommands for toyrobotd.
//!
//! Provides `db migrate` and `db status`.

use anyhow::{anyhow, Result};
use std::env;
use tracing::info;

use toyrobot_db::{migrate, status};

/// Run database CLI subcommands.
///
/// Supported commands:
/// - `toyrobotd db migrate` - Run pending migrations
/// - `toyrobotd db status` - Check migration status
pub async fn run_db_command(args: &[String]) -> Result<()> {
    let Some(command) = args.first() else {
        return Err(anyhow!("Usage: toyrobotd db <migrate|status>"));
    };

    let database_url = env::var("DATABASE_URL")
        .map_err(|_| anyhow!("DATABASE_URL environment variable is required for db commands"))?;

    let pool = sqlx::PgPool::connect(&database_url).await?;

    match command.as_str() {
        "migrate" => {
            migrate(&pool).await?;
        },
        "status" => {
            let status = status(&pool).await?;
            info!(
                migrations = status.migrations.len(),
                robot_states = ?status.robot_states,
                "Database status"
            );
        },
        other => {
            return Err(anyhow!("Unknown db command: {}. Use migrate or status", other));
        },
    }

    Ok(())
}
