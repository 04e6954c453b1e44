//! Toy Robot Daemon
//!
//! Persistence API server and interactive console.
//!
//! # Usage
//!
//! ```bash
//! # Start the API with default configuration
//! cargo run -p toyrobotd
//!
//! # Drive a robot from the terminal against a running API
//! cargo run -p toyrobotd -- console --api-url http://localhost:3000
//!
//! # Manage the PostgreSQL schema
//! cargo run -p toyrobotd --features postgres -- db migrate
//! ```
//!
//! # Environment Variables
//!
//! - `TOYROBOT_ENV`: Environment (test, development, production)
//! - `TOYROBOT_API_HOST`: API host (default: 0.0.0.0)
//! - `TOYROBOT_API_PORT`: API port (default: 3000)
//! - `TOYROBOT_CORS_ORIGIN`: Allowed browser origin (default: http://localhost:3001)
//! - `TOYROBOT_STORE`: History backend, memory or postgres (default: memory)
//! - `DATABASE_URL`: PostgreSQL connection string
//! - `TOYROBOT_API_URL`: API the console talks to (default: http://localhost:3000)
//! - `TOYROBOT_CLIENT_TIMEOUT_MS`: Console request timeout (default: 5000)

#[cfg(feature = "postgres")]
mod db;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use toyrobot_client::HttpRobotStore;
use toyrobot_session::RobotSession;
use toyrobotd::{run_console, Config, Daemon, StoreKind};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("toyrobotd=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        None | Some("serve") => serve().await,
        Some("console") => console(&args[1..]).await,
        #[cfg(feature = "postgres")]
        Some("db") => db::run_db_command(&args[1..]).await,
        #[cfg(not(feature = "postgres"))]
        Some("db") => Err(anyhow!("db commands require the `postgres` feature")),
        Some(other) => Err(anyhow!(
            "Unknown command: {}. Usage: toyrobotd [serve | console [--api-url URL] | db <migrate|status>]",
            other
        )),
    }
}

async fn serve() -> Result<()> {
    let config = Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        api_host = %config.api.host,
        api_port = config.api.port,
        store = %config.store.kind,
        "Toy Robot Daemon"
    );

    match config.store.kind {
        StoreKind::Memory => Daemon::new_memory(config).run().await?,
        #[cfg(feature = "postgres")]
        StoreKind::Postgres => Daemon::connect_postgres(config).await?.run().await?,
        #[cfg(not(feature = "postgres"))]
        StoreKind::Postgres => {
            return Err(anyhow!("TOYROBOT_STORE=postgres requires the `postgres` feature"))
        },
    }

    Ok(())
}

async fn console(args: &[String]) -> Result<()> {
    let mut config = Config::from_env()?;

    let mut rest = args.iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--api-url" => {
                config.client.base_url = rest
                    .next()
                    .cloned()
                    .ok_or_else(|| anyhow!("--api-url requires a value"))?;
            },
            other => return Err(anyhow!("Unknown option: {}", other)),
        }
    }

    info!(api_url = %config.client.base_url, "Starting console");
    println!("Toy Robot console. Type HELP for commands.");

    let store = Arc::new(HttpRobotStore::with_config(config.client));
    let session = RobotSession::new(store);

    run_console(&session, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
    Ok(())
}
