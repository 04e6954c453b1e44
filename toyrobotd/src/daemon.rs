//! Daemon: runtime orchestrator for the persistence API.
//!
//! # Lifecycle
//!
//! 1. Load configuration
//! 2. Open the storage backend
//! 3. Log the robot the history currently ends with
//! 4. Start API server
//! 5. Wait for Ctrl-C or a cancelled shutdown token
//! 6. Drain in-flight requests and stop

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

use toyrobot_store::{MemoryStore, RobotRepository};

use crate::api::{cors_layer, create_router, ApiState};
use crate::config::Config;
use crate::error::{DaemonError, DaemonResult};

// =============================================================================
// Daemon
// =============================================================================

/// The toy robot persistence daemon.
pub struct Daemon<S: RobotRepository + 'static> {
    /// Configuration
    config: Config,
    /// History backend
    store: Arc<S>,
    /// Cancelled to stop the server
    shutdown: CancellationToken,
    /// Server task
    tasks: TaskTracker,
}

impl Daemon<MemoryStore> {
    /// Create a daemon backed by process-local memory.
    pub fn new_memory(config: Config) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()))
    }
}

#[cfg(feature = "postgres")]
impl Daemon<toyrobot_store::PgRobotStore> {
    /// Create a daemon backed by PostgreSQL at `config.store.database_url`.
    pub async fn connect_postgres(config: Config) -> DaemonResult<Self> {
        let url = config.store.database_url.clone().ok_or_else(|| {
            DaemonError::Config("DATABASE_URL is required for the postgres store".to_string())
        })?;

        let pool = sqlx::PgPool::connect(&url)
            .await
            .map_err(toyrobot_store::StoreError::from)?;
        info!("Connected to PostgreSQL");

        let store = toyrobot_store::PgRobotStore::new(Arc::new(pool));
        Ok(Self::new(config, Arc::new(store)))
    }
}

impl<S: RobotRepository + 'static> Daemon<S> {
    /// Create a new daemon with the provided store.
    pub fn new(config: Config, store: Arc<S>) -> Self {
        Self {
            config,
            store,
            shutdown: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    /// Token that stops the daemon when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// History backend
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run the daemon.
    ///
    /// This method blocks until Ctrl-C is received or the shutdown token
    /// is cancelled.
    pub async fn run(self) -> DaemonResult<()> {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            environment = %self.config.environment,
            store = %self.config.store.kind,
            "Starting toy robot daemon"
        );

        // 1. Check the backend is readable
        self.log_current_robot().await?;

        // 2. Start API server
        let api_addr = self.start_api_server().await?;
        info!(%api_addr, "API server started");

        // 3. Wait for shutdown
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
            }
            _ = self.shutdown.cancelled() => {
                info!("Shutdown requested");
            }
        }

        // 4. Graceful shutdown
        self.shutdown().await;

        Ok(())
    }

    /// Log the state the history currently ends with.
    async fn log_current_robot(&self) -> DaemonResult<()> {
        match self.store.fetch_current().await? {
            Some(robot) => info!(%robot, "History ends with robot"),
            None => info!("History is empty"),
        }
        Ok(())
    }

    /// Start the API server.
    ///
    /// The server stops accepting connections once the shutdown token is
    /// cancelled.
    pub async fn start_api_server(&self) -> DaemonResult<SocketAddr> {
        let state = Arc::new(ApiState {
            store: self.store.clone(),
        });

        let router = create_router(state).layer(cors_layer(&self.config.api.cors_origin)?);
        let addr = self.config.bind_addr();

        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            DaemonError::Config(format!("Failed to bind to {}: {}", addr, e))
        })?;

        let local_addr = listener.local_addr().map_err(|e| {
            DaemonError::Config(format!("Failed to get local address: {}", e))
        })?;

        let shutdown = self.shutdown.clone();
        self.tasks.spawn(async move {
            let server = axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.cancelled().await });
            if let Err(e) = server.await {
                error!(error = %e, "API server error");
            }
        });

        Ok(local_addr)
    }

    /// Stop the server and wait for in-flight requests.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown");

        self.shutdown.cancel();
        self.tasks.close();
        self.tasks.wait().await;

        info!("Shutdown complete");
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use toyrobot_domain::RobotState;

    #[tokio::test]
    async fn test_daemon_memory_creation() {
        let daemon = Daemon::new_memory(Config::test());

        assert_eq!(daemon.store().record_count(), 0);
        daemon.log_current_robot().await.unwrap();
    }

    #[tokio::test]
    async fn test_daemon_api_server_start() {
        let daemon = Daemon::new_memory(Config::test());

        let addr = daemon.start_api_server().await.unwrap();

        // Server should be running on a port
        assert!(addr.port() > 0);

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .unwrap();

        assert!(response.status().is_success());
        daemon.shutdown().await;
    }

    #[tokio::test]
    async fn test_daemon_cors_preflight() {
        let daemon = Daemon::new_memory(Config::test());
        let addr = daemon.start_api_server().await.unwrap();

        let response = reqwest::Client::new()
            .request(reqwest::Method::OPTIONS, format!("http://{}/robot/move", addr))
            .header("Origin", "http://localhost:3001")
            .header("Access-Control-Request-Method", "POST")
            .send()
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:3001"
        );
        daemon.shutdown().await;
    }

    #[tokio::test]
    async fn test_daemon_run_stops_on_cancel() {
        let store = Arc::new(MemoryStore::with_states([RobotState::place(1, 1).unwrap()]));
        let daemon = Daemon::new(Config::test(), store);
        let token = daemon.shutdown_token();

        let handle = tokio::spawn(daemon.run());
        token.cancel();

        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_invalid_cors_origin_is_config_error() {
        let mut config = Config::test();
        config.api.cors_origin = "bad\norigin".to_string();
        let daemon = Daemon::new_memory(config);

        let result = daemon.start_api_server().await;
        assert!(matches!(result, Err(DaemonError::Config(_))));
    }
}
