//! HTTP adapter for the robot storage port.
//!
//! Talks to the persistence API:
//!
//! | Port call        | Request                          |
//! |------------------|----------------------------------|
//! | `fetch_current`  | `GET  /robot/current`            |
//! | `save_state`     | `POST /robot/move` `{x,y,direction}` |
//! | `fetch_history`  | `GET  /robot/history[?limit&offset]` |
//!
//! Every request is bounded by the configured timeout.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use toyrobot_domain::{HistoryRecord, RobotState};
use toyrobot_store::{HistoryQuery, RobotRepository, StoreError};

use crate::wire::{CurrentRobot, ErrorBody};

// =============================================================================
// Constants
// =============================================================================

/// Default persistence API base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Default request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

const SAVE_FAILED: &str = "Failed to save robot state";
const FETCH_CURRENT_FAILED: &str = "Failed to fetch current robot state";
const FETCH_HISTORY_FAILED: &str = "Failed to fetch robot history";

// =============================================================================
// Client
// =============================================================================

/// Connection settings for [`HttpRobotStore`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the persistence API (no trailing slash needed)
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

/// Storage port implementation backed by the HTTP persistence API.
pub struct HttpRobotStore {
    /// HTTP client
    client: Client,
    /// Connection settings
    config: ClientConfig,
}

impl HttpRobotStore {
    /// Create a client for the API at `base_url` with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_config(ClientConfig {
            base_url: base_url.into(),
            ..ClientConfig::default()
        })
    }

    /// Create a client from explicit settings.
    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Send a request and read the body.
    ///
    /// Transport failures are reported as `Connection(fallback)`; the
    /// underlying error is logged, not surfaced.
    async fn send(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<(StatusCode, String), StoreError> {
        let response = timeout(self.config.timeout, request.send())
            .await
            .map_err(|_| StoreError::Timeout)?
            .map_err(|e| {
                warn!(error = %e, "Persistence API request failed");
                StoreError::Connection(fallback.to_string())
            })?;

        let status = response.status();
        let body = timeout(self.config.timeout, response.text())
            .await
            .map_err(|_| StoreError::Timeout)?
            .map_err(|e| {
                warn!(error = %e, "Failed to read persistence API response");
                StoreError::Connection(fallback.to_string())
            })?;

        Ok((status, body))
    }
}

#[async_trait]
impl RobotRepository for HttpRobotStore {
    async fn fetch_current(&self) -> Result<Option<RobotState>, StoreError> {
        let request = self.client.get(self.url("/robot/current"));
        let (status, body) = self.send(request, FETCH_CURRENT_FAILED).await?;

        if !status.is_success() {
            warn!(%status, "Fetching current robot failed");
            return Err(StoreError::Connection(FETCH_CURRENT_FAILED.to_string()));
        }

        let CurrentRobot(state) = CurrentRobot::from_json(&body)
            .map_err(|e| StoreError::Deserialization(format!("current robot: {}", e)))?;
        Ok(state)
    }

    async fn save_state(&self, state: &RobotState) -> Result<HistoryRecord, StoreError> {
        let request = self.client.post(self.url("/robot/move")).json(state);
        let (status, body) = self.send(request, SAVE_FAILED).await?;

        if !status.is_success() {
            let message = ErrorBody::message_from(&body).unwrap_or_else(|| SAVE_FAILED.to_string());
            debug!(%status, %message, "Robot state rejected");
            return Err(StoreError::Rejected(message));
        }

        serde_json::from_str(&body)
            .map_err(|e| StoreError::Deserialization(format!("saved record: {}", e)))
    }

    async fn fetch_history(&self, query: HistoryQuery) -> Result<Vec<HistoryRecord>, StoreError> {
        let request = self.client.get(self.url("/robot/history")).query(&query);
        let (status, body) = self.send(request, FETCH_HISTORY_FAILED).await?;

        if !status.is_success() {
            warn!(%status, "Fetching robot history failed");
            return Err(StoreError::Connection(FETCH_HISTORY_FAILED.to_string()));
        }

        serde_json::from_str(&body)
            .map_err(|e| StoreError::Deserialization(format!("history: {}", e)))
    }
}
