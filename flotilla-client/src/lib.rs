//! Flotilla Sailor Client
//!
//! A small, type-safe HTTP client for the sailor contract. The captain
//! uses it to start chores (`POST /chore`) and to stop them
//! (`POST /cancel`); both calls carry a short per-request timeout so one
//! slow sailor never stalls a scheduling tick.
//!
//! The contract is expressed as the [`SailorApi`] trait so the control
//! loop can be driven against a mock in tests.

pub mod error;

pub use error::{ClientError, Result};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use flotilla_core::domain::chore::Chore;
use flotilla_core::domain::sailor::Sailor;
use flotilla_core::dto::chore::CancelChore;

/// Default per-call timeout for sailor RPCs.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(5);

/// Outbound sailor operations, as consumed by the captain.
#[async_trait]
pub trait SailorApi: Send + Sync {
    /// Hands a chore to the sailor for execution.
    ///
    /// A transport failure is retryable (the chore stays queued); an
    /// HTTP error status means the sailor rejected the chore and its
    /// body explains why.
    async fn assign(&self, sailor: &Sailor, chore: &Chore) -> Result<()>;

    /// Asks the sailor to terminate a chore. Safe to re-send.
    async fn cancel(&self, sailor: &Sailor, chore_id: u64, reason: &str) -> Result<()>;
}

/// HTTP implementation of [`SailorApi`].
#[derive(Debug, Clone)]
pub struct SailorClient {
    client: Client,
}

impl SailorClient {
    /// Create a client with the given per-call timeout.
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    /// Handle a sailor response that carries no useful body.
    ///
    /// Checks the status code and folds an error body into the returned
    /// error so callers can surface it as a chore reason.
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}

impl Default for SailorClient {
    fn default() -> Self {
        Self::new(DEFAULT_RPC_TIMEOUT)
    }
}

#[async_trait]
impl SailorApi for SailorClient {
    async fn assign(&self, sailor: &Sailor, chore: &Chore) -> Result<()> {
        let url = format!("{}/chore", sailor.base_url());
        let response = self.client.post(&url).json(chore).send().await?;

        self.handle_empty_response(response).await
    }

    async fn cancel(&self, sailor: &Sailor, chore_id: u64, reason: &str) -> Result<()> {
        let url = format!("{}/cancel", sailor.base_url());
        let body = CancelChore {
            chore_id,
            reason: Some(reason.to_string()),
        };
        let response = self.client.post(&url).json(&body).send().await?;

        self.handle_empty_response(response).await
    }
}
