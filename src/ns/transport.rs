use bytes::Bytes;
use reqwest::{header::USER_AGENT, Client};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{RecruitError, Result};
use crate::ns::budget::RequestBudget;

/// Proof that a request was admitted by the budget
#[derive(Debug, Clone, Copy)]
pub struct Permit {
    pub slot: Instant,
    pub waited: Duration,
}

/// Quota state as last seen, for logging and the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetSnapshot {
    pub occupancy: usize,
    pub ceiling: u32,
    pub server_limit: u32,
    pub server_remaining: u32,
    pub server_reset_in: Duration,
}

/// HTTP transport that admits every request through a shared [`RequestBudget`].
///
/// One instance is meant to be shared (behind an `Arc`) by every worker that
/// talks to the API, so the budget holds across all of them.
pub struct ThrottledTransport {
    http: Client,
    user_agent: String,
    budget: Mutex<RequestBudget>,
    /// Held from reservation until the slot is reached
    admission: Mutex<()>,
}

impl ThrottledTransport {
    pub fn new(user_agent: &str, max_per_window: u32, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, user_agent, max_per_window))
    }

    pub fn with_client(http: Client, user_agent: &str, max_per_window: u32) -> Self {
        Self {
            http,
            user_agent: user_agent.to_string(),
            budget: Mutex::new(RequestBudget::new(max_per_window)),
            admission: Mutex::new(()),
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Wait for a send slot.
    ///
    /// Workers queue on the admission lock, so at most one of them holds a
    /// reserved slot in the future. The budget lock is only held for the
    /// reservation itself, leaving `observe` free while a worker waits. Fails
    /// fast with `BudgetExceeded` instead of waiting when the budget is spent.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<Permit> {
        if cancel.is_cancelled() {
            return Err(RecruitError::Cancelled);
        }

        let _admission = tokio::select! {
            _ = cancel.cancelled() => return Err(RecruitError::Cancelled),
            guard = self.admission.lock() => guard,
        };

        let now = Instant::now();
        let slot = self.budget.lock().await.reserve(now)?;
        let waited = slot.saturating_duration_since(now);

        if !waited.is_zero() {
            debug!(?waited, "pacing request");
            tokio::select! {
                _ = cancel.cancelled() => return Err(RecruitError::Cancelled),
                _ = tokio::time::sleep_until(slot) => {}
            }
        }

        Ok(Permit { slot, waited })
    }

    /// Feed response headers back into the budget
    pub async fn observe(&self, headers: &reqwest::header::HeaderMap) {
        self.budget.lock().await.observe(headers, Instant::now());
    }

    pub async fn snapshot(&self) -> BudgetSnapshot {
        let budget = self.budget.lock().await;
        BudgetSnapshot {
            occupancy: budget.occupancy(),
            ceiling: budget.effective_ceiling(),
            server_limit: budget.server_limit(),
            server_remaining: budget.server_remaining(),
            server_reset_in: budget.server_reset_in(),
        }
    }

    /// Issue a GET once the budget admits it and return the body of a 2xx response
    pub async fn get(&self, url: &str, cancel: &CancellationToken) -> Result<Bytes> {
        self.acquire(cancel).await?;

        let request = self.http.get(url).header(USER_AGENT, &self.user_agent);
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(RecruitError::Cancelled),
            response = request.send() => response?,
        };

        self.observe(response.headers()).await;

        let status = response.status();
        if !status.is_success() {
            return Err(RecruitError::RequestFailed {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(RecruitError::Cancelled),
            body = response.bytes() => body?,
        };

        debug!(url, bytes = body.len(), "request complete");
        Ok(body)
    }
}
