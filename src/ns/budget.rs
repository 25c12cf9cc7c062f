//! Request budget bookkeeping for one API client.
//!
//! The budget reconciles two signals: a locally configured ceiling of
//! requests per rolling 30 second window, and the quota the server reports
//! back on every response. All methods take the current instant explicitly
//! so the owner decides which clock drives it.

use reqwest::header::HeaderMap;
use std::collections::VecDeque;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::{RecruitError, Result};
use crate::ns::types::{
    HEADER_LIMIT, HEADER_REMAINING, HEADER_RESET, HEADER_RETRY_AFTER, RATE_WINDOW,
};

/// Requests the server must still have left before we stop sending.
pub const SAFETY_MARGIN: u32 = 1;

#[derive(Debug)]
pub struct RequestBudget {
    /// Slots handed out in the trailing window, oldest first. May contain
    /// slots slightly in the future that a waiting caller has reserved.
    window: VecDeque<Instant>,
    max_per_window: u32,
    server_limit: u32,
    server_remaining: u32,
    server_reset_in: Duration,
    /// When `server_remaining` was last replaced by a header value
    observed_at: Option<Instant>,
}

impl RequestBudget {
    /// Create a budget seeded with the local ceiling as the assumed server quota
    pub fn new(max_per_window: u32) -> Self {
        let max_per_window = max_per_window.max(1);
        Self {
            window: VecDeque::with_capacity(max_per_window as usize),
            max_per_window,
            server_limit: max_per_window,
            server_remaining: max_per_window,
            server_reset_in: RATE_WINDOW,
            observed_at: None,
        }
    }

    pub fn max_per_window(&self) -> u32 {
        self.max_per_window
    }

    pub fn server_limit(&self) -> u32 {
        self.server_limit
    }

    pub fn server_remaining(&self) -> u32 {
        self.server_remaining
    }

    pub fn server_reset_in(&self) -> Duration {
        self.server_reset_in
    }

    /// Number of slots currently tracked in the window
    pub fn occupancy(&self) -> usize {
        self.window.len()
    }

    /// Ceiling actually enforced: the lower of our own and the server's limit
    pub fn effective_ceiling(&self) -> u32 {
        self.max_per_window.min(self.server_limit).max(1)
    }

    /// Spacing between consecutive slots so requests spread over the window.
    /// Rounded up so `ceiling` intervals always cover the full window.
    pub fn pacing_interval(&self) -> Duration {
        let window_nanos = RATE_WINDOW.as_nanos() as u64;
        Duration::from_nanos(window_nanos.div_ceil(u64::from(self.effective_ceiling())))
    }

    /// Drop every slot that has left the trailing window relative to `now`
    pub fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.window.front() {
            if now.saturating_duration_since(oldest) >= RATE_WINDOW {
                self.window.pop_front();
            } else {
                break;
            }
        }
    }

    /// Reserve the next send slot, or fail fast if the budget is spent.
    ///
    /// The first slot in an empty window is `now`; later slots are spaced
    /// by [`pacing_interval`](Self::pacing_interval) after the newest one.
    /// The caller is expected to wait until the returned instant.
    ///
    /// Once the window pruned at `now` holds `ceiling` slots, only a caller
    /// with nothing queued ahead of it is admitted, and its slot is pushed
    /// back until the oldest counted slot has left the window.
    pub fn reserve(&mut self, now: Instant) -> Result<Instant> {
        self.prune(now);

        if self.server_exhausted(now) {
            return Err(RecruitError::BudgetExceeded {
                reason: format!(
                    "server reports {} of {} requests remaining",
                    self.server_remaining, self.server_limit
                ),
            });
        }

        let ceiling = self.effective_ceiling() as usize;
        let occupied = self.window.len();
        let queued = self.window.back().is_some_and(|&newest| newest > now);

        if occupied >= ceiling && queued {
            return Err(RecruitError::BudgetExceeded {
                reason: format!(
                    "{} requests already in the current {}s window (ceiling {})",
                    occupied,
                    RATE_WINDOW.as_secs(),
                    ceiling
                ),
            });
        }

        let mut slot = match self.window.back() {
            Some(&newest) => (newest + self.pacing_interval()).max(now),
            None => now,
        };

        if occupied >= ceiling {
            let oldest_counted = self.window[occupied - ceiling];
            slot = slot.max(oldest_counted + RATE_WINDOW);
        }

        self.window.push_back(slot);
        Ok(slot)
    }

    /// Update server quota state from response headers.
    ///
    /// Missing or unparsable headers leave the previous values in place.
    pub fn observe(&mut self, headers: &HeaderMap, now: Instant) {
        if let Some(limit) = header_value::<u32>(headers, HEADER_LIMIT) {
            self.server_limit = limit;
        }

        if let Some(reset) = header_value::<u64>(headers, HEADER_RESET) {
            self.server_reset_in = Duration::from_secs(reset);
        }

        if let Some(remaining) = header_value::<u32>(headers, HEADER_REMAINING) {
            self.server_remaining = remaining;
            self.observed_at = Some(now);
        }

        // Sent alongside 429: nothing left until the server says otherwise
        if let Some(retry_after) = header_value::<u64>(headers, HEADER_RETRY_AFTER) {
            self.server_remaining = 0;
            self.server_reset_in = Duration::from_secs(retry_after);
            self.observed_at = Some(now);
        }
    }

    /// A low server quota blocks until its reset interval has passed, and
    /// never for less than one pacing interval
    fn server_exhausted(&self, now: Instant) -> bool {
        match self.observed_at {
            Some(observed_at) => {
                let hold = self.server_reset_in.max(self.pacing_interval());
                self.server_remaining <= SAFETY_MARGIN
                    && now.saturating_duration_since(observed_at) < hold
            }
            None => false,
        }
    }
}

fn header_value<T: FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    let Some(raw) = headers.get(name) else {
        trace!(header = name, "quota header absent");
        return None;
    };

    let parsed = raw.to_str().ok().and_then(|value| value.trim().parse::<T>().ok());
    if parsed.is_none() {
        debug!(header = name, value = ?raw, "ignoring unparsable quota header");
    }
    parsed
}
