use chrono::Utc;
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{RecruitError, Result};
use crate::ns::client::NationApi;
use crate::recruit::outcome::ScanOutcome;
use crate::utils::normalize_name;

/// Scans a region's members for recruitment eligibility.
///
/// Lookups run one at a time by default. With a higher concurrency they are
/// issued in parallel, but every lookup still goes through the same API
/// client and therefore the same request budget.
pub struct EligibilityScanner<A: NationApi + ?Sized> {
    api: Arc<A>,
    concurrency: usize,
    progress: Option<ProgressBar>,
}

impl<A: NationApi + ?Sized> EligibilityScanner<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            concurrency: 1,
            progress: None,
        }
    }

    /// Set the maximum number of lookups in flight.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Tick `bar` once per processed member.
    #[must_use]
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    /// Classify every non-excluded member of `source_region` by whether it
    /// can receive recruitment telegrams from `target_region`.
    ///
    /// A failure fetching the member list aborts the scan. A failed lookup
    /// for a single member is logged and the member is recorded in
    /// `failed`; the scan carries on. Cancellation always aborts.
    pub async fn scan(
        &self,
        target_region: &str,
        source_region: &str,
        excluded: &[String],
        cancel: &CancellationToken,
    ) -> Result<ScanOutcome> {
        let started_at = Utc::now();

        let members = self.api.region_members(source_region, cancel).await?;
        let total = members.len();

        let excluded: HashSet<String> = excluded.iter().map(|name| normalize_name(name)).collect();
        let pending: Vec<String> = members
            .into_iter()
            .filter(|member| !excluded.contains(&normalize_name(member)))
            .collect();

        info!(
            region = source_region,
            total,
            to_check = pending.len(),
            "checking recruitment eligibility, this may take a while"
        );

        if let Some(bar) = &self.progress {
            bar.set_length(pending.len() as u64);
        }

        let mut outcome = ScanOutcome {
            skipped: total - pending.len(),
            started_at: Some(started_at),
            ..Default::default()
        };

        let api = &self.api;
        let mut lookups = stream::iter(pending)
            .map(|member| async move {
                debug!(nation = %member, "checking recruitment eligibility status");
                let result = api.eligibility(&member, target_region, cancel).await;
                (member, result)
            })
            .buffered(self.concurrency);

        while let Some((member, result)) = lookups.next().await {
            match result {
                Ok(status) if status.can_receive => outcome.eligible.push(member),
                Ok(_) => outcome.ineligible.push(member),
                Err(RecruitError::Cancelled) => return Err(RecruitError::Cancelled),
                Err(e) => {
                    warn!(
                        nation = %member,
                        kind = e.kind(),
                        error = %e,
                        "unable to get recruitment eligibility status"
                    );
                    outcome.failed.push(member);
                }
            }

            if let Some(bar) = &self.progress {
                bar.inc(1);
            }
        }

        if let Some(bar) = &self.progress {
            bar.finish_and_clear();
        }

        outcome.finished_at = Some(Utc::now());

        info!(
            eligible = outcome.eligible.len(),
            checked = outcome.checked(),
            failed = outcome.failed.len(),
            "{}/{} checked nations have recruitment telegrams enabled",
            outcome.eligible.len(),
            outcome.checked()
        );

        Ok(outcome)
    }
}
