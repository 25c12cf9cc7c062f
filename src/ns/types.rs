use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Length of the rolling window the API enforces its quota over.
pub const RATE_WINDOW: Duration = Duration::from_secs(30);

pub const HEADER_LIMIT: &str = "ratelimit-limit";
pub const HEADER_REMAINING: &str = "ratelimit-remaining";
pub const HEADER_RESET: &str = "ratelimit-reset";
pub const HEADER_RETRY_AFTER: &str = "retry-after";

/// Outcome of one recruitment eligibility query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityResult {
    /// Nation name as reported by the server
    pub member: String,
    /// Normalized name of the region the nation currently resides in
    pub home_region: String,
    /// Whether the nation accepts recruitment telegrams from the queried region
    pub can_receive: bool,
}

impl EligibilityResult {
    /// Check whether the nation already lives in `region` (normalized compare)
    pub fn resides_in(&self, region: &str) -> bool {
        self.home_region == crate::utils::normalize_name(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resides_in_compares_normalized_names() {
        let result = EligibilityResult {
            member: "alpha".to_string(),
            home_region: "the_europeian_union".to_string(),
            can_receive: false,
        };

        assert!(result.resides_in("The Europeian Union"));
        assert!(!result.resides_in("Lazarus"));
    }
}
