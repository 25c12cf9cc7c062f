use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::utils;

/// Width of the summary banner
const SUMMARY_WIDTH: usize = 32;

/// Aggregate result of one region scan.
///
/// Every member that was looked up lands in exactly one of `eligible`,
/// `ineligible` or `failed`, in the order the region list returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub eligible: Vec<String>,
    pub ineligible: Vec<String>,
    /// Members whose lookup failed; not classified either way
    pub failed: Vec<String>,
    /// Members skipped because they were on the exclusion list
    pub skipped: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ScanOutcome {
    /// Number of members with a successful lookup
    pub fn checked(&self) -> usize {
        self.eligible.len() + self.ineligible.len()
    }

    /// Share of successfully checked members that can be recruited, as a percentage
    pub fn eligible_rate(&self) -> f64 {
        if self.checked() == 0 {
            0.0
        } else {
            (self.eligible.len() as f64 / self.checked() as f64) * 100.0
        }
    }

    /// Print a formatted summary to console
    pub fn print_summary(&self) {
        println!("\n{}", "=== Recruitment Scan Summary ===".cyan().bold());
        println!("Skipped (excluded): {}", self.skipped);
        println!("Checked:            {}", self.checked());
        println!("Eligible:           {} ✓", self.eligible.len().to_string().green());
        println!("Ineligible:         {}", self.ineligible.len());
        println!("Lookup failed:      {} ✗", self.failed.len().to_string().red());
        println!("Eligible rate:      {:.1}%", self.eligible_rate());
        if let (Some(start), Some(end)) = (self.started_at, self.finished_at) {
            println!(
                "Duration:           {}s",
                (end - start).num_seconds()
            );
        }
        utils::print_table_border(SUMMARY_WIDTH);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eligible_rate_ignores_failed_lookups() {
        let outcome = ScanOutcome {
            eligible: vec!["a".into()],
            ineligible: vec!["b".into(), "c".into(), "d".into()],
            failed: vec!["e".into()],
            ..Default::default()
        };

        assert_eq!(outcome.checked(), 4);
        assert!((outcome.eligible_rate() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_prints_with_and_without_timestamps() {
        ScanOutcome::default().print_summary();

        let now = Utc::now();
        ScanOutcome {
            eligible: vec!["a".into()],
            started_at: Some(now),
            finished_at: Some(now),
            ..Default::default()
        }
        .print_summary();
    }

    #[test]
    fn empty_outcome_has_zero_rate() {
        assert_eq!(ScanOutcome::default().eligible_rate(), 0.0);
    }
}
