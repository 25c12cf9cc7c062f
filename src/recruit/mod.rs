pub mod outcome;
pub mod scanner;

pub use outcome::ScanOutcome;
pub use scanner::EligibilityScanner;
