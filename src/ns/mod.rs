pub mod budget;
pub mod client;
pub mod decode;
pub mod transport;
pub mod types;

pub use budget::RequestBudget;
pub use client::{NationApi, NsClient};
pub use decode::{decode_eligibility, decode_region_list};
pub use transport::{BudgetSnapshot, Permit, ThrottledTransport};
pub use types::EligibilityResult;
