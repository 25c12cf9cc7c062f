pub mod ns;
pub mod recruit;
pub mod config;
pub mod error;
pub mod utils;

pub use error::{Result, RecruitError};
pub use config::Config;
