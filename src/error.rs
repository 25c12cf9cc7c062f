use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecruitError {
    #[error("Request budget exceeded: {reason}")]
    BudgetExceeded { reason: String },

    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request to {url} failed with status {status}")]
    RequestFailed { status: u16, url: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RecruitError {
    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            RecruitError::BudgetExceeded { .. } => "budget_exceeded",
            RecruitError::Transport(_) => "transport",
            RecruitError::RequestFailed { .. } => "request_failed",
            RecruitError::Decode(_) => "decode",
            RecruitError::Cancelled => "cancelled",
            RecruitError::Config(_) => "config",
            RecruitError::Io(_) => "io",
            RecruitError::JsonError(_) => "json",
            RecruitError::Other(_) => "other",
        }
    }
}

impl From<quick_xml::DeError> for RecruitError {
    fn from(value: quick_xml::DeError) -> Self {
        RecruitError::Decode(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RecruitError>;
