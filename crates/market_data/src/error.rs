use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },
    #[error("HTTP 429: Too Many Requests")]
    RateLimited,
    #[error("HTTP {0}: request blocked by upstream")]
    Blocked(u16),
    #[error("Malformed option chain payload: {0}")]
    MalformedPayload(String),
    #[error("Failed to fetch option chain after {attempts} attempt(s): {last}")]
    RetriesExhausted { attempts: u32, last: Box<FetchError> },
}

impl FetchError {
    pub fn is_blocked(&self) -> bool {
        match self {
            FetchError::Blocked(_) => true,
            FetchError::RetriesExhausted { last, .. } => last.is_blocked(),
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum FallbackError {
    #[error("Fallback CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Fallback CSV is empty")]
    Empty,
    #[error("Fallback CSV missing strike column")]
    MissingStrikeColumn,
    #[error("Fallback CSV has no parseable strike values")]
    NoStrikes,
}
