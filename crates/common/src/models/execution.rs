use std::fmt;

use chrono::{DateTime, Utc};

pub const MAX_DETAILS_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Started,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Started => "started",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionEvent {
    pub timestamp: DateTime<Utc>,
    pub status: ExecutionStatus,
    pub details: String,
}

impl ExecutionEvent {
    pub fn new(status: ExecutionStatus, details: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            status,
            details: truncate_chars(&details.into(), MAX_DETAILS_CHARS),
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
