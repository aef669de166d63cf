use chrono::NaiveDateTime;

use super::StrikeRecord;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub underlying: f64,
    pub records: Vec<StrikeRecord>,
}

impl Snapshot {
    pub fn new(
        timestamp: NaiveDateTime,
        symbol: &str,
        underlying: f64,
        records: Vec<StrikeRecord>,
    ) -> Self {
        Self {
            timestamp,
            symbol: symbol.to_string(),
            underlying,
            records,
        }
    }

    pub fn timestamp_str(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
