use chrono::NaiveDateTime;

use super::Side;

#[derive(Debug, Clone, PartialEq)]
pub struct DiffRow {
    pub strike: i64,
    pub prev_open_interest: i64,
    pub curr_open_interest: i64,
    pub curr_change_in_open_interest: i64,
    pub pct_coi: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertRow {
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub underlying: f64,
    pub rank: usize,
    pub label: String,
    pub strike: i64,
    pub side: Side,
    pub pct_coi: f64,
    pub details: String, // "prev_OI=.., curr_COI=.., pct_coi=.."
}
