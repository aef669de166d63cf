use chrono::NaiveDateTime;
use common::{
    config::{DEFAULT_ALERT_TOP_N, DEFAULT_MIN_PCT_COI},
    models::{AlertRow, DiffRow, Side},
};

use crate::differencer::SideDiffs;

/// Sides in the order their alerts are emitted.
pub const EMISSION_ORDER: [Side; 2] = [Side::Put, Side::Call];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankParams {
    pub threshold: f64,
    pub top_n: usize,
}

impl Default for RankParams {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MIN_PCT_COI,
            top_n: DEFAULT_ALERT_TOP_N,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlertContext<'a> {
    pub timestamp: NaiveDateTime,
    pub symbol: &'a str,
    pub underlying: f64,
}

/// Orders rows by pct-COI descending, keeps those strictly above the threshold
/// and returns at most `top_n` of them paired with a 1-based rank.
pub fn rank_side<'a>(rows: &'a [DiffRow], params: &RankParams) -> Vec<(usize, &'a DiffRow)> {
    let mut sorted: Vec<&DiffRow> = rows.iter().collect();
    sorted.sort_by(|a, b| b.pct_coi.total_cmp(&a.pct_coi));

    sorted
        .into_iter()
        .filter(|row| row.pct_coi > params.threshold)
        .take(params.top_n)
        .enumerate()
        .map(|(i, row)| (i + 1, row))
        .collect()
}

pub fn alert_label(side: Side, rank: usize) -> String {
    match side {
        Side::Put => format!("Put-writer spike (pct COI rank {rank})"),
        Side::Call => format!("Call-writer spike (pct COI rank {rank})"),
    }
}

pub fn alert_details(row: &DiffRow) -> String {
    format!(
        "prev_OI={}, curr_COI={}, pct_coi={:.4}",
        row.prev_open_interest, row.curr_change_in_open_interest, row.pct_coi
    )
}

pub fn build_alerts(ctx: &AlertContext<'_>, diffs: &SideDiffs, params: &RankParams) -> Vec<AlertRow> {
    EMISSION_ORDER
        .iter()
        .flat_map(|&side| {
            rank_side(diffs.side(side), params)
                .into_iter()
                .map(move |(rank, row)| AlertRow {
                    timestamp: ctx.timestamp,
                    symbol: ctx.symbol.to_string(),
                    underlying: ctx.underlying,
                    rank,
                    label: alert_label(side, rank),
                    strike: row.strike,
                    side,
                    pct_coi: row.pct_coi,
                    details: alert_details(row),
                })
        })
        .collect()
}
