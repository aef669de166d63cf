use std::collections::HashMap;

use common::models::{DiffRow, Side, StrikeRecord};

/// Floor for the previous open interest used as the pct-COI denominator.
pub const MIN_PREV_OI_DENOM: f64 = 1e-9;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideDiffs {
    pub call: Vec<DiffRow>,
    pub put: Vec<DiffRow>,
}

impl SideDiffs {
    pub fn side(&self, side: Side) -> &[DiffRow] {
        match side {
            Side::Call => &self.call,
            Side::Put => &self.put,
        }
    }
}

/// Only a positive change in open interest produces a signal.
pub fn pct_coi(curr_change_in_open_interest: i64, prev_open_interest: i64) -> f64 {
    if curr_change_in_open_interest > 0 {
        curr_change_in_open_interest as f64 / (prev_open_interest as f64).max(MIN_PREV_OI_DENOM)
    } else {
        0.0
    }
}

/// Joins the current neighborhood against the previous one by strike.
///
/// Returns `None` when there is no previous neighborhood to compare against.
pub fn diff_snapshots(current: &[StrikeRecord], previous: &[StrikeRecord]) -> Option<SideDiffs> {
    if previous.is_empty() {
        return None;
    }

    let mut lookup: HashMap<i64, &StrikeRecord> = HashMap::with_capacity(previous.len());
    for record in previous {
        lookup.entry(record.strike).or_insert(record);
    }

    Some(SideDiffs {
        call: diff_side(current, &lookup, Side::Call),
        put: diff_side(current, &lookup, Side::Put),
    })
}

fn diff_side(
    current: &[StrikeRecord],
    lookup: &HashMap<i64, &StrikeRecord>,
    side: Side,
) -> Vec<DiffRow> {
    current
        .iter()
        .map(|record| {
            let quote = record.side(side);
            let previous = lookup.get(&record.strike);
            let prev_open_interest = previous.map_or(0, |prev| prev.side(side).open_interest);

            DiffRow {
                strike: record.strike,
                prev_open_interest,
                curr_open_interest: quote.open_interest,
                curr_change_in_open_interest: quote.change_in_open_interest,
                pct_coi: pct_coi(quote.change_in_open_interest, prev_open_interest),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::SideQuote;

    fn record(strike: i64, call: (i64, i64), put: (i64, i64)) -> StrikeRecord {
        StrikeRecord {
            strike,
            call: SideQuote {
                open_interest: call.0,
                change_in_open_interest: call.1,
                implied_volatility: 0.0,
            },
            put: SideQuote {
                open_interest: put.0,
                change_in_open_interest: put.1,
                implied_volatility: 0.0,
            },
        }
    }

    #[test]
    fn test_pct_coi_gate() {
        assert_eq!(pct_coi(0, 100), 0.0);
        assert_eq!(pct_coi(-10, 0), 0.0);
        assert_eq!(pct_coi(-10, 5), 0.0);
        assert_eq!(pct_coi(50, 200), 0.25);
    }

    #[test]
    fn test_zero_previous_oi_is_large_but_finite() {
        let value = pct_coi(50, 0);
        assert!(value.is_finite());
        assert_eq!(value, 50.0 / 1e-9);
    }

    #[test]
    fn test_no_previous_snapshot_yields_nothing() {
        let current = vec![record(100, (200, 50), (10, 5))];
        assert!(diff_snapshots(&current, &[]).is_none());
    }

    #[test]
    fn test_join_by_strike() {
        let current = vec![
            record(100, (200, 50), (300, -10)),
            record(200, (400, 80), (100, 20)),
        ];
        let previous = vec![record(200, (160, 0), (50, 0)), record(300, (1, 1), (1, 1))];

        let diffs = diff_snapshots(&current, &previous).unwrap();
        assert_eq!(diffs.call.len(), 2);
        assert_eq!(diffs.put.len(), 2);

        let call_100 = &diffs.call[0];
        assert_eq!(call_100.strike, 100);
        assert_eq!(call_100.prev_open_interest, 0);
        assert_eq!(call_100.pct_coi, 50.0 / MIN_PREV_OI_DENOM);

        let call_200 = &diffs.call[1];
        assert_eq!(call_200.prev_open_interest, 160);
        assert_eq!(call_200.curr_open_interest, 400);
        assert_eq!(call_200.pct_coi, 0.5);

        assert_eq!(diffs.side(Side::Put)[0].pct_coi, 0.0);
        assert_eq!(diffs.side(Side::Put)[1].pct_coi, 0.4);
    }
}
