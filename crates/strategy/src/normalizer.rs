use std::collections::HashSet;

use common::{
    models::{SideQuote, StrikeRecord},
    parsing::parse_numeric_or_default,
};
use serde_json::Value;

const STRIKE_FIELD: &str = "strikePrice";
const CALL_FIELD: &str = "CE";
const PUT_FIELD: &str = "PE";
const OI_FIELD: &str = "openInterest";
const COI_FIELD: &str = "changeinOpenInterest";
const IV_FIELD: &str = "impliedVolatility";

/// Turns raw option-chain entries into a strike-ascending table with unique strikes.
///
/// Missing or malformed numbers become zero. When a strike repeats, the first
/// entry seen is kept.
pub fn normalize_records(entries: &[Value]) -> Vec<StrikeRecord> {
    let mut seen = HashSet::with_capacity(entries.len());
    let mut records: Vec<StrikeRecord> = entries
        .iter()
        .map(normalize_entry)
        .filter(|record| seen.insert(record.strike))
        .collect();

    records.sort_by_key(|record| record.strike);
    records
}

fn normalize_entry(entry: &Value) -> StrikeRecord {
    StrikeRecord {
        strike: parse_numeric_or_default(entry.get(STRIKE_FIELD)),
        call: normalize_side(entry.get(CALL_FIELD)),
        put: normalize_side(entry.get(PUT_FIELD)),
    }
}

fn normalize_side(side: Option<&Value>) -> SideQuote {
    let Some(side) = side else {
        return SideQuote::default();
    };

    SideQuote {
        open_interest: parse_numeric_or_default(side.get(OI_FIELD)),
        change_in_open_interest: parse_numeric_or_default(side.get(COI_FIELD)),
        implied_volatility: parse_numeric_or_default(side.get(IV_FIELD)),
    }
}
