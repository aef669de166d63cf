use std::{io, path::Path};

use common::{models::OptionChain, parsing::parse_numeric_str};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::FallbackError;

const STRIKE_PATTERNS: &[&str] = &["strike"];
const CE_OI_PATTERNS: &[&str] = &["ce_oi", "call_oi", "calls_oi"];
const CE_COI_PATTERNS: &[&str] = &["ce_coi", "ce_change", "call_change"];
const CE_IV_PATTERNS: &[&str] = &["ce_iv", "call_iv"];
const PE_OI_PATTERNS: &[&str] = &["pe_oi", "put_oi", "puts_oi"];
const PE_COI_PATTERNS: &[&str] = &["pe_coi", "pe_change", "put_change"];
const PE_IV_PATTERNS: &[&str] = &["pe_iv", "put_iv"];

struct SideColumns {
    oi: Option<usize>,
    coi: Option<usize>,
    iv: Option<usize>,
}

pub fn load_fallback_csv(path: &Path) -> Result<OptionChain, FallbackError> {
    info!("Loading fallback CSV: {}", path.display());
    let reader = csv::Reader::from_path(path)?;
    read_chain(reader)
}

pub fn load_fallback_reader<R: io::Read>(rdr: R) -> Result<OptionChain, FallbackError> {
    read_chain(csv::Reader::from_reader(rdr))
}

/// Reads a loosely formatted option-chain export into raw chain entries.
///
/// Columns are matched case-insensitively by substring; the reference price is
/// the midpoint between the lowest and highest strike.
fn read_chain<R: io::Read>(mut reader: csv::Reader<R>) -> Result<OptionChain, FallbackError> {
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let strike_col = find_column(&headers, STRIKE_PATTERNS).ok_or(FallbackError::MissingStrikeColumn)?;
    let call = SideColumns {
        oi: find_column(&headers, CE_OI_PATTERNS),
        coi: find_column(&headers, CE_COI_PATTERNS),
        iv: find_column(&headers, CE_IV_PATTERNS),
    };
    let put = SideColumns {
        oi: find_column(&headers, PE_OI_PATTERNS),
        coi: find_column(&headers, PE_COI_PATTERNS),
        iv: find_column(&headers, PE_IV_PATTERNS),
    };

    let mut entries = Vec::new();
    let mut bounds: Option<(i64, i64)> = None;

    for record in reader.records() {
        let record = record?;
        let strike = record.get(strike_col).unwrap_or("");

        if let Some(s) = parse_numeric_str::<i64>(strike) {
            bounds = Some(match bounds {
                Some((lo, hi)) => (lo.min(s), hi.max(s)),
                None => (s, s),
            });
        }

        let mut entry = Map::new();
        entry.insert("strikePrice".to_string(), Value::from(strike));
        entry.insert("CE".to_string(), side_entry(&record, &call));
        entry.insert("PE".to_string(), side_entry(&record, &put));
        entries.push(Value::Object(entry));
    }

    if entries.is_empty() {
        return Err(FallbackError::Empty);
    }
    let (lo, hi) = bounds.ok_or(FallbackError::NoStrikes)?;
    let underlying = (lo as f64 + hi as f64) / 2.0;

    info!(
        "Loaded fallback CSV: {} rows, underlying≈{:.0}",
        entries.len(),
        underlying
    );
    Ok(OptionChain {
        underlying,
        entries,
    })
}

fn find_column(headers: &[String], patterns: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| patterns.iter().any(|p| h.contains(p)))
}

fn side_entry(record: &csv::StringRecord, cols: &SideColumns) -> Value {
    let mut side = Map::new();
    let mut set = |key: &str, col: Option<usize>| {
        if let Some(value) = col.and_then(|i| record.get(i)) {
            side.insert(key.to_string(), Value::from(value));
        }
    };
    set("openInterest", cols.oi);
    set("changeinOpenInterest", cols.coi);
    set("impliedVolatility", cols.iv);
    Value::Object(side)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loads_columns_by_fuzzy_name() {
        let csv = "\
Strike Price,CE_OI,CE_Change,Call_IV,Put_OI,PE_COI,PE_IV
24200,1000,50,12.5,800,-20,13.1
24300,1200,n/a,12.9,900,40,13.4
24400,1100,10,,950,5,13.9
";
        let chain = load_fallback_reader(csv.as_bytes()).unwrap();
        assert_eq!(chain.entries.len(), 3);
        assert_eq!(chain.underlying, 24300.0);

        let first = &chain.entries[0];
        assert_eq!(first["strikePrice"], "24200");
        assert_eq!(first["CE"]["openInterest"], "1000");
        assert_eq!(first["CE"]["changeinOpenInterest"], "50");
        assert_eq!(first["CE"]["impliedVolatility"], "12.5");
        assert_eq!(first["PE"]["changeinOpenInterest"], "-20");
    }

    #[test]
    fn test_missing_columns_are_left_out() {
        let csv = "strike,call_oi\n100,5\n300,7\n";
        let chain = load_fallback_reader(csv.as_bytes()).unwrap();
        assert_eq!(chain.underlying, 200.0);
        assert!(chain.entries[0]["PE"].as_object().unwrap().is_empty());
        assert!(chain.entries[0]["CE"].get("changeinOpenInterest").is_none());
    }

    #[test]
    fn test_rejects_unusable_files() {
        let err = load_fallback_reader("ce_oi,pe_oi\n1,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, FallbackError::MissingStrikeColumn));

        let err = load_fallback_reader("strike,ce_oi\n".as_bytes()).unwrap_err();
        assert!(matches!(err, FallbackError::Empty));

        let err = load_fallback_reader("strike,ce_oi\nabc,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, FallbackError::NoStrikes));
    }

    #[test]
    fn test_huge_strikes_do_not_overflow_midpoint() {
        let csv = "strike,ce_oi\n9e18,1\n9.1e18,2\n";
        let chain = load_fallback_reader(csv.as_bytes()).unwrap();
        assert_eq!(chain.entries.len(), 2);
        assert!(chain.underlying.is_finite());
        assert_eq!(chain.underlying, (9e18 + 9.1e18) / 2.0);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_fallback_csv(Path::new("/nonexistent/fallback.csv")).unwrap_err();
        assert!(matches!(err, FallbackError::Csv(_)));
    }
}
