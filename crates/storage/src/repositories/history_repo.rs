use chrono::NaiveDateTime;
use common::{
    models::{SideQuote, Snapshot, StrikeRecord, snapshot::TIMESTAMP_FORMAT},
    parsing::parse_str_or_default,
};
use tracing::debug;

use crate::{
    data_manager::DataManager,
    error::StoreError,
    schema::HISTORY_TABLE,
    table_store::Table,
};

pub struct HistoryRepository;

struct HistoryColumns {
    timestamp: usize,
    symbol: usize,
    underlying: Option<usize>,
    strike: Option<usize>,
    ce_oi: Option<usize>,
    ce_coi: Option<usize>,
    ce_iv: Option<usize>,
    pe_oi: Option<usize>,
    pe_coi: Option<usize>,
    pe_iv: Option<usize>,
}

impl HistoryColumns {
    fn resolve(table: &Table) -> Option<Self> {
        Some(Self {
            timestamp: table.column("timestamp")?,
            symbol: table.column("symbol")?,
            underlying: table.column("underlying"),
            strike: table.column("strike"),
            ce_oi: table.column("CE_OI"),
            ce_coi: table.column("CE_COI"),
            ce_iv: table.column("CE_IV"),
            pe_oi: table.column("PE_OI"),
            pe_coi: table.column("PE_COI"),
            pe_iv: table.column("PE_IV"),
        })
    }
}

impl HistoryRepository {
    pub async fn insert_snapshot(
        data_manager: &DataManager,
        snapshot: &Snapshot,
    ) -> Result<usize, StoreError> {
        if snapshot.is_empty() {
            return Ok(0);
        }

        let timestamp = snapshot.timestamp_str();
        let underlying = snapshot.underlying.to_string();
        let rows: Vec<Vec<String>> = snapshot
            .records
            .iter()
            .map(|r| {
                vec![
                    timestamp.clone(),
                    snapshot.symbol.clone(),
                    underlying.clone(),
                    r.strike.to_string(),
                    r.call.open_interest.to_string(),
                    r.call.change_in_open_interest.to_string(),
                    r.call.implied_volatility.to_string(),
                    r.put.open_interest.to_string(),
                    r.put.change_in_open_interest.to_string(),
                    r.put.implied_volatility.to_string(),
                ]
            })
            .collect();

        data_manager.store().append_rows(HISTORY_TABLE, &rows).await?;
        Ok(rows.len())
    }

    /// Most recent snapshot persisted for `symbol`: every row sharing the
    /// latest timestamp among that symbol's rows.
    pub async fn latest_snapshot(
        data_manager: &DataManager,
        symbol: &str,
    ) -> Result<Option<Snapshot>, StoreError> {
        let table = data_manager.store().read_all_rows(HISTORY_TABLE).await?;
        Ok(Self::latest_from_table(&table, symbol))
    }

    fn latest_from_table(table: &Table, symbol: &str) -> Option<Snapshot> {
        let cols = HistoryColumns::resolve(table)?;
        let cell = |row: &Vec<String>, col: Option<usize>| -> String {
            col.and_then(|i| row.get(i)).cloned().unwrap_or_default()
        };

        let symbol_rows: Vec<(NaiveDateTime, &Vec<String>)> = table
            .rows
            .iter()
            .filter(|row| row.get(cols.symbol).is_some_and(|s| s == symbol))
            .filter_map(|row| {
                let ts = row.get(cols.timestamp)?;
                let parsed = NaiveDateTime::parse_from_str(ts.trim(), TIMESTAMP_FORMAT).ok()?;
                Some((parsed, row))
            })
            .collect();

        let latest = symbol_rows.iter().map(|(ts, _)| *ts).max()?;
        let rows: Vec<&Vec<String>> = symbol_rows
            .into_iter()
            .filter(|(ts, _)| *ts == latest)
            .map(|(_, row)| row)
            .collect();

        let underlying = parse_str_or_default::<f64>(&cell(rows[0], cols.underlying));
        let records: Vec<StrikeRecord> = rows
            .iter()
            .map(|&row| StrikeRecord {
                strike: parse_str_or_default(&cell(row, cols.strike)),
                call: SideQuote {
                    open_interest: parse_str_or_default(&cell(row, cols.ce_oi)),
                    change_in_open_interest: parse_str_or_default(&cell(row, cols.ce_coi)),
                    implied_volatility: parse_str_or_default(&cell(row, cols.ce_iv)),
                },
                put: SideQuote {
                    open_interest: parse_str_or_default(&cell(row, cols.pe_oi)),
                    change_in_open_interest: parse_str_or_default(&cell(row, cols.pe_coi)),
                    implied_volatility: parse_str_or_default(&cell(row, cols.pe_iv)),
                },
            })
            .collect();

        debug!(
            "Latest {} snapshot at {} has {} strikes",
            symbol,
            latest,
            records.len()
        );
        Some(Snapshot::new(latest, symbol, underlying, records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryTableStore;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn record(strike: i64, ce_oi: i64, pe_oi: i64) -> StrikeRecord {
        StrikeRecord {
            strike,
            call: SideQuote {
                open_interest: ce_oi,
                change_in_open_interest: 7,
                implied_volatility: 12.25,
            },
            put: SideQuote {
                open_interest: pe_oi,
                change_in_open_interest: -3,
                implied_volatility: 14.5,
            },
        }
    }

    async fn setup() -> (Arc<MemoryTableStore>, DataManager) {
        let store = Arc::new(MemoryTableStore::new());
        let dm = DataManager::new(store.clone());
        dm.ensure_schema(false).await.unwrap();
        (store, dm)
    }

    #[tokio::test]
    async fn test_no_history_means_no_snapshot() {
        let (_, dm) = setup().await;
        assert!(HistoryRepository::latest_snapshot(&dm, "NIFTY").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_snapshot_per_symbol() {
        let (store, dm) = setup().await;

        let older = Snapshot::new(at(9, 30), "NIFTY", 100.0, vec![record(100, 1, 2)]);
        let newer = Snapshot::new(
            at(9, 45),
            "NIFTY",
            101.5,
            vec![record(100, 10, 20), record(150, 30, 40)],
        );
        let other = Snapshot::new(at(10, 0), "BANKNIFTY", 5000.0, vec![record(5000, 9, 9)]);

        for snapshot in [&older, &newer, &other] {
            HistoryRepository::insert_snapshot(&dm, snapshot).await.unwrap();
        }
        assert_eq!(store.rows(HISTORY_TABLE).await.len(), 4);

        let latest = HistoryRepository::latest_snapshot(&dm, "NIFTY")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.timestamp, at(9, 45));
        assert_eq!(latest.underlying, 101.5);
        assert_eq!(latest.records, newer.records);
    }

    #[test]
    fn test_malformed_cells_read_as_zero() {
        let table = Table {
            header: ["timestamp", "symbol", "underlying", "strike", "CE_OI", "PE_OI"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows: vec![
                ["2025-01-15 09:30:00", "NIFTY", "x", "24500.0", "", "12"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                ["garbage", "NIFTY", "1", "1", "1", "1"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ],
        };

        let snapshot = HistoryRepository::latest_from_table(&table, "NIFTY").unwrap();
        assert_eq!(snapshot.underlying, 0.0);
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.records[0].strike, 24500);
        assert_eq!(snapshot.records[0].call.open_interest, 0);
        assert_eq!(snapshot.records[0].put.open_interest, 12);
        assert_eq!(snapshot.records[0].put.change_in_open_interest, 0);
    }

    #[test]
    fn test_missing_key_columns() {
        let table = Table {
            header: vec!["strike".to_string()],
            rows: vec![vec!["100".to_string()]],
        };
        assert!(HistoryRepository::latest_from_table(&table, "NIFTY").is_none());
    }
}
