use std::sync::Arc;

use chrono::{Local, NaiveDateTime, Timelike};
use common::{
    RunConfig,
    models::{AlertRow, ExecutionStatus, Snapshot, StrikeRecord},
};
use market_data::{ChainPoller, fallback::load_fallback_csv};
use storage::{
    DataManager, StoreError,
    repositories::{AlertsRepository, HistoryRepository},
};
use strategy::StrategyService;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Could not prepare store tables: {0}")]
    Bootstrap(#[from] StoreError),
}

#[derive(Debug)]
pub enum RunOutcome {
    /// Neither the feed nor the fallback produced usable strikes.
    NoData { reason: String },
    /// No previous snapshot to compare with; only the current one was persisted.
    Baseline {
        strikes: usize,
        history: Result<usize, StoreError>,
    },
    Ranked {
        strikes: usize,
        alerts: Vec<AlertRow>,
        alerts_written: Result<usize, StoreError>,
        history: Result<usize, StoreError>,
    },
}

impl RunOutcome {
    pub fn persistence_failed(&self) -> bool {
        match self {
            RunOutcome::NoData { .. } => false,
            RunOutcome::Baseline { history, .. } => history.is_err(),
            RunOutcome::Ranked {
                alerts_written,
                history,
                ..
            } => alerts_written.is_err() || history.is_err(),
        }
    }

    pub fn status(&self) -> ExecutionStatus {
        match self {
            RunOutcome::NoData { .. } => ExecutionStatus::Failed,
            _ if self.persistence_failed() => ExecutionStatus::Failed,
            _ => ExecutionStatus::Completed,
        }
    }

    pub fn summary(&self) -> String {
        fn written(result: &Result<usize, StoreError>) -> String {
            match result {
                Ok(n) => format!("ok({n})"),
                Err(e) => format!("error({e})"),
            }
        }

        match self {
            RunOutcome::NoData { reason } => format!("no usable data: {reason}"),
            RunOutcome::Baseline { strikes, history } => {
                format!("baseline snapshot of {strikes} strikes; history={}", written(history))
            }
            RunOutcome::Ranked {
                strikes,
                alerts,
                alerts_written,
                history,
            } => format!(
                "{strikes} strikes, {} alert(s); alerts={}; history={}",
                alerts.len(),
                written(alerts_written),
                written(history)
            ),
        }
    }
}

/// Sequences one run: fetch, normalize, select, diff, rank and persist.
pub struct RunService {
    config: RunConfig,
    poller: ChainPoller,
    strategy: StrategyService,
    data_manager: Arc<DataManager>,
}

impl RunService {
    pub fn new(config: RunConfig, poller: ChainPoller, data_manager: Arc<DataManager>) -> Self {
        let strategy = StrategyService::from_config(&config);
        Self {
            config,
            poller,
            strategy,
            data_manager,
        }
    }

    pub async fn run(&self) -> Result<RunOutcome, RunError> {
        let now = Local::now().naive_local();
        self.run_at(now.with_nanosecond(0).unwrap_or(now)).await
    }

    pub async fn run_at(&self, timestamp: NaiveDateTime) -> Result<RunOutcome, RunError> {
        let symbol = self.config.symbol.as_str();
        info!("Starting single run for {} at {}", symbol, timestamp);

        let (underlying, records) = match self.acquire_strikes().await {
            Ok(found) => found,
            Err(reason) => {
                error!("No usable data available: {}", reason);
                return Ok(RunOutcome::NoData { reason });
            }
        };

        let selected = self.strategy.select(&records, underlying);
        let snapshot = Snapshot::new(timestamp, symbol, underlying, selected);
        Self::log_neighborhood(&snapshot);

        self.data_manager
            .ensure_schema(self.config.execution_log)
            .await?;

        let previous = self.previous_records().await;

        let Some(alerts) = self.strategy.evaluate(&snapshot, &previous) else {
            let history = self.persist_history(&snapshot).await;
            info!("No previous snapshot for comparison. Run again later to generate alerts.");
            return Ok(RunOutcome::Baseline {
                strikes: snapshot.records.len(),
                history,
            });
        };

        let alerts_written = self.persist_alerts(&alerts).await;
        let history = self.persist_history(&snapshot).await;

        Ok(RunOutcome::Ranked {
            strikes: snapshot.records.len(),
            alerts,
            alerts_written,
            history,
        })
    }

    async fn acquire_strikes(&self) -> Result<(f64, Vec<StrikeRecord>), String> {
        let mut reason = match self.poller.fetch_with_retry(&self.config.symbol).await {
            Ok(chain) => {
                let records = self.strategy.normalize(&chain);
                if !records.is_empty() {
                    info!(
                        "Processed {} strikes; underlying={}",
                        records.len(),
                        chain.underlying
                    );
                    return Ok((chain.underlying, records));
                }
                "option chain contained no strikes".to_string()
            }
            Err(e) => {
                error!("Primary fetch failed: {}", e);
                e.to_string()
            }
        };

        if let Some(path) = &self.config.fallback_csv {
            if !path.exists() {
                warn!("Fallback CSV not found: {}", path.display());
                reason.push_str(&format!("; fallback CSV not found: {}", path.display()));
                return Err(reason);
            }
            match load_fallback_csv(path) {
                Ok(chain) => {
                    let records = self.strategy.normalize(&chain);
                    if !records.is_empty() {
                        return Ok((chain.underlying, records));
                    }
                    reason.push_str("; fallback CSV contained no strikes");
                }
                Err(e) => {
                    warn!("Fallback CSV unusable: {}", e);
                    reason.push_str(&format!("; {e}"));
                }
            }
        }

        Err(reason)
    }

    async fn previous_records(&self) -> Vec<StrikeRecord> {
        match HistoryRepository::latest_snapshot(&self.data_manager, &self.config.symbol).await {
            Ok(Some(previous)) => {
                info!(
                    "Found previous snapshot from {} with {} strikes",
                    previous.timestamp_str(),
                    previous.records.len()
                );
                previous.records
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Could not read history: {}", e);
                Vec::new()
            }
        }
    }

    async fn persist_alerts(&self, alerts: &[AlertRow]) -> Result<usize, StoreError> {
        if alerts.is_empty() {
            info!("No alerts by pct-COI ranking this run");
            return Ok(0);
        }

        match AlertsRepository::insert_batch(&self.data_manager, alerts).await {
            Ok(n) => {
                info!("Logged {} alert(s):", n);
                for alert in alerts {
                    info!("  {} | Strike {} | {}", alert.label, alert.strike, alert.details);
                }
                Ok(n)
            }
            Err(e) => {
                error!("Failed to write alerts: {}", e);
                Err(e)
            }
        }
    }

    async fn persist_history(&self, snapshot: &Snapshot) -> Result<usize, StoreError> {
        match HistoryRepository::insert_snapshot(&self.data_manager, snapshot).await {
            Ok(n) => {
                info!("Appended {} history rows", n);
                Ok(n)
            }
            Err(e) => {
                error!("Failed to append history: {}", e);
                Err(e)
            }
        }
    }

    fn log_neighborhood(snapshot: &Snapshot) {
        info!(
            "Selected {} nearest strikes around {}:",
            snapshot.records.len(),
            snapshot.underlying
        );
        info!("{:>8} {:>10} {:>10} {:>10} {:>10}", "strike", "CE_OI", "CE_COI", "PE_OI", "PE_COI");
        for r in &snapshot.records {
            info!(
                "{:>8} {:>10} {:>10} {:>10} {:>10}",
                r.strike,
                r.call.open_interest,
                r.call.change_in_open_interest,
                r.put.open_interest,
                r.put.change_in_open_interest
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use common::models::{OptionChain, Side, SideQuote};
    use market_data::{FetchError, OptionChainSource, RetryPolicy};
    use mockall::mock;
    use serde_json::{Value, json};
    use storage::{
        MemoryTableStore, TableStore,
        schema::{ALERTS_TABLE, HISTORY_TABLE},
    };

    mock! {
        Source {}

        #[async_trait]
        impl OptionChainSource for Source {
            async fn fetch_chain(&self, symbol: &str) -> Result<OptionChain, FetchError>;
        }
    }

    fn ts(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 4)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn entry(strike: i64, ce: (i64, i64), pe: (i64, i64)) -> Value {
        json!({
            "strikePrice": strike,
            "CE": {"openInterest": ce.0, "changeinOpenInterest": ce.1, "impliedVolatility": 12.5},
            "PE": {"openInterest": pe.0, "changeinOpenInterest": pe.1, "impliedVolatility": 13.0},
        })
    }

    fn record(strike: i64, call_oi: i64, put_oi: i64) -> StrikeRecord {
        StrikeRecord {
            strike,
            call: SideQuote {
                open_interest: call_oi,
                change_in_open_interest: 0,
                implied_volatility: 10.0,
            },
            put: SideQuote {
                open_interest: put_oi,
                change_in_open_interest: 0,
                implied_volatility: 10.0,
            },
        }
    }

    fn source_returning(underlying: f64, entries: Vec<Value>) -> MockSource {
        let mut source = MockSource::new();
        source.expect_fetch_chain().returning(move |_| {
            Ok(OptionChain {
                underlying,
                entries: entries.clone(),
            })
        });
        source
    }

    fn failing_source() -> MockSource {
        let mut source = MockSource::new();
        source
            .expect_fetch_chain()
            .returning(|_| Err(FetchError::Blocked(403)));
        source
    }

    fn service(
        source: MockSource,
        store: Arc<MemoryTableStore>,
        fallback_csv: Option<PathBuf>,
    ) -> RunService {
        let config = RunConfig {
            fallback_csv,
            fetch_retries: 1,
            ..RunConfig::default()
        };
        let poller = ChainPoller::new(Box::new(source), RetryPolicy::immediate(1));
        let data_manager = Arc::new(DataManager::new(store as Arc<dyn TableStore>));
        RunService::new(config, poller, data_manager)
    }

    async fn seed_previous(store: &Arc<MemoryTableStore>, records: Vec<StrikeRecord>) {
        let data_manager = DataManager::new(store.clone() as Arc<dyn TableStore>);
        data_manager.ensure_schema(false).await.unwrap();
        let previous = Snapshot::new(ts(10, 0), "NIFTY", 110.0, records);
        HistoryRepository::insert_snapshot(&data_manager, &previous)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_strike_missing_from_previous_ranks_first() {
        let store = Arc::new(MemoryTableStore::new());
        seed_previous(&store, vec![record(110, 1_000, 1_000), record(120, 1_000, 1_000)]).await;

        let source = source_returning(
            110.0,
            vec![
                entry(100, (200, 50), (0, 0)),
                entry(110, (1_000, 10), (1_000, 0)),
                entry(120, (1_000, 5), (1_000, 0)),
            ],
        );
        let outcome = service(source, store.clone(), None)
            .run_at(ts(10, 5))
            .await
            .unwrap();

        let RunOutcome::Ranked { alerts, .. } = &outcome else {
            panic!("expected a ranked outcome, got {outcome:?}");
        };
        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts[0].side, Side::Call);
        assert_eq!(alerts[0].strike, 100);
        assert_eq!(alerts[0].rank, 1);
        assert_eq!(alerts[0].pct_coi, 50.0 / strategy::MIN_PREV_OI_DENOM);
        assert!(alerts[0].details.starts_with("prev_OI=0, curr_COI=50"));
        assert_eq!(store.rows(ALERTS_TABLE).await.len(), 3);
        assert_eq!(outcome.status(), ExecutionStatus::Completed);
    }

    #[tokio::test]
    async fn test_negative_change_never_alerts() {
        let store = Arc::new(MemoryTableStore::new());
        seed_previous(&store, vec![record(100, 500, 500), record(110, 500, 500)]).await;

        let source = source_returning(
            105.0,
            vec![entry(100, (500, -10), (500, -10)), entry(110, (500, 1), (500, 1))],
        );
        let outcome = service(source, store, None).run_at(ts(10, 5)).await.unwrap();

        let RunOutcome::Ranked { alerts, .. } = outcome else {
            panic!("expected a ranked outcome");
        };
        assert!(alerts.iter().all(|a| a.strike != 100));
        assert_eq!(alerts.len(), 2);
    }

    #[tokio::test]
    async fn test_first_run_persists_history_only() {
        let store = Arc::new(MemoryTableStore::new());
        let source = source_returning(
            110.0,
            vec![entry(100, (200, 50), (300, 20)), entry(110, (400, 30), (100, 10))],
        );

        let outcome = service(source, store.clone(), None)
            .run_at(ts(9, 30))
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            RunOutcome::Baseline {
                strikes: 2,
                history: Ok(2)
            }
        ));
        assert!(store.rows(ALERTS_TABLE).await.is_empty());
        let history = store.rows(HISTORY_TABLE).await;
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|row| row[0] == "2025-03-04 09:30:00"));
    }

    #[tokio::test]
    async fn test_ties_keep_strike_order_and_sequential_ranks() {
        let store = Arc::new(MemoryTableStore::new());
        seed_previous(&store, vec![record(100, 100, 0), record(110, 100, 0)]).await;

        let source = source_returning(
            105.0,
            vec![entry(100, (110, 10), (0, 0)), entry(110, (110, 10), (0, 0))],
        );
        let outcome = service(source, store, None).run_at(ts(10, 5)).await.unwrap();

        let RunOutcome::Ranked { alerts, .. } = outcome else {
            panic!("expected a ranked outcome");
        };
        let ranked: Vec<(usize, i64)> = alerts.iter().map(|a| (a.rank, a.strike)).collect();
        assert_eq!(ranked, vec![(1, 100), (2, 110)]);
        assert_eq!(alerts[0].pct_coi, alerts[1].pct_coi);
    }

    #[tokio::test]
    async fn test_alert_write_failure_does_not_block_history() {
        let store = Arc::new(MemoryTableStore::new().with_failing_writes(ALERTS_TABLE));
        seed_previous(&store, vec![record(100, 100, 100)]).await;

        let source = source_returning(100.0, vec![entry(100, (150, 50), (100, 0))]);
        let outcome = service(source, store.clone(), None)
            .run_at(ts(10, 5))
            .await
            .unwrap();

        let RunOutcome::Ranked {
            alerts_written,
            history,
            ..
        } = &outcome
        else {
            panic!("expected a ranked outcome");
        };
        assert!(alerts_written.is_err());
        assert_eq!(history.as_ref().ok(), Some(&1));
        assert!(outcome.persistence_failed());
        assert_eq!(store.rows(HISTORY_TABLE).await.len(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_history_counts_as_first_run() {
        let store = Arc::new(MemoryTableStore::new().with_failing_reads(HISTORY_TABLE));
        let source = source_returning(100.0, vec![entry(100, (150, 50), (100, 0))]);

        let outcome = service(source, store.clone(), None)
            .run_at(ts(10, 5))
            .await
            .unwrap();

        assert!(matches!(outcome, RunOutcome::Baseline { history: Ok(1), .. }));
        assert!(store.rows(ALERTS_TABLE).await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_without_fallback_yields_no_data() {
        let store = Arc::new(MemoryTableStore::new());
        let outcome = service(failing_source(), store.clone(), None)
            .run_at(ts(10, 5))
            .await
            .unwrap();

        assert!(matches!(outcome, RunOutcome::NoData { .. }));
        assert_eq!(outcome.status(), ExecutionStatus::Failed);
        assert!(!outcome.persistence_failed());
        assert!(store.rows(HISTORY_TABLE).await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_uses_fallback_csv() {
        let path = std::env::temp_dir().join(format!("oi-fallback-{}.csv", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "Strike Price,CE_OI,CE_COI,PE_OI,PE_COI\n100,200,20,300,30\n200,400,40,500,50\n",
        )
        .unwrap();

        let store = Arc::new(MemoryTableStore::new());
        let outcome = service(failing_source(), store.clone(), Some(path.clone()))
            .run_at(ts(10, 5))
            .await
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert!(matches!(outcome, RunOutcome::Baseline { strikes: 2, .. }));
        let history = store.rows(HISTORY_TABLE).await;
        assert_eq!(history[0][2], "150");
    }

    #[tokio::test]
    async fn test_missing_fallback_file_yields_no_data() {
        let store = Arc::new(MemoryTableStore::new());
        let outcome = service(
            failing_source(),
            store,
            Some(PathBuf::from("/nonexistent/oi-fallback.csv")),
        )
        .run_at(ts(10, 5))
        .await
        .unwrap();

        let RunOutcome::NoData { reason } = outcome else {
            panic!("expected no data");
        };
        assert!(reason.contains("fallback CSV not found"));
    }
}
