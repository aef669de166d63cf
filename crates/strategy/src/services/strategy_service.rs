use common::{
    RunConfig,
    models::{AlertRow, OptionChain, Snapshot, StrikeRecord},
};
use tracing::{debug, info};

use crate::{
    differencer::diff_snapshots,
    neighborhood::select_neighborhood,
    normalizer::normalize_records,
    ranker::{AlertContext, RankParams, build_alerts},
};

/// Runs the pct-COI pipeline for one symbol: normalize, select, diff and rank.
pub struct StrategyService {
    nearest_strikes: usize,
    params: RankParams,
}

impl StrategyService {
    pub fn new(nearest_strikes: usize, params: RankParams) -> Self {
        Self {
            nearest_strikes,
            params,
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(
            config.nearest_strikes,
            RankParams {
                threshold: config.min_pct_coi,
                top_n: config.alert_top_n,
            },
        )
    }

    pub fn normalize(&self, chain: &OptionChain) -> Vec<StrikeRecord> {
        let records = normalize_records(&chain.entries);
        debug!(
            "Normalized {} raw entries into {} strikes",
            chain.entries.len(),
            records.len()
        );
        records
    }

    pub fn select(&self, records: &[StrikeRecord], underlying: f64) -> Vec<StrikeRecord> {
        select_neighborhood(records, underlying, self.nearest_strikes)
    }

    /// Compares the current snapshot with the previous neighborhood.
    ///
    /// `None` means there was nothing to compare against; an empty vector means
    /// the comparison ran and no strike cleared the threshold.
    pub fn evaluate(&self, current: &Snapshot, previous: &[StrikeRecord]) -> Option<Vec<AlertRow>> {
        let diffs = diff_snapshots(&current.records, previous)?;

        let ctx = AlertContext {
            timestamp: current.timestamp,
            symbol: &current.symbol,
            underlying: current.underlying,
        };
        let alerts = build_alerts(&ctx, &diffs, &self.params);
        info!(
            "pct-COI ranking produced {} alert(s) from {} strikes",
            alerts.len(),
            current.records.len()
        );
        Some(alerts)
    }
}
