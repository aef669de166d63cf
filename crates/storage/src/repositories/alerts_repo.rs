use common::models::{AlertRow, snapshot::TIMESTAMP_FORMAT};

use crate::{data_manager::DataManager, error::StoreError, schema::ALERTS_TABLE};

pub struct AlertsRepository;

impl AlertsRepository {
    pub async fn insert_batch(
        data_manager: &DataManager,
        alerts: &[AlertRow],
    ) -> Result<usize, StoreError> {
        if alerts.is_empty() {
            return Ok(0);
        }

        let rows: Vec<Vec<String>> = alerts.iter().map(Self::to_row).collect();
        data_manager.store().append_rows(ALERTS_TABLE, &rows).await?;
        Ok(rows.len())
    }

    fn to_row(alert: &AlertRow) -> Vec<String> {
        vec![
            alert.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            alert.symbol.clone(),
            alert.underlying.to_string(),
            alert.rank.to_string(),
            alert.label.clone(),
            alert.strike.to_string(),
            alert.side.code().to_string(),
            alert.pct_coi.to_string(),
            alert.details.clone(),
        ]
    }
}
