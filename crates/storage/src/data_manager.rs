use std::sync::Arc;

use tracing::info;

use crate::{
    error::StoreError,
    schema::{
        ALERTS_HEADER, ALERTS_TABLE, EXECUTION_LOG_HEADER, EXECUTION_LOG_TABLE, HISTORY_HEADER,
        HISTORY_TABLE,
    },
    table_store::TableStore,
};

pub struct DataManager {
    store: Arc<dyn TableStore>,
}

impl DataManager {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn TableStore {
        self.store.as_ref()
    }

    /// Makes sure `history` and `alerts` (and optionally `execution_log`) exist.
    pub async fn ensure_schema(&self, with_execution_log: bool) -> Result<(), StoreError> {
        let mut tables = vec![
            (HISTORY_TABLE, &HISTORY_HEADER[..]),
            (ALERTS_TABLE, &ALERTS_HEADER[..]),
        ];
        if with_execution_log {
            tables.push((EXECUTION_LOG_TABLE, &EXECUTION_LOG_HEADER[..]));
        }

        for (name, header) in tables {
            if self.store.ensure_table(name, header).await? {
                info!("Created table '{}'", name);
            }
        }
        Ok(())
    }
}
