use common::models::{ExecutionEvent, snapshot::TIMESTAMP_FORMAT};

use crate::{data_manager::DataManager, error::StoreError, schema::EXECUTION_LOG_TABLE};

pub struct ExecutionLogRepository;

impl ExecutionLogRepository {
    pub async fn insert(data_manager: &DataManager, event: &ExecutionEvent) -> Result<(), StoreError> {
        let row = vec![
            event.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            event.status.as_str().to_string(),
            event.details.clone(),
        ];
        data_manager
            .store()
            .append_rows(EXECUTION_LOG_TABLE, &[row])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryTableStore;
    use common::models::ExecutionStatus;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_insert_writes_status_and_details() {
        let store = Arc::new(MemoryTableStore::new());
        let dm = DataManager::new(store.clone());
        dm.ensure_schema(true).await.unwrap();

        let event = ExecutionEvent::new(ExecutionStatus::Failed, "boom ".repeat(200));
        ExecutionLogRepository::insert(&dm, &event).await.unwrap();

        let rows = store.rows(EXECUTION_LOG_TABLE).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1], "failed");
        assert_eq!(rows[0][2].chars().count(), 500);
        assert!(chrono::NaiveDateTime::parse_from_str(&rows[0][0], TIMESTAMP_FORMAT).is_ok());
    }

    #[tokio::test]
    async fn test_missing_table_is_an_error() {
        let store = Arc::new(MemoryTableStore::new());
        let dm = DataManager::new(store);
        dm.ensure_schema(false).await.unwrap();

        let event = ExecutionEvent::new(ExecutionStatus::Started, "");
        assert!(ExecutionLogRepository::insert(&dm, &event).await.is_err());
    }
}
