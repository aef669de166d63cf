use std::sync::Arc;

use common::models::{ExecutionEvent, ExecutionStatus};
use storage::{DataManager, repositories::ExecutionLogRepository};
use tracing::{info, warn};

/// Records run lifecycle events to the `execution_log` table when one is configured.
pub struct ExecutionService {
    data_manager: Option<Arc<DataManager>>,
}

impl ExecutionService {
    pub fn new(data_manager: Option<Arc<DataManager>>) -> Self {
        Self { data_manager }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub async fn record(&self, status: ExecutionStatus, details: impl Into<String>) {
        let event = ExecutionEvent::new(status, details);
        info!("Run {}: {}", event.status, event.details);

        let Some(data_manager) = &self.data_manager else {
            return;
        };
        if let Err(e) = ExecutionLogRepository::insert(data_manager, &event).await {
            warn!("Could not write execution log: {}", e);
        }
    }
}
