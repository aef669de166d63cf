use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    error::StoreError,
    table_store::{Table, TableStore},
};

/// In-process table store. Tables can be marked as failing to simulate an
/// unreachable or read-only backend.
#[derive(Default)]
pub struct MemoryTableStore {
    tables: Mutex<HashMap<String, Table>>,
    failing_reads: HashSet<String>,
    failing_writes: HashSet<String>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failing_reads(mut self, table: &str) -> Self {
        self.failing_reads.insert(table.to_string());
        self
    }

    pub fn with_failing_writes(mut self, table: &str) -> Self {
        self.failing_writes.insert(table.to_string());
        self
    }

    pub async fn rows(&self, name: &str) -> Vec<Vec<String>> {
        let tables = self.tables.lock().await;
        tables.get(name).map(|t| t.rows.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn ensure_table(&self, name: &str, header: &[&str]) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.contains_key(name) {
            return Ok(false);
        }
        tables.insert(
            name.to_string(),
            Table {
                header: header.iter().map(|h| h.to_string()).collect(),
                rows: Vec::new(),
            },
        );
        Ok(true)
    }

    async fn read_all_rows(&self, name: &str) -> Result<Table, StoreError> {
        if self.failing_reads.contains(name) {
            return Err(StoreError::Rejected(name.to_string(), "read refused".to_string()));
        }
        let tables = self.tables.lock().await;
        tables
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))
    }

    async fn append_rows(&self, name: &str, rows: &[Vec<String>]) -> Result<(), StoreError> {
        if self.failing_writes.contains(name) {
            return Err(StoreError::Rejected(name.to_string(), "write refused".to_string()));
        }
        let mut tables = self.tables.lock().await;
        let table = tables
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))?;

        let expected = table.header.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != expected) {
            return Err(StoreError::RowWidth {
                table: name.to_string(),
                expected,
                got: bad.len(),
            });
        }
        table.rows.extend(rows.iter().cloned());
        Ok(())
    }
}
