use async_trait::async_trait;

use crate::error::StoreError;

/// Header plus data rows of one table, all cells as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Row-oriented, append-only store of named tables.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Creates the table with `header` unless it already exists. Returns whether it was created.
    async fn ensure_table(&self, name: &str, header: &[&str]) -> Result<bool, StoreError>;

    async fn read_all_rows(&self, name: &str) -> Result<Table, StoreError>;

    async fn append_rows(&self, name: &str, rows: &[Vec<String>]) -> Result<(), StoreError>;
}
